//! Input sanitization middleware.
//!
//! # Responsibilities
//! - Strip operator-injection keys (`$`-prefixed or dotted) from JSON and
//!   urlencoded bodies and from the query string
//! - Neutralize script-injection payloads in body and query string values
//!
//! # Design Decisions
//! - Runs after the body size limit, so buffering the body is bounded
//! - Sanitized bytes replace the request body before handler extraction
//! - A body that fails to parse is passed through untouched; the handler's
//!   extractor owns the resulting 400

use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, uri::PathAndQuery, Request, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;
use url::form_urlencoded;

use crate::config::AppConfig;

/// Escape the characters that open executable markup.
pub fn escape_html(input: &str) -> String {
    input.replace('<', "&lt;").replace('>', "&gt;")
}

/// True for keys a query/document store would interpret as operators.
fn is_operator_key(key: &str) -> bool {
    key.starts_with('$') || key.contains('.')
}

/// Recursively sanitize a JSON value in place.
fn sanitize_value(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|key, _| !is_operator_key(key));
            for child in map.values_mut() {
                sanitize_value(child);
            }
        }
        Value::Array(items) => {
            for item in items {
                sanitize_value(item);
            }
        }
        Value::String(text) => {
            if text.contains(['<', '>']) {
                *text = escape_html(text);
            }
        }
        _ => {}
    }
}

/// Sanitize a JSON body, returning None when nothing changed.
fn sanitize_json(bytes: &Bytes) -> Option<Vec<u8>> {
    let mut value: Value = serde_json::from_slice(bytes).ok()?;
    sanitize_value(&mut value);
    let sanitized = serde_json::to_vec(&value).ok()?;
    if sanitized.as_slice() == bytes.as_ref() {
        None
    } else {
        Some(sanitized)
    }
}

/// Sanitize a urlencoded body or query string: drop operator keys and
/// escape values. Returns None when nothing changed.
fn sanitize_urlencoded(input: &str) -> Option<String> {
    let pairs: Vec<(String, String)> = form_urlencoded::parse(input.as_bytes())
        .into_owned()
        .collect();
    let dirty = pairs
        .iter()
        .any(|(name, value)| is_operator_key(name) || value.contains(['<', '>']));
    if !dirty {
        return None;
    }
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (name, value) in &pairs {
        if is_operator_key(name) {
            continue;
        }
        serializer.append_pair(name, &escape_html(value));
    }
    Some(serializer.finish())
}

/// Middleware applying both sanitization passes to the request.
pub async fn sanitize_middleware(
    State(config): State<Arc<AppConfig>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let request = sanitize_query(request);

    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    let is_json = content_type.starts_with("application/json");
    let is_form = content_type.starts_with("application/x-www-form-urlencoded");

    if !is_json && !is_form {
        return next.run(request).await;
    }

    let (mut parts, body) = request.into_parts();
    let bytes = match axum::body::to_bytes(body, config.limits.body_limit_bytes).await {
        Ok(bytes) => bytes,
        Err(_) => {
            return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
        }
    };

    let sanitized = if is_json {
        sanitize_json(&bytes)
    } else {
        std::str::from_utf8(&bytes)
            .ok()
            .and_then(sanitize_urlencoded)
            .map(String::into_bytes)
    };

    let body_bytes = match sanitized {
        Some(clean) => Bytes::from(clean),
        None => bytes,
    };
    parts.headers.insert(
        header::CONTENT_LENGTH,
        header::HeaderValue::from(body_bytes.len()),
    );

    next.run(Request::from_parts(parts, Body::from(body_bytes))).await
}

/// Rewrite the query string with script-injection payloads escaped.
fn sanitize_query(mut request: Request<Body>) -> Request<Body> {
    let Some(query) = request.uri().query() else {
        return request;
    };
    let Some(sanitized) = sanitize_urlencoded(query) else {
        return request;
    };

    let path = request.uri().path();
    let path_and_query = if sanitized.is_empty() {
        path.to_string()
    } else {
        format!("{path}?{sanitized}")
    };

    let mut uri_parts = request.uri().clone().into_parts();
    if let Ok(pq) = PathAndQuery::from_maybe_shared(path_and_query) {
        uri_parts.path_and_query = Some(pq);
        if let Ok(uri) = Uri::from_parts(uri_parts) {
            *request.uri_mut() = uri;
        }
    }
    request
}
