//! Parameter-pollution guard.
//!
//! # Responsibilities
//! - Collapse duplicated parameter names to their last value, in the query
//!   string and in urlencoded bodies
//! - Preserve multiple values for the configured allow-list of names
//!
//! # Design Decisions
//! - Last value wins, matching what downstream code that indexes a flat
//!   parameter map would otherwise see nondeterministically
//! - Parameter order follows first occurrence of each name

use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, uri::PathAndQuery, Request, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};
use url::form_urlencoded;

use crate::config::AppConfig;

/// Collapse duplicated parameters, returning None when the query already has
/// no duplicates.
pub fn collapse_query(query: &str, allow_arrays: &[String]) -> Option<String> {
    let mut order: Vec<String> = Vec::new();
    let mut grouped: Vec<(String, Vec<String>)> = Vec::new();

    for (name, value) in form_urlencoded::parse(query.as_bytes()) {
        match grouped.iter_mut().find(|(n, _)| *n == name) {
            Some((_, values)) => values.push(value.into_owned()),
            None => {
                order.push(name.to_string());
                grouped.push((name.into_owned(), vec![value.into_owned()]));
            }
        }
    }

    if grouped.iter().all(|(_, values)| values.len() == 1) {
        return None;
    }

    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for name in &order {
        let (_, values) = grouped
            .iter()
            .find(|(n, _)| n == name)
            .expect("grouped entry exists for every ordered name");
        if allow_arrays.iter().any(|a| a == name) {
            for value in values {
                serializer.append_pair(name, value);
            }
        } else if let Some(last) = values.last() {
            serializer.append_pair(name, last);
        }
    }
    Some(serializer.finish())
}

/// Middleware rewriting the request URI and urlencoded body with duplicates
/// collapsed.
pub async fn hpp_middleware(
    State(config): State<Arc<AppConfig>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    if let Some(query) = request.uri().query() {
        if let Some(collapsed) = collapse_query(query, &config.sanitize.allow_array_params) {
            let path = request.uri().path();
            let path_and_query = if collapsed.is_empty() {
                path.to_string()
            } else {
                format!("{path}?{collapsed}")
            };
            let mut uri_parts = request.uri().clone().into_parts();
            if let Ok(pq) = PathAndQuery::from_maybe_shared(path_and_query) {
                uri_parts.path_and_query = Some(pq);
                if let Ok(uri) = Uri::from_parts(uri_parts) {
                    *request.uri_mut() = uri;
                }
            }
        }
    }

    let is_form = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/x-www-form-urlencoded"));
    if !is_form {
        return next.run(request).await;
    }

    let (mut parts, body) = request.into_parts();
    let bytes = match axum::body::to_bytes(body, config.limits.body_limit_bytes).await {
        Ok(bytes) => bytes,
        Err(_) => {
            return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
        }
    };

    let collapsed = std::str::from_utf8(&bytes)
        .ok()
        .and_then(|form| collapse_query(form, &config.sanitize.allow_array_params));
    let body_bytes = match collapsed {
        Some(clean) => Bytes::from(clean),
        None => bytes,
    };
    parts.headers.insert(
        header::CONTENT_LENGTH,
        header::HeaderValue::from(body_bytes.len()),
    );

    next.run(Request::from_parts(parts, Body::from(body_bytes))).await
}
