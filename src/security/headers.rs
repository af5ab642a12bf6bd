//! Security response headers.
//!
//! # Responsibilities
//! - Build the Content-Security-Policy value from configured source lists
//! - Supply the companion security headers set on every response
//!
//! # Design Decisions
//! - Headers only augment responses; this stage never rejects a request
//! - The CSP value is built once at startup, not per request

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};

use crate::config::SecurityConfig;

/// Header pairs applied to every response, built once at startup.
pub type HeaderSet = Vec<(HeaderName, HeaderValue)>;

/// Middleware stamping the security header set onto the response.
pub async fn headers_middleware(
    State(headers): State<Arc<HeaderSet>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    for (name, value) in headers.iter() {
        response.headers_mut().insert(name.clone(), value.clone());
    }
    response
}

/// Render one CSP directive, or None when its source list is empty.
fn directive(name: &str, sources: &[String]) -> Option<String> {
    if sources.is_empty() {
        None
    } else {
        Some(format!("{} {}", name, sources.join(" ")))
    }
}

/// Render the full Content-Security-Policy header value.
pub fn csp_value(config: &SecurityConfig) -> String {
    let mut directives: Vec<String> = [
        directive("default-src", &config.default_src),
        directive("base-uri", &config.base_uri),
        directive("font-src", &config.font_src),
        directive("script-src", &config.script_src),
        directive("frame-src", &config.frame_src),
        directive("object-src", &config.object_src),
        directive("style-src", &config.style_src),
        directive("worker-src", &config.worker_src),
        directive("child-src", &config.child_src),
        directive("img-src", &config.img_src),
        directive("form-action", &config.form_action),
        directive("connect-src", &config.connect_src),
    ]
    .into_iter()
    .flatten()
    .collect();

    if config.upgrade_insecure_requests {
        directives.push("upgrade-insecure-requests".to_string());
    }

    directives.join(";")
}

/// The full set of security headers added to every response.
///
/// CSP sources are checked at config load, so header value construction
/// cannot fail here.
pub fn response_headers(config: &SecurityConfig) -> HeaderSet {
    vec![
        (
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_str(&csp_value(config)).expect("CSP sources validated at load"),
        ),
        (
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ),
        (
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ),
        (
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ),
        (
            HeaderName::from_static("x-xss-protection"),
            HeaderValue::from_static("0"),
        ),
        (
            HeaderName::from_static("x-dns-prefetch-control"),
            HeaderValue::from_static("off"),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csp_names_the_external_origins() {
        let value = csp_value(&SecurityConfig::default());
        assert!(value.contains("script-src 'self' https: http: blob: https://*.mapbox.com"));
        assert!(value.contains("frame-src 'self' https://js.stripe.com"));
        assert!(value.contains("worker-src 'self' data: blob: https://*.tiles.mapbox.com"));
        assert!(value.contains("connect-src"));
        assert!(value.contains("img-src 'self' data: blob:"));
        assert!(value.contains("font-src 'self' https: data:"));
        assert!(value.contains("style-src 'self' https: 'unsafe-inline'"));
        assert!(value.ends_with("upgrade-insecure-requests"));
    }

    #[test]
    fn empty_directive_is_omitted() {
        let config = SecurityConfig {
            frame_src: Vec::new(),
            upgrade_insecure_requests: false,
            ..SecurityConfig::default()
        };
        let value = csp_value(&config);
        assert!(!value.contains("frame-src"));
        assert!(!value.contains("upgrade-insecure-requests"));
    }

    #[test]
    fn companion_headers_present() {
        let headers = response_headers(&SecurityConfig::default());
        assert!(headers
            .iter()
            .any(|(name, value)| name == header::X_CONTENT_TYPE_OPTIONS && value == "nosniff"));
        assert!(headers
            .iter()
            .any(|(name, _)| name == header::CONTENT_SECURITY_POLICY));
    }
}
