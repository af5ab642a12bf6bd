//! Cookie parsing middleware.
//!
//! Parses the Cookie request header into a structured map exposed to
//! handlers as a request extension. Malformed pairs are skipped rather than
//! rejected.

use std::collections::HashMap;

use axum::{
    body::Body,
    http::{header, Request},
    middleware::Next,
    response::Response,
};
use cookie::Cookie;

/// Parsed request cookies, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct Cookies(HashMap<String, String>);

impl Cookies {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

fn parse_cookie_header(value: &str) -> Cookies {
    let mut map = HashMap::new();
    for cookie in Cookie::split_parse(value).flatten() {
        map.insert(cookie.name().to_string(), cookie.value().to_string());
    }
    Cookies(map)
}

/// Middleware attaching [`Cookies`] to every request.
pub async fn cookie_middleware(mut request: Request<Body>, next: Next) -> Response {
    let cookies = request
        .headers()
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(parse_cookie_header)
        .unwrap_or_default();
    request.extensions_mut().insert(cookies);
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_parses_into_map() {
        let cookies = parse_cookie_header("session=abc123; theme=dark");
        assert_eq!(cookies.get("session"), Some("abc123"));
        assert_eq!(cookies.get("theme"), Some("dark"));
        assert_eq!(cookies.len(), 2);
    }

    #[test]
    fn malformed_pairs_are_skipped() {
        let cookies = parse_cookie_header("good=1; notacookie");
        assert_eq!(cookies.get("good"), Some("1"));
        assert_eq!(cookies.len(), 1);
    }

    #[test]
    fn no_header_means_empty() {
        assert!(Cookies::default().is_empty());
    }

    #[tokio::test]
    async fn middleware_exposes_cookies_to_handlers() {
        use axum::{middleware, routing::get, Extension, Router};
        use tower::ServiceExt;

        async fn read(Extension(cookies): Extension<Cookies>) -> String {
            cookies.get("session").unwrap_or("missing").to_string()
        }

        let app = Router::new()
            .route("/", get(read))
            .layer(middleware::from_fn(cookie_middleware));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header(header::COOKIE, "session=abc123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(bytes, "abc123");
    }
}
