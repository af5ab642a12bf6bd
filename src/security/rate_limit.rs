//! Fixed-window rate limiting middleware for the API path prefix.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::config::RateLimitConfig;

/// One client's counter for the current window.
struct Window {
    started: Instant,
    count: u32,
}

/// All tracked counters plus the time of the last eviction sweep.
struct Windows {
    map: HashMap<String, Window>,
    last_sweep: Instant,
}

/// State for the fixed-window rate limiter.
///
/// Counters live behind one mutex so concurrent requests from the same
/// client key observe a consistent count. Once per window length, expired
/// entries are swept out so the map does not grow with every client key
/// ever seen.
pub struct RateLimiterState {
    windows: Mutex<Windows>,
    config: RateLimitConfig,
}

impl RateLimiterState {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            windows: Mutex::new(Windows {
                map: HashMap::new(),
                last_sweep: Instant::now(),
            }),
            config,
        }
    }

    /// The path prefix this limiter is scoped to.
    pub fn applies_to(&self, path: &str) -> bool {
        let prefix = &self.config.path_prefix;
        path == prefix || path.starts_with(&format!("{prefix}/"))
    }

    /// The message returned when the quota is exhausted.
    pub fn message(&self) -> &str {
        &self.config.message
    }

    /// Count one request against `key`, returning false once the quota for
    /// the current window is spent. The window restarts `window_secs` after
    /// the first counted request.
    pub fn check(&self, key: &str) -> bool {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> bool {
        let window_len = Duration::from_secs(self.config.window_secs);
        let mut windows = self.windows.lock().expect("rate limiter mutex poisoned");

        if now.duration_since(windows.last_sweep) >= window_len {
            windows
                .map
                .retain(|_, w| now.duration_since(w.started) < window_len);
            windows.last_sweep = now;
        }

        let window = windows.map.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });

        if now.duration_since(window.started) >= window_len {
            window.started = now;
            window.count = 0;
        }

        if window.count < self.config.max_requests {
            window.count += 1;
            true
        } else {
            false
        }
    }

    #[cfg(test)]
    fn tracked_clients(&self) -> usize {
        self.windows
            .lock()
            .expect("rate limiter mutex poisoned")
            .map
            .len()
    }
}

/// Middleware enforcing the per-client quota under the configured prefix.
/// Requests outside the prefix pass through uncounted.
pub async fn rate_limit_middleware(
    State(state): State<Arc<RateLimiterState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !state.applies_to(request.uri().path()) {
        return next.run(request).await;
    }

    let key = client_key(&request);
    if state.check(&key) {
        next.run(request).await
    } else {
        tracing::warn!(client = %key, path = %request.uri().path(), "Rate limit exceeded");
        let mut response = Response::new(Body::from(state.message().to_string()));
        *response.status_mut() = StatusCode::TOO_MANY_REQUESTS;
        response
    }
}

/// Derive the client key for quota accounting.
///
/// The server sits behind a trusted proxy, so the first X-Forwarded-For
/// entry wins; the socket address is the fallback for direct connections.
fn client_key(request: &Request<Body>) -> String {
    if let Some(forwarded) = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return forwarded.to_string();
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_requests: u32, window_secs: u64) -> RateLimiterState {
        RateLimiterState::new(RateLimitConfig {
            max_requests,
            window_secs,
            ..RateLimitConfig::default()
        })
    }

    #[test]
    fn quota_denies_the_excess_request() {
        let state = limiter(100, 3600);
        for _ in 0..100 {
            assert!(state.check("10.0.0.1"));
        }
        assert!(!state.check("10.0.0.1"));
    }

    #[test]
    fn keys_are_independent() {
        let state = limiter(1, 3600);
        assert!(state.check("10.0.0.1"));
        assert!(!state.check("10.0.0.1"));
        assert!(state.check("10.0.0.2"));
    }

    #[test]
    fn window_expiry_resets_the_count() {
        let state = limiter(1, 60);
        let start = Instant::now();
        assert!(state.check_at("10.0.0.1", start));
        assert!(!state.check_at("10.0.0.1", start + Duration::from_secs(30)));
        assert!(state.check_at("10.0.0.1", start + Duration::from_secs(61)));
    }

    #[test]
    fn expired_windows_are_evicted() {
        let state = limiter(100, 60);
        let start = Instant::now();
        assert!(state.check_at("10.0.0.1", start));
        assert!(state.check_at("10.0.0.2", start + Duration::from_secs(1)));
        assert_eq!(state.tracked_clients(), 2);

        // The next check a full window later sweeps both stale entries
        // before inserting its own.
        assert!(state.check_at("10.0.0.3", start + Duration::from_secs(61)));
        assert_eq!(state.tracked_clients(), 1);
    }

    #[test]
    fn prefix_scoping() {
        let state = limiter(100, 3600);
        assert!(state.applies_to("/api"));
        assert!(state.applies_to("/api/v1/confer"));
        assert!(!state.applies_to("/apiary"));
        assert!(!state.applies_to("/"));
    }

    #[test]
    fn forwarded_header_wins_over_socket() {
        let request = Request::builder()
            .header("x-forwarded-for", "203.0.113.9, 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_key(&request), "203.0.113.9");

        let request = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(client_key(&request), "unknown");
    }
}
