//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files, and
//! every section has defaults so the server can run with no config file at
//! all.

use serde::{Deserialize, Serialize};

/// Root configuration for the Confer API server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener and runtime environment settings.
    pub server: ServerConfig,

    /// Rate limiting for the API path prefix.
    pub rate_limit: RateLimitConfig,

    /// Request body limits.
    pub limits: LimitsConfig,

    /// Security response headers (content security policy).
    pub security: SecurityConfig,

    /// Input sanitization settings.
    pub sanitize: SanitizeConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// TCP port to listen on. Overridable via the `PORT` env var.
    pub port: u16,

    /// Runtime environment name. Overridable via the `APP_ENV` env var.
    /// Request logging is enabled only when this equals "development".
    pub environment: String,

    /// Directory served as static assets.
    pub static_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            environment: "production".to_string(),
            static_dir: "public".to_string(),
        }
    }
}

impl ServerConfig {
    /// True when request logging should be active.
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

/// Rate limiting configuration.
///
/// Requests under `path_prefix` share a fixed quota per client key; the
/// window restarts `window_secs` after a client's first counted request.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Path prefix the limiter applies to.
    pub path_prefix: String,

    /// Maximum requests per window per client.
    pub max_requests: u32,

    /// Window length in seconds.
    pub window_secs: u64,

    /// Message returned alongside 429 when the quota is exhausted.
    pub message: String,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            path_prefix: "/api".to_string(),
            max_requests: 100,
            window_secs: 60 * 60,
            message: "Too many requests from this IP address, please try again in an hour."
                .to_string(),
        }
    }
}

/// Request limits configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum accepted request body size in bytes.
    pub body_limit_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            body_limit_bytes: 10 * 1024,
        }
    }
}

/// Security header configuration: content-security-policy directive sources.
///
/// Each field is the source list for one CSP directive. Defaults name the
/// external origins the frontend loads from (mapbox, stripe, cloudflare).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub default_src: Vec<String>,
    pub base_uri: Vec<String>,
    pub font_src: Vec<String>,
    pub script_src: Vec<String>,
    pub frame_src: Vec<String>,
    pub object_src: Vec<String>,
    pub style_src: Vec<String>,
    pub worker_src: Vec<String>,
    pub child_src: Vec<String>,
    pub img_src: Vec<String>,
    pub form_action: Vec<String>,
    pub connect_src: Vec<String>,

    /// Emit the valueless `upgrade-insecure-requests` directive.
    pub upgrade_insecure_requests: bool,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            default_src: strings(&["'self'", "data:", "blob:", "https:", "ws:"]),
            base_uri: strings(&["'self'"]),
            font_src: strings(&["'self'", "https:", "data:"]),
            script_src: strings(&[
                "'self'",
                "https:",
                "http:",
                "blob:",
                "https://*.mapbox.com",
                "https://js.stripe.com",
                "https://m.stripe.network",
                "https://*.cloudflare.com",
            ]),
            frame_src: strings(&["'self'", "https://js.stripe.com"]),
            object_src: strings(&["'none'"]),
            style_src: strings(&["'self'", "https:", "'unsafe-inline'"]),
            worker_src: strings(&[
                "'self'",
                "data:",
                "blob:",
                "https://*.tiles.mapbox.com",
                "https://api.mapbox.com",
                "https://events.mapbox.com",
                "https://m.stripe.network",
            ]),
            child_src: strings(&["'self'", "blob:"]),
            img_src: strings(&["'self'", "data:", "blob:"]),
            form_action: strings(&["'self'"]),
            connect_src: strings(&[
                "'self'",
                "'unsafe-inline'",
                "data:",
                "blob:",
                "https://*.stripe.com",
                "https://*.mapbox.com",
                "https://*.cloudflare.com/",
                "https://bundle.js:*",
                "ws://127.0.0.1:*/",
            ]),
            upgrade_insecure_requests: true,
        }
    }
}

/// Sanitization configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SanitizeConfig {
    /// Query parameter names allowed to keep multiple values. Every other
    /// duplicated name collapses to its last supplied value.
    pub allow_array_params: Vec<String>,
}

impl Default for SanitizeConfig {
    fn default() -> Self {
        Self {
            allow_array_params: strings(&[
                "duration",
                "numRatings",
                "avgRating",
                "maxGroupSize",
                "difficulty",
                "price",
            ]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_contract() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.environment, "production");
        assert!(!config.server.is_development());
        assert_eq!(config.rate_limit.max_requests, 100);
        assert_eq!(config.rate_limit.window_secs, 3600);
        assert_eq!(config.rate_limit.path_prefix, "/api");
        assert_eq!(config.limits.body_limit_bytes, 10 * 1024);
        assert!(config
            .sanitize
            .allow_array_params
            .contains(&"duration".to_string()));
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [server]
            port = 8080
            environment = "development"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 8080);
        assert!(config.server.is_development());
        assert_eq!(config.rate_limit.max_requests, 100);
        assert!(config
            .security
            .script_src
            .contains(&"https://js.stripe.com".to_string()));
    }
}
