//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with both route handlers
//! - Wire up the middleware pipeline in its contracted order
//! - Bind the server to a listener and serve until asked to stop
//!
//! # Pipeline order
//! Static assets are checked outside the layered stack, so matching files
//! bypass every later stage. For everything else the stages run strictly in
//! declaration order:
//! CORS → security headers → request logging (development only) → rate
//! limiting (/api) → body size limit → cookie parsing → sanitization →
//! parameter-pollution guard → handlers, with response compression applied
//! on the way out.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{middleware, routing::get, Router};
use tokio::net::TcpListener;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer,
    services::ServeDir, trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::http::cookies::cookie_middleware;
use crate::http::handlers;
use crate::security::headers::{self, headers_middleware};
use crate::security::hpp::hpp_middleware;
use crate::security::rate_limit::{rate_limit_middleware, RateLimiterState};
use crate::security::sanitize::sanitize_middleware;

/// HTTP server for the Confer API.
pub struct HttpServer {
    router: Router,
    config: Arc<AppConfig>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        let config = Arc::new(config);
        let rate_limiter = Arc::new(RateLimiterState::new(config.rate_limit.clone()));
        let router = Self::build_router(config.clone(), rate_limiter);
        Self { router, config }
    }

    /// Build the Axum router with all middleware stages.
    fn build_router(config: Arc<AppConfig>, rate_limiter: Arc<RateLimiterState>) -> Router {
        let security_headers = Arc::new(headers::response_headers(&config.security));

        // Request logging only in development, mirroring the morgan gate.
        let trace = config
            .server
            .is_development()
            .then(TraceLayer::new_for_http);

        // Later Router::layer calls wrap earlier ones, so stages are added
        // innermost first: request-path order is the reverse of this listing.
        let mut api = Router::new()
            .route("/", get(handlers::welcome).post(handlers::echo))
            // Unmatched-route handler and centralized error formatter exist
            // in handlers.rs / response.rs but stay unregistered for now.
            // .fallback(handlers::not_found)
            .layer(CompressionLayer::new())
            .layer(middleware::from_fn_with_state(config.clone(), hpp_middleware))
            .layer(middleware::from_fn_with_state(
                config.clone(),
                sanitize_middleware,
            ))
            .layer(middleware::from_fn(cookie_middleware))
            .layer(RequestBodyLimitLayer::new(config.limits.body_limit_bytes))
            .layer(middleware::from_fn_with_state(
                rate_limiter,
                rate_limit_middleware,
            ));

        // The logging stage slots between the header stage and the limiter.
        if let Some(trace) = trace {
            api = api.layer(trace);
        }
        let api = api
            .layer(middleware::from_fn_with_state(
                security_headers,
                headers_middleware,
            ))
            .layer(CorsLayer::permissive());

        // Static assets resolve first; a matching file bypasses every later
        // stage, everything else funnels into the layered stack.
        let static_first = ServeDir::new(&config.server.static_dir)
            .call_fallback_on_method_not_allowed(true)
            .fallback(api);

        Router::new().fallback_service(static_first)
    }

    /// A clone of the router, for driving requests through the full
    /// pipeline without a network listener.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests.
    pub async fn run_until<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            environment = %self.config.server.environment,
            "App listening"
        );

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
