//! Confer API server library.
//!
//! A small HTTP service: a fixed, ordered middleware pipeline (static
//! assets, CORS, security headers, rate limiting, size-limited body
//! parsing, cookies, input sanitization, parameter-pollution guard,
//! compression) in front of two JSON routes, supervised by a process
//! lifecycle that maps faults and signals onto explicit shutdown modes.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::AppConfig;
pub use http::HttpServer;
pub use lifecycle::{Shutdown, ShutdownMode, Supervisor};
