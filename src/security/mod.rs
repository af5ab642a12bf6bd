//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → headers.rs (CSP + companion headers on the response side)
//!     → rate_limit.rs (check per-client quota under /api)
//!     → sanitize.rs (strip operator keys, neutralize script payloads)
//!     → hpp.rs (collapse duplicated query parameters)
//!     → Pass to handlers
//! ```
//!
//! # Design Decisions
//! - Defense in depth: multiple layers of protection
//! - Header stage only augments responses; limiter and sanitizers may
//!   short-circuit
//! - No trust in client input

pub mod headers;
pub mod hpp;
pub mod rate_limit;
pub mod sanitize;

pub use rate_limit::RateLimiterState;
