//! HTTP pipeline subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, ordered middleware stack)
//!     → cookies.rs (Cookie header → request extension)
//!     → handlers.rs (welcome / echo routes)
//!     → response.rs (one envelope shape for every JSON reply)
//! ```

pub mod cookies;
pub mod handlers;
pub mod response;
pub mod server;

pub use cookies::Cookies;
pub use response::ApiResponse;
pub use server::HttpServer;
