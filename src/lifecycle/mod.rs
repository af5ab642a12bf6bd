//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Init logging → install panic hook → load config → bind → supervise
//!
//! Shutdown (shutdown.rs):
//!     Mode requested → stop accepting → drain in-flight → exit by mode
//!
//! Faults (supervisor.rs):
//!     Panic → log, exit 1 immediately (no drain)
//!     Background task fault → log, drain, exit 1
//!     SIGTERM / Ctrl+C (signals.rs) → log, drain, exit 0
//! ```
//!
//! # Design Decisions
//! - One shutdown routine parameterized by ShutdownMode, not three paths
//! - Every handler fires once per process; the first request wins

pub mod shutdown;
pub mod signals;
pub mod supervisor;

pub use shutdown::{Shutdown, ShutdownMode};
pub use supervisor::{FaultHandle, Supervisor};
