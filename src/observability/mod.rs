//! Observability subsystem.
//!
//! # Design Decisions
//! - Structured logging via tracing; subscribers configured once in main
//! - Request-level logging is a pipeline stage (TraceLayer), gated on the
//!   development environment

pub mod logging;
