//! OS signal handling.
//!
//! # Responsibilities
//! - Register signal handlers (SIGTERM, Ctrl+C)
//! - Translate signals to a graceful-shutdown request
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Signals always take the clean shutdown path, never the fault paths

/// Resolve when the process receives a termination request.
pub async fn wait_for_termination() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm =
            signal(SignalKind::terminate()).expect("Failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => tracing::info!("Interrupt signal (Ctrl+C) received"),
            _ = sigterm.recv() => tracing::info!("Termination signal (SIGTERM) received"),
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await;
        tracing::info!("Interrupt signal (Ctrl+C) received");
    }
}
