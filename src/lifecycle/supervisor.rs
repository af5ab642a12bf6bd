//! Process supervision.
//!
//! # Responsibilities
//! - Install the process-wide panic hook (uncaught synchronous fault)
//! - Collect fatal faults reported by background tasks
//! - Map every fault path onto one shutdown routine with an explicit mode
//! - Drive the HTTP server and drain it before a non-clean exit
//!
//! # Design Decisions
//! - Panic means untrustworthy state: log, then exit 1 with no drain
//! - A failed background task is less suspect, so in-flight work drains
//!   before the process exits 1
//! - Signals drain and exit 0; all handlers fire once, no retries

use tokio::net::TcpListener;
use tokio::sync::mpsc;

use crate::http::HttpServer;
use crate::lifecycle::shutdown::{Shutdown, ShutdownMode};
use crate::lifecycle::signals;

/// A fatal fault reported by a background task.
#[derive(Debug)]
pub struct FatalFault {
    pub source: String,
    pub message: String,
}

/// Cloneable handle background tasks use to report fatal faults.
#[derive(Clone)]
pub struct FaultHandle {
    tx: mpsc::UnboundedSender<FatalFault>,
}

impl FaultHandle {
    /// Report a fault the task cannot recover from. The supervisor drains
    /// the server and exits non-zero.
    pub fn report(&self, source: impl Into<String>, message: impl Into<String>) {
        let _ = self.tx.send(FatalFault {
            source: source.into(),
            message: message.into(),
        });
    }
}

/// Owns the server lifecycle: start, supervise, shut down.
pub struct Supervisor {
    shutdown: Shutdown,
    fault_tx: mpsc::UnboundedSender<FatalFault>,
    fault_rx: mpsc::UnboundedReceiver<FatalFault>,
}

impl Supervisor {
    pub fn new() -> Self {
        let (fault_tx, fault_rx) = mpsc::unbounded_channel();
        Self {
            shutdown: Shutdown::new(),
            fault_tx,
            fault_rx,
        }
    }

    /// Install the panic hook for uncaught synchronous faults.
    ///
    /// Process state after a panic is untrustworthy, so this path never
    /// drains: log the category and message, then exit immediately.
    pub fn install_panic_hook() {
        std::panic::set_hook(Box::new(|info| {
            let message = info
                .payload()
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| info.payload().downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            let location = info
                .location()
                .map(|l| l.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            tracing::error!(
                category = "uncaught_exception",
                message = %message,
                location = %location,
                "Uncaught exception: shutting down application"
            );
            std::process::exit(ShutdownMode::Immediate.exit_code());
        }));
    }

    /// Handle for background tasks to report fatal faults through.
    pub fn fault_handle(&self) -> FaultHandle {
        FaultHandle {
            tx: self.fault_tx.clone(),
        }
    }

    /// The shutdown coordinator, for wiring into other components.
    pub fn shutdown(&self) -> &Shutdown {
        &self.shutdown
    }

    /// Run the server under supervision until a signal or fault stops it.
    ///
    /// Returns the exit code the process should terminate with: 0 for a
    /// signal-triggered graceful shutdown, 1 when a reported fault forced
    /// the drain.
    pub async fn run(
        self,
        server: HttpServer,
        listener: TcpListener,
    ) -> std::io::Result<i32> {
        let Self {
            shutdown,
            fault_tx,
            mut fault_rx,
        } = self;
        // Only outstanding FaultHandles keep the fault channel open.
        drop(fault_tx);

        let watcher = shutdown.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = signals::wait_for_termination() => {
                    tracing::info!("Shutting down gracefully...");
                    watcher.trigger(ShutdownMode::Graceful);
                }
                Some(fault) = fault_rx.recv() => {
                    tracing::error!(
                        category = "unhandled_rejection",
                        source = %fault.source,
                        message = %fault.message,
                        "Unhandled rejection: shutting down application"
                    );
                    watcher.trigger(ShutdownMode::Drain);
                }
            }
        });

        let drain = shutdown.clone();
        server
            .run_until(listener, async move { drain.wait().await })
            .await?;

        // In-flight requests have drained by the time serve returns.
        let mode = shutdown.requested().unwrap_or(ShutdownMode::Graceful);
        if mode == ShutdownMode::Graceful {
            tracing::info!("Process terminated.");
        }
        Ok(mode.exit_code())
    }
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    async fn bound_listener() -> TcpListener {
        TcpListener::bind("127.0.0.1:0").await.unwrap()
    }

    #[tokio::test]
    async fn reported_fault_drains_and_exits_nonzero() {
        let supervisor = Supervisor::new();
        let faults = supervisor.fault_handle();
        let server = HttpServer::new(AppConfig::default());
        let listener = bound_listener().await;

        faults.report("worker", "connection pool collapsed");
        let code = supervisor.run(server, listener).await.unwrap();
        assert_eq!(code, 1);
    }

    #[tokio::test]
    async fn triggered_graceful_shutdown_exits_clean() {
        let supervisor = Supervisor::new();
        let shutdown = supervisor.shutdown().clone();
        let server = HttpServer::new(AppConfig::default());
        let listener = bound_listener().await;

        shutdown.trigger(ShutdownMode::Graceful);
        let code = supervisor.run(server, listener).await.unwrap();
        assert_eq!(code, 0);
    }

    #[tokio::test]
    async fn request_dispatched_before_fault_still_completes() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let supervisor = Supervisor::new();
        let faults = supervisor.fault_handle();
        let server = HttpServer::new(AppConfig::default());
        let listener = bound_listener().await;
        let addr = listener.local_addr().unwrap();

        let run = tokio::spawn(supervisor.run(server, listener));

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        // Let the connection be dispatched before the fault lands.
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        faults.report("worker", "fatal");

        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).await.unwrap();
        let response = String::from_utf8_lossy(&buf);
        assert!(response.contains("200 OK"));

        let code = run.await.unwrap().unwrap();
        assert_eq!(code, 1);
    }
}
