//! Confer API server binary.
//!
//! Startup order matters: logging first so every later step can report,
//! then the panic hook, then configuration, and the listener last so
//! traffic only arrives once the pipeline is ready.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use confer::config;
use confer::{HttpServer, Supervisor};

#[derive(Parser)]
#[command(name = "confer")]
#[command(about = "Confer API server", long_about = None)]
struct Cli {
    /// Path to the TOML config file. Missing file means built-in defaults.
    #[arg(short, long, default_value = "confer.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    confer::observability::logging::init();
    Supervisor::install_panic_hook();

    let cli = Cli::parse();
    let config = config::load_config(&cli.config)?;

    tracing::info!(
        port = config.server.port,
        environment = %config.server.environment,
        rate_limit = config.rate_limit.max_requests,
        body_limit_bytes = config.limits.body_limit_bytes,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(("0.0.0.0", config.server.port)).await?;
    let server = HttpServer::new(config);
    let supervisor = Supervisor::new();

    let exit_code = supervisor.run(server, listener).await?;
    if exit_code != 0 {
        std::process::exit(exit_code);
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
