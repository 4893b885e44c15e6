use anyhow::Result;
use axum::{routing::get, Router};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use tracing::{error, info};

use acme_warden::{config, observability, CertLifecycle};

#[derive(Parser)]
#[command(name = "acme-warden")]
#[command(about = "ACME certificate lifecycle daemon", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the daemon
    Run,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = config::load_config(&cli.config)?;
    let _guard = observability::logging::init_logging(&config.logging);

    info!("Starting acme-warden for {}", config.acme.domain);

    // Application routes; served on both the plaintext and TLS listeners.
    let app = Router::new().route("/", get(|| async { "OK" }));

    let mut lifecycle = CertLifecycle::start(&config, app).await?;

    // The plaintext listener owns the HTTP port; ACME HTTP-01 validation
    // requests arrive here.
    let http_addr: SocketAddr = config.http.listen_addr.parse()?;
    let http_app = lifecycle.router();
    tokio::spawn(async move {
        match tokio::net::TcpListener::bind(http_addr).await {
            Ok(listener) => {
                info!("HTTP listener on {}", http_addr);
                if let Err(e) = axum::serve(listener, http_app.into_make_service()).await {
                    error!("HTTP server error: {}", e);
                }
            }
            Err(e) => error!("Failed to bind {}: {}", http_addr, e),
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("Shutting down...");

    lifecycle.stop().await;
    lifecycle.shutdown_listener().await;

    Ok(())
}
