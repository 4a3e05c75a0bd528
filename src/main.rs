//! api-relay
//!
//! Backend-for-frontend relay built with Tokio and Axum.
//!
//! ```text
//!     Browser                       api-relay                         Upstream
//!    ─────────  /api/v1/foo?x=1  ┌─────────────────────┐  + X-API-Key  ─────────
//!    ─────────────────────────▶  │ request id → relay  │ ────────────▶
//!                                │   (no cache, no     │
//!    ◀─────────────────────────  │    retry, no-store) │ ◀────────────
//!      status + raw body         └─────────────────────┘  redirects followed
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use api_relay::config::{load_config, validation::validate_config, ConfigError};
use api_relay::lifecycle::{wait_for_termination, Shutdown};
use api_relay::observability::{logging, metrics};
use api_relay::HttpServer;

#[derive(Parser)]
#[command(name = "api-relay", version)]
#[command(about = "Relay /api requests to a configured backend with a server-side API key", long_about = None)]
struct Cli {
    /// TOML configuration file. Environment variables override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address, overriding config file and RELAY_BIND.
    #[arg(short, long)]
    bind: Option<String>,

    /// Load and validate the configuration, then exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
        validate_config(&config).map_err(ConfigError::Validation)?;
    }

    if cli.check {
        println!("configuration OK");
        println!("  bind_address: {}", config.listener.bind_address);
        println!(
            "  upstream: {}",
            config.upstream.normalized_base_url().unwrap_or("<not configured>")
        );
        println!(
            "  credential: {}",
            if config.upstream.api_key.is_some() { config.upstream.api_key_header.as_str() } else { "<none>" }
        );
        return Ok(());
    }

    logging::init(&config.observability);

    tracing::info!("api-relay v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = config.upstream.normalized_base_url().unwrap_or("<not configured>"),
        credential_configured = config.upstream.api_key.is_some(),
        upstream_timeout_secs = config.upstream.timeout_secs,
        "Configuration loaded"
    );
    if config.upstream.normalized_base_url().is_none() {
        tracing::warn!("BACKEND_URL is not set; every relayed request will fail with 500");
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(config)?;

    let shutdown = Shutdown::new();
    let signal = shutdown.subscribe();
    tokio::spawn(async move {
        wait_for_termination().await;
        shutdown.trigger();
    });

    server.run(listener, signal).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
