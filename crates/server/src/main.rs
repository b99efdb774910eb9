use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use snowglass_core::config::load_dotenv;
use snowglass_core::Config;
use snowglass_server::{build_router, AppState};
use snowglass_warehouse::{WarehouseClient, WarehouseConfig};

/// Read-only HTTP API over a Snowflake warehouse.
#[derive(Parser, Debug)]
#[command(name = "snowglass", version, about = "Read-only HTTP API over a Snowflake warehouse")]
struct Cli {
    /// Bind host (overrides HOST)
    #[arg(long)]
    host: Option<String>,

    /// Bind port (overrides PORT)
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env().context("invalid server configuration")?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let warehouse = match WarehouseConfig::from_env_profiled(&config.profile) {
        Ok(w) => w,
        Err(e) => {
            error!(error = %e, "Warehouse configuration is incomplete");
            return Err(e).context("invalid warehouse configuration");
        }
    };

    config.log_summary();
    warehouse.log_summary();

    let client = Arc::new(WarehouseClient::new(warehouse));
    let state = Arc::new(AppState::new(Arc::clone(&client)));
    let app = build_router(state, &config.server.cors_origin);

    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down");
    if let Err(e) = client.close().await {
        warn!(error = %e, "Warehouse session was not closed cleanly");
    }
    Ok(())
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for ctrl_c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {},
                    _ = sigterm.recv() => {},
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to register SIGTERM handler");
                ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await;
    }
}
