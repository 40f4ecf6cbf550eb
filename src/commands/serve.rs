use anyhow::{Context, Result};
use std::net::SocketAddr;

use vesseltrack::config::Config;
use vesseltrack::metrics;
use vesseltrack::server::VesselServer;

pub async fn serve(mut config: Config, bind: Option<SocketAddr>) -> Result<()> {
    if let Some(bind) = bind {
        config.server.bind_address = bind;
    }

    if let Err(e) = metrics::init_metrics() {
        tracing::warn!(error = %e, "Metrics initialization failed; continuing without metrics");
    }

    let server = VesselServer::new(&config).context("Failed to initialize server")?;

    println!("{}", server.info().display());
    println!("  Registry: {}", config.database.sqlite_path.display());
    println!("  Telemetry: {}", config.telemetry.base_url);
    println!();

    server
        .start_with_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}
