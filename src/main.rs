use anyhow::{Context, Result};
use clap::Parser;
use guide_log::config::{self, ServerCli};
use guide_log::log_store::LogStore;
use guide_log::server;
use log::info;
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<()> {
    guide_log::init_logging().context("Failed to initialize logger")?;

    info!("Starting guide-log-server");

    // Parse command-line arguments
    let cli = ServerCli::parse();

    // Load configuration
    let config = config::load_server_config(&cli).context("Failed to load configuration")?;
    info!("Configuration loaded successfully");

    let store = Arc::new(LogStore::new(config.log_file.clone()));
    store
        .ensure_dir()
        .await
        .with_context(|| format!("Failed to create log directory for {:?}", store.path()))?;

    if let Some(ref dir) = config.static_dir {
        info!("Serving static files from {}", dir.display());
    }
    let app = server::router(Arc::clone(&store), config.static_dir.as_deref());

    let listener = TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("Failed to bind port {}", config.port))?;

    info!("Log server running on port {}", config.port);
    info!("Log file: {}", store.path().display());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Log server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
