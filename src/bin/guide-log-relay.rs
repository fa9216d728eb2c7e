use anyhow::{Context, Result};
use clap::Parser;
use guide_log::config::{self, RelayCli};
use guide_log::{relay, Console, HttpTransport, LogBatcher};
use log::info;
use std::sync::Arc;
use std::time::Duration;

/// How long exit waits for batches still being sent.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    guide_log::init_logging().context("Failed to initialize logger")?;

    let cli = RelayCli::parse();
    let config = config::load_relay_config(&cli).context("Failed to load configuration")?;
    info!(
        "Logger config: endpoint={}, enabled={}, max_queue_size={}, flush_delay={:?}",
        config.endpoint, config.enabled, config.max_queue_size, config.flush_delay
    );

    let transport = HttpTransport::new(config.transport());
    let batcher = LogBatcher::new(config.batcher(), Arc::new(transport));
    let console = Console::new(batcher.clone());

    let lines = relay::stdin_lines();

    tokio::select! {
        count = relay::run(lines, &console, &config.filter) => {
            info!("Input finished, {} lines forwarded", count);
        }
        signal = relay::shutdown_signal() => {
            info!("Received {}, flushing remaining logs", signal);
        }
    }

    batcher.shutdown(SHUTDOWN_GRACE).await;
    Ok(())
}
