//! # Pi-hole Shipper
//!
//! Long-running process that ships new Pi-hole DNS queries to Elasticsearch
//! every `sleep_interval` seconds. Configuration comes from
//! `/etc/pihole-elasticsearch/config.json` (or `$PIHOLE_SHIPPER_CONFIG`);
//! there are no command-line flags.

use anyhow::Context;
use tracing::info;

use pihole_shipper::config::ConfigManager;
use pihole_shipper::lock::InstanceLock;
use pihole_shipper::logging::{init_structured_logging, LoggingConfig};
use pihole_shipper::pipeline::build_driver;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let manager = ConfigManager::load();
    let config = manager.config().clone();

    let _logging = init_structured_logging(&LoggingConfig::from(&config));
    manager.log_summary();

    let _lock = config
        .lock_path
        .as_ref()
        .map(InstanceLock::acquire)
        .transpose()
        .context("acquiring single-instance lock")?;

    let mut driver = build_driver(&config).context("building pipeline")?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        sleep_interval_secs = config.sleep_interval,
        "Pi-hole shipper started"
    );

    driver.run_until(shutdown_signal()).await;

    info!(passes = driver.passes_completed(), "Pi-hole shipper stopped");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
