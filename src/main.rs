//! Sevwatch
//!
//! Run with: cargo run
//!
//! Configuration is read from `SEVWATCH_*` environment variables, see
//! [`sevwatch::config`]. `SEVWATCH_WEBHOOK_URL` is required.
//! `RUST_LOG` sets the log level (default: sevwatch=info).
//!
//! Only one watcher may run against a given checkpoint file.

use sevwatch::state::InstanceLock;
use sevwatch::{Watcher, WatcherConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sevwatch=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = WatcherConfig::from_env()?;

    tracing::info!("Sevwatch configuration:");
    tracing::info!("  Alerts file: {}", config.alerts_file.display());
    tracing::info!("  Checkpoint: {}", config.checkpoint_file.display());
    tracing::info!("  Pending dir: {}", config.pending_dir.display());
    tracing::info!("  Snapshot: {}", config.snapshot_path().display());
    tracing::info!("  Webhook: {}", config.webhook_url);
    tracing::info!("  Severity threshold: {}", config.severity_threshold);
    tracing::info!(
        "  Poll interval: {:?} (backoff {:?})",
        config.poll_interval,
        config.error_backoff
    );
    tracing::info!("  Dispatch delay: {:?}", config.dispatch_delay);
    if let Some(keep) = config.marker_retention {
        tracing::info!("  Marker retention: {}", keep);
    }
    if config.dispatch_insecure {
        tracing::warn!("  TLS verification DISABLED for webhook");
    }

    println!(
        r#"
  ___  _____   ____      ____ _ _____ ___ _   _
 / __|| __\ \ / /\ \    / / _` |_   _/ __| |_| |
 \__ \| _| \ V /  \ \/\/ / (_| | | || (__|  _  |
 |___/|___| \_/    \_/\_/ \__,_| |_| \___|_| |_|

 Severity Watcher
 Version: {}
"#,
        env!("CARGO_PKG_VERSION")
    );

    let mut lock = InstanceLock::open(config.lock_path())?;
    let _guard = lock.acquire()?;
    tracing::info!(path = %config.lock_path().display(), "Acquired instance lock");

    let watcher = Watcher::new(config)?;
    let stats = watcher.run(shutdown_signal()).await?;

    match serde_json::to_string(&stats) {
        Ok(json) => tracing::info!("Final statistics: {}", json),
        Err(e) => tracing::warn!(error = %e, "Failed to encode final statistics"),
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
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
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("Shutdown signal received");
}
