//! Resolve one alert id to its full record
//!
//! Usage: alert-lookup <alert_id>
//!
//! Searches the snapshot written by the watcher, then the live alert log,
//! and prints the record as JSON. Paths come from `SEVWATCH_ALERTS_FILE` and
//! `SEVWATCH_SNAPSHOT_DIR` with the watcher's defaults.

use std::process::ExitCode;

use sevwatch::config::SourcePaths;
use sevwatch::source::snapshot::find_alert;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sevwatch=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let Some(raw_id) = std::env::args().nth(1) else {
        eprintln!("Usage: alert-lookup <alert_id>");
        return ExitCode::FAILURE;
    };

    let Ok(alert_id) = raw_id.trim().parse::<i64>() else {
        tracing::error!(alert_id = %raw_id, "Alert id must be an integer");
        return ExitCode::FAILURE;
    };

    let paths = SourcePaths::from_env();

    match find_alert(&paths.snapshot_path(), &paths.alerts_file, alert_id) {
        Ok(Some(alert)) => match serde_json::to_string_pretty(&alert.record) {
            Ok(json) => {
                println!("{}", json);
                ExitCode::SUCCESS
            }
            Err(e) => {
                tracing::error!(alert_id, error = %e, "Failed to encode alert");
                ExitCode::FAILURE
            }
        },
        Ok(None) => {
            tracing::error!(alert_id, "Alert not found");
            ExitCode::FAILURE
        }
        Err(e) => {
            tracing::error!(alert_id, error = %e, "Alert lookup failed");
            ExitCode::FAILURE
        }
    }
}
