//! Sevwatch: severity watcher for an append-only security alert log
//!
//! Polls a JSON-lines alert file, selects alerts above a severity threshold
//! that are newer than a persisted watermark, and fires a webhook per alert.
//!
//! # Guarantees
//!
//! - **At-least-once**: the watermark is written only after every selected
//!   alert has been queued, so a crash mid-cycle re-selects those alerts
//! - **Best-effort notifications**: a failed webhook call is logged and never
//!   holds the watermark back
//! - **Single instance**: one watcher per checkpoint path, guarded by an
//!   advisory lock
//!
//! # Example
//!
//! ```no_run
//! use sevwatch::{Watcher, WatcherConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = WatcherConfig::new("http://localhost:4440/api/52/webhook/token")
//!     .with_alerts_file("/var/ossec/alerts.json")
//!     .with_severity_threshold(10);
//!
//! let watcher = Watcher::new(config)?;
//! let stats = watcher.run(async { let _ = tokio::signal::ctrl_c().await; }).await?;
//! println!("Dispatched {} alerts", stats.notifications_sent);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dispatch;
pub mod source;
pub mod state;
pub mod watcher;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use config::{ConfigError, WatcherConfig};
pub use source::{Alert, AlertSource, SourceError};
pub use watcher::{CycleReport, CycleResult, WatchError, Watcher, WatcherStats};
