//! Poll loop tying the components together
//!
//! Each cycle loads the watermark, re-reads the alert log, refreshes the
//! snapshot, selects qualifying alerts, writes a marker and fires a
//! notification for each, then advances the watermark. The watermark only
//! moves once every selected alert has been queued, so a crash mid-cycle
//! means the same alerts are selected again after restart.

pub mod cycle;
pub mod filter;
pub mod stats;

pub use cycle::{CycleReport, CycleResult, Watcher};
pub use filter::{is_qualifying, next_watermark, select, Selection};
pub use stats::WatcherStats;

use crate::config::ConfigError;
use crate::dispatch::DispatchError;
use crate::source::SourceError;
use crate::state::StateError;

/// Watcher errors
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}
