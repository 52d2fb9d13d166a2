//! Process-lifetime counters

use serde::Serialize;

/// Watcher statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct WatcherStats {
    pub cycles_completed: u64,
    pub cycles_failed: u64,
    pub alerts_queued: u64,
    pub notifications_sent: u64,
    pub notification_failures: u64,
    /// Watermark after the last completed cycle
    pub watermark: i64,
    /// Last cycle end (unix millis)
    pub last_cycle_at: Option<i64>,
    pub last_error: Option<String>,
}
