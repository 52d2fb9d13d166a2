//! Watcher state machine

use std::future::Future;
use std::sync::Arc;

use parking_lot::RwLock;

use super::filter;
use super::stats::WatcherStats;
use super::WatchError;
use crate::config::WatcherConfig;
use crate::dispatch::DispatchClient;
use crate::source::{AlertSource, SnapshotWriter};
use crate::state::{CheckpointStore, MarkerQueue};

/// Summary of one completed cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub scanned: usize,
    pub selected: usize,
    pub dispatched: usize,
    pub dispatch_failures: usize,
    pub watermark_before: i64,
    pub watermark_after: i64,
}

/// How a cycle ended, and therefore what the loop does next
#[derive(Debug)]
pub enum CycleResult {
    /// Sleep the poll interval
    Completed(CycleReport),
    /// Sleep the error backoff and retry
    Recoverable(WatchError),
    /// Stop the watcher
    Fatal(WatchError),
}

/// Severity watcher
pub struct Watcher {
    config: WatcherConfig,
    checkpoint: CheckpointStore,
    source: AlertSource,
    snapshot: SnapshotWriter,
    markers: MarkerQueue,
    dispatcher: DispatchClient,
    stats: Arc<RwLock<WatcherStats>>,
    /// Whether the source has been opened at least once
    source_seen: bool,
    /// Consecutive cycles the source has been missing before it was ever seen
    missing_streak: u32,
}

impl Watcher {
    /// Prepare directories and purge markers from earlier runs
    pub fn new(config: WatcherConfig) -> Result<Self, WatchError> {
        let checkpoint = CheckpointStore::new(&config.checkpoint_file);
        let source = AlertSource::new(&config.alerts_file);
        let snapshot = SnapshotWriter::new(&config.alerts_file, config.snapshot_path());
        let markers = MarkerQueue::new(&config.pending_dir);
        let dispatcher = DispatchClient::new(&config)?;

        checkpoint.ensure_parent()?;
        snapshot.ensure_dir()?;
        let removed = markers.clear_all()?;
        if removed > 0 {
            tracing::info!(
                dir = %markers.dir().display(),
                removed,
                "Cleared markers from previous run"
            );
        }

        let stats = WatcherStats {
            watermark: checkpoint.load(),
            ..Default::default()
        };

        Ok(Self {
            config,
            checkpoint,
            source,
            snapshot,
            markers,
            dispatcher,
            stats: Arc::new(RwLock::new(stats)),
            source_seen: false,
            missing_streak: 0,
        })
    }

    pub fn config(&self) -> &WatcherConfig {
        &self.config
    }

    /// Current statistics
    pub fn stats(&self) -> WatcherStats {
        self.stats.read().clone()
    }

    /// Shared handle on the statistics, readable while the loop runs
    pub fn stats_handle(&self) -> Arc<RwLock<WatcherStats>> {
        Arc::clone(&self.stats)
    }

    /// Run cycles until `shutdown` resolves or a fatal error occurs.
    ///
    /// Shutdown is observed mid-cycle as well as during sleeps. Dropping a
    /// cycle before its checkpoint write only means its alerts are selected
    /// again on the next start.
    pub async fn run<F>(mut self, shutdown: F) -> Result<WatcherStats, WatchError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        tracing::info!(
            source = %self.config.alerts_file.display(),
            interval = ?self.config.poll_interval,
            threshold = self.config.severity_threshold,
            "Severity watcher started"
        );

        loop {
            let result = tokio::select! {
                result = self.run_cycle() => result,
                _ = &mut shutdown => break,
            };

            let pause = match result {
                CycleResult::Completed(_) => self.config.poll_interval,
                CycleResult::Recoverable(e) => {
                    tracing::error!(error = %e, backoff = ?self.config.error_backoff, "Watch cycle failed");
                    self.config.error_backoff
                }
                CycleResult::Fatal(e) => {
                    tracing::error!(error = %e, "Watcher stopping on unrecoverable error");
                    return Err(e);
                }
            };

            tokio::select! {
                _ = tokio::time::sleep(pause) => {}
                _ = &mut shutdown => break,
            }
        }

        tracing::info!("Severity watcher shutting down");
        Ok(self.stats())
    }

    /// Run one cycle and classify its outcome
    pub async fn run_cycle(&mut self) -> CycleResult {
        match self.process().await {
            Ok(report) => {
                let mut stats = self.stats.write();
                stats.cycles_completed += 1;
                stats.watermark = report.watermark_after;
                stats.last_cycle_at = Some(chrono::Utc::now().timestamp_millis());
                stats.last_error = None;
                CycleResult::Completed(report)
            }
            Err(e) => {
                {
                    let mut stats = self.stats.write();
                    stats.cycles_failed += 1;
                    stats.last_cycle_at = Some(chrono::Utc::now().timestamp_millis());
                    stats.last_error = Some(e.to_string());
                }

                if self.is_fatal(&e) {
                    CycleResult::Fatal(e)
                } else {
                    CycleResult::Recoverable(e)
                }
            }
        }
    }

    /// A source that has never existed stops the watcher once the configured
    /// number of attempts is used up; everything else is retried.
    fn is_fatal(&mut self, error: &WatchError) -> bool {
        let missing = matches!(error, WatchError::Source(e) if e.is_missing());
        if !missing || self.source_seen {
            return false;
        }

        self.missing_streak += 1;
        self.config.startup_missing_limit > 0
            && self.missing_streak >= self.config.startup_missing_limit
    }

    async fn process(&mut self) -> Result<CycleReport, WatchError> {
        let watermark = self.checkpoint.load();

        let alerts = self.source.open()?;
        self.source_seen = true;
        self.missing_streak = 0;

        match self.snapshot.refresh() {
            Ok(bytes) => {
                tracing::debug!(path = %self.snapshot.target().display(), bytes, "Snapshot refreshed");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Snapshot refresh failed, continuing");
            }
        }

        let selection = filter::select(alerts, watermark, self.config.severity_threshold)?;

        let mut report = CycleReport {
            scanned: selection.scanned,
            selected: selection.alerts.len(),
            dispatched: 0,
            dispatch_failures: 0,
            watermark_before: watermark,
            watermark_after: watermark,
        };

        if selection.alerts.is_empty() {
            return Ok(report);
        }

        tracing::info!(count = report.selected, watermark, "Found new alerts");

        for (idx, alert) in selection.alerts.iter().enumerate() {
            if idx > 0 && !self.config.dispatch_delay.is_zero() {
                tokio::time::sleep(self.config.dispatch_delay).await;
            }

            let path = self.markers.create(alert.id)?;
            self.stats.write().alerts_queued += 1;
            tracing::info!(alert_id = alert.id, level = alert.level, path = %path.display(), "Queued alert");

            match self.dispatcher.notify(alert.id).await {
                Ok(_) => {
                    report.dispatched += 1;
                    self.stats.write().notifications_sent += 1;
                }
                Err(e) => {
                    report.dispatch_failures += 1;
                    self.stats.write().notification_failures += 1;
                    tracing::error!(alert_id = alert.id, error = %e, "Notification failed");
                }
            }
        }

        let next = filter::next_watermark(watermark, &selection.alerts);
        self.checkpoint.save(next)?;
        report.watermark_after = next;
        tracing::info!(
            from = watermark,
            to = next,
            dispatched = report.dispatched,
            failed = report.dispatch_failures,
            "Watermark advanced"
        );

        if let Some(keep) = self.config.marker_retention {
            match self.markers.prune(keep) {
                Ok(0) => {}
                Ok(pruned) => tracing::debug!(pruned, keep, "Pruned markers"),
                Err(e) => tracing::warn!(error = %e, "Marker pruning failed"),
            }
        }

        Ok(report)
    }
}
