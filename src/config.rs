//! Watcher configuration
//!
//! Built once at startup and shared by reference with every component.
//!
//! Environment variables:
//! - `SEVWATCH_ALERTS_FILE`: JSON-lines alert log (default: ./alerts.json)
//! - `SEVWATCH_CHECKPOINT_FILE`: watermark file (default: ./last_processed_alert_id.txt)
//! - `SEVWATCH_PENDING_DIR`: marker directory (default: ./ai_pending)
//! - `SEVWATCH_SNAPSHOT_DIR`: snapshot directory (default: ./ai_inputs)
//! - `SEVWATCH_WEBHOOK_URL`: job trigger endpoint (required)
//! - `SEVWATCH_POLL_INTERVAL_MS`: sleep after a clean cycle (default: 2000)
//! - `SEVWATCH_ERROR_BACKOFF_MS`: sleep after a failed cycle (default: 5000)
//! - `SEVWATCH_DISPATCH_DELAY_MS`: gap between notifications (default: 200)
//! - `SEVWATCH_DISPATCH_TIMEOUT_SECS`: HTTP request timeout (default: 10)
//! - `SEVWATCH_DISPATCH_INSECURE`: accept invalid TLS certificates (default: false)
//! - `SEVWATCH_SEVERITY_THRESHOLD`: minimum `rule.level` (default: 10)
//! - `SEVWATCH_MARKER_RETENTION`: keep at most N markers (default: unbounded)
//! - `SEVWATCH_STARTUP_MISSING_LIMIT`: cycles to wait for a missing source
//!   before giving up (default: 30)

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Marker file name prefix
pub const MARKER_PREFIX: &str = "alert_";
/// Marker file extension
pub const MARKER_EXTENSION: &str = "txt";
/// Snapshot file name inside the snapshot directory
pub const SNAPSHOT_FILE_NAME: &str = "alerts.json";

pub const DEFAULT_ALERTS_FILE: &str = "./alerts.json";
pub const DEFAULT_CHECKPOINT_FILE: &str = "./last_processed_alert_id.txt";
pub const DEFAULT_PENDING_DIR: &str = "./ai_pending";
pub const DEFAULT_SNAPSHOT_DIR: &str = "./ai_inputs";

/// Where alerts can be read from: the live log and the snapshot copy.
///
/// Needs no webhook, so tools that only resolve alert ids can use it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePaths {
    pub alerts_file: PathBuf,
    pub snapshot_dir: PathBuf,
}

impl Default for SourcePaths {
    fn default() -> Self {
        Self {
            alerts_file: PathBuf::from(DEFAULT_ALERTS_FILE),
            snapshot_dir: PathBuf::from(DEFAULT_SNAPSHOT_DIR),
        }
    }
}

impl SourcePaths {
    /// Read `SEVWATCH_ALERTS_FILE` and `SEVWATCH_SNAPSHOT_DIR`
    pub fn from_env() -> Self {
        Self::from_lookup(&|key: &str| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut paths = Self::default();
        if let Some(path) = lookup("SEVWATCH_ALERTS_FILE") {
            paths.alerts_file = PathBuf::from(path);
        }
        if let Some(path) = lookup("SEVWATCH_SNAPSHOT_DIR") {
            paths.snapshot_dir = PathBuf::from(path);
        }
        paths
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.snapshot_dir.join(SNAPSHOT_FILE_NAME)
    }
}

/// Static watcher configuration
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Append-only alert log, one JSON object per line
    pub alerts_file: PathBuf,
    /// Watermark file
    pub checkpoint_file: PathBuf,
    /// Directory holding one marker per selected alert
    pub pending_dir: PathBuf,
    /// Directory receiving the per-cycle copy of the alert log
    pub snapshot_dir: PathBuf,
    /// Job trigger URL
    pub webhook_url: String,
    /// Sleep after a cycle that completed
    pub poll_interval: Duration,
    /// Sleep after a cycle that failed
    pub error_backoff: Duration,
    /// Delay between consecutive notifications in one cycle
    pub dispatch_delay: Duration,
    /// Per-request timeout for notifications
    pub dispatch_timeout: Duration,
    /// Skip TLS certificate verification for the webhook
    pub dispatch_insecure: bool,
    /// Minimum `rule.level` for an alert to qualify
    pub severity_threshold: i64,
    /// Upper bound on markers kept during one process lifetime
    pub marker_retention: Option<usize>,
    /// Consecutive cycles a never-seen source may be missing before the watcher stops
    pub startup_missing_limit: u32,
}

impl WatcherConfig {
    /// Create a config with default paths and timings for the given webhook
    pub fn new(webhook_url: impl Into<String>) -> Self {
        let paths = SourcePaths::default();
        Self {
            alerts_file: paths.alerts_file,
            checkpoint_file: PathBuf::from(DEFAULT_CHECKPOINT_FILE),
            pending_dir: PathBuf::from(DEFAULT_PENDING_DIR),
            snapshot_dir: paths.snapshot_dir,
            webhook_url: webhook_url.into(),
            poll_interval: Duration::from_secs(2),
            error_backoff: Duration::from_secs(5),
            dispatch_delay: Duration::from_millis(200),
            dispatch_timeout: Duration::from_secs(10),
            dispatch_insecure: false,
            severity_threshold: 10,
            marker_retention: None,
            startup_missing_limit: 30,
        }
    }

    /// Create config from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let webhook_url = lookup("SEVWATCH_WEBHOOK_URL")
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::Missing("SEVWATCH_WEBHOOK_URL"))?;

        let mut config = Self::new(webhook_url.trim());

        let paths = SourcePaths::from_lookup(&lookup);
        config.alerts_file = paths.alerts_file;
        config.snapshot_dir = paths.snapshot_dir;
        if let Some(path) = lookup("SEVWATCH_CHECKPOINT_FILE") {
            config.checkpoint_file = PathBuf::from(path);
        }
        if let Some(path) = lookup("SEVWATCH_PENDING_DIR") {
            config.pending_dir = PathBuf::from(path);
        }

        if let Some(ms) = parse_var::<u64, _>(&lookup, "SEVWATCH_POLL_INTERVAL_MS")? {
            config.poll_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, "SEVWATCH_ERROR_BACKOFF_MS")? {
            config.error_backoff = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, "SEVWATCH_DISPATCH_DELAY_MS")? {
            config.dispatch_delay = Duration::from_millis(ms);
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, "SEVWATCH_DISPATCH_TIMEOUT_SECS")? {
            config.dispatch_timeout = Duration::from_secs(secs);
        }
        if let Some(insecure) = parse_var::<bool, _>(&lookup, "SEVWATCH_DISPATCH_INSECURE")? {
            config.dispatch_insecure = insecure;
        }
        if let Some(level) = parse_var::<i64, _>(&lookup, "SEVWATCH_SEVERITY_THRESHOLD")? {
            config.severity_threshold = level;
        }
        config.marker_retention = parse_var::<usize, _>(&lookup, "SEVWATCH_MARKER_RETENTION")?;
        if let Some(limit) = parse_var::<u32, _>(&lookup, "SEVWATCH_STARTUP_MISSING_LIMIT")? {
            config.startup_missing_limit = limit;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check invariants that would leave the watcher in a broken state
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.webhook_url.starts_with("http://") || self.webhook_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                key: "SEVWATCH_WEBHOOK_URL",
                value: self.webhook_url.clone(),
            });
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::Invalid {
                key: "SEVWATCH_POLL_INTERVAL_MS",
                value: "0".to_string(),
            });
        }
        if self.dispatch_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                key: "SEVWATCH_DISPATCH_TIMEOUT_SECS",
                value: "0".to_string(),
            });
        }
        if self.marker_retention == Some(0) {
            return Err(ConfigError::Invalid {
                key: "SEVWATCH_MARKER_RETENTION",
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    /// Path of the snapshot copy read by the enrichment worker
    pub fn snapshot_path(&self) -> PathBuf {
        self.snapshot_dir.join(SNAPSHOT_FILE_NAME)
    }

    /// Path of the advisory lock guarding the checkpoint
    pub fn lock_path(&self) -> PathBuf {
        let mut name = self.checkpoint_file.clone().into_os_string();
        name.push(".lock");
        PathBuf::from(name)
    }

    pub fn with_alerts_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.alerts_file = path.into();
        self
    }

    pub fn with_checkpoint_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.checkpoint_file = path.into();
        self
    }

    pub fn with_pending_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.pending_dir = path.into();
        self
    }

    pub fn with_snapshot_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_dir = path.into();
        self
    }

    pub fn with_severity_threshold(mut self, level: i64) -> Self {
        self.severity_threshold = level;
        self
    }

    pub fn with_dispatch_delay(mut self, delay: Duration) -> Self {
        self.dispatch_delay = delay;
        self
    }

    pub fn with_marker_retention(mut self, keep: usize) -> Self {
        self.marker_retention = Some(keep);
        self
    }

    pub fn with_startup_missing_limit(mut self, limit: u32) -> Self {
        self.startup_missing_limit = limit;
        self
    }
}

fn parse_var<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required setting {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}
