//! Alert source
//!
//! The source is an append-only JSON-lines file. Every cycle re-reads it from
//! the first byte; which alerts are new is decided by the watermark, never by
//! a read offset.

pub mod alert;
pub mod reader;
pub mod snapshot;

pub use alert::{Alert, FieldError};
pub use reader::{AlertLines, AlertSource};
pub use snapshot::SnapshotWriter;

use std::path::PathBuf;

/// Alert source errors
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Alert source not found: {}", .path.display())]
    Missing { path: PathBuf },

    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON at {}:{line}: {source}", .path.display())]
    Json {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Malformed alert at {}:{line}: {source}", .path.display())]
    Field {
        path: PathBuf,
        line: usize,
        #[source]
        source: FieldError,
    },
}

impl SourceError {
    /// Whether the error means the source file does not exist
    pub fn is_missing(&self) -> bool {
        matches!(self, SourceError::Missing { .. })
    }
}
