//! Durable watcher state
//!
//! The checkpoint file is the only dedup authority. Marker files exist for
//! operators and the enrichment worker, and the instance lock keeps a
//! second watcher off the same checkpoint.

pub mod checkpoint;
pub mod lock;
pub mod markers;

pub use checkpoint::CheckpointStore;
pub use lock::InstanceLock;
pub use markers::MarkerQueue;

use std::path::{Path, PathBuf};

/// State errors
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Another watcher holds {}", .0.display())]
    Locked(PathBuf),
}

impl StateError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        StateError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
