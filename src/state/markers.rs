//! Per-alert marker files
//!
//! A marker `alert_<id>.txt` containing `<id>` records that an alert was
//! selected for dispatch. Markers are written, never read, by the watcher.

use std::fs;
use std::path::{Path, PathBuf};

use super::StateError;
use crate::config::{MARKER_EXTENSION, MARKER_PREFIX};

/// Marker directory
#[derive(Debug, Clone)]
pub struct MarkerQueue {
    dir: PathBuf,
}

impl MarkerQueue {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the marker for an alert id
    pub fn marker_path(&self, id: i64) -> PathBuf {
        self.dir
            .join(format!("{}{}.{}", MARKER_PREFIX, id, MARKER_EXTENSION))
    }

    /// Remove every marker left by an earlier process.
    ///
    /// Creating the directory is required; a marker that cannot be deleted is
    /// logged and left behind.
    pub fn clear_all(&self) -> Result<usize, StateError> {
        fs::create_dir_all(&self.dir).map_err(|e| StateError::io(&self.dir, e))?;

        let mut removed = 0;
        for (_, path) in self.list()? {
            match fs::remove_file(&path) {
                Ok(()) => {
                    tracing::info!(path = %path.display(), "Deleted stale marker");
                    removed += 1;
                }
                Err(e) => {
                    tracing::error!(
                        path = %path.display(),
                        error = %e,
                        "Failed to delete stale marker"
                    );
                }
            }
        }

        Ok(removed)
    }

    /// Write the marker for an alert id, overwriting any existing one.
    ///
    /// The directory is recreated if it was removed while the watcher runs.
    pub fn create(&self, id: i64) -> Result<PathBuf, StateError> {
        fs::create_dir_all(&self.dir).map_err(|e| StateError::io(&self.dir, e))?;
        let path = self.marker_path(id);
        fs::write(&path, id.to_string()).map_err(|e| StateError::io(&path, e))?;
        Ok(path)
    }

    /// Keep only the `keep` highest-id markers
    pub fn prune(&self, keep: usize) -> Result<usize, StateError> {
        let mut markers = self.list()?;
        if markers.len() <= keep {
            return Ok(0);
        }

        markers.sort_by_key(|(id, _)| *id);
        let excess = markers.len() - keep;

        let mut removed = 0;
        for (id, path) in markers.into_iter().take(excess) {
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => {
                    tracing::warn!(alert_id = id, error = %e, "Failed to prune marker");
                }
            }
        }

        Ok(removed)
    }

    /// All marker files with the alert id parsed from their name
    pub fn list(&self) -> Result<Vec<(i64, PathBuf)>, StateError> {
        let entries = fs::read_dir(&self.dir).map_err(|e| StateError::io(&self.dir, e))?;

        let mut markers = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StateError::io(&self.dir, e))?;
            let path = entry.path();

            if path.extension().and_then(|ext| ext.to_str()) != Some(MARKER_EXTENSION) {
                continue;
            }
            let id = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| stem.strip_prefix(MARKER_PREFIX))
                .and_then(|id| id.parse::<i64>().ok());

            if let Some(id) = id {
                markers.push((id, path));
            }
        }

        Ok(markers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ids(queue: &MarkerQueue) -> Vec<i64> {
        let mut ids: Vec<i64> = queue.list().unwrap().into_iter().map(|(id, _)| id).collect();
        ids.sort();
        ids
    }

    #[test]
    fn test_create_marker() {
        let temp_dir = TempDir::new().unwrap();
        let queue = MarkerQueue::new(temp_dir.path());

        let path = queue.create(17).unwrap();
        assert_eq!(path, temp_dir.path().join("alert_17.txt"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "17");

        // Idempotent
        queue.create(17).unwrap();
        assert_eq!(ids(&queue), vec![17]);
    }

    #[test]
    fn test_create_recreates_removed_dir() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("pending");
        let queue = MarkerQueue::new(&dir);
        queue.clear_all().unwrap();

        fs::remove_dir_all(&dir).unwrap();
        queue.create(8).unwrap();
        assert_eq!(ids(&queue), vec![8]);
    }

    #[test]
    fn test_clear_all_removes_only_markers() {
        let temp_dir = TempDir::new().unwrap();
        let queue = MarkerQueue::new(temp_dir.path());

        queue.create(1).unwrap();
        queue.create(2).unwrap();
        fs::write(temp_dir.path().join("notes.md"), "keep me").unwrap();

        assert_eq!(queue.clear_all().unwrap(), 2);
        assert!(queue.list().unwrap().is_empty());
        assert!(temp_dir.path().join("notes.md").exists());

        assert_eq!(queue.clear_all().unwrap(), 0);
    }

    #[test]
    fn test_clear_all_creates_missing_dir() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("pending");
        let queue = MarkerQueue::new(&dir);

        assert_eq!(queue.clear_all().unwrap(), 0);
        assert!(dir.is_dir());
    }

    #[test]
    fn test_prune_keeps_highest_ids() {
        let temp_dir = TempDir::new().unwrap();
        let queue = MarkerQueue::new(temp_dir.path());

        for id in [5, 1, 9, 3, 7] {
            queue.create(id).unwrap();
        }

        assert_eq!(queue.prune(2).unwrap(), 3);
        assert_eq!(ids(&queue), vec![7, 9]);
        assert_eq!(queue.prune(2).unwrap(), 0);
    }
}
