//! Watermark checkpoint file

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use super::StateError;

/// Single-value store for the highest fully processed alert id.
///
/// The file holds the decimal watermark and nothing else. Anything that
/// cannot be read back as an integer counts as "nothing processed yet", so a
/// damaged checkpoint leads to re-delivery rather than skipped alerts.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the directory holding the checkpoint
    pub fn ensure_parent(&self) -> Result<(), StateError> {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                fs::create_dir_all(parent).map_err(|e| StateError::io(parent, e))
            }
            _ => Ok(()),
        }
    }

    /// Read the watermark, defaulting to 0
    pub fn load(&self) -> i64 {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return 0,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Checkpoint unreadable, starting from watermark 0"
                );
                return 0;
            }
        };

        match raw.trim().parse::<i64>() {
            Ok(watermark) => watermark,
            Err(_) => {
                tracing::warn!(
                    path = %self.path.display(),
                    contents = %raw.trim(),
                    "Checkpoint is not an integer, starting from watermark 0"
                );
                0
            }
        }
    }

    /// Persist the watermark through a temp file and rename
    pub fn save(&self, watermark: i64) -> Result<(), StateError> {
        let tmp = self.temp_path();

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&tmp)
            .map_err(|e| StateError::io(&tmp, e))?;

        file.write_all(watermark.to_string().as_bytes())
            .and_then(|_| file.sync_all())
            .map_err(|e| StateError::io(&tmp, e))?;

        fs::rename(&tmp, &self.path).map_err(|e| StateError::io(&self.path, e))?;

        tracing::debug!(path = %self.path.display(), watermark, "Checkpoint saved");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_checkpoint_is_zero() {
        let temp_dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(temp_dir.path().join("last_id.txt"));
        assert_eq!(store.load(), 0);
    }

    #[test]
    fn test_garbage_checkpoint_matches_missing() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("last_id.txt");
        fs::write(&path, "abc").unwrap();

        let store = CheckpointStore::new(&path);
        let missing = CheckpointStore::new(temp_dir.path().join("absent.txt"));
        assert_eq!(store.load(), missing.load());
        assert_eq!(store.load(), 0);
    }

    #[test]
    fn test_save_then_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("last_id.txt");
        let store = CheckpointStore::new(&path);

        store.save(42).unwrap();
        assert_eq!(store.load(), 42);
        assert_eq!(fs::read_to_string(&path).unwrap(), "42");
        assert!(!store.temp_path().exists());

        store.save(1337).unwrap();
        assert_eq!(store.load(), 1337);
    }

    #[test]
    fn test_load_tolerates_whitespace() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("last_id.txt");
        fs::write(&path, "  17\n").unwrap();
        assert_eq!(CheckpointStore::new(&path).load(), 17);
    }

    #[test]
    fn test_ensure_parent_creates_nested_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("a").join("b").join("last_id.txt");
        let store = CheckpointStore::new(&path);

        store.ensure_parent().unwrap();
        store.save(3).unwrap();
        assert_eq!(store.load(), 3);
    }

    #[test]
    fn test_save_into_directory_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("last_id.txt");
        fs::create_dir(&path).unwrap();

        let store = CheckpointStore::new(&path);
        assert_eq!(store.load(), 0);
        assert!(matches!(store.save(5), Err(StateError::Io { .. })));
    }
}
