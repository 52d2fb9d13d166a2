//! Snapshot copy of the alert source
//!
//! The enrichment worker resolves `alert_id -> record` against this copy
//! rather than the live file. It is refreshed every cycle and never versioned.

use std::fs;
use std::path::{Path, PathBuf};

use super::{Alert, AlertSource, SourceError};

/// Copies the alert source to a fixed location
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    source: PathBuf,
    target: PathBuf,
}

impl SnapshotWriter {
    pub fn new(source: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Create the snapshot directory
    pub fn ensure_dir(&self) -> Result<(), SourceError> {
        match self.target.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => {
                fs::create_dir_all(dir).map_err(|e| SourceError::Io {
                    path: dir.to_path_buf(),
                    source: e,
                })
            }
            _ => Ok(()),
        }
    }

    /// Replace the snapshot with a verbatim copy of the source, returning
    /// the number of bytes copied
    pub fn refresh(&self) -> Result<u64, SourceError> {
        self.ensure_dir()?;

        let mut tmp = self.target.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let bytes = fs::copy(&self.source, &tmp).map_err(|e| SourceError::Io {
            path: self.source.clone(),
            source: e,
        })?;
        fs::rename(&tmp, &self.target).map_err(|e| SourceError::Io {
            path: self.target.clone(),
            source: e,
        })?;

        Ok(bytes)
    }
}

/// Look an alert up by id, preferring the snapshot and falling back to the
/// live source when the snapshot is absent or lacks the id
pub fn find_alert(snapshot: &Path, source: &Path, id: i64) -> Result<Option<Alert>, SourceError> {
    match AlertSource::new(snapshot).find(id) {
        Ok(Some(alert)) => return Ok(Some(alert)),
        Ok(None) => {}
        Err(e) if e.is_missing() => {}
        Err(e) => return Err(e),
    }

    match AlertSource::new(source).find(id) {
        Err(e) if e.is_missing() => Ok(None),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_refresh_copies_verbatim() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("alerts.json");
        let target = temp_dir.path().join("inputs").join("alerts.json");
        let contents = "{\"id\":1,\"rule\":{\"level\":5}}\n{\"id\":2, \"rule\":{\"level\":12}}\n";
        fs::write(&source, contents).unwrap();

        let writer = SnapshotWriter::new(&source, &target);
        writer.ensure_dir().unwrap();
        assert_eq!(writer.refresh().unwrap(), contents.len() as u64);
        assert_eq!(fs::read_to_string(&target).unwrap(), contents);

        fs::write(&source, "{\"id\":3}\n").unwrap();
        writer.refresh().unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "{\"id\":3}\n");
    }

    #[test]
    fn test_refresh_recreates_removed_dir() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("alerts.json");
        let inputs = temp_dir.path().join("inputs");
        fs::write(&source, "{\"id\":1}\n").unwrap();

        let writer = SnapshotWriter::new(&source, inputs.join("alerts.json"));
        writer.ensure_dir().unwrap();
        fs::remove_dir_all(&inputs).unwrap();

        writer.refresh().unwrap();
        assert_eq!(fs::read_to_string(inputs.join("alerts.json")).unwrap(), "{\"id\":1}\n");
    }

    #[test]
    fn test_refresh_without_source_fails() {
        let temp_dir = TempDir::new().unwrap();
        let writer = SnapshotWriter::new(
            temp_dir.path().join("missing.json"),
            temp_dir.path().join("alerts.json"),
        );
        assert!(writer.refresh().is_err());
    }

    #[test]
    fn test_find_alert_falls_back_to_source() {
        let temp_dir = TempDir::new().unwrap();
        let snapshot = temp_dir.path().join("snapshot.json");
        let source = temp_dir.path().join("alerts.json");
        fs::write(&snapshot, "{\"id\":1,\"rule\":{\"level\":5}}\n").unwrap();
        fs::write(
            &source,
            "{\"id\":1,\"rule\":{\"level\":5}}\n{\"id\":2,\"rule\":{\"level\":12}}\n",
        )
        .unwrap();

        assert_eq!(find_alert(&snapshot, &source, 1).unwrap().unwrap().level, 5);
        assert_eq!(find_alert(&snapshot, &source, 2).unwrap().unwrap().level, 12);
        assert!(find_alert(&snapshot, &source, 3).unwrap().is_none());

        fs::remove_file(&snapshot).unwrap();
        assert_eq!(find_alert(&snapshot, &source, 2).unwrap().unwrap().id, 2);
    }
}
