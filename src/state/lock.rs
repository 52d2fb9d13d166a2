//! Single-instance guard
//!
//! Two watchers on one checkpoint would double-dispatch and race on the
//! watermark write. The lock file is held with an exclusive advisory lock
//! for as long as the returned guard lives.

use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use fd_lock::{RwLock, RwLockWriteGuard};

use super::StateError;

pub struct InstanceLock {
    path: PathBuf,
    lock: RwLock<File>,
}

impl InstanceLock {
    /// Open (creating it and its directory if needed) the lock file
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StateError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StateError::io(parent, e))?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| StateError::io(&path, e))?;

        Ok(Self {
            path,
            lock: RwLock::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Take the exclusive lock without blocking
    pub fn acquire(&mut self) -> Result<RwLockWriteGuard<'_, File>, StateError> {
        match self.lock.try_write() {
            Ok(guard) => Ok(guard),
            Err(e) if e.kind() == ErrorKind::WouldBlock => Err(StateError::Locked(self.path.clone())),
            Err(e) => Err(StateError::io(&self.path, e)),
        }
    }
}
