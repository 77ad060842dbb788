//! Exclusive run lock.
//!
//! Uses `fs2` for cross-platform file locking (flock on Unix, LockFile on
//! Windows). The OS drops the lock when the process exits, so a crashed run
//! never leaves a stale lock behind.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::{debug, warn};

use crate::error::{GenesisError, GenesisResult};

/// Held for the lifetime of a run; released on drop.
#[derive(Debug)]
pub struct RunLock {
    file: File,
    path: PathBuf,
}

impl RunLock {
    /// Lock file name inside the data directory.
    pub const LOCK_FILE: &'static str = "run.lock";

    /// Take the lock without waiting.
    pub fn acquire(data_dir: &Path) -> GenesisResult<Self> {
        std::fs::create_dir_all(data_dir).map_err(GenesisError::storage)?;
        let path = data_dir.join(Self::LOCK_FILE);

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| GenesisError::storage(format!("opening {}: {e}", path.display())))?;

        if file.try_lock_exclusive().is_err() {
            return Err(GenesisError::RunLocked { path });
        }

        // record the holder for operators; the lock itself is the flock
        let pid = std::process::id();
        let _ = file.set_len(0).and_then(|_| writeln!(file, "{pid}"));
        debug!("[genesis] Run lock acquired ({}, pid {})", path.display(), pid);

        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!("[genesis] Failed to release run lock {}: {}", self.path.display(), e);
        }
    }
}
