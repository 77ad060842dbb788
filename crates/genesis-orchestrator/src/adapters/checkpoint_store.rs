//! Checkpoint store adapters.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;
use tracing::debug;

use super::fs::{read_optional, write_atomic};
use crate::domain::RunCheckpoint;
use crate::error::{GenesisError, GenesisResult};
use crate::ports::outbound::CheckpointStore;

/// Pretty-printed JSON checkpoint, replaced atomically on every save.
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    path: PathBuf,
}

impl FileCheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CheckpointStore for FileCheckpointStore {
    fn load(&self) -> GenesisResult<Option<RunCheckpoint>> {
        let Some(bytes) = read_optional(&self.path).map_err(GenesisError::storage)? else {
            return Ok(None);
        };
        let checkpoint = serde_json::from_slice(&bytes).map_err(|e| {
            GenesisError::storage(format!("corrupt checkpoint {}: {e}", self.path.display()))
        })?;
        Ok(Some(checkpoint))
    }

    fn save(&self, checkpoint: &RunCheckpoint) -> GenesisResult<()> {
        let bytes = serde_json::to_vec_pretty(checkpoint).map_err(GenesisError::storage)?;
        write_atomic(&self.path, &bytes).map_err(|e| {
            GenesisError::storage(format!("writing {}: {e}", self.path.display()))
        })?;
        debug!("[genesis] Checkpoint saved ({} bytes)", bytes.len());
        Ok(())
    }
}

/// Checkpoint held in memory.
///
/// `fail_saves_after` makes the n-th and later saves fail, simulating a
/// process that dies part-way through a run.
#[derive(Default)]
pub struct InMemoryCheckpointStore {
    checkpoint: RwLock<Option<RunCheckpoint>>,
    saves: AtomicUsize,
    fail_after: RwLock<Option<usize>>,
}

impl InMemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_checkpoint(checkpoint: RunCheckpoint) -> Self {
        Self {
            checkpoint: RwLock::new(Some(checkpoint)),
            ..Self::default()
        }
    }

    pub fn snapshot(&self) -> Option<RunCheckpoint> {
        self.checkpoint.read().clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Allow `n` more successful saves, then fail.
    pub fn fail_saves_after(&self, n: usize) {
        *self.fail_after.write() = Some(self.save_count() + n);
    }

    pub fn clear_failures(&self) {
        *self.fail_after.write() = None;
    }
}

impl CheckpointStore for InMemoryCheckpointStore {
    fn load(&self) -> GenesisResult<Option<RunCheckpoint>> {
        Ok(self.snapshot())
    }

    fn save(&self, checkpoint: &RunCheckpoint) -> GenesisResult<()> {
        if let Some(limit) = *self.fail_after.read() {
            if self.save_count() >= limit {
                return Err(GenesisError::storage("simulated checkpoint write failure"));
            }
        }
        *self.checkpoint.write() = Some(checkpoint.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
