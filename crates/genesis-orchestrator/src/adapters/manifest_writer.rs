//! Run manifest sinks.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use tracing::info;

use super::fs::{read_optional, write_new_atomic};
use crate::domain::RunManifest;
use crate::error::{GenesisError, GenesisResult};
use crate::ports::outbound::ManifestSink;

fn report_failed(reason: impl std::fmt::Display) -> GenesisError {
    GenesisError::ReportFailed {
        reason: reason.to_string(),
    }
}

/// Writes `manifest.json` exactly once.
#[derive(Debug, Clone)]
pub struct FileManifestWriter {
    path: PathBuf,
}

impl FileManifestWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ManifestSink for FileManifestWriter {
    fn write(&self, manifest: &RunManifest) -> GenesisResult<()> {
        let bytes = serde_json::to_vec_pretty(manifest).map_err(report_failed)?;
        match write_new_atomic(&self.path, &bytes, false) {
            Ok(()) => {
                info!(
                    "[genesis] 📄 Run manifest written to {} (digest {})",
                    self.path.display(),
                    manifest.digest
                );
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                match self.read()? {
                    Some(existing) if existing.digest == manifest.digest => Ok(()),
                    _ => Err(report_failed(format!(
                        "{} already exists and is not overwritten",
                        self.path.display()
                    ))),
                }
            }
            Err(e) => Err(report_failed(format!("writing {}: {e}", self.path.display()))),
        }
    }

    fn read(&self) -> GenesisResult<Option<RunManifest>> {
        let Some(bytes) = read_optional(&self.path).map_err(report_failed)? else {
            return Ok(None);
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| report_failed(format!("corrupt manifest {}: {e}", self.path.display())))
    }
}

/// Manifest kept in memory, with an injectable write failure.
#[derive(Default)]
pub struct InMemoryManifestSink {
    manifest: RwLock<Option<RunManifest>>,
    fail_writes: AtomicBool,
}

impl InMemoryManifestSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl ManifestSink for InMemoryManifestSink {
    fn write(&self, manifest: &RunManifest) -> GenesisResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(report_failed("simulated manifest write failure"));
        }
        let mut slot = self.manifest.write();
        match slot.as_ref() {
            Some(existing) if existing.digest != manifest.digest => {
                Err(report_failed("manifest already written"))
            }
            _ => {
                *slot = Some(manifest.clone());
                Ok(())
            }
        }
    }

    fn read(&self) -> GenesisResult<Option<RunManifest>> {
        Ok(self.manifest.read().clone())
    }
}
