//! Runtime wiring: file-backed adapters around the orchestrator.
//!
//! Everything a run persists lives under the configured data directory:
//!
//! ```text
//! <data_dir>/
//! ├── checkpoint.json      run progress, rewritten atomically
//! ├── credentials/*.json   signing keys (0600)
//! ├── ledger.json          rehearsal ledger snapshot
//! ├── manifest.json        written once, never overwritten
//! ├── metrics.prom         counters from the last run
//! └── run.lock             held while a run is active
//! ```

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use genesis_orchestrator::adapters::{
    FileCheckpointStore, FileCredentialStore, FileManifestWriter, InMemoryLedger, RunLock,
    UnconfiguredLockEnforcer,
};
use genesis_orchestrator::ports::outbound::{CredentialProvider, ManifestSink};
use genesis_orchestrator::{
    DistributionConfig, GenesisOrchestrator, GenesisOutcome, GenesisResult, RunManifest,
    RunStatus, StorageSettings, CONTROLLER_CREDENTIAL,
};
use shared_types::PublicIdentity;
use tracing::info;

/// Orchestrator over the file-backed adapters.
pub type FileOrchestrator = GenesisOrchestrator<
    InMemoryLedger,
    FileCredentialStore,
    FileCheckpointStore,
    FileManifestWriter,
    UnconfiguredLockEnforcer,
>;

/// One process's view of a distribution.
pub struct GenesisRuntime {
    orchestrator: FileOrchestrator,
    ledger: Arc<InMemoryLedger>,
    credentials: Arc<FileCredentialStore>,
    storage: StorageSettings,
}

impl GenesisRuntime {
    pub fn new(config: DistributionConfig) -> Result<Self> {
        let storage = config.storage().clone();
        std::fs::create_dir_all(&storage.data_dir).with_context(|| {
            format!("Failed to create data directory {}", storage.data_dir.display())
        })?;

        let ledger = Arc::new(
            InMemoryLedger::open(storage.ledger_snapshot_path())
                .context("Failed to open rehearsal ledger")?,
        );
        let credentials = Arc::new(FileCredentialStore::new(storage.credentials_dir()));
        let orchestrator = GenesisOrchestrator::new(
            config,
            ledger.clone(),
            credentials.clone(),
            Arc::new(FileCheckpointStore::new(storage.checkpoint_path())),
            Arc::new(FileManifestWriter::new(storage.manifest_path())),
            Arc::new(UnconfiguredLockEnforcer),
        );

        Ok(Self {
            orchestrator,
            ledger,
            credentials,
            storage,
        })
    }

    pub fn orchestrator(&self) -> &FileOrchestrator {
        &self.orchestrator
    }

    pub fn storage(&self) -> &StorageSettings {
        &self.storage
    }

    /// Exclusive lock on the data directory for the rest of the process.
    pub fn lock(&self) -> GenesisResult<RunLock> {
        RunLock::acquire(&self.storage.data_dir)
    }

    pub async fn run(&self) -> GenesisResult<GenesisOutcome> {
        self.orchestrator.run().await
    }

    pub fn status(&self) -> GenesisResult<RunStatus> {
        self.orchestrator.status()
    }

    /// Credit `amount` to `identity`, or to the controlling identity.
    pub fn fund(&self, identity: Option<PublicIdentity>, amount: u64) -> Result<(PublicIdentity, u64)> {
        let identity = match identity {
            Some(identity) => identity,
            None => self
                .credentials
                .peek_identity(CONTROLLER_CREDENTIAL)?
                .context("No controlling identity yet; start a run to generate one")?,
        };
        let balance = self.ledger.fund(&identity, amount)?;
        Ok((identity, balance))
    }

    /// Read a manifest and check its digest.
    pub fn verify_manifest(&self, path: Option<&Path>) -> Result<RunManifest> {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.storage.manifest_path());
        let manifest = FileManifestWriter::new(&path)
            .read()?
            .with_context(|| format!("No manifest at {}", path.display()))?;
        anyhow::ensure!(
            manifest.verify_digest(),
            "Manifest {} does not match its digest {}",
            path.display(),
            manifest.digest
        );
        Ok(manifest)
    }

    /// Write the metrics registry next to the checkpoint.
    pub fn write_metrics(&self) -> Result<()> {
        let text = genesis_telemetry::encode_metrics()?;
        let path = self.storage.metrics_path();
        std::fs::write(&path, text)
            .with_context(|| format!("Failed to write metrics to {}", path.display()))?;
        info!("[genesis] Metrics written to {}", path.display());
        Ok(())
    }
}
