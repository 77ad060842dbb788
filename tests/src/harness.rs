//! Shared fixtures.
//!
//! A [`Workspace`] is a temporary data directory. Every call to
//! [`Workspace::orchestrator`] builds a fresh orchestrator over it, which is
//! how the suite models a process restart: nothing survives except what the
//! adapters wrote to disk.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use genesis_orchestrator::adapters::{
    FileCheckpointStore, FileCredentialStore, FileManifestWriter, InMemoryLedger,
    UnconfiguredLockEnforcer,
};
use genesis_orchestrator::ports::outbound::{CheckpointStore, CredentialProvider};
use genesis_orchestrator::{
    DistributionConfig, GenesisError, GenesisOrchestrator, GenesisResult, LedgerSettings,
    RunCheckpoint, StorageSettings, CONTROLLER_CREDENTIAL,
};
use tempfile::TempDir;

/// Enough native units for any run in this suite.
pub const FUNDING: u64 = 1_000_000_000;

pub const STANDARD_CONFIG: &str = r#"
    [asset]
    name = "Genesis Token"
    symbol = "GEN"
    decimals = 9
    total_supply = 1_000_000_000

    [[categories]]
    name = "community"
    percentage = "40"

    [[categories]]
    name = "team"
    percentage = "25"
    is_time_restricted = true
    lock_duration_secs = 31_536_000
    release = { kind = "linear", interval_secs = 2_592_000, periods = 12 }

    [[categories]]
    name = "treasury"
    percentage = "20"

    [[categories]]
    name = "liquidity"
    percentage = "10"

    [[categories]]
    name = "advisors"
    percentage = "5"
"#;

pub type FileBacked<S> = GenesisOrchestrator<
    InMemoryLedger,
    FileCredentialStore,
    S,
    FileManifestWriter,
    UnconfiguredLockEnforcer,
>;

/// Temporary data directory plus the configuration that runs against it.
pub struct Workspace {
    dir: TempDir,
    config: DistributionConfig,
}

impl Workspace {
    pub fn new(config_toml: &str) -> Self {
        let dir = TempDir::new().expect("temp dir");
        let config = DistributionConfig::from_toml_str(config_toml)
            .expect("valid config")
            .with_storage(StorageSettings::new(dir.path()))
            .with_ledger(LedgerSettings {
                confirmation_timeout: Duration::from_millis(300),
                poll_interval: Duration::from_millis(5),
            })
            .expect("valid ledger settings");
        Self { dir, config }
    }

    pub fn standard() -> Self {
        Self::new(STANDARD_CONFIG)
    }

    /// Standard workspace with a funded controller.
    pub fn funded() -> Self {
        let workspace = Self::standard();
        workspace.fund_controller(FUNDING);
        workspace
    }

    pub fn config(&self) -> &DistributionConfig {
        &self.config
    }

    pub fn storage(&self) -> &StorageSettings {
        self.config.storage()
    }

    pub fn path(&self) -> &std::path::Path {
        self.dir.path()
    }

    /// Ledger reopened from its snapshot, as a restarted process sees it.
    pub fn open_ledger(&self) -> Arc<InMemoryLedger> {
        Arc::new(InMemoryLedger::open(self.storage().ledger_snapshot_path()).expect("ledger snapshot"))
    }

    pub fn credentials(&self) -> FileCredentialStore {
        FileCredentialStore::new(self.storage().credentials_dir())
    }

    pub fn fund_controller(&self, amount: u64) {
        let controller = self
            .credentials()
            .load_or_create(CONTROLLER_CREDENTIAL)
            .expect("controller credential");
        self.open_ledger()
            .fund(&controller.identity(), amount)
            .expect("funding");
    }

    pub fn checkpoint_store(&self) -> FileCheckpointStore {
        FileCheckpointStore::new(self.storage().checkpoint_path())
    }

    pub fn checkpoint(&self) -> Option<RunCheckpoint> {
        self.checkpoint_store().load().expect("readable checkpoint")
    }

    pub fn orchestrator(&self, ledger: Arc<InMemoryLedger>) -> FileBacked<FileCheckpointStore> {
        self.orchestrator_with_store(ledger, Arc::new(self.checkpoint_store()))
    }

    pub fn orchestrator_with_store<S: CheckpointStore>(
        &self,
        ledger: Arc<InMemoryLedger>,
        store: Arc<S>,
    ) -> FileBacked<S> {
        GenesisOrchestrator::new(
            self.config.clone(),
            ledger,
            Arc::new(self.credentials()),
            store,
            Arc::new(FileManifestWriter::new(self.storage().manifest_path())),
            Arc::new(UnconfiguredLockEnforcer),
        )
    }
}

/// File checkpoint store that dies after a fixed number of writes.
///
/// The failing write leaves the previous file in place, which is what an
/// atomic rename guarantees when a process is killed mid-write.
pub struct CrashingStore {
    inner: FileCheckpointStore,
    writes_left: AtomicUsize,
}

impl CrashingStore {
    pub fn new(inner: FileCheckpointStore, writes_before_crash: usize) -> Self {
        Self {
            inner,
            writes_left: AtomicUsize::new(writes_before_crash),
        }
    }
}

impl CheckpointStore for CrashingStore {
    fn load(&self) -> GenesisResult<Option<RunCheckpoint>> {
        self.inner.load()
    }

    fn save(&self, checkpoint: &RunCheckpoint) -> GenesisResult<()> {
        let claimed = self
            .writes_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if claimed.is_err() {
            return Err(GenesisError::Storage {
                reason: "process killed".into(),
            });
        }
        self.inner.save(checkpoint)
    }
}
