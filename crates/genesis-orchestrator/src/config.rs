//! Distribution configuration.
//!
//! Loaded from TOML, then adjusted from the environment:
//!
//! ```toml
//! [asset]
//! name = "Genesis Token"
//! symbol = "GEN"
//! decimals = 9
//! total_supply = 1_000_000_000
//!
//! [[categories]]
//! name = "community"
//! percentage = "40"
//!
//! [[categories]]
//! name = "team"
//! percentage = "25"
//! is_time_restricted = true
//! lock_duration_secs = 31_536_000
//! release = { kind = "linear", interval_secs = 2_592_000, periods = 12 }
//!
//! [ledger]
//! confirmation_timeout_secs = 60
//! poll_interval_ms = 500
//!
//! [storage]
//! data_dir = "./genesis-data"
//! ```
//!
//! Percentages are quoted decimal strings so they never pass through a float.
//!
//! | Variable | Overrides |
//! |----------|-----------|
//! | `GD_DATA_DIR` | `storage.data_dir` |
//! | `GD_CONFIRMATION_TIMEOUT_SECS` | `ledger.confirmation_timeout_secs` |

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::domain::{
    compute_allocations, total_units, Allocation, AllocationCategory, AllocationTable, AssetParams,
};
use crate::error::{GenesisError, GenesisResult};

const DEFAULT_CONFIRMATION_TIMEOUT_SECS: u64 = 60;
const DEFAULT_POLL_INTERVAL_MS: u64 = 500;
const DEFAULT_DATA_DIR: &str = "./genesis-data";

/// Confirmation polling bounds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerSettings {
    pub confirmation_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            confirmation_timeout: Duration::from_secs(DEFAULT_CONFIRMATION_TIMEOUT_SECS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

impl LedgerSettings {
    fn validate(&self) -> GenesisResult<()> {
        if self.confirmation_timeout.is_zero() || self.poll_interval.is_zero() {
            return Err(GenesisError::InvalidConfig(
                "confirmation timeout and poll interval must be non-zero".into(),
            ));
        }
        if self.poll_interval > self.confirmation_timeout {
            return Err(GenesisError::InvalidConfig(
                "poll interval exceeds confirmation timeout".into(),
            ));
        }
        Ok(())
    }
}

/// Where run state lives on disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageSettings {
    pub data_dir: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
        }
    }
}

impl StorageSettings {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn checkpoint_path(&self) -> PathBuf {
        self.data_dir.join("checkpoint.json")
    }

    pub fn credentials_dir(&self) -> PathBuf {
        self.data_dir.join("credentials")
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.data_dir.join("manifest.json")
    }

    pub fn ledger_snapshot_path(&self) -> PathBuf {
        self.data_dir.join("ledger.json")
    }

    pub fn metrics_path(&self) -> PathBuf {
        self.data_dir.join("metrics.prom")
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    asset: AssetParams,
    categories: Vec<AllocationCategory>,
    #[serde(default)]
    ledger: LedgerSection,
    #[serde(default)]
    storage: StorageSection,
}

#[derive(Deserialize)]
#[serde(default, deny_unknown_fields)]
struct LedgerSection {
    confirmation_timeout_secs: u64,
    poll_interval_ms: u64,
}

impl Default for LedgerSection {
    fn default() -> Self {
        Self {
            confirmation_timeout_secs: DEFAULT_CONFIRMATION_TIMEOUT_SECS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

#[derive(Deserialize)]
#[serde(default, deny_unknown_fields)]
struct StorageSection {
    data_dir: PathBuf,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
        }
    }
}

/// Validated distribution configuration.
///
/// Construction fails on an invalid allocation table or asset parameters,
/// so a value of this type is always safe to run.
#[derive(Clone, Debug)]
pub struct DistributionConfig {
    asset: AssetParams,
    table: AllocationTable,
    allocations: Vec<Allocation>,
    ledger: LedgerSettings,
    storage: StorageSettings,
}

impl DistributionConfig {
    pub fn new(
        asset: AssetParams,
        categories: Vec<AllocationCategory>,
        ledger: LedgerSettings,
        storage: StorageSettings,
    ) -> GenesisResult<Self> {
        asset.validate()?;
        ledger.validate()?;
        let table = AllocationTable::new(categories)?;
        let allocations = compute_allocations(&table, asset.total_supply, asset.decimals)?;
        Ok(Self {
            asset,
            table,
            allocations,
            ledger,
            storage,
        })
    }

    pub fn from_toml_str(text: &str) -> GenesisResult<Self> {
        let file: ConfigFile = toml::from_str(text)
            .map_err(|e| GenesisError::InvalidConfig(format!("parse error: {e}")))?;
        Self::new(
            file.asset,
            file.categories,
            LedgerSettings {
                confirmation_timeout: Duration::from_secs(file.ledger.confirmation_timeout_secs),
                poll_interval: Duration::from_millis(file.ledger.poll_interval_ms),
            },
            StorageSettings::new(file.storage.data_dir),
        )
    }

    /// Read `path` and apply environment overrides.
    pub fn load(path: &Path) -> GenesisResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            GenesisError::InvalidConfig(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&text)?.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `GD_*` overrides from `lookup`.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> GenesisResult<Self> {
        if let Some(dir) = lookup("GD_DATA_DIR").filter(|d| !d.is_empty()) {
            self.storage = StorageSettings::new(dir);
        }
        if let Some(secs) = lookup("GD_CONFIRMATION_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                GenesisError::InvalidConfig(format!(
                    "GD_CONFIRMATION_TIMEOUT_SECS={secs:?} is not a whole number of seconds"
                ))
            })?;
            self.ledger.confirmation_timeout = Duration::from_secs(secs);
            self.ledger.validate()?;
        }
        Ok(self)
    }

    #[must_use]
    pub fn with_storage(mut self, storage: StorageSettings) -> Self {
        self.storage = storage;
        self
    }

    pub fn with_ledger(mut self, ledger: LedgerSettings) -> GenesisResult<Self> {
        ledger.validate()?;
        self.ledger = ledger;
        Ok(self)
    }

    pub fn asset(&self) -> &AssetParams {
        &self.asset
    }

    pub fn table(&self) -> &AllocationTable {
        &self.table
    }

    /// Per-category quantities, in table order.
    pub fn allocations(&self) -> &[Allocation] {
        &self.allocations
    }

    pub fn allocation(&self, category: &str) -> Option<&Allocation> {
        self.allocations.iter().find(|a| a.category == category)
    }

    pub fn ledger(&self) -> &LedgerSettings {
        &self.ledger
    }

    pub fn storage(&self) -> &StorageSettings {
        &self.storage
    }

    /// Total supply in smallest units.
    pub fn total_units(&self) -> GenesisResult<u64> {
        total_units(self.asset.total_supply, self.asset.decimals)
    }
}
