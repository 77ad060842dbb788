//! Adapters (hexagonal architecture)
//!
//! File-backed implementations are used by the CLI; in-memory ones by tests
//! and local rehearsals.

pub mod checkpoint_store;
pub mod credentials;
mod fs;
pub mod ledger;
pub mod lock_enforcer;
pub mod manifest_writer;
pub mod run_lock;

pub use checkpoint_store::{FileCheckpointStore, InMemoryCheckpointStore};
pub use credentials::{FileCredentialStore, InMemoryCredentialStore};
pub use ledger::{AssetAccount, FeeSchedule, HoldingAccount, InMemoryLedger};
pub use lock_enforcer::UnconfiguredLockEnforcer;
pub use manifest_writer::{FileManifestWriter, InMemoryManifestSink};
pub use run_lock::RunLock;
