//! # genesis-orchestrator
//!
//! Genesis distribution for a fixed-supply asset: create the asset, provision
//! one recipient per allocation category, issue each category its share,
//! revoke issuance authority, record deferred-release locks, and write a
//! tamper-evident run manifest.
//!
//! ## Overview
//!
//! - **Exact allocation**: percentages are fixed-point and must sum to
//!   exactly 100; the integer rounding remainder goes to the first category
//! - **Resumable**: every submission is recorded before it is sent, so a run
//!   interrupted anywhere resumes without repeating a confirmed operation
//! - **Irreversible finalization**: authority is revoked only after every
//!   category is issued, and at most once
//!
//! ## Flow
//!
//! ```text
//! [asset-init] ──→ [provision[c]]* ──→ [issue[c]]* ──→ [finalize] ──→ [schedule-release] ──→ [report]
//!      │                 │                  │               │                  │                 │
//!      └─────────────────┴──────── ledger ──┴───────────────┘                  │                 │
//!                                                                       LockEnforcer      ManifestSink
//! ```
//!
//! Every step records its result in the [`RunCheckpoint`]. A pending
//! transaction found on resume is re-checked before anything is resubmitted:
//!
//! | Ledger status | Action |
//! |---------------|--------|
//! | Confirmed | record, move on |
//! | Pending | keep waiting up to the confirmation timeout |
//! | Failed / NotFound | sign and submit again |
//!
//! ## Example
//!
//! ```rust,ignore
//! use genesis_orchestrator::{DistributionConfig, GenesisOrchestrator};
//! use genesis_orchestrator::ports::inbound::GenesisApi;
//!
//! let config = DistributionConfig::load(Path::new("genesis.toml"))?;
//! let orchestrator = GenesisOrchestrator::new(
//!     config,
//!     ledger,
//!     credentials,
//!     checkpoint_store,
//!     manifest_writer,
//!     lock_enforcer,
//! );
//!
//! let outcome = orchestrator.run().await?;
//! println!("manifest digest {}", outcome.manifest.digest);
//! ```

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use config::{DistributionConfig, LedgerSettings, StorageSettings};
pub use domain::{
    Allocation, AllocationCategory, AllocationTable, AssetDefinition, AssetParams,
    FinalizationState, IssuanceRecord, LockIntent, LockStatus, Percentage, RecipientAccount,
    ReleaseKind, RunCheckpoint, RunManifest, Step,
};
pub use error::{GenesisError, GenesisResult};
pub use ports::inbound::{GenesisApi, GenesisOutcome, RunStatus, StepProgress};
pub use service::{GenesisOrchestrator, ASSET_CREDENTIAL, CONTROLLER_CREDENTIAL};
