//! Driven ports (outbound dependencies)

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared_crypto::Ed25519KeyPair;
use shared_types::{AccountRef, PublicIdentity, TxSignature};
use thiserror::Error;

use crate::domain::{LockIntent, OperationKind, RunCheckpoint, RunManifest, SignedOperation, TxStatus};
use crate::error::GenesisResult;

/// Ledger boundary failures.
///
/// The orchestrator attaches the failing step when mapping these into
/// [`GenesisError`](crate::GenesisError).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Declined; state unchanged
    #[error("rejected: {0}")]
    Rejected(String),

    /// Payer cannot cover the fee
    #[error("insufficient funds: need {required}, have {available}")]
    InsufficientFunds { required: u64, available: u64 },

    /// Transport or node failure
    #[error("unavailable: {0}")]
    Unavailable(String),
}

/// Result type for ledger calls
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Public ledger network client.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Spendable balance of a signer's system account.
    async fn balance(&self, identity: &PublicIdentity) -> LedgerResult<u64>;

    /// Fee the ledger charges for one operation of `kind`.
    async fn operation_cost(&self, kind: OperationKind) -> LedgerResult<u64>;

    /// Submit a signed operation; returns its transaction signature.
    ///
    /// Resubmitting an already-accepted operation returns the same signature.
    async fn submit(&self, operation: SignedOperation) -> LedgerResult<TxSignature>;

    async fn transaction_status(&self, signature: &TxSignature) -> LedgerResult<TxStatus>;

    /// Asset balance held by a holding account (0 when absent).
    async fn holding_balance(&self, account: &AccountRef) -> LedgerResult<u64>;
}

/// A named signing identity.
#[derive(Debug, Clone)]
pub struct Credential {
    pub name: String,
    pub keypair: Arc<Ed25519KeyPair>,
    /// Generated by this call rather than loaded
    pub freshly_created: bool,
}

impl Credential {
    pub fn identity(&self) -> PublicIdentity {
        self.keypair.identity()
    }
}

/// Source of persisted signing keys.
pub trait CredentialProvider: Send + Sync {
    /// Load `name`, or generate and durably persist it before returning.
    fn load_or_create(&self, name: &str) -> GenesisResult<Credential>;

    /// Public identity of `name` if it exists; never generates.
    fn peek_identity(&self, name: &str) -> GenesisResult<Option<PublicIdentity>>;
}

/// Durable single-writer checkpoint storage.
pub trait CheckpointStore: Send + Sync {
    fn load(&self) -> GenesisResult<Option<RunCheckpoint>>;

    /// Replace the stored checkpoint atomically.
    fn save(&self, checkpoint: &RunCheckpoint) -> GenesisResult<()>;
}

/// Destination of the run manifest.
pub trait ManifestSink: Send + Sync {
    /// Write once; never overwrite a different manifest.
    fn write(&self, manifest: &RunManifest) -> GenesisResult<()>;

    fn read(&self) -> GenesisResult<Option<RunManifest>>;
}

/// Confirmation from an enforcement mechanism that a lock is in force.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockActivation {
    pub reference: String,
    pub activated_at: DateTime<Utc>,
}

/// Vesting or timelock mechanism able to enforce a [`LockIntent`].
///
/// `activate` may be called again for an intent after a crash, so
/// implementations must be idempotent per holding account.
#[async_trait]
pub trait LockEnforcer: Send + Sync {
    /// `Ok(None)` when no mechanism took the intent.
    async fn activate(&self, intent: &LockIntent) -> GenesisResult<Option<LockActivation>>;
}
