//! Error types for the genesis orchestrator

use std::path::PathBuf;

use shared_types::{PublicIdentity, TxSignature};
use thiserror::Error;

use crate::domain::Step;

/// Orchestrator errors.
///
/// Every variant aborts the run. Confirmed progress is never rolled back;
/// the checkpoint is the only recovery mechanism.
#[derive(Debug, Error)]
pub enum GenesisError {
    /// The controlling identity was just created or holds no funds
    #[error("Controlling identity {identity} must be funded before the run can continue")]
    NeedsFunding { identity: PublicIdentity },

    /// Balance below the ledger-reported cost of the next operation
    #[error("Insufficient funding for {step}: operation costs {required}, balance is {available}")]
    InsufficientFunding {
        step: Step,
        required: u64,
        available: u64,
    },

    /// The ledger declined the operation
    #[error("Ledger rejected {step}: {reason}")]
    NetworkRejected { step: Step, reason: String },

    /// No confirmation observed within the configured bound
    #[error("No confirmation for {step} (tx {signature}) after {waited_secs}s")]
    ConfirmationTimeout {
        step: Step,
        signature: TxSignature,
        waited_secs: u64,
    },

    /// Issued quantities do not add up, or a holding balance disagrees
    #[error("Accounting invariant violated: {reason}")]
    AccountingInvariantViolation { reason: String },

    /// Finalization attempted before every category was issued
    #[error("Cannot finalize: no confirmed issuance for {missing:?}")]
    PrematureFinalization { missing: Vec<String> },

    /// Issuance authority was already revoked
    #[error("Issuance authority already revoked")]
    AlreadyFinalized,

    /// A step was invoked before the step it depends on
    #[error("{step} requires {requires} to be confirmed first")]
    StepOutOfOrder { step: Step, requires: String },

    /// Configuration failed validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Checkpoint was written for a different configuration
    #[error("Checkpoint does not match configuration: {0}")]
    CheckpointMismatch(String),

    /// Credential could not be loaded or persisted
    #[error("Credential {name}: {reason}")]
    Credential { name: String, reason: String },

    /// Ledger could not be reached
    #[error("Ledger unavailable: {reason}")]
    LedgerUnavailable { reason: String },

    /// Checkpoint or snapshot I/O failed
    #[error("Storage error: {reason}")]
    Storage { reason: String },

    /// Run manifest could not be written
    #[error("Run report failed: {reason}")]
    ReportFailed { reason: String },

    /// Another process holds the run lock
    #[error("Run lock {} is held by another process", path.display())]
    RunLocked { path: PathBuf },
}

impl GenesisError {
    /// Whether re-running without operator action may succeed.
    ///
    /// A timed-out transaction stays pending in the checkpoint and is
    /// re-checked on the next run before anything is resubmitted.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GenesisError::ConfirmationTimeout { .. })
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            GenesisError::NeedsFunding { .. } => "needs_funding",
            GenesisError::InsufficientFunding { .. } => "insufficient_funding",
            GenesisError::NetworkRejected { .. } => "network_rejected",
            GenesisError::ConfirmationTimeout { .. } => "confirmation_timeout",
            GenesisError::AccountingInvariantViolation { .. } => "accounting_invariant",
            GenesisError::PrematureFinalization { .. } => "premature_finalization",
            GenesisError::AlreadyFinalized => "already_finalized",
            GenesisError::StepOutOfOrder { .. } => "step_out_of_order",
            GenesisError::InvalidConfig(_) => "invalid_config",
            GenesisError::CheckpointMismatch(_) => "checkpoint_mismatch",
            GenesisError::Credential { .. } => "credential",
            GenesisError::LedgerUnavailable { .. } => "ledger_unavailable",
            GenesisError::Storage { .. } => "storage",
            GenesisError::ReportFailed { .. } => "report_failed",
            GenesisError::RunLocked { .. } => "run_locked",
        }
    }

    pub(crate) fn storage(reason: impl std::fmt::Display) -> Self {
        GenesisError::Storage {
            reason: reason.to_string(),
        }
    }
}

/// Result type for orchestrator operations
pub type GenesisResult<T> = Result<T, GenesisError>;
