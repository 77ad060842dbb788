//! Domain layer: pure distribution logic with no I/O.

pub mod allocation;
pub mod asset;
pub mod checkpoint;
pub mod finalization;
pub mod issuance;
pub mod manifest;
pub mod operation;
pub mod percentage;
pub mod recipient;
pub mod release;
pub mod step;

pub use allocation::{
    compute_allocations, total_units, verify_total, Allocation, AllocationCategory,
    AllocationTable, MAX_DECIMALS,
};
pub use asset::{AssetDefinition, AssetParams};
pub use checkpoint::{ManifestRecord, ReleaseSchedule, RunCheckpoint, StepState, CHECKPOINT_VERSION};
pub use finalization::{FinalizationGate, FinalizationState};
pub use issuance::{verify_issued_total, IssuanceRecord};
pub use manifest::{ManifestBody, RunManifest, MANIFEST_VERSION};
pub use operation::{Endorsement, Operation, OperationKind, PendingTx, SignedOperation, TxStatus};
pub use percentage::{Percentage, PercentageError};
pub use recipient::{recipient_credential_name, RecipientAccount, RecipientMap};
pub use release::{LockIntent, LockStatus, ReleaseKind};
pub use step::{plan, Step};
