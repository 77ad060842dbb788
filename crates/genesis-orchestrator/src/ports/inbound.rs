//! Driving ports (API exposed to the runtime)

use async_trait::async_trait;
use serde::Serialize;
use shared_types::TxSignature;
use uuid::Uuid;

use crate::domain::{
    Allocation, AssetDefinition, FinalizationState, IssuanceRecord, LockIntent, RecipientMap,
    RunManifest, Step,
};
use crate::error::GenesisResult;

/// Result of a `run`.
#[derive(Debug, Clone)]
pub struct GenesisOutcome {
    pub manifest: RunManifest,
    /// Steps performed by this invocation
    pub steps_executed: Vec<Step>,
    /// Steps already complete in the checkpoint
    pub steps_skipped: Vec<Step>,
}

/// Progress of one step as recorded in the checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "progress", rename_all = "snake_case")]
pub enum StepProgress {
    NotStarted,
    Pending { signature: TxSignature },
    Complete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepStatus {
    pub step: Step,
    #[serde(flatten)]
    pub progress: StepProgress,
}

/// Checkpoint summary; never touches the ledger.
#[derive(Debug, Clone, Serialize)]
pub struct RunStatus {
    /// `None` before the first run
    pub run_id: Option<Uuid>,
    pub steps: Vec<StepStatus>,
}

impl RunStatus {
    pub fn next_step(&self) -> Option<&Step> {
        self.steps
            .iter()
            .find(|s| s.progress != StepProgress::Complete)
            .map(|s| &s.step)
    }

    pub fn is_complete(&self) -> bool {
        self.next_step().is_none()
    }
}

/// Genesis distribution API.
#[async_trait]
pub trait GenesisApi: Send + Sync {
    /// Steps in execution order with the quantity each category receives.
    fn plan(&self) -> (Vec<Step>, Vec<Allocation>);

    /// Execute every incomplete step.
    async fn run(&self) -> GenesisResult<GenesisOutcome>;

    async fn initialize_asset(&self) -> GenesisResult<AssetDefinition>;

    async fn provision_recipients(&self) -> GenesisResult<RecipientMap>;

    async fn issue_all(&self) -> GenesisResult<Vec<IssuanceRecord>>;

    async fn finalize(&self) -> GenesisResult<FinalizationState>;

    async fn schedule_releases(&self) -> GenesisResult<Vec<LockIntent>>;

    async fn write_manifest(&self) -> GenesisResult<RunManifest>;

    fn status(&self) -> GenesisResult<RunStatus>;
}
