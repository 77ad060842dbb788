//! Durable run checkpoint.
//!
//! Every ledger-touching step moves through
//!
//! ```text
//! (absent) ──signed──→ Pending { signature } ──confirmed──→ Confirmed(value)
//! ```
//!
//! and the checkpoint is persisted at each arrow. A `Pending` entry is
//! re-checked on the ledger before anything is resubmitted, so a crash
//! between submission and confirmation never duplicates a transaction.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::allocation::{Allocation, AllocationTable};
use super::asset::{AssetDefinition, AssetParams};
use super::finalization::FinalizationState;
use super::issuance::IssuanceRecord;
use super::operation::PendingTx;
use super::recipient::{RecipientAccount, RecipientMap};
use super::release::LockIntent;
use super::step::Step;
use crate::error::{GenesisError, GenesisResult};

/// Current checkpoint format.
pub const CHECKPOINT_VERSION: u32 = 1;

/// Progress of one ledger-touching step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepState<T> {
    Pending(PendingTx),
    Confirmed(T),
}

impl<T> StepState<T> {
    pub fn confirmed(&self) -> Option<&T> {
        match self {
            StepState::Confirmed(value) => Some(value),
            StepState::Pending(_) => None,
        }
    }

    pub fn pending(&self) -> Option<&PendingTx> {
        match self {
            StepState::Pending(tx) => Some(tx),
            StepState::Confirmed(_) => None,
        }
    }
}

/// Recorded lock intents.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseSchedule {
    pub intents: Vec<LockIntent>,
    pub recorded_at: DateTime<Utc>,
}

/// Marker that the run manifest was written.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestRecord {
    pub digest: String,
    pub written_at: DateTime<Utc>,
}

/// Everything a later run needs to resume.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCheckpoint {
    pub version: u32,
    pub run_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub asset: Option<StepState<AssetDefinition>>,
    #[serde(default)]
    pub recipients: BTreeMap<String, StepState<RecipientAccount>>,
    #[serde(default)]
    pub issuances: BTreeMap<String, StepState<IssuanceRecord>>,
    #[serde(default)]
    pub finalization: FinalizationState,
    /// Revocation submitted but not yet confirmed
    #[serde(default)]
    pub revocation: Option<PendingTx>,
    #[serde(default)]
    pub release_schedule: Option<ReleaseSchedule>,
    #[serde(default)]
    pub manifest: Option<ManifestRecord>,
}

impl RunCheckpoint {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            version: CHECKPOINT_VERSION,
            run_id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            asset: None,
            recipients: BTreeMap::new(),
            issuances: BTreeMap::new(),
            finalization: FinalizationState::Open,
            revocation: None,
            release_schedule: None,
            manifest: None,
        }
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    pub fn confirmed_asset(&self) -> Option<&AssetDefinition> {
        self.asset.as_ref().and_then(StepState::confirmed)
    }

    pub fn confirmed_recipient(&self, category: &str) -> Option<&RecipientAccount> {
        self.recipients.get(category).and_then(StepState::confirmed)
    }

    pub fn confirmed_issuance(&self, category: &str) -> Option<&IssuanceRecord> {
        self.issuances.get(category).and_then(StepState::confirmed)
    }

    /// In-flight transaction recorded for `step`, if any.
    pub fn pending_tx(&self, step: &Step) -> Option<&PendingTx> {
        match step {
            Step::AssetInit => self.asset.as_ref().and_then(StepState::pending),
            Step::Provision(c) => self.recipients.get(c).and_then(StepState::pending),
            Step::Issue(c) => self.issuances.get(c).and_then(StepState::pending),
            Step::Finalize => self.revocation.as_ref(),
            Step::ScheduleRelease | Step::Report => None,
        }
    }

    pub fn is_complete(&self, step: &Step) -> bool {
        match step {
            Step::AssetInit => self.confirmed_asset().is_some(),
            Step::Provision(c) => self.confirmed_recipient(c).is_some(),
            Step::Issue(c) => self.confirmed_issuance(c).is_some(),
            Step::Finalize => self.finalization.is_finalized(),
            Step::ScheduleRelease => self.release_schedule.is_some(),
            Step::Report => self.manifest.is_some(),
        }
    }

    /// First step of `plan` not yet complete.
    pub fn next_pending_step<'a>(&self, plan: &'a [Step]) -> Option<&'a Step> {
        plan.iter().find(|step| !self.is_complete(step))
    }

    /// Confirmed recipients in table order.
    pub fn recipient_map(&self, table: &AllocationTable) -> GenesisResult<RecipientMap> {
        let mut map = RecipientMap::new();
        for name in table.names() {
            if let Some(account) = self.confirmed_recipient(name) {
                map.insert(account.clone())?;
            }
        }
        Ok(map)
    }

    /// Confirmed issuances in table order.
    pub fn issuance_records(&self, table: &AllocationTable) -> Vec<IssuanceRecord> {
        table
            .names()
            .filter_map(|name| self.confirmed_issuance(name).cloned())
            .collect()
    }

    /// Categories without a confirmed issuance.
    pub fn missing_issuances(&self, table: &AllocationTable) -> Vec<String> {
        table
            .names()
            .filter(|name| self.confirmed_issuance(name).is_none())
            .map(str::to_string)
            .collect()
    }

    /// Refuse to resume a checkpoint written under different parameters.
    pub fn ensure_compatible(
        &self,
        params: &AssetParams,
        table: &AllocationTable,
        allocations: &[Allocation],
    ) -> GenesisResult<()> {
        if self.version != CHECKPOINT_VERSION {
            return Err(GenesisError::CheckpointMismatch(format!(
                "checkpoint version {} is not supported (expected {CHECKPOINT_VERSION})",
                self.version
            )));
        }

        if let Some(asset) = self.confirmed_asset() {
            if !asset.matches(params) {
                return Err(GenesisError::CheckpointMismatch(format!(
                    "asset {} ({}, {} decimals, supply {}) differs from configuration",
                    asset.symbol, asset.name, asset.decimals, asset.total_supply
                )));
            }
        }

        for category in self.recipients.keys().chain(self.issuances.keys()) {
            if !table.contains(category) {
                return Err(GenesisError::CheckpointMismatch(format!(
                    "checkpoint records category {category} which is not configured"
                )));
            }
        }

        for allocation in allocations {
            if let Some(record) = self.confirmed_issuance(&allocation.category) {
                if record.quantity != allocation.quantity {
                    return Err(GenesisError::CheckpointMismatch(format!(
                        "category {} was issued {} units but configuration now allocates {}",
                        allocation.category, record.quantity, allocation.quantity
                    )));
                }
            }
        }

        if self.finalization.is_finalized() {
            let missing = self.missing_issuances(table);
            if !missing.is_empty() {
                return Err(GenesisError::CheckpointMismatch(format!(
                    "issuance was finalized without categories {missing:?}"
                )));
            }
        }

        Ok(())
    }
}
