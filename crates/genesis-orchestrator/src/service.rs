//! Genesis Orchestrator - drives a distribution run to completion
//!
//! Every ledger-touching step follows the same protocol:
//!
//! 1. Re-check any transaction the checkpoint recorded as pending.
//! 2. Verify the payer can cover the operation's cost.
//! 3. Sign, record the signature as pending, then submit.
//! 4. Poll until confirmed, failed, or the confirmation timeout elapses.
//! 5. Record the confirmed result.
//!
//! The checkpoint is saved before every submission and after every
//! confirmation, so a run interrupted at any point resumes without
//! repeating a confirmed operation.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use genesis_telemetry::{
    log_step_event, metric_inc, CONFIRMATION_WAIT, RUN_FAILURES, STEPS_COMPLETED, STEPS_SKIPPED,
    TRANSACTIONS_SUBMITTED, UNITS_ISSUED,
};
use parking_lot::Mutex;
use shared_crypto::{derive_holding_account, Ed25519KeyPair};
use shared_types::{AssetId, ConfirmationReceipt, PublicIdentity, TxSignature};
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::config::DistributionConfig;
use crate::domain::{
    plan, recipient_credential_name, verify_issued_total, Allocation, AllocationCategory,
    AllocationTable, AssetDefinition, FinalizationGate, FinalizationState, IssuanceRecord, LockIntent, LockStatus,
    ManifestBody, ManifestRecord, Operation, OperationKind, PendingTx, RecipientAccount,
    RecipientMap, ReleaseSchedule, RunCheckpoint, RunManifest, SignedOperation, Step, StepState,
    TxStatus, MANIFEST_VERSION,
};
use crate::error::{GenesisError, GenesisResult};
use crate::ports::inbound::{GenesisApi, GenesisOutcome, RunStatus, StepProgress, StepStatus};
use crate::ports::outbound::{
    CheckpointStore, Credential, CredentialProvider, LedgerClient, LedgerError, LockEnforcer,
    ManifestSink,
};

/// Credential that pays for every operation and holds issuance authority.
pub const CONTROLLER_CREDENTIAL: &str = "controller";

/// Credential whose public identity becomes the asset identifier.
pub const ASSET_CREDENTIAL: &str = "asset";

fn map_ledger_error(step: &Step, err: LedgerError) -> GenesisError {
    match err {
        LedgerError::Rejected(reason) => GenesisError::NetworkRejected {
            step: step.clone(),
            reason,
        },
        LedgerError::InsufficientFunds {
            required,
            available,
        } => GenesisError::InsufficientFunding {
            step: step.clone(),
            required,
            available,
        },
        LedgerError::Unavailable(reason) => GenesisError::LedgerUnavailable { reason },
    }
}

fn out_of_order(step: Step, requires: impl Into<String>) -> GenesisError {
    GenesisError::StepOutOfOrder {
        step,
        requires: requires.into(),
    }
}

/// Refusal for a per-category phase started before the asset exists.
fn asset_required(table: &AllocationTable, step: fn(String) -> Step) -> GenesisError {
    match table.categories().first() {
        Some(first) => out_of_order(step(first.name.clone()), Step::AssetInit.to_string()),
        None => GenesisError::InvalidConfig("allocation table has no categories".into()),
    }
}

/// The orchestrator.
///
/// Generic over its outbound ports so tests run entirely in memory and the
/// binary wires file-backed adapters.
pub struct GenesisOrchestrator<L, C, S, M, E>
where
    L: LedgerClient,
    C: CredentialProvider,
    S: CheckpointStore,
    M: ManifestSink,
    E: LockEnforcer,
{
    config: DistributionConfig,
    ledger: Arc<L>,
    credentials: Arc<C>,
    store: Arc<S>,
    manifest_sink: Arc<M>,
    lock_enforcer: Arc<E>,
    /// Last checkpoint saved by this process
    checkpoint: Mutex<Option<RunCheckpoint>>,
}

impl<L, C, S, M, E> GenesisOrchestrator<L, C, S, M, E>
where
    L: LedgerClient,
    C: CredentialProvider,
    S: CheckpointStore,
    M: ManifestSink,
    E: LockEnforcer,
{
    pub fn new(
        config: DistributionConfig,
        ledger: Arc<L>,
        credentials: Arc<C>,
        store: Arc<S>,
        manifest_sink: Arc<M>,
        lock_enforcer: Arc<E>,
    ) -> Self {
        Self {
            config,
            ledger,
            credentials,
            store,
            manifest_sink,
            lock_enforcer,
            checkpoint: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &DistributionConfig {
        &self.config
    }

    // =========================================================================
    // CHECKPOINT
    // =========================================================================

    /// Current checkpoint, loading (or starting) it on first use.
    fn load_checkpoint(&self) -> GenesisResult<RunCheckpoint> {
        let mut slot = self.checkpoint.lock();
        if let Some(checkpoint) = slot.as_ref() {
            return Ok(checkpoint.clone());
        }

        let checkpoint = match self.store.load()? {
            Some(checkpoint) => {
                checkpoint.ensure_compatible(
                    self.config.asset(),
                    self.config.table(),
                    self.config.allocations(),
                )?;
                info!("[genesis] Resuming run {}", checkpoint.run_id);
                checkpoint
            }
            None => {
                let checkpoint = RunCheckpoint::new(Utc::now());
                self.store.save(&checkpoint)?;
                info!("[genesis] Starting run {}", checkpoint.run_id);
                checkpoint
            }
        };
        *slot = Some(checkpoint.clone());
        Ok(checkpoint)
    }

    /// Apply `update` and persist before the in-memory copy moves on.
    fn update_checkpoint<R>(&self, update: impl FnOnce(&mut RunCheckpoint) -> R) -> GenesisResult<R> {
        let mut slot = self.checkpoint.lock();
        let mut next = slot
            .clone()
            .ok_or_else(|| GenesisError::storage("checkpoint updated before it was loaded"))?;
        let result = update(&mut next);
        next.touch(Utc::now());
        self.store.save(&next)?;
        *slot = Some(next);
        Ok(result)
    }

    fn step_completed(&self, step: &Step) {
        metric_inc!(STEPS_COMPLETED, &[step.kind()]);
        log_step_event!(debug, step, "step recorded in checkpoint");
    }

    // =========================================================================
    // LEDGER PROTOCOL
    // =========================================================================

    /// Controlling credential, refusing to go on until it is funded.
    async fn funded_controller(&self, step: &Step) -> GenesisResult<Credential> {
        let controller = self.credentials.load_or_create(CONTROLLER_CREDENTIAL)?;
        let identity = controller.identity();
        if controller.freshly_created {
            warn!(
                "[genesis] ⚠️ Generated controlling identity {}; fund it and re-run",
                identity
            );
            return Err(GenesisError::NeedsFunding { identity });
        }

        let balance = self
            .ledger
            .balance(&identity)
            .await
            .map_err(|e| map_ledger_error(step, e))?;
        if balance == 0 {
            warn!("[genesis] ⚠️ Controlling identity {} has no balance", identity);
            return Err(GenesisError::NeedsFunding { identity });
        }
        Ok(controller)
    }

    async fn ensure_funds(
        &self,
        step: &Step,
        payer: &PublicIdentity,
        kind: OperationKind,
    ) -> GenesisResult<()> {
        let required = self
            .ledger
            .operation_cost(kind)
            .await
            .map_err(|e| map_ledger_error(step, e))?;
        let available = self
            .ledger
            .balance(payer)
            .await
            .map_err(|e| map_ledger_error(step, e))?;
        if available < required {
            return Err(GenesisError::InsufficientFunding {
                step: step.clone(),
                required,
                available,
            });
        }
        Ok(())
    }

    /// Sign, record as pending, submit, and wait for confirmation.
    async fn execute(
        &self,
        step: &Step,
        operation: Operation,
        payer: &Ed25519KeyPair,
        co_signers: &[&Ed25519KeyPair],
        record_pending: impl FnOnce(&mut RunCheckpoint, PendingTx) + Send,
    ) -> GenesisResult<ConfirmationReceipt> {
        self.ensure_funds(step, &payer.identity(), operation.kind())
            .await?;

        let signed = SignedOperation::sign(operation, payer, co_signers)?;
        let pending = PendingTx::new(signed.clone(), Utc::now());
        self.update_checkpoint(|checkpoint| record_pending(checkpoint, pending))?;

        self.submit_and_confirm(step, signed).await
    }

    async fn submit_and_confirm(
        &self,
        step: &Step,
        signed: SignedOperation,
    ) -> GenesisResult<ConfirmationReceipt> {
        let kind = signed.operation.kind();
        let signature = signed.tx_signature();
        info!(
            "[genesis] 📤 Submitting {} for {} (tx {})",
            kind.label(),
            step,
            signature.short()
        );
        metric_inc!(TRANSACTIONS_SUBMITTED, &[kind.label()]);
        let accepted = self
            .ledger
            .submit(signed)
            .await
            .map_err(|e| map_ledger_error(step, e))?;
        if accepted != signature {
            warn!(
                "[genesis] Ledger acknowledged {} as {}; tracking the signed id",
                signature.short(),
                accepted.short()
            );
        }

        self.await_confirmation(step, signature).await
    }

    async fn await_confirmation(
        &self,
        step: &Step,
        signature: TxSignature,
    ) -> GenesisResult<ConfirmationReceipt> {
        let settings = self.config.ledger();
        let started = Instant::now();

        match tokio::time::timeout(
            settings.confirmation_timeout,
            self.poll_until_settled(step, signature),
        )
        .await
        {
            Ok(result) => {
                if result.is_ok() {
                    CONFIRMATION_WAIT.observe(started.elapsed().as_secs_f64());
                }
                result
            }
            Err(_) => {
                warn!(
                    "[genesis] ⏳ {} not confirmed within {:?} (tx {})",
                    step,
                    settings.confirmation_timeout,
                    signature.short()
                );
                Err(GenesisError::ConfirmationTimeout {
                    step: step.clone(),
                    signature,
                    waited_secs: settings.confirmation_timeout.as_secs(),
                })
            }
        }
    }

    async fn poll_until_settled(
        &self,
        step: &Step,
        signature: TxSignature,
    ) -> GenesisResult<ConfirmationReceipt> {
        let interval = self.config.ledger().poll_interval;
        loop {
            let status = self
                .ledger
                .transaction_status(&signature)
                .await
                .map_err(|e| map_ledger_error(step, e))?;
            match status {
                TxStatus::Confirmed { receipt } => {
                    debug!(
                        "[genesis] {} confirmed in slot {} (tx {})",
                        step,
                        receipt.slot,
                        signature.short()
                    );
                    return Ok(receipt);
                }
                TxStatus::Failed { reason } => {
                    return Err(GenesisError::NetworkRejected {
                        step: step.clone(),
                        reason,
                    });
                }
                TxStatus::Pending | TxStatus::NotFound => tokio::time::sleep(interval).await,
            }
        }
    }

    /// Settle a transaction a previous run submitted but never saw confirmed.
    ///
    /// A transaction the ledger has never seen is resent as the same signed
    /// envelope. `None` means it failed and must be signed afresh.
    async fn recover_pending(
        &self,
        step: &Step,
        checkpoint: &RunCheckpoint,
    ) -> GenesisResult<Option<ConfirmationReceipt>> {
        let Some(pending) = checkpoint.pending_tx(step) else {
            return Ok(None);
        };
        let status = self
            .ledger
            .transaction_status(&pending.signature)
            .await
            .map_err(|e| map_ledger_error(step, e))?;

        match status {
            TxStatus::Confirmed { receipt } => {
                info!(
                    "[genesis] ✅ {} confirmed while the previous run was down (tx {})",
                    step,
                    pending.signature.short()
                );
                Ok(Some(receipt))
            }
            TxStatus::Pending => self
                .await_confirmation(step, pending.signature)
                .await
                .map(Some),
            TxStatus::Failed { reason } => {
                warn!(
                    "[genesis] Previous {} transaction failed ({}); submitting again",
                    step, reason
                );
                Ok(None)
            }
            TxStatus::NotFound => {
                // May still be in flight; only the identical envelope dedupes.
                warn!(
                    "[genesis] Previous {} transaction {} not on the ledger; resending it",
                    step,
                    pending.signature.short()
                );
                let signed = pending.operation.clone();
                self.ensure_funds(step, &signed.payer, signed.operation.kind())
                    .await?;
                self.submit_and_confirm(step, signed).await.map(Some)
            }
        }
    }

    // =========================================================================
    // STEPS
    // =========================================================================

    /// Create the asset with the controller as issuance authority.
    pub async fn initialize_asset(&self) -> GenesisResult<AssetDefinition> {
        let step = Step::AssetInit;
        let checkpoint = self.load_checkpoint()?;
        if let Some(asset) = checkpoint.confirmed_asset() {
            debug!("[genesis] Asset {} already defined", asset.asset_id);
            return Ok(asset.clone());
        }

        let controller = self.funded_controller(&step).await?;
        let asset_key = self.credentials.load_or_create(ASSET_CREDENTIAL)?;
        let asset_id = AssetId::from(asset_key.identity());
        let params = self.config.asset();

        let receipt = match self.recover_pending(&step, &checkpoint).await? {
            Some(receipt) => receipt,
            None => {
                let operation = Operation::DefineAsset {
                    asset: asset_id,
                    decimals: params.decimals,
                    mint_authority: controller.identity(),
                    freeze_authority: params
                        .retain_freeze_authority
                        .then_some(controller.identity()),
                    name: params.name.clone(),
                    symbol: params.symbol.clone(),
                    metadata_uri: params.metadata_uri.clone(),
                };
                self.execute(
                    &step,
                    operation,
                    controller.keypair.as_ref(),
                    &[asset_key.keypair.as_ref()],
                    |checkpoint, pending| checkpoint.asset = Some(StepState::Pending(pending)),
                )
                .await?
            }
        };

        let definition =
            AssetDefinition::confirmed(params, asset_id, controller.identity(), receipt);
        self.update_checkpoint(|checkpoint| {
            checkpoint.asset = Some(StepState::Confirmed(definition.clone()))
        })?;
        self.step_completed(&step);
        info!(
            "[genesis] 🪙 Asset {} ({}) defined with {} decimals",
            definition.symbol, definition.asset_id, definition.decimals
        );
        Ok(definition)
    }

    /// Generate one identity and holding account per category.
    pub async fn provision_recipients(&self) -> GenesisResult<RecipientMap> {
        let checkpoint = self.load_checkpoint()?;
        let table = self.config.table();
        let asset = checkpoint
            .confirmed_asset()
            .cloned()
            .ok_or_else(|| asset_required(table, Step::Provision))?;

        let mut recipients = checkpoint.recipient_map(table)?;
        let mut controller: Option<Credential> = None;

        for category in table.iter() {
            if recipients.get(&category.name).is_some() {
                continue;
            }
            let step = Step::Provision(category.name.clone());
            let payer = match controller.take() {
                Some(credential) => credential,
                None => self.funded_controller(&step).await?,
            };

            let span = info_span!("genesis_step", step = %step);
            let account = self
                .provision_one(&step, category, &asset, &payer, &checkpoint)
                .instrument(span)
                .await?;
            controller = Some(payer);

            recipients.insert(account.clone())?;
            self.update_checkpoint(|checkpoint| {
                checkpoint
                    .recipients
                    .insert(category.name.clone(), StepState::Confirmed(account.clone()));
            })?;
            self.step_completed(&step);
            info!(
                "[genesis] 👤 Provisioned {} as {} (holding {})",
                category.name,
                account.public_identity.short(),
                account.holding_account.short()
            );
        }

        Ok(recipients)
    }

    async fn provision_one(
        &self,
        step: &Step,
        category: &AllocationCategory,
        asset: &AssetDefinition,
        controller: &Credential,
        checkpoint: &RunCheckpoint,
    ) -> GenesisResult<RecipientAccount> {
        let recipient = self
            .credentials
            .load_or_create(&recipient_credential_name(&category.name))?;
        let owner = recipient.identity();
        let holding_account = derive_holding_account(&owner, &asset.asset_id);

        let receipt = match self.recover_pending(step, checkpoint).await? {
            Some(receipt) => receipt,
            None => {
                let name = category.name.clone();
                self.execute(
                    step,
                    Operation::CreateHoldingAccount {
                        owner,
                        asset: asset.asset_id,
                    },
                    controller.keypair.as_ref(),
                    &[],
                    move |checkpoint, pending| {
                        checkpoint
                            .recipients
                            .insert(name, StepState::Pending(pending));
                    },
                )
                .await?
            }
        };

        Ok(RecipientAccount {
            category: category.name.clone(),
            public_identity: owner,
            holding_account,
            provisioned_at: receipt.confirmed_at,
            receipt,
        })
    }

    /// Issue every category its allocation, then reconcile against the ledger
    /// while finalization is still open.
    pub async fn issue_all(&self) -> GenesisResult<Vec<IssuanceRecord>> {
        let checkpoint = self.load_checkpoint()?;
        let table = self.config.table();
        let asset = checkpoint
            .confirmed_asset()
            .cloned()
            .ok_or_else(|| asset_required(table, Step::Issue))?;

        let recipients = checkpoint.recipient_map(table)?;
        if let Some(category) = recipients.missing(table).into_iter().next() {
            return Err(out_of_order(
                Step::Issue(category.clone()),
                Step::Provision(category).to_string(),
            ));
        }

        let mut controller: Option<Credential> = None;
        for allocation in self.config.allocations() {
            if checkpoint.confirmed_issuance(&allocation.category).is_some() {
                continue;
            }
            let step = Step::Issue(allocation.category.clone());
            let recipient = recipients.get(&allocation.category).ok_or_else(|| {
                out_of_order(step.clone(), Step::Provision(allocation.category.clone()).to_string())
            })?;
            let payer = match controller.take() {
                Some(credential) => credential,
                None => self.funded_controller(&step).await?,
            };

            let span = info_span!("genesis_step", step = %step);
            let record = self
                .issue_one(&step, allocation, recipient, &asset, &payer, &checkpoint)
                .instrument(span)
                .await?;
            controller = Some(payer);

            self.update_checkpoint(|checkpoint| {
                checkpoint.issuances.insert(
                    allocation.category.clone(),
                    StepState::Confirmed(record.clone()),
                );
            })?;
            self.step_completed(&step);
            UNITS_ISSUED.inc_by(record.quantity);
            info!(
                "[genesis] 💸 Issued {} units to {} ({})",
                record.quantity,
                record.category,
                record.destination.short()
            );
        }

        let latest = self.load_checkpoint()?;
        let records = latest.issuance_records(table);
        verify_issued_total(&records, self.config.total_units()?)?;
        // Holdings belong to their recipients once authority is revoked.
        if !latest.finalization.is_finalized() {
            self.reconcile_holdings(&records).await?;
        }
        Ok(records)
    }

    async fn issue_one(
        &self,
        step: &Step,
        allocation: &Allocation,
        recipient: &RecipientAccount,
        asset: &AssetDefinition,
        controller: &Credential,
        checkpoint: &RunCheckpoint,
    ) -> GenesisResult<IssuanceRecord> {
        let receipt = match self.recover_pending(step, checkpoint).await? {
            Some(receipt) => receipt,
            None => {
                let name = allocation.category.clone();
                self.execute(
                    step,
                    Operation::Issue {
                        asset: asset.asset_id,
                        destination: recipient.holding_account,
                        quantity: allocation.quantity,
                    },
                    controller.keypair.as_ref(),
                    &[],
                    move |checkpoint, pending| {
                        checkpoint
                            .issuances
                            .insert(name, StepState::Pending(pending));
                    },
                )
                .await?
            }
        };

        Ok(IssuanceRecord {
            category: allocation.category.clone(),
            quantity: allocation.quantity,
            destination: recipient.holding_account,
            receipt,
        })
    }

    /// Every holding must carry exactly its recorded quantity.
    async fn reconcile_holdings(&self, records: &[IssuanceRecord]) -> GenesisResult<()> {
        for record in records {
            let step = Step::Issue(record.category.clone());
            let held = self
                .ledger
                .holding_balance(&record.destination)
                .await
                .map_err(|e| map_ledger_error(&step, e))?;
            if held != record.quantity {
                error!(
                    "[genesis] ❌ Holding for {} carries {} units, checkpoint records {}",
                    record.category, held, record.quantity
                );
                return Err(GenesisError::AccountingInvariantViolation {
                    reason: format!(
                        "holding {} for {} carries {held} units but {} were issued",
                        record.destination, record.category, record.quantity
                    ),
                });
            }
        }
        Ok(())
    }

    /// Revoke issuance authority. Refused until every category is issued.
    pub async fn finalize(&self) -> GenesisResult<FinalizationState> {
        let step = Step::Finalize;
        let checkpoint = self.load_checkpoint()?;
        let mut gate = FinalizationGate::new(checkpoint.finalization.clone());
        gate.ensure_ready(&checkpoint.missing_issuances(self.config.table()))?;

        let asset = checkpoint
            .confirmed_asset()
            .cloned()
            .ok_or_else(|| out_of_order(step.clone(), Step::AssetInit.to_string()))?;
        let controller = self.funded_controller(&step).await?;

        let receipt = match self.recover_pending(&step, &checkpoint).await? {
            Some(receipt) => receipt,
            None => {
                self.execute(
                    &step,
                    Operation::RevokeIssuanceAuthority {
                        asset: asset.asset_id,
                    },
                    controller.keypair.as_ref(),
                    &[],
                    |checkpoint, pending| checkpoint.revocation = Some(pending),
                )
                .await?
            }
        };

        let state = gate.complete(receipt)?.clone();
        self.update_checkpoint(|checkpoint| {
            checkpoint.finalization = state.clone();
            checkpoint.revocation = None;
        })?;
        self.step_completed(&step);
        info!(
            "[genesis] 🔒 Issuance authority for {} revoked; supply is fixed",
            asset.asset_id
        );
        Ok(state)
    }

    /// Record a lock intent for every time-restricted category.
    pub async fn schedule_releases(&self) -> GenesisResult<Vec<LockIntent>> {
        let step = Step::ScheduleRelease;
        let checkpoint = self.load_checkpoint()?;
        if let Some(schedule) = &checkpoint.release_schedule {
            return Ok(schedule.intents.clone());
        }
        if !checkpoint.finalization.is_finalized() {
            return Err(out_of_order(step, Step::Finalize.to_string()));
        }

        let table = self.config.table();
        let recipients = checkpoint.recipient_map(table)?;
        let mut intents = Vec::new();

        for category in table.iter().filter(|c| c.is_time_restricted) {
            let missing = |what: &str| GenesisError::AccountingInvariantViolation {
                reason: format!("finalized run has no {what} for {}", category.name),
            };
            let recipient = recipients
                .get(&category.name)
                .ok_or_else(|| missing("recipient"))?;
            let issued = checkpoint
                .confirmed_issuance(&category.name)
                .ok_or_else(|| missing("issuance"))?;

            let mut intent = LockIntent::new(
                category.name.clone(),
                recipient.public_identity,
                recipient.holding_account,
                issued.quantity,
                category.lock_duration_secs.unwrap_or_default(),
                recipient.provisioned_at,
                category.release,
            )?;

            if let Some(activation) = self.lock_enforcer.activate(&intent).await? {
                info!(
                    "[genesis] ⏱️ Lock for {} active until {} ({})",
                    intent.category, intent.unlock_at, activation.reference
                );
                intent.status = LockStatus::Active {
                    reference: activation.reference,
                    activated_at: activation.activated_at,
                };
            }
            intents.push(intent);
        }

        let schedule = ReleaseSchedule {
            intents: intents.clone(),
            recorded_at: Utc::now(),
        };
        self.update_checkpoint(|checkpoint| checkpoint.release_schedule = Some(schedule))?;
        self.step_completed(&step);
        info!("[genesis] Release schedule recorded ({} locks)", intents.len());
        Ok(intents)
    }

    /// Assemble and persist the run manifest. Written at most once per run.
    pub async fn write_manifest(&self) -> GenesisResult<RunManifest> {
        let step = Step::Report;
        let checkpoint = self.load_checkpoint()?;

        // a manifest that landed before the checkpoint recorded it is adopted
        if let Some(existing) = self.manifest_sink.read()? {
            if existing.run_id() == checkpoint.run_id && existing.verify_digest() {
                if checkpoint.manifest.is_none() {
                    let record = ManifestRecord {
                        digest: existing.digest.clone(),
                        written_at: existing.body.created_at,
                    };
                    self.update_checkpoint(|checkpoint| checkpoint.manifest = Some(record))?;
                    self.step_completed(&step);
                }
                return Ok(existing);
            }
        }
        if let Some(recorded) = &checkpoint.manifest {
            return Err(GenesisError::ReportFailed {
                reason: format!("recorded manifest {} can no longer be read", recorded.digest),
            });
        }

        let schedule = checkpoint
            .release_schedule
            .clone()
            .ok_or_else(|| out_of_order(step.clone(), Step::ScheduleRelease.to_string()))?;
        let asset = checkpoint
            .confirmed_asset()
            .cloned()
            .ok_or_else(|| out_of_order(step.clone(), Step::AssetInit.to_string()))?;

        let table = self.config.table();
        let issuances = checkpoint.issuance_records(table);
        let total_issued = issuances.iter().map(|r| r.quantity).sum::<u64>();
        let manifest = RunManifest::new(ManifestBody {
            version: MANIFEST_VERSION,
            run_id: checkpoint.run_id,
            created_at: Utc::now(),
            asset,
            recipients: checkpoint.recipient_map(table)?.ordered_by(table),
            issuances,
            total_issued,
            finalization: checkpoint.finalization.clone(),
            release_schedule: schedule.intents,
        })?;

        self.manifest_sink.write(&manifest).map_err(|e| match e {
            GenesisError::ReportFailed { .. } => e,
            other => GenesisError::ReportFailed {
                reason: other.to_string(),
            },
        })?;

        let record = ManifestRecord {
            digest: manifest.digest.clone(),
            written_at: manifest.body.created_at,
        };
        self.update_checkpoint(|checkpoint| checkpoint.manifest = Some(record))?;
        self.step_completed(&step);
        Ok(manifest)
    }

    // =========================================================================
    // RUN
    // =========================================================================

    /// Execute every remaining step in order.
    pub async fn run(&self) -> GenesisResult<GenesisOutcome> {
        let result = self.run_remaining().await;
        if let Err(e) = &result {
            metric_inc!(RUN_FAILURES, &[e.kind()]);
            error!(
                "[genesis] ❌ Run stopped: {} (safe to re-run: {})",
                e,
                e.is_retryable()
            );
        }
        result
    }

    async fn run_remaining(&self) -> GenesisResult<GenesisOutcome> {
        let checkpoint = self.load_checkpoint()?;
        let steps = plan(self.config.table());
        let (steps_skipped, steps_executed): (Vec<Step>, Vec<Step>) = steps
            .iter()
            .cloned()
            .partition(|step| checkpoint.is_complete(step));
        for step in &steps_skipped {
            metric_inc!(STEPS_SKIPPED, &[step.kind()]);
        }

        let Some(next) = steps_executed.first().cloned() else {
            info!("[genesis] Run {} already complete", checkpoint.run_id);
            let manifest = self.write_manifest().await?;
            return Ok(GenesisOutcome {
                manifest,
                steps_executed,
                steps_skipped,
            });
        };
        info!(
            "[genesis] ▶️ Run {}: {} of {} steps remaining, starting at {}",
            checkpoint.run_id,
            steps_executed.len(),
            steps.len(),
            next
        );

        // fail fast before anything is signed
        if steps_executed.iter().any(Step::touches_ledger) {
            self.funded_controller(&next).await?;
        }

        self.initialize_asset()
            .instrument(info_span!("genesis_step", step = "asset-init"))
            .await?;
        self.provision_recipients().await?;
        self.issue_all().await?;
        if !self.load_checkpoint()?.finalization.is_finalized() {
            self.finalize()
                .instrument(info_span!("genesis_step", step = "finalize"))
                .await?;
        }
        self.schedule_releases()
            .instrument(info_span!("genesis_step", step = "schedule-release"))
            .await?;
        let manifest = self
            .write_manifest()
            .instrument(info_span!("genesis_step", step = "report"))
            .await?;

        info!(
            "[genesis] 🎉 Distribution complete: {} units of {} across {} categories (digest {})",
            manifest.body.total_issued,
            manifest.body.asset.symbol,
            manifest.body.issuances.len(),
            manifest.digest
        );
        Ok(GenesisOutcome {
            manifest,
            steps_executed,
            steps_skipped,
        })
    }

    /// Ordered steps and per-category quantities. Touches nothing.
    pub fn plan(&self) -> (Vec<Step>, Vec<Allocation>) {
        (plan(self.config.table()), self.config.allocations().to_vec())
    }

    /// Progress recorded so far. Never creates a checkpoint.
    pub fn status(&self) -> GenesisResult<RunStatus> {
        let cached = self.checkpoint.lock().clone();
        let checkpoint = match cached {
            Some(checkpoint) => Some(checkpoint),
            None => self.store.load()?,
        };

        let steps = plan(self.config.table())
            .into_iter()
            .map(|step| {
                let progress = match &checkpoint {
                    Some(cp) if cp.is_complete(&step) => StepProgress::Complete,
                    Some(cp) => match cp.pending_tx(&step) {
                        Some(pending) => StepProgress::Pending {
                            signature: pending.signature,
                        },
                        None => StepProgress::NotStarted,
                    },
                    None => StepProgress::NotStarted,
                };
                StepStatus { step, progress }
            })
            .collect();

        Ok(RunStatus {
            run_id: checkpoint.map(|cp| cp.run_id),
            steps,
        })
    }
}

#[async_trait]
impl<L, C, S, M, E> GenesisApi for GenesisOrchestrator<L, C, S, M, E>
where
    L: LedgerClient,
    C: CredentialProvider,
    S: CheckpointStore,
    M: ManifestSink,
    E: LockEnforcer,
{
    fn plan(&self) -> (Vec<Step>, Vec<Allocation>) {
        GenesisOrchestrator::plan(self)
    }

    async fn run(&self) -> GenesisResult<GenesisOutcome> {
        GenesisOrchestrator::run(self).await
    }

    async fn initialize_asset(&self) -> GenesisResult<AssetDefinition> {
        GenesisOrchestrator::initialize_asset(self).await
    }

    async fn provision_recipients(&self) -> GenesisResult<RecipientMap> {
        GenesisOrchestrator::provision_recipients(self).await
    }

    async fn issue_all(&self) -> GenesisResult<Vec<IssuanceRecord>> {
        GenesisOrchestrator::issue_all(self).await
    }

    async fn finalize(&self) -> GenesisResult<FinalizationState> {
        GenesisOrchestrator::finalize(self).await
    }

    async fn schedule_releases(&self) -> GenesisResult<Vec<LockIntent>> {
        GenesisOrchestrator::schedule_releases(self).await
    }

    async fn write_manifest(&self) -> GenesisResult<RunManifest> {
        GenesisOrchestrator::write_manifest(self).await
    }

    fn status(&self) -> GenesisResult<RunStatus> {
        GenesisOrchestrator::status(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{
        InMemoryCheckpointStore, InMemoryCredentialStore, InMemoryLedger, InMemoryManifestSink,
        UnconfiguredLockEnforcer,
    };
    use crate::config::{LedgerSettings, StorageSettings};
    use crate::domain::{AssetParams, ReleaseKind};
    use crate::ports::outbound::LockActivation;
    use std::time::Duration;

    const FUNDING: u64 = 1_000_000_000_000;

    fn config() -> DistributionConfig {
        let categories = vec![
            AllocationCategory::new("community", "40".parse().unwrap()),
            AllocationCategory::new("team", "25".parse().unwrap())
                .time_restricted(
                    31_536_000,
                    ReleaseKind::Linear {
                        interval_secs: 2_592_000,
                        periods: 12,
                    },
                ),
            AllocationCategory::new("treasury", "20".parse().unwrap()),
            AllocationCategory::new("liquidity", "10".parse().unwrap()),
            AllocationCategory::new("advisors", "5".parse().unwrap())
                .time_restricted(15_768_000, ReleaseKind::Cliff),
        ];
        DistributionConfig::new(
            AssetParams {
                name: "Genesis Token".into(),
                symbol: "GEN".into(),
                decimals: 9,
                total_supply: 1_000_000_000,
                retain_freeze_authority: false,
                metadata_uri: None,
            },
            categories,
            LedgerSettings {
                confirmation_timeout: Duration::from_secs(5),
                poll_interval: Duration::from_millis(100),
            },
            StorageSettings::default(),
        )
        .unwrap()
    }

    /// Records every activation and hands out sequential references.
    #[derive(Default)]
    struct RecordingEnforcer {
        activated: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl crate::ports::outbound::LockEnforcer for RecordingEnforcer {
        async fn activate(&self, intent: &LockIntent) -> GenesisResult<Option<LockActivation>> {
            let mut activated = self.activated.lock();
            activated.push(intent.category.clone());
            Ok(Some(LockActivation {
                reference: format!("lock-{}", activated.len()),
                activated_at: Utc::now(),
            }))
        }
    }

    /// Shared adapters; each `orchestrator()` call is a fresh process.
    struct Harness {
        ledger: Arc<InMemoryLedger>,
        credentials: Arc<InMemoryCredentialStore>,
        store: Arc<InMemoryCheckpointStore>,
        sink: Arc<InMemoryManifestSink>,
    }

    type TestOrchestrator<E = UnconfiguredLockEnforcer> = GenesisOrchestrator<
        InMemoryLedger,
        InMemoryCredentialStore,
        InMemoryCheckpointStore,
        InMemoryManifestSink,
        E,
    >;

    impl Harness {
        fn new() -> Self {
            Self {
                ledger: Arc::new(InMemoryLedger::new()),
                credentials: Arc::new(InMemoryCredentialStore::new()),
                store: Arc::new(InMemoryCheckpointStore::new()),
                sink: Arc::new(InMemoryManifestSink::new()),
            }
        }

        fn funded() -> Self {
            let harness = Self::new();
            harness.fund_controller(FUNDING);
            harness
        }

        fn fund_controller(&self, amount: u64) {
            let controller = self.credentials.load_or_create(CONTROLLER_CREDENTIAL).unwrap();
            self.ledger.fund(&controller.identity(), amount).unwrap();
        }

        fn orchestrator(&self) -> TestOrchestrator {
            self.orchestrator_with(Arc::new(UnconfiguredLockEnforcer))
        }

        fn orchestrator_with<E: LockEnforcer>(&self, enforcer: Arc<E>) -> TestOrchestrator<E> {
            GenesisOrchestrator::new(
                config(),
                self.ledger.clone(),
                self.credentials.clone(),
                self.store.clone(),
                self.sink.clone(),
                enforcer,
            )
        }

        fn checkpoint(&self) -> RunCheckpoint {
            self.store.snapshot().unwrap()
        }
    }

    fn holding_amount(harness: &Harness, checkpoint: &RunCheckpoint, category: &str) -> u64 {
        let recipient = checkpoint.confirmed_recipient(category).unwrap();
        harness
            .ledger
            .holding(&recipient.holding_account)
            .map(|h| h.amount)
            .unwrap_or(0)
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_run_distributes_supply() {
        let harness = Harness::funded();
        let outcome = harness.orchestrator().run().await.unwrap();

        assert_eq!(outcome.steps_executed.len(), 14);
        assert!(outcome.steps_skipped.is_empty());

        let checkpoint = harness.checkpoint();
        let expected = [
            ("community", 400_000_000_000_000_000u64),
            ("team", 250_000_000_000_000_000),
            ("treasury", 200_000_000_000_000_000),
            ("liquidity", 100_000_000_000_000_000),
            ("advisors", 50_000_000_000_000_000),
        ];
        for (category, quantity) in expected {
            assert_eq!(holding_amount(&harness, &checkpoint, category), quantity);
        }

        let manifest = &outcome.manifest;
        assert_eq!(manifest.body.total_issued, 1_000_000_000_000_000_000);
        assert!(manifest.verify_digest());
        assert!(manifest.body.finalization.is_finalized());
        assert_eq!(manifest.body.recipients.len(), 5);

        let asset = harness.ledger.asset(&manifest.body.asset.asset_id).unwrap();
        assert_eq!(asset.mint_authority, None);
        assert_eq!(asset.supply, 1_000_000_000_000_000_000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_distinct_recipient_identities() {
        let harness = Harness::funded();
        let outcome = harness.orchestrator().run().await.unwrap();

        let mut identities: Vec<_> = outcome
            .manifest
            .body
            .recipients
            .iter()
            .map(|r| r.public_identity)
            .collect();
        identities.sort_by_key(|id| id.0);
        identities.dedup();
        assert_eq!(identities.len(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_controller_needs_funding() {
        let harness = Harness::new();
        let err = harness.orchestrator().run().await.unwrap_err();

        let controller = harness
            .credentials
            .peek_identity(CONTROLLER_CREDENTIAL)
            .unwrap()
            .unwrap();
        assert!(matches!(err, GenesisError::NeedsFunding { identity } if identity == controller));
        assert_eq!(harness.ledger.submission_count(OperationKind::DefineAsset), 0);

        // same identity on the next attempt, which now succeeds
        harness.fund_controller(FUNDING);
        harness.orchestrator().run().await.unwrap();
        assert_eq!(
            harness.credentials.peek_identity(CONTROLLER_CREDENTIAL).unwrap(),
            Some(controller)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_unfunded_existing_controller_needs_funding() {
        let harness = Harness::new();
        harness.credentials.load_or_create(CONTROLLER_CREDENTIAL).unwrap();

        let err = harness.orchestrator().run().await.unwrap_err();
        assert!(matches!(err, GenesisError::NeedsFunding { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_insufficient_funding_stops_before_submission() {
        let harness = Harness::new();
        harness.fund_controller(1_000);

        let err = harness.orchestrator().run().await.unwrap_err();
        assert!(matches!(
            err,
            GenesisError::InsufficientFunding {
                step: Step::AssetInit,
                available: 1_000,
                ..
            }
        ));
        assert_eq!(harness.ledger.submission_count(OperationKind::DefineAsset), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resume_never_reissues_confirmed_category() {
        let harness = Harness::funded();
        harness
            .ledger
            .reject_after(OperationKind::Issue, 1, "blockhash expired");

        let err = harness.orchestrator().run().await.unwrap_err();
        assert!(
            matches!(err, GenesisError::NetworkRejected { ref step, .. } if *step == Step::Issue("team".into()))
        );
        assert!(harness.checkpoint().confirmed_issuance("community").is_some());

        let outcome = harness.orchestrator().run().await.unwrap();
        assert!(outcome.steps_skipped.contains(&Step::Issue("community".into())));

        // 5 accepted plus the one rejection
        assert_eq!(harness.ledger.submission_count(OperationKind::Issue), 6);
        let checkpoint = harness.checkpoint();
        assert_eq!(
            holding_amount(&harness, &checkpoint, "community"),
            400_000_000_000_000_000
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_interrupted_provisioning_resumes_remaining_categories() {
        let harness = Harness::funded();
        harness
            .ledger
            .reject_after(OperationKind::CreateHoldingAccount, 3, "node busy");

        assert!(harness.orchestrator().run().await.is_err());
        let before = harness.checkpoint();
        let provisioned: Vec<_> = ["community", "team", "treasury"]
            .iter()
            .map(|c| before.confirmed_recipient(c).unwrap().public_identity)
            .collect();
        assert!(before.confirmed_recipient("liquidity").is_none());

        harness.orchestrator().run().await.unwrap();
        // 3 first time, 1 rejected, 2 on resume
        assert_eq!(
            harness.ledger.submission_count(OperationKind::CreateHoldingAccount),
            6
        );
        let after = harness.checkpoint();
        for (category, identity) in ["community", "team", "treasury"].iter().zip(provisioned) {
            assert_eq!(after.confirmed_recipient(category).unwrap().public_identity, identity);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_premature_finalization_refused() {
        let harness = Harness::funded();
        let orchestrator = harness.orchestrator();
        orchestrator.initialize_asset().await.unwrap();
        orchestrator.provision_recipients().await.unwrap();

        let err = orchestrator.finalize().await.unwrap_err();
        match err {
            GenesisError::PrematureFinalization { missing } => assert_eq!(missing.len(), 5),
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(
            harness
                .ledger
                .submission_count(OperationKind::RevokeIssuanceAuthority),
            0
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_finalize_does_not_contact_ledger() {
        let harness = Harness::funded();
        harness.orchestrator().run().await.unwrap();

        harness.ledger.set_unavailable(true);
        let err = harness.orchestrator().finalize().await.unwrap_err();
        assert!(matches!(err, GenesisError::AlreadyFinalized));
        assert_eq!(
            harness
                .ledger
                .submission_count(OperationKind::RevokeIssuanceAuthority),
            1
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_confirmed_while_down_is_not_resubmitted() {
        let harness = Harness::funded();
        harness.ledger.withhold_next(OperationKind::Issue, u32::MAX);

        let err = harness.orchestrator().run().await.unwrap_err();
        assert!(matches!(err, GenesisError::ConfirmationTimeout { .. }));
        assert!(err.is_retryable());
        let pending = harness.checkpoint();
        assert!(pending.pending_tx(&Step::Issue("community".into())).is_some());

        harness.ledger.release_withheld();
        harness.orchestrator().run().await.unwrap();

        assert_eq!(harness.ledger.submission_count(OperationKind::Issue), 5);
        let checkpoint = harness.checkpoint();
        assert_eq!(
            holding_amount(&harness, &checkpoint, "community"),
            400_000_000_000_000_000
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_lost_submission_is_resubmitted() {
        let harness = Harness::funded();
        harness.ledger.lose_next(OperationKind::Issue);

        let err = harness.orchestrator().run().await.unwrap_err();
        assert!(matches!(err, GenesisError::ConfirmationTimeout { .. }));

        harness.orchestrator().run().await.unwrap();
        assert_eq!(harness.ledger.submission_count(OperationKind::Issue), 6);
        let checkpoint = harness.checkpoint();
        assert_eq!(
            holding_amount(&harness, &checkpoint, "community"),
            400_000_000_000_000_000
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_transaction_is_rejected_then_retried() {
        let harness = Harness::funded();
        harness
            .ledger
            .fail_next(OperationKind::DefineAsset, "compute budget exceeded");

        let err = harness.orchestrator().run().await.unwrap_err();
        assert!(matches!(
            err,
            GenesisError::NetworkRejected { step: Step::AssetInit, ref reason } if reason.contains("compute budget")
        ));

        harness.orchestrator().run().await.unwrap();
        assert_eq!(harness.ledger.submission_count(OperationKind::DefineAsset), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ledger_unavailable_is_reported() {
        let harness = Harness::funded();
        harness.ledger.set_unavailable(true);

        let err = harness.orchestrator().run().await.unwrap_err();
        assert!(matches!(err, GenesisError::LedgerUnavailable { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_completed_run_is_idempotent() {
        let harness = Harness::funded();
        let first = harness.orchestrator().run().await.unwrap();

        harness.ledger.set_unavailable(true);
        let second = harness.orchestrator().run().await.unwrap();
        assert!(second.steps_executed.is_empty());
        assert_eq!(second.steps_skipped.len(), 14);
        assert_eq!(second.manifest.digest, first.manifest.digest);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unconfigured_locks_stay_intended() {
        let harness = Harness::funded();
        let outcome = harness.orchestrator().run().await.unwrap();

        let schedule = &outcome.manifest.body.release_schedule;
        assert_eq!(schedule.len(), 2);
        assert!(schedule.iter().all(|intent| !intent.is_active()));

        let team = schedule.iter().find(|i| i.category == "team").unwrap();
        let recipient = harness.checkpoint().confirmed_recipient("team").cloned().unwrap();
        assert_eq!(team.quantity, 250_000_000_000_000_000);
        assert_eq!(team.locked_from, recipient.provisioned_at);
        assert_eq!(
            team.unlock_at,
            recipient.provisioned_at + chrono::Duration::seconds(31_536_000)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_configured_enforcer_activates_locks() {
        let harness = Harness::funded();
        let enforcer = Arc::new(RecordingEnforcer::default());
        let outcome = harness
            .orchestrator_with(enforcer.clone())
            .run()
            .await
            .unwrap();

        assert_eq!(*enforcer.activated.lock(), vec!["team".to_string(), "advisors".to_string()]);
        assert!(outcome
            .manifest
            .body
            .release_schedule
            .iter()
            .all(LockIntent::is_active));
    }

    #[tokio::test(start_paused = true)]
    async fn test_manifest_failure_keeps_ledger_state() {
        let harness = Harness::funded();
        harness.sink.fail_writes(true);

        let err = harness.orchestrator().run().await.unwrap_err();
        assert!(matches!(err, GenesisError::ReportFailed { .. }));
        assert!(harness.checkpoint().finalization.is_finalized());

        harness.sink.fail_writes(false);
        let submissions = harness.ledger.submission_count(OperationKind::Issue);
        let outcome = harness.orchestrator().run().await.unwrap();
        assert_eq!(outcome.steps_executed, vec![Step::Report]);
        assert_eq!(harness.ledger.submission_count(OperationKind::Issue), submissions);
    }

    #[tokio::test(start_paused = true)]
    async fn test_report_only_resume_needs_no_ledger() {
        let harness = Harness::funded();
        harness.sink.fail_writes(true);
        assert!(matches!(
            harness.orchestrator().run().await,
            Err(GenesisError::ReportFailed { .. })
        ));

        harness.sink.fail_writes(false);
        harness.ledger.set_unavailable(true);
        let outcome = harness.orchestrator().run().await.unwrap();
        assert_eq!(outcome.steps_executed, vec![Step::Report]);
        assert!(outcome.manifest.verify_digest());
        assert_eq!(outcome.manifest.body.total_issued, 1_000_000_000_000_000_000);
        assert_eq!(harness.sink.read().unwrap(), Some(outcome.manifest));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delayed_original_lands_after_resend_without_double_issuance() {
        let harness = Harness::funded();
        harness.ledger.delay_next(OperationKind::Issue);

        let err = harness.orchestrator().run().await.unwrap_err();
        assert!(matches!(
            err,
            GenesisError::ConfirmationTimeout { ref step, .. } if *step == Step::Issue("community".into())
        ));
        let pending = harness
            .checkpoint()
            .pending_tx(&Step::Issue("community".into()))
            .cloned()
            .unwrap();

        harness.orchestrator().run().await.unwrap();
        assert_eq!(harness.ledger.deliver_delayed().unwrap(), 0);

        let checkpoint = harness.checkpoint();
        let issued = checkpoint.confirmed_issuance("community").unwrap();
        assert_eq!(issued.receipt.signature, pending.signature);
        assert_eq!(
            holding_amount(&harness, &checkpoint, "community"),
            400_000_000_000_000_000
        );
        let asset_id = checkpoint.confirmed_asset().unwrap().asset_id;
        assert_eq!(
            harness.ledger.asset(&asset_id).unwrap().supply,
            1_000_000_000_000_000_000
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_manifest_written_before_checkpoint_is_adopted() {
        let harness = Harness::funded();
        let outcome = harness.orchestrator().run().await.unwrap();

        // lose the checkpoint's record of the manifest
        let mut checkpoint = harness.checkpoint();
        checkpoint.manifest = None;
        let store = Arc::new(InMemoryCheckpointStore::with_checkpoint(checkpoint));
        let orchestrator = GenesisOrchestrator::new(
            config(),
            harness.ledger.clone(),
            harness.credentials.clone(),
            store.clone(),
            harness.sink.clone(),
            Arc::new(UnconfiguredLockEnforcer),
        );

        let manifest = orchestrator.write_manifest().await.unwrap();
        assert_eq!(manifest.digest, outcome.manifest.digest);
        assert_eq!(
            store.snapshot().unwrap().manifest.map(|m| m.digest),
            Some(outcome.manifest.digest)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_steps_out_of_order_are_refused() {
        let harness = Harness::funded();
        let orchestrator = harness.orchestrator();

        assert!(matches!(
            orchestrator.provision_recipients().await,
            Err(GenesisError::StepOutOfOrder { ref step, .. }) if *step == Step::Provision("community".into())
        ));
        assert!(matches!(
            orchestrator.issue_all().await,
            Err(GenesisError::StepOutOfOrder { ref step, .. }) if *step == Step::Issue("community".into())
        ));
        assert!(matches!(
            orchestrator.schedule_releases().await,
            Err(GenesisError::StepOutOfOrder { .. })
        ));
        assert!(matches!(
            orchestrator.write_manifest().await,
            Err(GenesisError::StepOutOfOrder { .. })
        ));

        orchestrator.initialize_asset().await.unwrap();
        assert!(matches!(
            orchestrator.issue_all().await,
            Err(GenesisError::StepOutOfOrder { ref step, .. }) if *step == Step::Issue("community".into())
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_changed_configuration_is_refused_on_resume() {
        let harness = Harness::funded();
        harness.orchestrator().initialize_asset().await.unwrap();

        let mut params = config().asset().clone();
        params.decimals = 6;
        let changed = DistributionConfig::new(
            params,
            config().table().categories().to_vec(),
            config().ledger().clone(),
            StorageSettings::default(),
        )
        .unwrap();
        let orchestrator = GenesisOrchestrator::new(
            changed,
            harness.ledger.clone(),
            harness.credentials.clone(),
            harness.store.clone(),
            harness.sink.clone(),
            Arc::new(UnconfiguredLockEnforcer),
        );

        assert!(matches!(
            orchestrator.run().await,
            Err(GenesisError::CheckpointMismatch(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_reports_progress() {
        let harness = Harness::funded();
        let status = harness.orchestrator().status().unwrap();
        assert_eq!(status.run_id, None);
        assert_eq!(status.next_step(), Some(&Step::AssetInit));
        assert!(harness.store.snapshot().is_none());

        harness.ledger.withhold_next(OperationKind::DefineAsset, u32::MAX);
        assert!(harness.orchestrator().run().await.is_err());

        let status = harness.orchestrator().status().unwrap();
        assert!(status.run_id.is_some());
        assert!(matches!(
            status.steps[0].progress,
            StepProgress::Pending { .. }
        ));

        harness.ledger.release_withheld();
        harness.orchestrator().run().await.unwrap();
        assert!(harness.orchestrator().status().unwrap().is_complete());
    }

    #[test]
    fn test_plan_touches_nothing() {
        let harness = Harness::new();
        let (steps, allocations) = harness.orchestrator().plan();

        assert_eq!(steps.first(), Some(&Step::AssetInit));
        assert_eq!(steps.last(), Some(&Step::Report));
        assert_eq!(allocations.len(), 5);
        assert!(harness.store.snapshot().is_none());
        assert_eq!(harness.credentials.len(), 0);
    }
}
