//! In-memory ledger.
//!
//! A deterministic stand-in for the public ledger network, used by the test
//! suites and for local rehearsal runs. It verifies Ed25519 endorsements,
//! charges per-operation fees, enforces issuance authority, and can persist
//! its state to a JSON snapshot so a rehearsal survives process restarts.
//!
//! Fault injection covers the failure modes the orchestrator must survive:
//! rejected submissions, transactions that land and fail, submissions that
//! are silently dropped, confirmations that arrive late, and an unreachable
//! node.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use shared_crypto::derive_holding_account;
use shared_types::{AccountRef, AssetId, ConfirmationReceipt, PublicIdentity, TxSignature};
use tracing::{debug, info};

use super::fs::{read_optional, write_atomic};
use crate::domain::{Operation, OperationKind, SignedOperation, TxStatus};
use crate::error::{GenesisError, GenesisResult};
use crate::ports::outbound::{LedgerClient, LedgerError, LedgerResult};

/// Fee charged per operation kind, in the ledger's native units.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeeSchedule {
    pub define_asset: u64,
    pub create_holding_account: u64,
    pub issue: u64,
    pub revoke_issuance_authority: u64,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            define_asset: 1_466_600,
            create_holding_account: 2_044_280,
            issue: 5_000,
            revoke_issuance_authority: 5_000,
        }
    }
}

impl FeeSchedule {
    pub fn cost(&self, kind: OperationKind) -> u64 {
        match kind {
            OperationKind::DefineAsset => self.define_asset,
            OperationKind::CreateHoldingAccount => self.create_holding_account,
            OperationKind::Issue => self.issue,
            OperationKind::RevokeIssuanceAuthority => self.revoke_issuance_authority,
        }
    }
}

/// Asset account as held by the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetAccount {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub mint_authority: Option<PublicIdentity>,
    pub freeze_authority: Option<PublicIdentity>,
    pub supply: u64,
}

/// Holding account for one owner and asset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldingAccount {
    pub owner: PublicIdentity,
    pub asset: AssetId,
    pub amount: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
enum TxOutcome {
    Confirmed { receipt: ConfirmationReceipt },
    Failed { reason: String },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct TxRecord {
    kind: OperationKind,
    outcome: TxOutcome,
}

/// Snapshot-able ledger state. Maps are keyed by hex strings.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct LedgerState {
    slot: u64,
    balances: BTreeMap<String, u64>,
    assets: BTreeMap<String, AssetAccount>,
    holdings: BTreeMap<String, HoldingAccount>,
    transactions: BTreeMap<String, TxRecord>,
}

impl LedgerState {
    fn balance(&self, identity: &PublicIdentity) -> u64 {
        self.balances.get(&identity.to_string()).copied().unwrap_or(0)
    }

    fn apply(&mut self, signed: &SignedOperation) -> Result<(), String> {
        let payer = signed.payer;
        match &signed.operation {
            Operation::DefineAsset {
                asset,
                decimals,
                mint_authority,
                freeze_authority,
                name,
                symbol,
                ..
            } => {
                if !signed.is_signed_by(&PublicIdentity(asset.0)) {
                    return Err("asset account must sign its own creation".into());
                }
                let key = asset.to_string();
                if self.assets.contains_key(&key) {
                    return Err(format!("asset account {} already in use", asset.short()));
                }
                self.assets.insert(
                    key,
                    AssetAccount {
                        name: name.clone(),
                        symbol: symbol.clone(),
                        decimals: *decimals,
                        mint_authority: Some(*mint_authority),
                        freeze_authority: *freeze_authority,
                        supply: 0,
                    },
                );
            }
            Operation::CreateHoldingAccount { owner, asset } => {
                if !self.assets.contains_key(&asset.to_string()) {
                    return Err(format!("unknown asset {}", asset.short()));
                }
                let address = derive_holding_account(owner, asset);
                self.holdings
                    .entry(address.to_string())
                    .or_insert(HoldingAccount {
                        owner: *owner,
                        asset: *asset,
                        amount: 0,
                    });
            }
            Operation::Issue {
                asset,
                destination,
                quantity,
            } => {
                let account = self
                    .assets
                    .get_mut(&asset.to_string())
                    .ok_or_else(|| format!("unknown asset {}", asset.short()))?;
                match account.mint_authority {
                    Some(authority) if authority == payer => {}
                    Some(_) => return Err("payer is not the issuance authority".into()),
                    None => return Err("issuance authority has been revoked".into()),
                }
                let holding = self
                    .holdings
                    .get_mut(&destination.to_string())
                    .ok_or_else(|| format!("unknown holding account {}", destination.short()))?;
                if holding.asset != *asset {
                    return Err("holding account belongs to another asset".into());
                }
                let supply = account
                    .supply
                    .checked_add(*quantity)
                    .ok_or("supply would overflow")?;
                account.supply = supply;
                holding.amount += quantity;
            }
            Operation::RevokeIssuanceAuthority { asset } => {
                let account = self
                    .assets
                    .get_mut(&asset.to_string())
                    .ok_or_else(|| format!("unknown asset {}", asset.short()))?;
                match account.mint_authority {
                    Some(authority) if authority == payer => account.mint_authority = None,
                    Some(_) => return Err("payer is not the issuance authority".into()),
                    None => return Err("issuance authority already revoked".into()),
                }
            }
        }
        Ok(())
    }
}

#[derive(Default)]
struct Faults {
    unavailable: bool,
    /// (kind, submissions to let through first, reason)
    reject: Option<(OperationKind, usize, String)>,
    fail_next: Option<(OperationKind, String)>,
    lose_next: Option<OperationKind>,
    delay_next: Option<OperationKind>,
    delayed: Vec<SignedOperation>,
    withhold_next: Option<(OperationKind, u32)>,
    withheld: HashMap<TxSignature, u32>,
}

fn take_if<T>(slot: &mut Option<(OperationKind, T)>, kind: OperationKind) -> Option<T> {
    if slot.as_ref().is_some_and(|(k, _)| *k == kind) {
        slot.take().map(|(_, v)| v)
    } else {
        None
    }
}

/// Ledger held in process memory, optionally backed by a JSON snapshot.
pub struct InMemoryLedger {
    state: RwLock<LedgerState>,
    fees: FeeSchedule,
    snapshot: Option<PathBuf>,
    faults: Mutex<Faults>,
    submissions: Mutex<Vec<(OperationKind, TxSignature)>>,
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(LedgerState::default()),
            fees: FeeSchedule::default(),
            snapshot: None,
            faults: Mutex::new(Faults::default()),
            submissions: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn with_fees(mut self, fees: FeeSchedule) -> Self {
        self.fees = fees;
        self
    }

    /// Load from `path` if it exists and persist every change back to it.
    pub fn open(path: impl Into<PathBuf>) -> GenesisResult<Self> {
        let path = path.into();
        let state = match read_optional(&path).map_err(GenesisError::storage)? {
            Some(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                GenesisError::storage(format!("corrupt ledger snapshot {}: {e}", path.display()))
            })?,
            None => LedgerState::default(),
        };
        Ok(Self {
            state: RwLock::new(state),
            snapshot: Some(path),
            ..Self::new()
        })
    }

    pub fn fees(&self) -> FeeSchedule {
        self.fees
    }

    /// Credit native units to a signer's account; returns the new balance.
    pub fn fund(&self, identity: &PublicIdentity, amount: u64) -> GenesisResult<u64> {
        let balance = {
            let mut state = self.state.write();
            let entry = state.balances.entry(identity.to_string()).or_insert(0);
            *entry = entry.saturating_add(amount);
            *entry
        };
        self.persist().map_err(GenesisError::storage)?;
        info!("[genesis] 💰 Funded {} with {} (balance {})", identity, amount, balance);
        Ok(balance)
    }

    pub fn asset(&self, asset: &AssetId) -> Option<AssetAccount> {
        self.state.read().assets.get(&asset.to_string()).cloned()
    }

    pub fn holding(&self, account: &AccountRef) -> Option<HoldingAccount> {
        self.state.read().holdings.get(&account.to_string()).cloned()
    }

    /// Submissions of `kind` received, including rejected and dropped ones.
    pub fn submission_count(&self, kind: OperationKind) -> usize {
        self.submissions
            .lock()
            .iter()
            .filter(|(k, _)| *k == kind)
            .count()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.faults.lock().unavailable = unavailable;
    }

    /// Decline the next submission of `kind`.
    pub fn reject_next(&self, kind: OperationKind, reason: impl Into<String>) {
        self.reject_after(kind, 0, reason);
    }

    /// Let `successes` submissions of `kind` through, then decline one.
    pub fn reject_after(&self, kind: OperationKind, successes: usize, reason: impl Into<String>) {
        self.faults.lock().reject = Some((kind, successes, reason.into()));
    }

    /// Accept the next submission of `kind`, then report it as failed.
    pub fn fail_next(&self, kind: OperationKind, reason: impl Into<String>) {
        self.faults.lock().fail_next = Some((kind, reason.into()));
    }

    /// Accept the next submission of `kind` and silently drop it.
    pub fn lose_next(&self, kind: OperationKind) {
        self.faults.lock().lose_next = Some(kind);
    }

    /// Accept the next submission of `kind` but keep it off the ledger
    /// (status `NotFound`) until [`InMemoryLedger::deliver_delayed`].
    pub fn delay_next(&self, kind: OperationKind) {
        self.faults.lock().delay_next = Some(kind);
    }

    /// Land every delayed submission; returns how many took effect.
    pub fn deliver_delayed(&self) -> GenesisResult<usize> {
        let delayed = std::mem::take(&mut self.faults.lock().delayed);
        let mut landed = 0;
        for operation in &delayed {
            if self.commit(operation, None).map_err(GenesisError::storage)? {
                landed += 1;
            }
        }
        self.persist().map_err(GenesisError::storage)?;
        Ok(landed)
    }

    /// Apply the next submission of `kind` but report it pending for
    /// `polls` status queries (`u32::MAX` until released).
    pub fn withhold_next(&self, kind: OperationKind, polls: u32) {
        self.faults.lock().withhold_next = Some((kind, polls));
    }

    /// Make every withheld confirmation visible.
    pub fn release_withheld(&self) {
        self.faults.lock().withheld.clear();
    }

    fn persist(&self) -> std::io::Result<()> {
        let Some(path) = &self.snapshot else {
            return Ok(());
        };
        let bytes = serde_json::to_vec_pretty(&*self.state.read())
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        write_atomic(path, &bytes)
    }

    /// Verify, charge and record one operation. `false` when its signature
    /// was already on the ledger, which leaves state untouched.
    fn commit(
        &self,
        operation: &SignedOperation,
        fail_reason: Option<String>,
    ) -> LedgerResult<bool> {
        operation
            .verify()
            .map_err(|e| LedgerError::Rejected(format!("invalid endorsement: {e}")))?;

        let kind = operation.operation.kind();
        let signature = operation.tx_signature();
        let mut state = self.state.write();
        let key = signature.to_string();
        if state.transactions.contains_key(&key) {
            return Ok(false);
        }

        let fee = self.fees.cost(kind);
        let available = state.balance(&operation.payer);
        if available < fee {
            return Err(LedgerError::InsufficientFunds {
                required: fee,
                available,
            });
        }

        let outcome = match fail_reason {
            Some(reason) => TxOutcome::Failed { reason },
            None => {
                state.apply(operation).map_err(LedgerError::Rejected)?;
                state.slot += 1;
                TxOutcome::Confirmed {
                    receipt: ConfirmationReceipt {
                        signature,
                        slot: state.slot,
                        confirmed_at: Utc::now(),
                    },
                }
            }
        };
        state
            .balances
            .insert(operation.payer.to_string(), available - fee);
        state.transactions.insert(key, TxRecord { kind, outcome });
        Ok(true)
    }

    fn check_available(&self) -> LedgerResult<()> {
        if self.faults.lock().unavailable {
            return Err(LedgerError::Unavailable("node unreachable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerClient for InMemoryLedger {
    async fn balance(&self, identity: &PublicIdentity) -> LedgerResult<u64> {
        self.check_available()?;
        Ok(self.state.read().balance(identity))
    }

    async fn operation_cost(&self, kind: OperationKind) -> LedgerResult<u64> {
        self.check_available()?;
        Ok(self.fees.cost(kind))
    }

    async fn submit(&self, operation: SignedOperation) -> LedgerResult<TxSignature> {
        self.check_available()?;
        let kind = operation.operation.kind();
        let signature = operation.tx_signature();
        self.submissions.lock().push((kind, signature));

        let (fail_reason, withhold) = {
            let mut faults = self.faults.lock();
            if let Some((k, remaining, _)) = faults.reject.as_mut() {
                if *k == kind {
                    if *remaining == 0 {
                        let reason = faults.reject.take().map(|(_, _, r)| r).unwrap_or_default();
                        return Err(LedgerError::Rejected(reason));
                    }
                    *remaining -= 1;
                }
            }
            if faults.lose_next == Some(kind) {
                faults.lose_next = None;
                debug!("[genesis] Ledger dropped {} submission {}", kind.label(), signature.short());
                return Ok(signature);
            }
            if faults.delay_next == Some(kind) {
                faults.delay_next = None;
                faults.delayed.push(operation.clone());
                debug!("[genesis] Ledger delayed {} submission {}", kind.label(), signature.short());
                return Ok(signature);
            }
            (
                take_if(&mut faults.fail_next, kind),
                take_if(&mut faults.withhold_next, kind),
            )
        };

        self.commit(&operation, fail_reason)?;

        if let Some(polls) = withhold {
            self.faults.lock().withheld.insert(signature, polls);
        }
        self.persist()
            .map_err(|e| LedgerError::Unavailable(format!("snapshot write failed: {e}")))?;
        Ok(signature)
    }

    async fn transaction_status(&self, signature: &TxSignature) -> LedgerResult<TxStatus> {
        self.check_available()?;
        {
            let mut faults = self.faults.lock();
            if let Some(remaining) = faults.withheld.get_mut(signature) {
                if *remaining > 0 {
                    if *remaining != u32::MAX {
                        *remaining -= 1;
                    }
                    return Ok(TxStatus::Pending);
                }
            }
        }

        let state = self.state.read();
        Ok(match state.transactions.get(&signature.to_string()) {
            Some(TxRecord {
                outcome: TxOutcome::Confirmed { receipt },
                ..
            }) => TxStatus::Confirmed {
                receipt: receipt.clone(),
            },
            Some(TxRecord {
                outcome: TxOutcome::Failed { reason },
                ..
            }) => TxStatus::Failed {
                reason: reason.clone(),
            },
            None => TxStatus::NotFound,
        })
    }

    async fn holding_balance(&self, account: &AccountRef) -> LedgerResult<u64> {
        self.check_available()?;
        Ok(self
            .state
            .read()
            .holdings
            .get(&account.to_string())
            .map(|h| h.amount)
            .unwrap_or(0))
    }
}
