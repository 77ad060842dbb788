//! Finalization gate for issuance authority.
//!
//! State Machine:
//! ```text
//! [OPEN] ──all categories issued + revocation confirmed──→ [FINALIZED]
//!   │                                                          │
//!   └── any category unissued ──→ PrematureFinalization        └── any request ──→ AlreadyFinalized
//! ```
//!
//! There is no transition out of `Finalized`.

use serde::{Deserialize, Serialize};
use shared_types::ConfirmationReceipt;

use crate::error::{GenesisError, GenesisResult};

/// Issuance authority state.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FinalizationState {
    /// Controller may still issue
    #[default]
    Open,
    /// Issuance authority revoked on the ledger
    Finalized { receipt: ConfirmationReceipt },
}

impl FinalizationState {
    pub fn is_finalized(&self) -> bool {
        matches!(self, FinalizationState::Finalized { .. })
    }

    pub fn receipt(&self) -> Option<&ConfirmationReceipt> {
        match self {
            FinalizationState::Finalized { receipt } => Some(receipt),
            FinalizationState::Open => None,
        }
    }
}

/// One-way gate over [`FinalizationState`].
#[derive(Debug, Clone, Default)]
pub struct FinalizationGate {
    state: FinalizationState,
}

impl FinalizationGate {
    pub fn new(state: FinalizationState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &FinalizationState {
        &self.state
    }

    /// Refuse when already finalized.
    pub fn ensure_open(&self) -> GenesisResult<()> {
        if self.state.is_finalized() {
            return Err(GenesisError::AlreadyFinalized);
        }
        Ok(())
    }

    /// Refuse while any category lacks a confirmed issuance.
    pub fn ensure_ready(&self, missing: &[String]) -> GenesisResult<()> {
        self.ensure_open()?;
        if !missing.is_empty() {
            return Err(GenesisError::PrematureFinalization {
                missing: missing.to_vec(),
            });
        }
        Ok(())
    }

    /// Record the confirmed revocation.
    pub fn complete(&mut self, receipt: ConfirmationReceipt) -> GenesisResult<&FinalizationState> {
        self.ensure_open()?;
        self.state = FinalizationState::Finalized { receipt };
        Ok(&self.state)
    }

    pub fn into_state(self) -> FinalizationState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shared_types::TxSignature;

    fn receipt() -> ConfirmationReceipt {
        ConfirmationReceipt {
            signature: TxSignature([6; 64]),
            slot: 99,
            confirmed_at: Utc::now(),
        }
    }

    #[test]
    fn test_open_to_finalized_once() {
        let mut gate = FinalizationGate::default();
        assert!(gate.ensure_ready(&[]).is_ok());

        let state = gate.complete(receipt()).unwrap().clone();
        assert!(state.is_finalized());
        assert_eq!(state.receipt().unwrap().slot, 99);

        assert!(matches!(gate.complete(receipt()), Err(GenesisError::AlreadyFinalized)));
        assert!(matches!(gate.ensure_ready(&[]), Err(GenesisError::AlreadyFinalized)));
    }

    #[test]
    fn test_premature_lists_missing_categories() {
        let gate = FinalizationGate::new(FinalizationState::Open);
        let missing = vec!["advisors".to_string()];
        match gate.ensure_ready(&missing) {
            Err(GenesisError::PrematureFinalization { missing }) => {
                assert_eq!(missing, vec!["advisors".to_string()]);
            }
            other => panic!("expected PrematureFinalization, got {other:?}"),
        }
    }

    #[test]
    fn test_already_finalized_takes_precedence() {
        let gate = FinalizationGate::new(FinalizationState::Finalized { receipt: receipt() });
        assert!(matches!(
            gate.ensure_ready(&["team".to_string()]),
            Err(GenesisError::AlreadyFinalized)
        ));
    }
}
