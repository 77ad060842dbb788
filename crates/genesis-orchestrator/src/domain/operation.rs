//! Ledger operations and their signed envelopes.
//!
//! An operation is serialized canonically (serde_json, declaration field
//! order) together with its request id and payer, and every required signer
//! signs those bytes. The payer's signature is the transaction's ledger id,
//! so it is known before submission and can be checkpointed first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_crypto::{verify_signature, CryptoError, Ed25519KeyPair, Ed25519Signature};
use shared_types::{AccountRef, AssetId, ConfirmationReceipt, PublicIdentity, TxSignature};
use uuid::Uuid;

use crate::error::{GenesisError, GenesisResult};

/// Ledger-level mutation requested by the orchestrator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    /// Create the asset account and define the asset in one transaction
    DefineAsset {
        asset: AssetId,
        decimals: u8,
        mint_authority: PublicIdentity,
        freeze_authority: Option<PublicIdentity>,
        name: String,
        symbol: String,
        metadata_uri: Option<String>,
    },
    /// Create-or-get the owner's holding account for the asset
    CreateHoldingAccount { owner: PublicIdentity, asset: AssetId },
    /// Issue new units into a holding account
    Issue {
        asset: AssetId,
        destination: AccountRef,
        quantity: u64,
    },
    /// Permanently remove issuance authority
    RevokeIssuanceAuthority { asset: AssetId },
}

/// Operation discriminant, used for cost lookups and metrics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    DefineAsset,
    CreateHoldingAccount,
    Issue,
    RevokeIssuanceAuthority,
}

impl OperationKind {
    pub fn label(&self) -> &'static str {
        match self {
            OperationKind::DefineAsset => "define_asset",
            OperationKind::CreateHoldingAccount => "create_holding_account",
            OperationKind::Issue => "issue",
            OperationKind::RevokeIssuanceAuthority => "revoke_issuance_authority",
        }
    }
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::DefineAsset { .. } => OperationKind::DefineAsset,
            Operation::CreateHoldingAccount { .. } => OperationKind::CreateHoldingAccount,
            Operation::Issue { .. } => OperationKind::Issue,
            Operation::RevokeIssuanceAuthority { .. } => OperationKind::RevokeIssuanceAuthority,
        }
    }

    pub fn asset(&self) -> AssetId {
        match self {
            Operation::DefineAsset { asset, .. }
            | Operation::CreateHoldingAccount { asset, .. }
            | Operation::Issue { asset, .. }
            | Operation::RevokeIssuanceAuthority { asset } => *asset,
        }
    }
}

#[derive(Serialize)]
struct SigningPayload<'a> {
    domain: &'static str,
    request_id: &'a Uuid,
    payer: &'a PublicIdentity,
    operation: &'a Operation,
}

/// A signer and its signature over the canonical payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endorsement {
    pub signer: PublicIdentity,
    pub signature: Ed25519Signature,
}

/// An operation signed by its payer and any co-signers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedOperation {
    pub request_id: Uuid,
    pub payer: PublicIdentity,
    pub operation: Operation,
    /// Payer first
    pub endorsements: Vec<Endorsement>,
}

impl SignedOperation {
    /// Sign `operation` with the payer and every co-signer.
    pub fn sign(
        operation: Operation,
        payer: &Ed25519KeyPair,
        co_signers: &[&Ed25519KeyPair],
    ) -> GenesisResult<Self> {
        let request_id = Uuid::new_v4();
        let payer_id = payer.identity();
        let message = Self::signing_bytes(&request_id, &payer_id, &operation)?;

        let endorsements = std::iter::once(payer)
            .chain(co_signers.iter().copied())
            .map(|key| Endorsement {
                signer: key.identity(),
                signature: key.sign(&message),
            })
            .collect();

        Ok(Self {
            request_id,
            payer: payer_id,
            operation,
            endorsements,
        })
    }

    /// Canonical bytes every signer signs.
    pub fn signing_bytes(
        request_id: &Uuid,
        payer: &PublicIdentity,
        operation: &Operation,
    ) -> GenesisResult<Vec<u8>> {
        serde_json::to_vec(&SigningPayload {
            domain: "genesis-distribution/op/v1",
            request_id,
            payer,
            operation,
        })
        .map_err(|e| GenesisError::storage(format!("operation encoding failed: {e}")))
    }

    /// The payer's signature, which identifies the transaction.
    pub fn tx_signature(&self) -> TxSignature {
        self.endorsements
            .first()
            .map(|e| TxSignature::from(e.signature))
            .unwrap_or(TxSignature([0; 64]))
    }

    pub fn is_signed_by(&self, identity: &PublicIdentity) -> bool {
        self.endorsements.iter().any(|e| &e.signer == identity)
    }

    /// Verify every endorsement, and that the payer endorsed first.
    pub fn verify(&self) -> Result<(), CryptoError> {
        match self.endorsements.first() {
            Some(first) if first.signer == self.payer => {}
            _ => return Err(CryptoError::SignatureVerificationFailed),
        }
        let message = Self::signing_bytes(&self.request_id, &self.payer, &self.operation)
            .map_err(|_| CryptoError::SignatureVerificationFailed)?;
        for endorsement in &self.endorsements {
            verify_signature(&endorsement.signer, &message, &endorsement.signature)?;
        }
        Ok(())
    }
}

/// Ledger view of a submitted transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TxStatus {
    Confirmed { receipt: ConfirmationReceipt },
    /// Seen but not yet final
    Pending,
    /// Landed and failed; state unchanged
    Failed { reason: String },
    /// Never seen or dropped
    NotFound,
}

/// Signature recorded before submission, awaiting confirmation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTx {
    pub signature: TxSignature,
    pub submitted_at: DateTime<Utc>,
    /// The exact envelope submitted, resent verbatim if the ledger never saw it.
    pub operation: SignedOperation,
}

impl PendingTx {
    pub fn new(operation: SignedOperation, submitted_at: DateTime<Utc>) -> Self {
        Self {
            signature: operation.tx_signature(),
            submitted_at,
            operation,
        }
    }
}
