//! Run manifest: the immutable audit record of a completed distribution.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_crypto::blake3_hash;
use uuid::Uuid;

use super::asset::AssetDefinition;
use super::finalization::FinalizationState;
use super::issuance::IssuanceRecord;
use super::recipient::RecipientAccount;
use super::release::LockIntent;
use crate::error::{GenesisError, GenesisResult};

/// Current manifest format.
pub const MANIFEST_VERSION: u32 = 1;

/// Digested manifest content.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestBody {
    pub version: u32,
    pub run_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub asset: AssetDefinition,
    /// Category → recipient, in declaration order
    pub recipients: Vec<RecipientAccount>,
    pub issuances: Vec<IssuanceRecord>,
    /// Smallest units
    pub total_issued: u64,
    pub finalization: FinalizationState,
    pub release_schedule: Vec<LockIntent>,
}

/// Manifest body plus its BLAKE3 digest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunManifest {
    #[serde(flatten)]
    pub body: ManifestBody,
    /// Hex BLAKE3 of the canonical JSON body
    pub digest: String,
}

impl RunManifest {
    pub fn new(body: ManifestBody) -> GenesisResult<Self> {
        let digest = digest_of(&body)?;
        Ok(Self { body, digest })
    }

    pub fn run_id(&self) -> Uuid {
        self.body.run_id
    }

    /// Recompute the digest and compare.
    pub fn verify_digest(&self) -> bool {
        digest_of(&self.body).is_ok_and(|d| d == self.digest)
    }
}

fn digest_of(body: &ManifestBody) -> GenesisResult<String> {
    let bytes = serde_json::to_vec(body).map_err(|e| GenesisError::ReportFailed {
        reason: format!("manifest encoding failed: {e}"),
    })?;
    Ok(hex::encode(blake3_hash(&bytes)))
}
