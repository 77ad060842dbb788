//! Asset parameters and the confirmed asset definition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_types::{AssetId, ConfirmationReceipt, PublicIdentity};

use super::allocation::{total_units, MAX_DECIMALS};
use crate::error::{GenesisError, GenesisResult};

/// Longest ticker symbol accepted.
pub const MAX_SYMBOL_LEN: usize = 10;

/// Asset parameters from configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetParams {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    /// Whole-unit supply
    pub total_supply: u64,
    /// Keep the controller as freeze authority
    #[serde(default)]
    pub retain_freeze_authority: bool,
    /// Off-ledger metadata location handed to the registry
    #[serde(default)]
    pub metadata_uri: Option<String>,
}

impl AssetParams {
    pub fn validate(&self) -> GenesisResult<()> {
        if self.name.trim().is_empty() {
            return Err(GenesisError::InvalidConfig("asset name is empty".into()));
        }
        if self.symbol.is_empty()
            || self.symbol.len() > MAX_SYMBOL_LEN
            || !self.symbol.bytes().all(|b| b.is_ascii_alphanumeric())
        {
            return Err(GenesisError::InvalidConfig(format!(
                "asset symbol {:?} must be 1-{MAX_SYMBOL_LEN} alphanumeric chars",
                self.symbol
            )));
        }
        if self.decimals > MAX_DECIMALS {
            return Err(GenesisError::InvalidConfig(format!(
                "decimals {} exceeds {MAX_DECIMALS}",
                self.decimals
            )));
        }
        if self.total_supply == 0 {
            return Err(GenesisError::InvalidConfig("total supply is zero".into()));
        }
        total_units(self.total_supply, self.decimals).map(|_| ())
    }
}

/// The asset as confirmed on the ledger.
///
/// Immutable once issuance authority is revoked.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetDefinition {
    pub asset_id: AssetId,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: u64,
    /// Holder of issuance authority until finalization
    pub controlling_key: PublicIdentity,
    pub freeze_authority: Option<PublicIdentity>,
    pub metadata_uri: Option<String>,
    pub created_at: DateTime<Utc>,
    pub receipt: ConfirmationReceipt,
}

impl AssetDefinition {
    /// Definition recorded from a confirmed `DefineAsset` transaction.
    pub fn confirmed(
        params: &AssetParams,
        asset_id: AssetId,
        controlling_key: PublicIdentity,
        receipt: ConfirmationReceipt,
    ) -> Self {
        Self {
            asset_id,
            name: params.name.clone(),
            symbol: params.symbol.clone(),
            decimals: params.decimals,
            total_supply: params.total_supply,
            controlling_key,
            freeze_authority: params.retain_freeze_authority.then_some(controlling_key),
            metadata_uri: params.metadata_uri.clone(),
            created_at: receipt.confirmed_at,
            receipt,
        }
    }

    /// Total supply in smallest units.
    pub fn total_units(&self) -> GenesisResult<u64> {
        total_units(self.total_supply, self.decimals)
    }

    /// Whether a recorded definition still matches configuration.
    pub fn matches(&self, params: &AssetParams) -> bool {
        self.name == params.name
            && self.symbol == params.symbol
            && self.decimals == params.decimals
            && self.total_supply == params.total_supply
    }
}
