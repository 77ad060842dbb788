//! Confirmed issuance records.

use serde::{Deserialize, Serialize};
use shared_types::{AccountRef, ConfirmationReceipt};

use super::allocation::verify_total;
use crate::error::GenesisResult;

/// One category's confirmed issuance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuanceRecord {
    pub category: String,
    /// Smallest units
    pub quantity: u64,
    pub destination: AccountRef,
    pub receipt: ConfirmationReceipt,
}

/// Sum of issued quantities must equal the asset's total units.
pub fn verify_issued_total(records: &[IssuanceRecord], expected: u64) -> GenesisResult<()> {
    verify_total(records.iter().map(|r| r.quantity), expected)
}
