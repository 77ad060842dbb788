//! Provisioned recipients, one per allocation category.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_types::{AccountRef, ConfirmationReceipt, PublicIdentity};

use super::allocation::AllocationTable;
use crate::error::{GenesisError, GenesisResult};

/// Credential name for a category's recipient keypair.
pub fn recipient_credential_name(category: &str) -> String {
    format!("recipient-{category}")
}

/// A category's recipient and its holding account for the asset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientAccount {
    pub category: String,
    pub public_identity: PublicIdentity,
    pub holding_account: AccountRef,
    /// Ledger time the holding account was confirmed
    pub provisioned_at: DateTime<Utc>,
    pub receipt: ConfirmationReceipt,
}

/// Category → recipient mapping in declaration order.
///
/// Injective: no two categories share an identity or a holding account.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecipientMap {
    entries: Vec<RecipientAccount>,
}

impl RecipientMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a recipient, rejecting duplicates of category, identity or account.
    pub fn insert(&mut self, account: RecipientAccount) -> GenesisResult<()> {
        for existing in &self.entries {
            let clash = if existing.category == account.category {
                Some("category")
            } else if existing.public_identity == account.public_identity {
                Some("identity")
            } else if existing.holding_account == account.holding_account {
                Some("holding account")
            } else {
                None
            };
            if let Some(field) = clash {
                return Err(GenesisError::AccountingInvariantViolation {
                    reason: format!(
                        "recipient for {} reuses the {field} of {}",
                        account.category, existing.category
                    ),
                });
            }
        }
        self.entries.push(account);
        Ok(())
    }

    pub fn get(&self, category: &str) -> Option<&RecipientAccount> {
        self.entries.iter().find(|r| r.category == category)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RecipientAccount> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Categories of `table` without a recipient.
    pub fn missing(&self, table: &AllocationTable) -> Vec<String> {
        table
            .names()
            .filter(|name| self.get(name).is_none())
            .map(str::to_string)
            .collect()
    }

    /// Entries reordered to follow `table`.
    pub fn ordered_by(&self, table: &AllocationTable) -> Vec<RecipientAccount> {
        table
            .names()
            .filter_map(|name| self.get(name).cloned())
            .collect()
    }

    pub fn into_vec(self) -> Vec<RecipientAccount> {
        self.entries
    }
}
