//! Allocation table and exact proportional quantities.
//!
//! ## Arithmetic
//!
//! ```text
//! whole_i    = floor(total_supply * pct_i / 100)          (u128 intermediate)
//! remainder  = total_supply - sum(whole_i)                 (whole units)
//! whole_0   += remainder                                   (first category)
//! quantity_i = whole_i * 10^decimals                       (smallest units)
//! ```
//!
//! The sum of quantities is `total_supply * 10^decimals` for every valid
//! table; [`compute_allocations`] checks it before returning.

use serde::{Deserialize, Serialize};

use super::percentage::{format_scaled, Percentage, HUNDRED_PERCENT};
use super::release::{ReleaseKind, MAX_LOCK_SECS};
use crate::error::{GenesisError, GenesisResult};

/// Largest supported decimal precision.
pub const MAX_DECIMALS: u8 = 18;

/// Longest category name (names end up in credential file names).
pub const MAX_CATEGORY_NAME: usize = 32;

/// One named share of the supply.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationCategory {
    pub name: String,
    pub percentage: Percentage,
    #[serde(default)]
    pub is_time_restricted: bool,
    #[serde(default)]
    pub lock_duration_secs: Option<u64>,
    #[serde(default)]
    pub release: ReleaseKind,
}

impl AllocationCategory {
    /// An unrestricted category.
    pub fn new(name: impl Into<String>, percentage: Percentage) -> Self {
        Self {
            name: name.into(),
            percentage,
            is_time_restricted: false,
            lock_duration_secs: None,
            release: ReleaseKind::Cliff,
        }
    }

    /// Mark the category as locked for `lock_duration_secs` after provisioning.
    #[must_use]
    pub fn time_restricted(mut self, lock_duration_secs: u64, release: ReleaseKind) -> Self {
        self.is_time_restricted = true;
        self.lock_duration_secs = Some(lock_duration_secs);
        self.release = release;
        self
    }

    fn validate(&self) -> GenesisResult<()> {
        let name_ok = !self.name.is_empty()
            && self.name.len() <= MAX_CATEGORY_NAME
            && self
                .name
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'_');
        if !name_ok {
            return Err(GenesisError::InvalidConfig(format!(
                "category name {:?} must be 1-{MAX_CATEGORY_NAME} chars of [a-z0-9_-]",
                self.name
            )));
        }

        match (self.is_time_restricted, self.lock_duration_secs) {
            (true, Some(secs)) if secs > 0 && secs <= MAX_LOCK_SECS => {
                self.release.validate(secs)
            }
            (true, _) => Err(GenesisError::InvalidConfig(format!(
                "time-restricted category {} needs a lock duration in (0, {MAX_LOCK_SECS}] seconds",
                self.name
            ))),
            (false, Some(_)) => Err(GenesisError::InvalidConfig(format!(
                "category {} has a lock duration but is not time-restricted",
                self.name
            ))),
            (false, None) if self.release != ReleaseKind::Cliff => {
                Err(GenesisError::InvalidConfig(format!(
                    "category {} has a release schedule but is not time-restricted",
                    self.name
                )))
            }
            (false, None) => Ok(()),
        }
    }
}

/// Validated, ordered allocation categories.
///
/// Invariants: non-empty, unique names, percentages summing to exactly 100.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AllocationTable {
    categories: Vec<AllocationCategory>,
}

impl AllocationTable {
    pub fn new(categories: Vec<AllocationCategory>) -> GenesisResult<Self> {
        if categories.is_empty() {
            return Err(GenesisError::InvalidConfig(
                "allocation table has no categories".into(),
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for category in &categories {
            category.validate()?;
            if !seen.insert(category.name.as_str()) {
                return Err(GenesisError::InvalidConfig(format!(
                    "duplicate category {}",
                    category.name
                )));
            }
        }

        let sum: u128 = categories
            .iter()
            .map(|c| u128::from(c.percentage.scaled()))
            .sum();
        if sum != u128::from(HUNDRED_PERCENT) {
            let shown = u64::try_from(sum)
                .map(format_scaled)
                .unwrap_or_else(|_| sum.to_string());
            return Err(GenesisError::InvalidConfig(format!(
                "category percentages sum to {shown}, expected exactly 100"
            )));
        }

        Ok(Self { categories })
    }

    pub fn categories(&self) -> &[AllocationCategory] {
        &self.categories
    }

    pub fn iter(&self) -> impl Iterator<Item = &AllocationCategory> {
        self.categories.iter()
    }

    pub fn get(&self, name: &str) -> Option<&AllocationCategory> {
        self.categories.iter().find(|c| c.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// Quantity owed to one category.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub category: String,
    /// Whole asset units
    pub whole_units: u64,
    /// Smallest units (`whole_units * 10^decimals`)
    pub quantity: u64,
}

/// `total_supply * 10^decimals`, or `InvalidConfig` when it does not fit in u64.
pub fn total_units(total_supply: u64, decimals: u8) -> GenesisResult<u64> {
    if decimals > MAX_DECIMALS {
        return Err(GenesisError::InvalidConfig(format!(
            "decimals {decimals} exceeds {MAX_DECIMALS}"
        )));
    }
    10u64
        .checked_pow(u32::from(decimals))
        .and_then(|scale| total_supply.checked_mul(scale))
        .ok_or_else(|| {
            GenesisError::InvalidConfig(format!(
                "total supply {total_supply} with {decimals} decimals overflows 64-bit units"
            ))
        })
}

/// Exact per-category quantities, in table order.
pub fn compute_allocations(
    table: &AllocationTable,
    total_supply: u64,
    decimals: u8,
) -> GenesisResult<Vec<Allocation>> {
    let expected = total_units(total_supply, decimals)?;
    let scale = 10u64.pow(u32::from(decimals));

    let mut wholes: Vec<u64> = table
        .iter()
        .map(|c| c.percentage.share_of(total_supply))
        .collect();
    let floored: u64 = wholes.iter().sum();
    // each floor loses < 1 unit, so the remainder is < category count
    let remainder = total_supply - floored;
    wholes[0] += remainder;

    let allocations: Vec<Allocation> = table
        .iter()
        .zip(wholes)
        .map(|(category, whole_units)| Allocation {
            category: category.name.clone(),
            whole_units,
            quantity: whole_units * scale,
        })
        .collect();

    verify_total(allocations.iter().map(|a| a.quantity), expected)?;
    Ok(allocations)
}

/// Check that quantities add up to `expected` exactly.
pub fn verify_total(quantities: impl IntoIterator<Item = u64>, expected: u64) -> GenesisResult<()> {
    let sum: u128 = quantities.into_iter().map(u128::from).sum();
    if sum != u128::from(expected) {
        return Err(GenesisError::AccountingInvariantViolation {
            reason: format!("quantities sum to {sum}, expected {expected}"),
        });
    }
    Ok(())
}
