//! Deferred-release contract for time-restricted categories.
//!
//! The orchestrator records what must be locked and until when. Enforcement
//! belongs to an external mechanism reached through
//! [`LockEnforcer`](crate::ports::outbound::LockEnforcer); an intent only
//! becomes [`LockStatus::Active`] when that mechanism confirms it.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use shared_types::{AccountRef, PublicIdentity};

use crate::error::{GenesisError, GenesisResult};

/// Longest lock or release horizon accepted (100 years).
pub const MAX_LOCK_SECS: u64 = 100 * 365 * 24 * 60 * 60;

/// How a locked allocation becomes spendable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReleaseKind {
    /// Everything unlocks at `unlock_at`
    #[default]
    Cliff,
    /// Equal tranches: the first at `unlock_at`, then one per `interval_secs`
    Linear { interval_secs: u64, periods: u32 },
}

impl ReleaseKind {
    /// Reject schedules that cannot be evaluated.
    pub fn validate(&self, lock_duration_secs: u64) -> GenesisResult<()> {
        if let ReleaseKind::Linear {
            interval_secs,
            periods,
        } = *self
        {
            if interval_secs == 0 || periods == 0 {
                return Err(GenesisError::InvalidConfig(
                    "linear release needs a non-zero interval and period count".into(),
                ));
            }
            let tail = interval_secs
                .checked_mul(u64::from(periods - 1))
                .and_then(|t| t.checked_add(lock_duration_secs));
            if !matches!(tail, Some(total) if total <= MAX_LOCK_SECS) {
                return Err(GenesisError::InvalidConfig(format!(
                    "release schedule extends beyond {MAX_LOCK_SECS}s"
                )));
            }
        }
        Ok(())
    }
}

/// Whether an enforcement mechanism has confirmed the lock.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LockStatus {
    /// Recorded only; nothing on the ledger prevents spending
    Intended,
    /// Confirmed by the enforcer
    Active {
        reference: String,
        activated_at: DateTime<Utc>,
    },
}

/// A recorded lock over one category's issued quantity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockIntent {
    pub category: String,
    pub recipient: PublicIdentity,
    pub holding_account: AccountRef,
    pub quantity: u64,
    pub lock_duration_secs: u64,
    /// Recipient account creation time
    pub locked_from: DateTime<Utc>,
    pub unlock_at: DateTime<Utc>,
    pub release: ReleaseKind,
    pub status: LockStatus,
}

impl LockIntent {
    /// Build an intent; `unlock_at = locked_from + lock_duration_secs`.
    pub fn new(
        category: impl Into<String>,
        recipient: PublicIdentity,
        holding_account: AccountRef,
        quantity: u64,
        lock_duration_secs: u64,
        locked_from: DateTime<Utc>,
        release: ReleaseKind,
    ) -> GenesisResult<Self> {
        let category = category.into();
        let unlock_at = add_secs(locked_from, lock_duration_secs).ok_or_else(|| {
            GenesisError::InvalidConfig(format!("lock for {category} overflows the calendar"))
        })?;
        Ok(Self {
            category,
            recipient,
            holding_account,
            quantity,
            lock_duration_secs,
            locked_from,
            unlock_at,
            release,
            status: LockStatus::Intended,
        })
    }

    pub fn is_active(&self) -> bool {
        matches!(self.status, LockStatus::Active { .. })
    }

    /// Quantity an enforcer must allow to move at `now`.
    pub fn releasable_at(&self, now: DateTime<Utc>) -> u64 {
        if now < self.unlock_at {
            return 0;
        }
        match self.release {
            ReleaseKind::Cliff => self.quantity,
            ReleaseKind::Linear {
                interval_secs,
                periods,
            } => {
                let elapsed = (now - self.unlock_at).num_seconds().max(0) as u64;
                let tranches = (elapsed / interval_secs)
                    .saturating_add(1)
                    .min(u64::from(periods));
                if tranches == u64::from(periods) {
                    // last tranche absorbs the rounding
                    return self.quantity;
                }
                let released =
                    u128::from(self.quantity) * u128::from(tranches) / u128::from(periods);
                released as u64
            }
        }
    }

    /// Time after which the whole quantity is releasable.
    pub fn fully_released_at(&self) -> DateTime<Utc> {
        match self.release {
            ReleaseKind::Cliff => self.unlock_at,
            ReleaseKind::Linear {
                interval_secs,
                periods,
            } => {
                let tail = interval_secs.saturating_mul(u64::from(periods.saturating_sub(1)));
                add_secs(self.unlock_at, tail).unwrap_or(DateTime::<Utc>::MAX_UTC)
            }
        }
    }
}

fn add_secs(at: DateTime<Utc>, secs: u64) -> Option<DateTime<Utc>> {
    let secs = i64::try_from(secs).ok()?;
    at.checked_add_signed(Duration::try_seconds(secs)?)
}
