//! Lock enforcer adapters.

use async_trait::async_trait;
use tracing::warn;

use crate::domain::LockIntent;
use crate::error::GenesisResult;
use crate::ports::outbound::{LockActivation, LockEnforcer};

/// No enforcement mechanism configured: every intent stays `Intended`.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredLockEnforcer;

#[async_trait]
impl LockEnforcer for UnconfiguredLockEnforcer {
    async fn activate(&self, intent: &LockIntent) -> GenesisResult<Option<LockActivation>> {
        warn!(
            "[genesis] ⚠️ No lock enforcer configured: {} units for {} are recorded as intent only, unlock at {}",
            intent.quantity, intent.category, intent.unlock_at
        );
        Ok(None)
    }
}
