//! Entitlement Gate: the authoritative quota and feature check.
//!
//! Ordering: the quota check completes before any model call is dispatched,
//! and the counter moves only after the generation succeeded. One admission is
//! one quota unit, however many completions run under it.

use std::future::Future;

use tracing::{info, warn};
use uuid::Uuid;

use crate::billing::test_mode::{resolve_tier, TestModeOverride};
use crate::billing::tier::{limit_for, Quota, Tier};
use crate::errors::AppError;
use crate::models::usage::UserUsage;
use crate::state::AppState;
use crate::store::{SubscriptionStore, UsageStore};

/// A passed quota check. Consumed by `settle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    pub user_id: Uuid,
    pub tier: Tier,
    pub limit: Quota,
    /// Counter value the decision was made against.
    pub current: i64,
}

pub struct EntitlementGate<'a> {
    usage: &'a dyn UsageStore,
    subscriptions: &'a dyn SubscriptionStore,
}

impl<'a> EntitlementGate<'a> {
    pub fn new(usage: &'a dyn UsageStore, subscriptions: &'a dyn SubscriptionStore) -> Self {
        Self {
            usage,
            subscriptions,
        }
    }

    pub fn from_state(state: &'a AppState) -> Self {
        Self::new(state.usage.as_ref(), state.subscriptions.as_ref())
    }

    /// Effective tier: override, then the real subscription, then free.
    pub async fn resolve_tier(
        &self,
        user_id: Uuid,
        test_mode: TestModeOverride,
    ) -> Result<Tier, AppError> {
        if let Some(tier) = test_mode.tier() {
            info!(user_id = %user_id, tier = %tier, "Test mode override in effect");
            return Ok(tier);
        }
        let subscription = self.subscriptions.subscription(user_id).await?;
        Ok(resolve_tier(subscription.as_ref(), test_mode))
    }

    /// Checks the caller's counter against their tier's quota.
    pub async fn admit(
        &self,
        user_id: Uuid,
        test_mode: TestModeOverride,
    ) -> Result<Admission, AppError> {
        let tier = self.resolve_tier(user_id, test_mode).await?;
        let current = self.usage.monthly_usage(user_id).await?;
        let limit = limit_for(tier);

        if !limit.allows(current) {
            warn!(
                user_id = %user_id,
                current,
                limit = %limit,
                tier = %tier,
                "Usage limit reached"
            );
            return Err(AppError::UsageLimitExceeded {
                current_usage: current,
                limit,
                tier,
            });
        }

        Ok(Admission {
            user_id,
            tier,
            limit,
            current,
        })
    }

    /// Charges one unit for a successful generation.
    pub async fn settle(&self, admission: Admission) -> Result<UserUsage, AppError> {
        let current = self.usage.increment(admission.user_id).await?;
        info!(
            user_id = %admission.user_id,
            current,
            limit = %admission.limit,
            "Usage incremented"
        );
        Ok(UserUsage {
            current,
            limit: admission.limit,
            tier: admission.tier,
        })
    }

    /// Admits, runs `generate`, and charges one unit only if it succeeded.
    pub async fn metered<T, F, Fut>(
        &self,
        user_id: Uuid,
        test_mode: TestModeOverride,
        generate: F,
    ) -> Result<(T, UserUsage), AppError>
    where
        F: FnOnce(Admission) -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        let admission = self.admit(user_id, test_mode).await?;
        let output = generate(admission).await?;
        let usage = self.settle(admission).await?;
        Ok((output, usage))
    }

    /// Pro-only feature check, using the same tier resolution as the quota.
    pub async fn require_pro(
        &self,
        user_id: Uuid,
        test_mode: TestModeOverride,
    ) -> Result<Tier, AppError> {
        match self.resolve_tier(user_id, test_mode).await? {
            Tier::Pro => Ok(Tier::Pro),
            current_tier => {
                info!(user_id = %user_id, tier = %current_tier, "Pro subscription required");
                Err(AppError::ProRequired { current_tier })
            }
        }
    }
}
