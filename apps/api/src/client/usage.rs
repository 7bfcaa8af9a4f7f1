//! Client view of the monthly usage counter.
//!
//! `can_generate` is a display convenience. The server's entitlement gate
//! makes the real decision.

use serde::Serialize;

use crate::billing::test_mode::TestModeOverride;
use crate::billing::tier::{limit_for, Quota, Tier};
use crate::client::{ApiClient, ClientError};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UsageView {
    pub current: i64,
    pub limit: Quota,
    pub tier: Tier,
    /// Raw ratio, may exceed 100. Use `display_percentage` for progress bars.
    pub percentage: f64,
    pub can_generate: bool,
    pub model_label: &'static str,
    /// `current` is an illustrative number shown under a test-mode override,
    /// not the real counter.
    pub synthetic: bool,
}

impl UsageView {
    /// Signed-out visitors can never generate.
    pub fn unauthenticated() -> Self {
        Self {
            can_generate: false,
            ..Self::derive(0, Tier::Free, false)
        }
    }

    pub fn derive(current: i64, tier: Tier, synthetic: bool) -> Self {
        let limit = limit_for(tier);
        Self {
            current,
            limit,
            tier,
            percentage: limit.percentage(current),
            can_generate: limit.allows(current),
            model_label: tier.model_label(),
            synthetic,
        }
    }

    pub fn synthetic(tier: Tier) -> Self {
        Self::derive(synthetic_count(tier), tier, true)
    }

    pub fn display_percentage(&self) -> f64 {
        self.percentage.clamp(0.0, 100.0)
    }
}

/// Demo counter shown for each tier while test mode is active.
pub const fn synthetic_count(tier: Tier) -> i64 {
    match tier {
        Tier::Free => 7,
        Tier::Starter => 23,
        Tier::Pro => 142,
    }
}

pub struct UsageTracker<'a> {
    api: &'a ApiClient,
}

impl<'a> UsageTracker<'a> {
    pub fn new(api: &'a ApiClient) -> Self {
        Self { api }
    }

    pub async fn get_usage(&self, test_mode: TestModeOverride) -> Result<UsageView, ClientError> {
        if !self.api.is_authenticated() {
            return Ok(UsageView::unauthenticated());
        }
        if let Some(tier) = test_mode.tier() {
            return Ok(UsageView::synthetic(tier));
        }
        let usage = self.api.usage().await?;
        Ok(UsageView::derive(usage.current, usage.tier, false))
    }
}
