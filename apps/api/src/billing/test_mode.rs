//! Test-mode tier override.
//!
//! The override travels with each request as `?test=true&tier=<tier>` and is
//! resolved into an explicit value before any tier-dependent decision. Nothing
//! here is global: handlers receive the override as an input.

use serde::{Deserialize, Serialize};

use crate::billing::subscription::Subscription;
use crate::billing::tier::Tier;

/// Raw query parameters carrying the override.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TestModeQuery {
    pub test: Option<String>,
    pub tier: Option<String>,
}

/// Resolved override. `tier` is only `Some` while `active` is true.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestModeOverride {
    pub active: bool,
    pub tier: Option<Tier>,
}

impl TestModeOverride {
    pub const fn inactive() -> Self {
        Self {
            active: false,
            tier: None,
        }
    }

    pub const fn with_tier(tier: Tier) -> Self {
        Self {
            active: true,
            tier: Some(tier),
        }
    }

    /// Reads the override from query parameters. Requires `test=true` and a
    /// recognised tier; anything else leaves the override inactive.
    pub fn from_query(query: &TestModeQuery) -> Self {
        if query.test.as_deref() != Some("true") {
            return Self::inactive();
        }
        match query.tier.as_deref().map(str::parse::<Tier>) {
            Some(Ok(tier)) => Self::with_tier(tier),
            _ => Self::inactive(),
        }
    }

    /// Like `from_query`, but only when the deployment allows test mode.
    pub fn from_query_if_allowed(query: &TestModeQuery, allowed: bool) -> Self {
        if allowed {
            Self::from_query(query)
        } else {
            Self::inactive()
        }
    }

    pub fn tier(&self) -> Option<Tier> {
        if self.active {
            self.tier
        } else {
            None
        }
    }

    pub fn is_active(&self) -> bool {
        self.tier().is_some()
    }
}

/// Effective tier for every tier-dependent decision.
///
/// Precedence: override, then the real subscription, then `Free`.
pub fn resolve_tier(subscription: Option<&Subscription>, test_mode: TestModeOverride) -> Tier {
    if let Some(tier) = test_mode.tier() {
        return tier;
    }
    subscription
        .map(Subscription::effective_tier)
        .unwrap_or(Tier::Free)
}
