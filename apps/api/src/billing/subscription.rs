//! Subscription records and the checkout/portal redirect gateway.
//!
//! Billing itself lives in the hosted backend. This module only reads the
//! subscriber row and asks the backend functions for redirect URLs.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::billing::test_mode::TestModeOverride;
use crate::billing::tier::Tier;
use crate::errors::AppError;

/// A user's subscription as reported by the billing collaborator.
/// `tier` is meaningful only while `subscribed` is true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub subscribed: bool,
    pub tier: Option<Tier>,
    pub period_end: Option<DateTime<Utc>>,
}

impl Subscription {
    /// The implicit subscription of a user with no subscriber row.
    pub fn free() -> Self {
        Self {
            subscribed: false,
            tier: None,
            period_end: None,
        }
    }

    /// Builds a subscription from the raw subscriber columns.
    ///
    /// A missing or blank tier stays `None`. Any other unrecognised name is
    /// treated as `Free`.
    pub fn from_row(
        subscribed: bool,
        tier: Option<&str>,
        period_end: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            subscribed,
            tier: tier
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(Tier::from_name_or_free),
            period_end,
        }
    }

    /// Subscribed rows with no tier recorded count as starter.
    pub fn effective_tier(&self) -> Tier {
        if !self.subscribed {
            return Tier::Free;
        }
        self.tier.unwrap_or(Tier::Starter)
    }

    /// What the billing view shows while a test-mode override is active.
    /// The real record is left untouched.
    pub fn simulated(tier: Tier, now: DateTime<Utc>) -> Self {
        match tier {
            Tier::Free => Self::free(),
            paid => Self {
                subscribed: true,
                tier: Some(paid),
                period_end: Some(now + Duration::days(365)),
            },
        }
    }

    /// Either the simulated subscription (under override) or the real one.
    pub fn visible(real: Option<Subscription>, test_mode: TestModeOverride) -> Self {
        match test_mode.tier() {
            Some(tier) => Self::simulated(tier, Utc::now()),
            None => real.unwrap_or_else(Self::free),
        }
    }
}

/// Plans that can be bought through checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Starter,
    Pro,
}

impl Plan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Starter => "starter",
            Self::Pro => "pro",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedirectUrl {
    pub url: String,
}

/// Requests checkout and customer-portal redirect URLs from the backend.
#[async_trait]
pub trait BillingGateway: Send + Sync {
    async fn create_checkout(&self, access_token: &str, plan: Plan) -> Result<RedirectUrl, AppError>;
    async fn customer_portal(&self, access_token: &str) -> Result<RedirectUrl, AppError>;
}

/// Calls the hosted backend's `create-checkout` and `customer-portal` functions.
#[derive(Clone)]
pub struct SupabaseBilling {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseBilling {
    pub fn new(client: Client, base_url: &str, anon_key: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key,
        }
    }

    async fn invoke(
        &self,
        function: &str,
        access_token: &str,
        body: serde_json::Value,
    ) -> Result<RedirectUrl, AppError> {
        let url = format!("{}/functions/v1/{function}", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(access_token)
            .header("apikey", &self.anon_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!("Billing function {function} returned {status}: {text}");
            return Err(AppError::Upstream(format!(
                "{function} failed with status {status}"
            )));
        }

        let redirect: RedirectUrl = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("{function} returned malformed body: {e}")))?;
        info!("Billing function {function} produced a redirect");
        Ok(redirect)
    }
}

#[async_trait]
impl BillingGateway for SupabaseBilling {
    async fn create_checkout(&self, access_token: &str, plan: Plan) -> Result<RedirectUrl, AppError> {
        self.invoke(
            "create-checkout",
            access_token,
            serde_json::json!({ "plan": plan.as_str() }),
        )
        .await
    }

    async fn customer_portal(&self, access_token: &str) -> Result<RedirectUrl, AppError> {
        self.invoke("customer-portal", access_token, serde_json::json!({}))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_tier_follows_subscription_flag() {
        assert_eq!(Subscription::free().effective_tier(), Tier::Free);
        let lapsed = Subscription::from_row(false, Some("pro"), None);
        assert_eq!(lapsed.effective_tier(), Tier::Free);
        let pro = Subscription::from_row(true, Some("Pro"), None);
        assert_eq!(pro.effective_tier(), Tier::Pro);
    }

    #[test]
    fn test_missing_tier_is_starter_but_unknown_tier_is_free() {
        for blank in [None, Some(""), Some("   ")] {
            let row = Subscription::from_row(true, blank, None);
            assert_eq!(row.tier, None);
            assert_eq!(row.effective_tier(), Tier::Starter, "{blank:?}");
        }
        for name in ["legacy-gold", "gold", "free", "FREE"] {
            let row = Subscription::from_row(true, Some(name), None);
            assert_eq!(row.effective_tier(), Tier::Free, "{name}");
        }
    }

    #[test]
    fn test_simulated_subscription() {
        let now = Utc::now();
        assert_eq!(Subscription::simulated(Tier::Free, now), Subscription::free());
        let pro = Subscription::simulated(Tier::Pro, now);
        assert!(pro.subscribed);
        assert_eq!(pro.tier, Some(Tier::Pro));
        assert_eq!(pro.period_end, Some(now + Duration::days(365)));
    }

    #[test]
    fn test_visible_prefers_override_without_touching_real() {
        let real = Subscription::from_row(true, Some("pro"), None);
        let shown = Subscription::visible(
            Some(real.clone()),
            TestModeOverride::with_tier(Tier::Free),
        );
        assert_eq!(shown, Subscription::free());
        assert_eq!(real.effective_tier(), Tier::Pro);

        let shown = Subscription::visible(Some(real.clone()), TestModeOverride::inactive());
        assert_eq!(shown, real);
    }
}
