//! Subscription and billing actions as seen by the client.

use chrono::Utc;
use tracing::info;

use crate::billing::subscription::{Plan, RedirectUrl, Subscription};
use crate::billing::test_mode::TestModeOverride;
use crate::client::{ApiClient, ClientError};

pub struct SubscriptionFacade<'a> {
    api: &'a ApiClient,
    test_mode: TestModeOverride,
}

impl<'a> SubscriptionFacade<'a> {
    pub fn new(api: &'a ApiClient, test_mode: TestModeOverride) -> Self {
        Self { api, test_mode }
    }

    /// Under an override the subscription is simulated locally.
    pub async fn check_subscription(&self) -> Result<Subscription, ClientError> {
        match self.test_mode.tier() {
            Some(tier) => Ok(Subscription::simulated(tier, Utc::now())),
            None => self.api.subscription().await,
        }
    }

    pub async fn create_checkout(&self, plan: Plan) -> Result<RedirectUrl, ClientError> {
        self.refuse_under_test_mode()?;
        info!(plan = plan.as_str(), "Starting checkout");
        self.api.create_checkout(plan).await
    }

    pub async fn open_customer_portal(&self) -> Result<RedirectUrl, ClientError> {
        self.refuse_under_test_mode()?;
        self.api.customer_portal().await
    }

    fn refuse_under_test_mode(&self) -> Result<(), ClientError> {
        match self.test_mode.tier() {
            Some(tier) => Err(ClientError::TestModeActive { tier }),
            None => Ok(()),
        }
    }
}
