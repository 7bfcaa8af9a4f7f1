use std::sync::Arc;

use crate::auth::AuthVerifier;
use crate::billing::subscription::BillingGateway;
use crate::billing::test_mode::{TestModeOverride, TestModeQuery};
use crate::config::Config;
use crate::llm_client::LlmProvider;
use crate::store::{AnalysisStore, EmailStore, RatingStore, SubscriptionStore, UsageStore};

/// Shared application state injected into all route handlers via Axum extractors.
/// Every collaborator sits behind a trait object so tests can swap it out.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub auth: Arc<dyn AuthVerifier>,
    pub llm: Arc<dyn LlmProvider>,
    pub billing: Arc<dyn BillingGateway>,
    pub usage: Arc<dyn UsageStore>,
    pub subscriptions: Arc<dyn SubscriptionStore>,
    pub emails: Arc<dyn EmailStore>,
    pub ratings: Arc<dyn RatingStore>,
    pub analyses: Arc<dyn AnalysisStore>,
}

impl AppState {
    /// The request's test-mode override, honoured only where the deployment allows it.
    pub fn test_mode(&self, query: &TestModeQuery) -> TestModeOverride {
        TestModeOverride::from_query_if_allowed(query, self.config.allow_test_mode)
    }
}
