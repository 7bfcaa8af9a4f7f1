//! Client-side test-mode state.
//!
//! URL parameters win over persisted state. Activating persists the choice
//! until `clear()`.

use std::sync::Arc;

use reqwest::Url;
use tracing::{debug, info};

use crate::billing::test_mode::{TestModeOverride, TestModeQuery};
use crate::billing::tier::Tier;
use crate::client::local_store::LocalStore;
use crate::client::ClientError;

pub const TEST_MODE_KEY: &str = "test_mode";
pub const TEST_TIER_KEY: &str = "test_tier";

pub struct TestMode {
    store: Arc<dyn LocalStore>,
    current: TestModeOverride,
}

impl TestMode {
    /// Resolves the override for a page load.
    pub fn load(store: Arc<dyn LocalStore>, page_url: Option<&str>) -> Result<Self, ClientError> {
        let mut test_mode = Self {
            store,
            current: TestModeOverride::inactive(),
        };

        if let Some(tier) = page_url.and_then(override_from_url).and_then(|o| o.tier()) {
            test_mode.activate(tier)?;
            return Ok(test_mode);
        }

        test_mode.current = test_mode.persisted()?;
        if let Some(tier) = test_mode.current.tier() {
            debug!(tier = %tier, "Test mode restored from storage");
        }
        Ok(test_mode)
    }

    fn persisted(&self) -> Result<TestModeOverride, ClientError> {
        if self.store.get(TEST_MODE_KEY)?.as_deref() != Some("true") {
            return Ok(TestModeOverride::inactive());
        }
        Ok(match self.store.get(TEST_TIER_KEY)?.map(|t| t.parse::<Tier>()) {
            Some(Ok(tier)) => TestModeOverride::with_tier(tier),
            _ => TestModeOverride::inactive(),
        })
    }

    pub fn activate(&mut self, tier: Tier) -> Result<(), ClientError> {
        self.store.set(TEST_MODE_KEY, "true")?;
        self.store.set(TEST_TIER_KEY, tier.as_str())?;
        self.current = TestModeOverride::with_tier(tier);
        info!(tier = %tier, "Test mode activated");
        Ok(())
    }

    pub fn clear(&mut self) -> Result<(), ClientError> {
        self.store.remove(TEST_MODE_KEY)?;
        self.store.remove(TEST_TIER_KEY)?;
        self.current = TestModeOverride::inactive();
        info!("Test mode cleared");
        Ok(())
    }

    pub fn current(&self) -> TestModeOverride {
        self.current
    }
}

fn override_from_url(page_url: &str) -> Option<TestModeOverride> {
    let url = Url::parse(page_url).ok()?;
    let mut query = TestModeQuery::default();
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "test" => query.test = Some(value.into_owned()),
            "tier" => query.tier = Some(value.into_owned()),
            _ => {}
        }
    }
    Some(TestModeOverride::from_query(&query))
}
