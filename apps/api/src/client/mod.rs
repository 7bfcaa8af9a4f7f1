//! Typed client for the Reachly API.
//!
//! Owns the client-side contracts: usage view, test-mode persistence, the
//! billing facade and local drafts. The server stays authoritative for every
//! quota and feature decision; nothing here can grant access.

use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::analysis::handlers::AnalyzeResponse;
use crate::billing::subscription::{Plan, RedirectUrl, Subscription};
use crate::billing::test_mode::TestModeOverride;
use crate::billing::tier::Tier;
use crate::generation::composer::{EmailBrief, Framework};
use crate::generation::handlers::{DualGenerateResponse, GenerateResponse};
use crate::models::email::GeneratedEmailRow;
use crate::models::rating::RatingInput;
use crate::models::usage::UserUsage;

pub mod billing;
pub mod drafts;
pub mod local_store;
pub mod test_mode;
pub mod usage;

const HIGH_DEMAND_MESSAGE: &str =
    "We're experiencing high demand right now. Please try again in a moment.";

#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered with a structured error body.
    #[error("API error {status} ({code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
        details: Map<String, Value>,
    },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("could not decode response: {0}")]
    Decode(String),

    /// Billing actions are blocked while a test-mode override is active.
    #[error("billing is disabled while test mode simulates the {tier} tier")]
    TestModeActive { tier: Tier },

    #[error("local storage error: {0}")]
    Storage(#[from] std::io::Error),
}

impl ClientError {
    /// Stable error code, when the failure carries one.
    pub fn code(&self) -> Option<&str> {
        match self {
            ClientError::Api { code, .. } => Some(code),
            ClientError::Network(_) => Some("NETWORK_ERROR"),
            ClientError::TestModeActive { .. } => Some("TEST_MODE_ACTIVE"),
            ClientError::Decode(_) | ClientError::Storage(_) => None,
        }
    }

    /// User-facing text, chosen from the error code alone.
    pub fn display_message(&self) -> String {
        match self.code() {
            Some("USAGE_LIMIT_EXCEEDED") => match self {
                ClientError::Api { details, .. } => match details.get("limit") {
                    Some(limit) => format!(
                        "You've used all {limit} emails this month. Upgrade to keep generating."
                    ),
                    None => "You've reached your monthly limit. Upgrade to keep generating."
                        .to_string(),
                },
                _ => HIGH_DEMAND_MESSAGE.to_string(),
            },
            Some("MISSING_API_KEY") | Some("INVALID_API_KEY") => {
                "The email service is temporarily unavailable. Please try again later."
                    .to_string()
            }
            Some("RATE_LIMIT_EXCEEDED") | Some("QUOTA_EXCEEDED") => {
                "Our servers are busy. Please try again shortly.".to_string()
            }
            Some("AUTHENTICATION_REQUIRED") | Some("INVALID_AUTHENTICATION") => {
                "Please sign in again to continue.".to_string()
            }
            Some("PRO_REQUIRED") => "Email analysis is available on the Pro plan.".to_string(),
            Some("PARSE_ERROR") => {
                "We couldn't read the analysis results. Please try again.".to_string()
            }
            Some("NETWORK_ERROR") => {
                "Could not reach the email service. Check your connection and try again."
                    .to_string()
            }
            Some("TEST_MODE_ACTIVE") => {
                "Billing is disabled while test mode is active. Clear test mode first."
                    .to_string()
            }
            _ => HIGH_DEMAND_MESSAGE.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: String,
    #[serde(default)]
    message: String,
    #[serde(flatten)]
    details: Map<String, Value>,
}

/// Turns a non-success response body into a `ClientError`.
fn api_error(status: u16, body: &str) -> ClientError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => ClientError::Api {
            status,
            code: envelope.error.code,
            message: envelope.error.message,
            details: envelope.error.details,
        },
        Err(_) => ClientError::Api {
            status,
            code: "UNKNOWN".to_string(),
            message: body.to_string(),
            details: Map::new(),
        },
    }
}

#[derive(Debug, Serialize)]
struct AnalyzeBody<'a> {
    email_content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    email_type: Option<&'a str>,
}

/// HTTP wrapper around every Reachly endpoint.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
    test_mode: TestModeOverride,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url).map_err(|e| ClientError::Decode(e.to_string()))?;
        Ok(Self {
            client: Client::new(),
            base_url,
            token: None,
            test_mode: TestModeOverride::inactive(),
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Forwards the override on every subsequent request.
    pub fn with_test_mode(mut self, test_mode: TestModeOverride) -> Self {
        self.test_mode = test_mode;
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn test_mode(&self) -> TestModeOverride {
        self.test_mode
    }

    /// Endpoint URL with `?test=true&tier=…` appended while an override is active.
    fn url(&self, path: &str) -> Result<Url, ClientError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        if let Some(tier) = self.test_mode.tier() {
            url.query_pairs_mut()
                .append_pair("test", "true")
                .append_pair("tier", tier.as_str());
        }
        Ok(url)
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let mut request = self.client.request(method, self.url(path)?);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        Ok(request)
    }

    async fn execute(&self, request: RequestBuilder) -> Result<reqwest::Response, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let err = api_error(status.as_u16(), &body);
        warn!(status = status.as_u16(), code = ?err.code(), "Reachly API request failed");
        Err(err)
    }

    async fn call<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = self.execute(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }

    pub async fn generate(&self, prompt: &str) -> Result<GenerateResponse, ClientError> {
        debug!("Requesting generation");
        let request = self
            .request(Method::POST, "/api/v1/emails/generate")?
            .json(&json!({ "prompt": prompt }));
        self.call(request).await
    }

    /// Legacy single-prompt flow; the server composes the prompt.
    pub async fn generate_from_brief(
        &self,
        brief: &EmailBrief,
        framework: Framework,
    ) -> Result<GenerateResponse, ClientError> {
        let mut body = serde_json::to_value(brief).map_err(|e| ClientError::Decode(e.to_string()))?;
        body["framework"] = json!(framework);
        let request = self
            .request(Method::POST, "/api/v1/emails/generate")?
            .json(&body);
        self.call(request).await
    }

    pub async fn generate_dual(
        &self,
        brief: &EmailBrief,
    ) -> Result<DualGenerateResponse, ClientError> {
        let request = self
            .request(Method::POST, "/api/v1/emails/generate-dual")?
            .json(brief);
        self.call(request).await
    }

    pub async fn analyze(
        &self,
        email_content: &str,
        email_type: Option<&str>,
    ) -> Result<AnalyzeResponse, ClientError> {
        let request = self
            .request(Method::POST, "/api/v1/emails/analyze")?
            .json(&AnalyzeBody {
                email_content,
                email_type,
            });
        self.call(request).await
    }

    pub async fn history(&self) -> Result<Vec<GeneratedEmailRow>, ClientError> {
        self.call(self.request(Method::GET, "/api/v1/emails")?).await
    }

    pub async fn delete_email(&self, id: Uuid) -> Result<(), ClientError> {
        let path = format!("/api/v1/emails/{id}");
        self.execute(self.request(Method::DELETE, &path)?).await?;
        Ok(())
    }

    pub async fn rate(&self, rating: &RatingInput) -> Result<(), ClientError> {
        let request = self.request(Method::POST, "/api/v1/ratings")?.json(rating);
        self.execute(request).await?;
        Ok(())
    }

    pub async fn usage(&self) -> Result<UserUsage, ClientError> {
        self.call(self.request(Method::GET, "/api/v1/usage")?).await
    }

    pub async fn subscription(&self) -> Result<Subscription, ClientError> {
        self.call(self.request(Method::GET, "/api/v1/subscription")?)
            .await
    }

    pub async fn create_checkout(&self, plan: Plan) -> Result<RedirectUrl, ClientError> {
        let request = self
            .request(Method::POST, "/api/v1/billing/checkout")?
            .json(&json!({ "plan": plan }));
        self.call(request).await
    }

    pub async fn customer_portal(&self) -> Result<RedirectUrl, ClientError> {
        self.call(self.request(Method::POST, "/api/v1/billing/portal")?)
            .await
    }

    pub async fn setup_test_user(&self, email: &str, tier: Tier) -> Result<(), ClientError> {
        let request = self
            .request(Method::POST, "/api/v1/admin/test-users")?
            .json(&json!({ "email": email, "tier": tier }));
        self.execute(request).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_carries_active_override() {
        let client = ApiClient::new("https://api.reachly.test").unwrap();
        let plain = client.url("/api/v1/usage").unwrap();
        assert_eq!(plain.as_str(), "https://api.reachly.test/api/v1/usage");

        let client = client.with_test_mode(TestModeOverride::with_tier(Tier::Starter));
        let url = client.url("/api/v1/usage").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.reachly.test/api/v1/usage?test=true&tier=starter"
        );
    }

    #[test]
    fn test_api_error_keeps_code_and_details() {
        let body = r#"{"error":{"code":"USAGE_LIMIT_EXCEEDED","message":"limit",
            "current_usage":10,"limit":10,"tier":"free"}}"#;
        let err = api_error(429, body);
        match &err {
            ClientError::Api {
                status,
                code,
                details,
                ..
            } => {
                assert_eq!(*status, 429);
                assert_eq!(code, "USAGE_LIMIT_EXCEEDED");
                assert_eq!(details["current_usage"], 10);
                assert_eq!(details["tier"], "free");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(err.display_message().contains("10 emails"));
    }

    #[test]
    fn test_unstructured_error_falls_back_to_high_demand() {
        let err = api_error(500, "<html>Bad Gateway</html>");
        assert_eq!(err.code(), Some("UNKNOWN"));
        assert_eq!(err.display_message(), HIGH_DEMAND_MESSAGE);
    }

    #[test]
    fn test_display_message_never_names_credentials() {
        let err = api_error(503, r#"{"error":{"code":"MISSING_API_KEY","message":"x"}}"#);
        let message = err.display_message();
        assert!(message.contains("temporarily unavailable"));
        assert!(!message.to_lowercase().contains("key"));
    }

    #[test]
    fn test_test_mode_error_message() {
        let err = ClientError::TestModeActive { tier: Tier::Pro };
        assert_eq!(err.code(), Some("TEST_MODE_ACTIVE"));
        assert!(err.display_message().contains("test mode"));
    }
}
