use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::billing::tier::{Quota, Tier};
use crate::llm_client::LlmError;

const SERVICE_UNAVAILABLE_MESSAGE: &str =
    "The email service is temporarily unavailable. Please try again later.";
const HIGH_DEMAND_MESSAGE: &str =
    "We're experiencing high demand right now. Please try again in a moment.";

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Authentication required")]
    AuthenticationRequired,

    #[error("Invalid authentication")]
    InvalidAuthentication,

    #[error("Usage limit exceeded: {current_usage}/{limit} on {tier}")]
    UsageLimitExceeded {
        current_usage: i64,
        limit: Quota,
        tier: Tier,
    },

    #[error("Pro subscription required (current tier: {current_tier})")]
    ProRequired { current_tier: Tier },

    #[error("Test mode is active ({tier})")]
    TestModeActive { tier: Tier },

    #[error("Test mode is disabled on this deployment")]
    TestModeDisabled,

    #[error("LLM API key is not configured")]
    MissingApiKey,

    #[error("LLM API key was rejected")]
    InvalidApiKey,

    #[error("LLM provider rate limited the request")]
    ProviderRateLimited,

    #[error("LLM provider quota exceeded")]
    ProviderQuotaExceeded,

    #[error("Could not parse model output: {reason}")]
    Parse { reason: String, raw_response: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Stable machine-readable code carried in every error body.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::AuthenticationRequired => "AUTHENTICATION_REQUIRED",
            AppError::InvalidAuthentication => "INVALID_AUTHENTICATION",
            AppError::UsageLimitExceeded { .. } => "USAGE_LIMIT_EXCEEDED",
            AppError::ProRequired { .. } => "PRO_REQUIRED",
            AppError::TestModeActive { .. } => "TEST_MODE_ACTIVE",
            AppError::TestModeDisabled => "TEST_MODE_DISABLED",
            AppError::MissingApiKey => "MISSING_API_KEY",
            AppError::InvalidApiKey => "INVALID_API_KEY",
            AppError::ProviderRateLimited => "RATE_LIMIT_EXCEEDED",
            AppError::ProviderQuotaExceeded => "QUOTA_EXCEEDED",
            AppError::Parse { .. } => "PARSE_ERROR",
            AppError::Network(_) => "NETWORK_ERROR",
            AppError::Upstream(_) => "UPSTREAM_ERROR",
            AppError::Llm(_) => "GENERATION_FAILED",
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::AuthenticationRequired | AppError::InvalidAuthentication => {
                StatusCode::UNAUTHORIZED
            }
            AppError::UsageLimitExceeded { .. }
            | AppError::ProviderRateLimited
            | AppError::ProviderQuotaExceeded => StatusCode::TOO_MANY_REQUESTS,
            AppError::ProRequired { .. } | AppError::TestModeDisabled => StatusCode::FORBIDDEN,
            AppError::TestModeActive { .. } => StatusCode::CONFLICT,
            AppError::MissingApiKey | AppError::InvalidApiKey => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Network(_) | AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Parse { .. }
            | AppError::Llm(_)
            | AppError::Database(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            AppError::NotFound(msg) | AppError::Validation(msg) => msg.clone(),
            AppError::AuthenticationRequired => "Authentication required".to_string(),
            AppError::InvalidAuthentication => "Invalid authentication".to_string(),
            AppError::UsageLimitExceeded { limit, .. } => format!(
                "You've reached your monthly limit of {limit} emails. Upgrade to generate more."
            ),
            AppError::ProRequired { .. } => {
                "A Pro subscription is required for this feature".to_string()
            }
            AppError::TestModeActive { tier } => {
                format!("Billing is disabled while test mode simulates the {tier} tier")
            }
            AppError::TestModeDisabled => "Test mode is not available".to_string(),
            AppError::MissingApiKey | AppError::InvalidApiKey => {
                SERVICE_UNAVAILABLE_MESSAGE.to_string()
            }
            AppError::ProviderRateLimited | AppError::ProviderQuotaExceeded => {
                "Our servers are busy. Please try again shortly.".to_string()
            }
            AppError::Parse { .. } => "Failed to parse analysis results".to_string(),
            AppError::Network(_) => {
                "Could not reach the email service. Check your connection and try again."
                    .to_string()
            }
            AppError::Upstream(_) => "A billing service error occurred".to_string(),
            AppError::Llm(_) => HIGH_DEMAND_MESSAGE.to_string(),
            AppError::Database(_) => "A database error occurred".to_string(),
            AppError::Internal(_) => "An internal server error occurred".to_string(),
        }
    }

    fn details(&self) -> Map<String, Value> {
        let mut details = Map::new();
        match self {
            AppError::UsageLimitExceeded {
                current_usage,
                limit,
                tier,
            } => {
                details.insert("current_usage".into(), json!(current_usage));
                details.insert("limit".into(), json!(limit));
                details.insert("tier".into(), json!(tier));
            }
            AppError::ProRequired { current_tier } => {
                details.insert("current_tier".into(), json!(current_tier));
            }
            AppError::TestModeActive { tier } => {
                details.insert("tier".into(), json!(tier));
            }
            AppError::Parse { raw_response, .. } => {
                details.insert("raw_response".into(), json!(raw_response));
            }
            _ => {}
        }
        details
    }
}

impl From<LlmError> for AppError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::MissingApiKey => AppError::MissingApiKey,
            LlmError::Http(e) if e.is_decode() => AppError::Llm(e.to_string()),
            LlmError::Http(e) => AppError::Network(e.to_string()),
            LlmError::Api { status: 401 | 403, .. } => AppError::InvalidApiKey,
            LlmError::Api { status: 429, message } => {
                let lower = message.to_lowercase();
                if ["quota", "credit", "billing"]
                    .iter()
                    .any(|needle| lower.contains(needle))
                {
                    AppError::ProviderQuotaExceeded
                } else {
                    AppError::ProviderRateLimited
                }
            }
            LlmError::Api { status: 529, .. } => AppError::ProviderRateLimited,
            other => AppError::Llm(other.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::Database(e) => tracing::error!("Database error: {e}"),
            AppError::Internal(e) => tracing::error!("Internal error: {e:?}"),
            AppError::Llm(msg) => tracing::error!("LLM error: {msg}"),
            AppError::Upstream(msg) => tracing::error!("Upstream error: {msg}"),
            AppError::Network(msg) => tracing::warn!("Network error: {msg}"),
            AppError::MissingApiKey => tracing::error!("LLM API key missing"),
            AppError::InvalidApiKey => tracing::error!("LLM API key rejected by provider"),
            AppError::Parse { reason, .. } => tracing::warn!("Parse error: {reason}"),
            _ => {}
        }

        let mut error = self.details();
        error.insert("code".into(), json!(self.code()));
        error.insert("message".into(), json!(self.message()));

        (status, Json(json!({ "error": error }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(err: AppError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_usage_limit_payload() {
        let (status, body) = body_json(AppError::UsageLimitExceeded {
            current_usage: 10,
            limit: Quota::Limited(10),
            tier: Tier::Free,
        })
        .await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"]["code"], "USAGE_LIMIT_EXCEEDED");
        assert_eq!(body["error"]["current_usage"], 10);
        assert_eq!(body["error"]["limit"], 10);
        assert_eq!(body["error"]["tier"], "free");
    }

    #[tokio::test]
    async fn test_missing_key_never_names_the_credential() {
        let (status, body) = body_json(AppError::MissingApiKey).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["code"], "MISSING_API_KEY");
        let message = body["error"]["message"].as_str().unwrap().to_lowercase();
        assert!(!message.contains("key"));
        assert!(!message.contains("anthropic"));
    }

    #[test]
    fn test_llm_error_classification() {
        let rate = AppError::from(LlmError::Api {
            status: 429,
            message: "Too many requests".into(),
        });
        assert_eq!(rate.code(), "RATE_LIMIT_EXCEEDED");

        let quota = AppError::from(LlmError::Api {
            status: 429,
            message: "Your credit balance is too low".into(),
        });
        assert_eq!(quota.code(), "QUOTA_EXCEEDED");

        let auth = AppError::from(LlmError::Api {
            status: 401,
            message: "invalid x-api-key".into(),
        });
        assert_eq!(auth.code(), "INVALID_API_KEY");

        let unknown = AppError::from(LlmError::Api {
            status: 500,
            message: "boom".into(),
        });
        assert_eq!(unknown.code(), "GENERATION_FAILED");
        assert_eq!(AppError::from(LlmError::EmptyContent).code(), "GENERATION_FAILED");
        assert_eq!(AppError::from(LlmError::MissingApiKey).code(), "MISSING_API_KEY");
    }

    #[tokio::test]
    async fn test_generic_failure_does_not_leak_internals() {
        let (_, body) = body_json(AppError::Llm("socket hang up at 10.0.0.3".into())).await;
        assert_eq!(body["error"]["message"], HIGH_DEMAND_MESSAGE);
    }
}
