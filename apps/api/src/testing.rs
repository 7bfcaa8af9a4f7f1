//! In-memory stand-ins for every collaborator in `AppState`, plus a small
//! harness that drives the real router.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use chrono::Utc;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use crate::analysis::analyzer::AnalysisResult;
use crate::auth::{AuthError, AuthVerifier};
use crate::billing::subscription::{BillingGateway, Plan, RedirectUrl, Subscription};
use crate::billing::tier::Tier;
use crate::config::Config;
use crate::errors::AppError;
use crate::llm_client::{CompletionRequest, LlmError, LlmProvider, LlmResponse, ProviderUsage};
use crate::models::email::{GeneratedEmailRow, NewGeneratedEmail};
use crate::models::rating::NewRating;
use crate::models::user::AuthUser;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{AnalysisStore, EmailStore, RatingStore, SubscriptionStore, UsageStore};

// ────────────────────────────────────────────────────────────────────────────
// Stores
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct StoredAnalysis {
    pub user_id: Uuid,
    pub email_content: String,
    pub email_type: String,
    pub result: AnalysisResult,
}

#[derive(Default)]
pub struct MemoryStore {
    usage: Mutex<HashMap<Uuid, i64>>,
    subscriptions: Mutex<HashMap<Uuid, Subscription>>,
    emails: Mutex<Vec<GeneratedEmailRow>>,
    ratings: Mutex<Vec<NewRating>>,
    analyses: Mutex<Vec<StoredAnalysis>>,
    test_users: Mutex<Vec<(String, Tier)>>,
}

impl MemoryStore {
    pub fn set_usage(&self, user_id: Uuid, count: i64) {
        self.usage.lock().unwrap().insert(user_id, count);
    }

    pub fn usage_of(&self, user_id: Uuid) -> i64 {
        self.usage.lock().unwrap().get(&user_id).copied().unwrap_or(0)
    }

    pub fn set_subscription(&self, user_id: Uuid, subscription: Subscription) {
        self.subscriptions
            .lock()
            .unwrap()
            .insert(user_id, subscription);
    }

    pub fn emails(&self) -> Vec<GeneratedEmailRow> {
        self.emails.lock().unwrap().clone()
    }

    pub fn ratings(&self) -> Vec<NewRating> {
        self.ratings.lock().unwrap().clone()
    }

    pub fn analyses(&self) -> Vec<StoredAnalysis> {
        self.analyses.lock().unwrap().clone()
    }

    pub fn test_users(&self) -> Vec<(String, Tier)> {
        self.test_users.lock().unwrap().clone()
    }
}

#[async_trait]
impl UsageStore for MemoryStore {
    async fn monthly_usage(&self, user_id: Uuid) -> Result<i64, AppError> {
        Ok(self.usage_of(user_id))
    }

    async fn increment(&self, user_id: Uuid) -> Result<i64, AppError> {
        let mut usage = self.usage.lock().unwrap();
        let count = usage.entry(user_id).or_insert(0);
        *count += 1;
        Ok(*count)
    }
}

#[async_trait]
impl SubscriptionStore for MemoryStore {
    async fn subscription(&self, user_id: Uuid) -> Result<Option<Subscription>, AppError> {
        Ok(self.subscriptions.lock().unwrap().get(&user_id).cloned())
    }

    async fn setup_test_user(&self, email: &str, tier: Tier) -> Result<(), AppError> {
        self.test_users
            .lock()
            .unwrap()
            .push((email.to_string(), tier));
        Ok(())
    }
}

#[async_trait]
impl EmailStore for MemoryStore {
    async fn insert(&self, email: NewGeneratedEmail) -> Result<GeneratedEmailRow, AppError> {
        let row = GeneratedEmailRow {
            id: Uuid::new_v4(),
            user_id: email.user_id,
            subject_line: email.subject_line,
            body: email.body,
            product_service: email.product_service,
            target_audience: email.target_audience,
            tone: email.tone,
            framework: email.framework,
            created_at: Utc::now(),
        };
        self.emails.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn recent(&self, user_id: Uuid, limit: i64) -> Result<Vec<GeneratedEmailRow>, AppError> {
        let emails = self.emails.lock().unwrap();
        Ok(emails
            .iter()
            .rev()
            .filter(|e| e.user_id == user_id)
            .take(usize::try_from(limit).unwrap_or(0))
            .cloned()
            .collect())
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let mut emails = self.emails.lock().unwrap();
        let before = emails.len();
        emails.retain(|e| !(e.id == id && e.user_id == user_id));
        Ok(emails.len() != before)
    }
}

#[async_trait]
impl RatingStore for MemoryStore {
    async fn insert(&self, rating: NewRating) -> Result<(), AppError> {
        self.ratings.lock().unwrap().push(rating);
        Ok(())
    }
}

#[async_trait]
impl AnalysisStore for MemoryStore {
    async fn insert(
        &self,
        user_id: Uuid,
        email_content: &str,
        email_type: &str,
        analysis: &AnalysisResult,
    ) -> Result<(), AppError> {
        self.analyses.lock().unwrap().push(StoredAnalysis {
            user_id,
            email_content: email_content.to_string(),
            email_type: email_type.to_string(),
            result: analysis.clone(),
        });
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// LLM
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub model: String,
    pub system: String,
    pub prompt: String,
}

#[derive(Debug, Clone)]
enum Behaviour {
    Reply(String),
    Fail { status: u16, message: String },
    FailOnCall {
        call: usize,
        reply: String,
        status: u16,
        message: String,
    },
    MissingKey,
}

pub struct MockLlm {
    behaviour: Behaviour,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockLlm {
    pub fn replying(text: impl Into<String>) -> Self {
        Self::with(Behaviour::Reply(text.into()))
    }

    /// Every call fails with the given provider status.
    pub fn failing(status: u16, message: impl Into<String>) -> Self {
        Self::with(Behaviour::Fail {
            status,
            message: message.into(),
        })
    }

    /// Replies with `text` except on the `call`-th call (1-based), which fails.
    pub fn failing_on_call(
        call: usize,
        text: impl Into<String>,
        status: u16,
        message: impl Into<String>,
    ) -> Self {
        Self::with(Behaviour::FailOnCall {
            call,
            reply: text.into(),
            status,
            message: message.into(),
        })
    }

    pub fn without_key() -> Self {
        Self::with(Behaviour::MissingKey)
    }

    fn with(behaviour: Behaviour) -> Self {
        Self {
            behaviour,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmProvider for MockLlm {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<LlmResponse, LlmError> {
        let call_number = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(RecordedCall {
                model: request.model.to_string(),
                system: request.system.to_string(),
                prompt: request.prompt.to_string(),
            });
            calls.len()
        };
        // Yield so concurrent requests interleave like real network calls.
        tokio::task::yield_now().await;

        let reply = |text: &str| {
            Ok(LlmResponse::from_text(
                text.to_string(),
                ProviderUsage {
                    input_tokens: 120,
                    output_tokens: 240,
                },
            ))
        };
        match &self.behaviour {
            Behaviour::Reply(text) => reply(text),
            Behaviour::Fail { status, message } => Err(LlmError::Api {
                status: *status,
                message: message.clone(),
            }),
            Behaviour::FailOnCall {
                call,
                reply: text,
                status,
                message,
            } => {
                if call_number == *call {
                    Err(LlmError::Api {
                        status: *status,
                        message: message.clone(),
                    })
                } else {
                    reply(text)
                }
            }
            Behaviour::MissingKey => Err(LlmError::MissingApiKey),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Auth & billing
// ────────────────────────────────────────────────────────────────────────────

/// Accepts a fixed set of tokens.
#[derive(Default)]
pub struct StaticAuth {
    users: HashMap<String, AuthUser>,
}

impl StaticAuth {
    pub fn with_user(mut self, token: &str, id: Uuid) -> Self {
        self.users.insert(
            token.to_string(),
            AuthUser {
                id,
                email: Some(format!("{token}@example.com")),
            },
        );
        self
    }
}

#[async_trait]
impl AuthVerifier for StaticAuth {
    async fn verify(&self, token: &str) -> Result<AuthUser, AuthError> {
        self.users.get(token).cloned().ok_or(AuthError::Rejected)
    }
}

#[derive(Default)]
pub struct StaticBilling {
    calls: Mutex<Vec<String>>,
}

impl StaticBilling {
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl BillingGateway for StaticBilling {
    async fn create_checkout(&self, _access_token: &str, plan: Plan) -> Result<RedirectUrl, AppError> {
        self.calls.lock().unwrap().push(format!("checkout:{}", plan.as_str()));
        Ok(RedirectUrl {
            url: format!("https://checkout.example.com/{}", plan.as_str()),
        })
    }

    async fn customer_portal(&self, _access_token: &str) -> Result<RedirectUrl, AppError> {
        self.calls.lock().unwrap().push("portal".to_string());
        Ok(RedirectUrl {
            url: "https://billing.example.com/portal".to_string(),
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Router harness
// ────────────────────────────────────────────────────────────────────────────

pub const ALICE: &str = "alice-token";
pub const BOB: &str = "bob-token";

pub struct TestApp {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub llm: Arc<MockLlm>,
    pub billing: Arc<StaticBilling>,
    pub alice: Uuid,
    pub bob: Uuid,
}

impl TestApp {
    pub fn new(llm: MockLlm) -> Self {
        Self::build(llm, false)
    }

    pub fn with_test_mode(llm: MockLlm) -> Self {
        Self::build(llm, true)
    }

    fn build(llm: MockLlm, allow_test_mode: bool) -> Self {
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let store = Arc::new(MemoryStore::default());
        let llm = Arc::new(llm);
        let billing = Arc::new(StaticBilling::default());
        let auth = StaticAuth::default()
            .with_user(ALICE, alice)
            .with_user(BOB, bob);

        let state = AppState {
            config: test_config(allow_test_mode),
            auth: Arc::new(auth),
            llm: llm.clone(),
            billing: billing.clone(),
            usage: store.clone(),
            subscriptions: store.clone(),
            emails: store.clone(),
            ratings: store.clone(),
            analyses: store.clone(),
        };

        Self {
            state,
            store,
            llm,
            billing,
            alice,
            bob,
        }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, token, None).await
    }

    /// Returns the status and the JSON body (`Null` when the body is empty).
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = build_router(self.state.clone())
            .oneshot(request)
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }
}

fn test_config(allow_test_mode: bool) -> Config {
    Config {
        database_url: "postgres://localhost/test".to_string(),
        supabase_url: "http://localhost:54321".to_string(),
        supabase_anon_key: "anon".to_string(),
        anthropic_api_key: None,
        port: 0,
        rust_log: "debug".to_string(),
        allow_test_mode,
    }
}
