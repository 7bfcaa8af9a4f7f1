//! Axum route handlers for the Generation API.

use axum::{
    extract::State,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::Authenticated;
use crate::billing::test_mode::TestModeQuery;
use crate::errors::AppError;
use crate::extract::{AppJson, AppQuery};
use crate::generation::composer::{
    compose_dual_prompts, compose_prompt, EmailBrief, Framework, PERSUASIVE_PITCH,
    PROBLEM_SOLUTION,
};
use crate::generation::gate::EntitlementGate;
use crate::generation::writer::{generate, split_subject, GeneratedText};
use crate::llm_client::ProviderUsage;
use crate::models::email::NewGeneratedEmail;
use crate::models::usage::UserUsage;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// Either a ready-made prompt or the legacy structured brief.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum GenerateRequest {
    Prompt {
        prompt: String,
    },
    Brief {
        #[serde(flatten)]
        brief: EmailBrief,
        #[serde(default)]
        framework: Framework,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub result: String,
    pub usage: ProviderUsage,
    pub user_usage: UserUsage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DualGenerateResponse {
    pub email_a: GeneratedText,
    pub email_b: GeneratedText,
    pub user_usage: UserUsage,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/emails/generate
///
/// One completion, one quota unit. Legacy briefs are composed here with the
/// caller's tier deciding how many variants to ask for.
pub async fn handle_generate(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<TestModeQuery>,
    caller: Authenticated,
    AppJson(request): AppJson<GenerateRequest>,
) -> Result<Json<GenerateResponse>, AppError> {
    match &request {
        GenerateRequest::Prompt { prompt } if prompt.trim().is_empty() => {
            return Err(AppError::Validation("prompt cannot be empty".to_string()));
        }
        GenerateRequest::Brief { brief, .. } => brief.validate()?,
        GenerateRequest::Prompt { .. } => {}
    }

    let test_mode = state.test_mode(&query);
    let gate = EntitlementGate::from_state(&state);
    let llm = state.llm.as_ref();
    let request_ref = &request;

    let (text, user_usage) = gate
        .metered(caller.user.id, test_mode, move |admission| async move {
            let prompt = match request_ref {
                GenerateRequest::Prompt { prompt } => prompt.clone(),
                GenerateRequest::Brief { brief, framework } => {
                    compose_prompt(brief, *framework, admission.tier.variant_count())
                }
            };
            generate(llm, &prompt, admission.tier).await
        })
        .await?;

    let (brief, framework) = match &request {
        GenerateRequest::Prompt { .. } => (None, None),
        GenerateRequest::Brief { brief, framework } => (Some(brief), Some(framework.as_str())),
    };
    record_history(&state, caller.user.id, &text.result, brief, framework).await;

    Ok(Json(GenerateResponse {
        result: text.result,
        usage: text.usage,
        user_usage,
    }))
}

/// POST /api/v1/emails/generate-dual
///
/// Two drafts from two concurrent completions, charged as a single unit.
pub async fn handle_generate_dual(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<TestModeQuery>,
    caller: Authenticated,
    AppJson(brief): AppJson<EmailBrief>,
) -> Result<Json<DualGenerateResponse>, AppError> {
    brief.validate()?;

    let test_mode = state.test_mode(&query);
    let gate = EntitlementGate::from_state(&state);
    let llm = state.llm.as_ref();
    let prompts = compose_dual_prompts(&brief);
    let prompts_ref = &prompts;

    let ((email_a, email_b), user_usage) = gate
        .metered(caller.user.id, test_mode, move |admission| async move {
            tokio::try_join!(
                generate(llm, &prompts_ref.prompt_a, admission.tier),
                generate(llm, &prompts_ref.prompt_b, admission.tier),
            )
        })
        .await?;

    info!(user_id = %caller.user.id, "Dual generation completed");

    record_history(
        &state,
        caller.user.id,
        &email_a.result,
        Some(&brief),
        Some(PERSUASIVE_PITCH),
    )
    .await;
    record_history(
        &state,
        caller.user.id,
        &email_b.result,
        Some(&brief),
        Some(PROBLEM_SOLUTION),
    )
    .await;

    Ok(Json(DualGenerateResponse {
        email_a,
        email_b,
        user_usage,
    }))
}

/// Stores a generated email in the caller's history. The generation has
/// already been charged, so a storage failure is logged rather than returned.
async fn record_history(
    state: &AppState,
    user_id: Uuid,
    text: &str,
    brief: Option<&EmailBrief>,
    framework: Option<&str>,
) {
    let parsed = split_subject(text);
    let record = NewGeneratedEmail {
        user_id,
        subject_line: parsed.subject,
        body: parsed.body,
        product_service: brief.map(|b| b.product.clone()),
        target_audience: brief.map(|b| b.audience.clone()),
        tone: brief.map(|b| b.tone.as_str().to_string()),
        framework: framework.map(str::to_string),
    };

    if let Err(e) = state.emails.insert(record).await {
        warn!(user_id = %user_id, "Failed to store generated email: {e}");
    }
}
