use axum::{
    extract::State,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::analysis::analyzer::{analyze, AnalysisResult};
use crate::auth::Authenticated;
use crate::billing::test_mode::TestModeQuery;
use crate::errors::AppError;
use crate::extract::{AppJson, AppQuery};
use crate::generation::gate::EntitlementGate;
use crate::llm_client::ProviderUsage;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub email_content: String,
    #[serde(default)]
    pub email_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub analysis: AnalysisResult,
    pub usage: ProviderUsage,
}

/// POST /api/v1/emails/analyze
///
/// Pro only, after test-mode resolution. Analyses run under an override are
/// not stored.
pub async fn handle_analyze(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<TestModeQuery>,
    caller: Authenticated,
    AppJson(request): AppJson<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    if request.email_content.trim().is_empty() {
        return Err(AppError::Validation(
            "email_content cannot be empty".to_string(),
        ));
    }

    let test_mode = state.test_mode(&query);
    EntitlementGate::from_state(&state)
        .require_pro(caller.user.id, test_mode)
        .await?;

    let analysis = analyze(state.llm.as_ref(), &request.email_content).await?;

    if !test_mode.is_active() {
        let email_type = request.email_type.as_deref().unwrap_or("unknown");
        if let Err(e) = state
            .analyses
            .insert(
                caller.user.id,
                &request.email_content,
                email_type,
                &analysis.result,
            )
            .await
        {
            warn!(user_id = %caller.user.id, "Failed to store analysis: {e}");
        }
    }

    Ok(Json(AnalyzeResponse {
        analysis: analysis.result,
        usage: analysis.usage,
    }))
}
