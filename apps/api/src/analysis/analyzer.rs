//! Email analysis: asks the model for a fixed scoring schema and validates it.
//!
//! Every field of `AnalysisResult` is required. A response that is missing one,
//! or carries it with the wrong type, is a `Parse` error. Nothing is defaulted.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::analysis::prompts::{
    ANALYSIS_MAX_TOKENS, ANALYSIS_PROMPT_TEMPLATE, ANALYSIS_TEMPERATURE,
};
use crate::billing::tier::ADVANCED_MODEL;
use crate::errors::AppError;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{strip_json_fences, CompletionRequest, LlmProvider, ProviderUsage};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub overall_score: f64,
    pub tone_score: f64,
    pub structure_score: f64,
    pub clarity_score: f64,
    /// Higher means more likely to be flagged as spam.
    pub spam_score: f64,
    pub suggestions: Vec<String>,
    pub strengths: Vec<String>,
    pub red_flags: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub result: AnalysisResult,
    pub usage: ProviderUsage,
}

/// Parses raw model output, with or without a surrounding code fence.
pub fn parse_analysis(raw: &str) -> Result<AnalysisResult, AppError> {
    let json = strip_json_fences(raw);
    serde_json::from_str::<AnalysisResult>(json).map_err(|e| AppError::Parse {
        reason: e.to_string(),
        raw_response: raw.to_string(),
    })
}

/// Sends the full email text for scoring and returns the validated result.
pub async fn analyze(llm: &dyn LlmProvider, email_content: &str) -> Result<Analysis, AppError> {
    let prompt = ANALYSIS_PROMPT_TEMPLATE.replace("{email_content}", email_content);

    info!(
        "Analyzing email with {} ({} chars)",
        ADVANCED_MODEL,
        email_content.len()
    );

    let response = llm
        .complete(CompletionRequest {
            model: ADVANCED_MODEL,
            system: JSON_ONLY_SYSTEM,
            prompt: &prompt,
            max_tokens: ANALYSIS_MAX_TOKENS,
            temperature: ANALYSIS_TEMPERATURE,
        })
        .await?;

    let text = response.text().unwrap_or_default();
    let result = parse_analysis(text).map_err(|e| {
        warn!("Analysis response did not match the schema");
        e
    })?;

    info!(
        "Email analysis completed: score={}, suggestions={}",
        result.overall_score,
        result.suggestions.len()
    );

    Ok(Analysis {
        result,
        usage: response.usage,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockLlm;

    const VALID: &str = r#"{
        "overall_score": 78,
        "tone_score": 82,
        "structure_score": 75.5,
        "clarity_score": 80,
        "spam_score": 12,
        "suggestions": ["Shorten the opener"],
        "strengths": ["Clear CTA"],
        "red_flags": []
    }"#;

    #[test]
    fn test_fenced_and_bare_json_parse_identically() {
        let bare = parse_analysis(VALID).unwrap();
        let fenced = parse_analysis(&format!("```json\n{VALID}\n```")).unwrap();
        let untagged = parse_analysis(&format!("```\n{VALID}\n```")).unwrap();
        let upper = parse_analysis(&format!("```JSON\n{VALID}\n```")).unwrap();
        assert_eq!(bare, fenced);
        assert_eq!(bare, upper);
        assert_eq!(bare, untagged);
        assert_eq!(bare.overall_score, 78.0);
        assert_eq!(bare.structure_score, 75.5);
    }

    #[test]
    fn test_missing_overall_score_is_parse_error() {
        let without = VALID.replace("\"overall_score\": 78,", "");
        let err = parse_analysis(&without).unwrap_err();
        match err {
            AppError::Parse { raw_response, .. } => assert_eq!(raw_response, without),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_wrong_types_are_parse_errors() {
        let stringly = VALID.replace("\"spam_score\": 12", "\"spam_score\": \"low\"");
        assert!(matches!(parse_analysis(&stringly), Err(AppError::Parse { .. })));

        let no_array = VALID.replace("\"red_flags\": []", "\"red_flags\": null");
        assert!(matches!(parse_analysis(&no_array), Err(AppError::Parse { .. })));

        assert!(matches!(parse_analysis("not json"), Err(AppError::Parse { .. })));
    }

    #[tokio::test]
    async fn test_analyze_sends_full_email_and_uses_advanced_model() {
        let llm = MockLlm::replying(VALID);
        let email = "Subject: Quick question\n\nHi Dana, ...";
        let analysis = analyze(&llm, email).await.unwrap();
        assert_eq!(analysis.result.strengths, vec!["Clear CTA".to_string()]);

        let calls = llm.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].prompt.contains(email));
        assert_eq!(calls[0].model, ADVANCED_MODEL);
    }
}
