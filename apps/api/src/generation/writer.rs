//! Generation facade: sends one prompt to the model and relays raw text.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::billing::tier::Tier;
use crate::errors::AppError;
use crate::llm_client::prompts::COPYWRITER_SYSTEM;
use crate::llm_client::{CompletionRequest, LlmError, LlmProvider, ProviderUsage};

const GENERATION_TEMPERATURE: f32 = 0.7;
const GENERATION_MAX_TOKENS: u32 = 800;

/// Raw model output for one completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedText {
    pub result: String,
    pub usage: ProviderUsage,
}

/// Runs one completion with the copywriter system instruction and the
/// tier's generation model.
pub async fn generate(
    llm: &dyn LlmProvider,
    prompt: &str,
    tier: Tier,
) -> Result<GeneratedText, AppError> {
    debug!("Generation prompt: {prompt}");

    let response = llm
        .complete(CompletionRequest {
            model: tier.generation_model(),
            system: COPYWRITER_SYSTEM,
            prompt,
            max_tokens: GENERATION_MAX_TOKENS,
            temperature: GENERATION_TEMPERATURE,
        })
        .await?;

    let text = response
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(LlmError::EmptyContent)?;

    info!(
        "Email generated: model={}, output_tokens={}",
        tier.generation_model(),
        response.usage.output_tokens
    );

    Ok(GeneratedText {
        result: text.to_string(),
        usage: response.usage,
    })
}

/// An email split into its subject line and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEmail {
    pub subject: Option<String>,
    pub body: String,
}

/// Finds the first `subject:` line (markdown emphasis and headings ignored)
/// and treats everything after it as the body.
pub fn split_subject(text: &str) -> ParsedEmail {
    let lines: Vec<&str> = text.lines().collect();

    for (index, line) in lines.iter().enumerate() {
        let cleaned = line.trim().trim_start_matches(['*', '#', ' ']);
        let Some(prefix) = cleaned.get(..8) else {
            continue;
        };
        if !prefix.eq_ignore_ascii_case("subject:") {
            continue;
        }
        let subject = cleaned[8..].trim().trim_matches('*').trim();
        let body = lines[index + 1..].join("\n").trim().to_string();
        return ParsedEmail {
            subject: (!subject.is_empty()).then(|| subject.to_string()),
            body,
        };
    }

    ParsedEmail {
        subject: None,
        body: text.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::tier::{ADVANCED_MODEL, STANDARD_MODEL};
    use crate::testing::MockLlm;

    #[test]
    fn test_split_plain_subject() {
        let parsed = split_subject("Subject: Quick idea for Acme\n\nHi Sam,\nBody here.");
        assert_eq!(parsed.subject.as_deref(), Some("Quick idea for Acme"));
        assert_eq!(parsed.body, "Hi Sam,\nBody here.");
    }

    #[test]
    fn test_split_markdown_subject() {
        let parsed = split_subject("**Subject:** Cut payroll time in half\n\nHello");
        assert_eq!(parsed.subject.as_deref(), Some("Cut payroll time in half"));
        assert_eq!(parsed.body, "Hello");

        let parsed = split_subject("### SUBJECT: Loud\nBody");
        assert_eq!(parsed.subject.as_deref(), Some("Loud"));
    }

    #[test]
    fn test_split_without_subject_keeps_whole_text() {
        let parsed = split_subject("  Hi there,\nNo subject here.  ");
        assert_eq!(parsed.subject, None);
        assert_eq!(parsed.body, "Hi there,\nNo subject here.");
    }

    #[test]
    fn test_split_handles_multibyte_lines() {
        let parsed = split_subject("✉️ héllo\nSubject: Ünïcode\nbody");
        assert_eq!(parsed.subject.as_deref(), Some("Ünïcode"));
        assert_eq!(parsed.body, "body");
    }

    #[tokio::test]
    async fn test_generate_uses_tier_model_and_system_instruction() {
        let llm = MockLlm::replying("Subject: Hi\n\nBody");
        let out = generate(&llm, "write it", Tier::Free).await.unwrap();
        assert_eq!(out.result, "Subject: Hi\n\nBody");

        generate(&llm, "write it", Tier::Pro).await.unwrap();
        let calls = llm.calls();
        assert_eq!(calls[0].model, STANDARD_MODEL);
        assert_eq!(calls[1].model, ADVANCED_MODEL);
        assert_eq!(calls[0].system, COPYWRITER_SYSTEM);
    }

    #[tokio::test]
    async fn test_empty_completion_is_an_error() {
        let llm = MockLlm::replying("   ");
        let err = generate(&llm, "write it", Tier::Free).await.unwrap_err();
        assert_eq!(err.code(), "GENERATION_FAILED");
    }
}
