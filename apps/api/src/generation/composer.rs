//! Prompt composition: pure string construction, no I/O.
//!
//! Every caller-supplied field of the brief ends up in the rendered prompt.
//! Substitution is single-pass, so user text containing `{placeholders}` is
//! never expanded a second time.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::generation::prompts::{
    AIDA_INSTRUCTION, BRIEF_TEMPLATE, DEFAULT_FRAMEWORK_INSTRUCTION, DEFAULT_HOOK,
    FOUR_SENTENCE_INSTRUCTION, PAS_INSTRUCTION, PERSUASIVE_PITCH_INSTRUCTION,
    PROBLEM_SOLUTION_INSTRUCTION, SINGLE_EMAIL_INSTRUCTION, VARIANTS_INSTRUCTION,
};

/// History label for draft A of the dual flow.
pub const PERSUASIVE_PITCH: &str = "persuasive_pitch";
/// History label for draft B of the dual flow.
pub const PROBLEM_SOLUTION: &str = "problem_solution";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Professional,
    Friendly,
    Bold,
}

impl Tone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Professional => "professional",
            Self::Friendly => "friendly",
            Self::Bold => "bold",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Framework keys accepted by the single-prompt flow. Unknown keys fall back
/// to `Default`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Framework {
    Aida,
    Pas,
    FourSentence,
    #[default]
    #[serde(other)]
    Default,
}

impl Framework {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aida => "aida",
            Self::Pas => "pas",
            Self::FourSentence => "four_sentence",
            Self::Default => "default",
        }
    }

    fn instruction(&self) -> &'static str {
        match self {
            Self::Aida => AIDA_INSTRUCTION,
            Self::Pas => PAS_INSTRUCTION,
            Self::FourSentence => FOUR_SENTENCE_INSTRUCTION,
            Self::Default => DEFAULT_FRAMEWORK_INSTRUCTION,
        }
    }
}

/// What the user wants to write about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailBrief {
    pub product: String,
    pub audience: String,
    #[serde(default)]
    pub tone: Tone,
    #[serde(default, alias = "customHook")]
    pub custom_hook: Option<String>,
}

impl EmailBrief {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.product.trim().is_empty() {
            return Err(AppError::Validation(
                "product cannot be empty".to_string(),
            ));
        }
        if self.audience.trim().is_empty() {
            return Err(AppError::Validation(
                "audience cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// The caller's hook, or the stock sentence when none was given.
    pub fn hook(&self) -> &str {
        match self.custom_hook.as_deref().map(str::trim) {
            Some(hook) if !hook.is_empty() => hook,
            _ => DEFAULT_HOOK,
        }
    }

    fn render_header(&self) -> String {
        fill(
            BRIEF_TEMPLATE,
            &[
                ("audience", &self.audience),
                ("product", &self.product),
                ("tone", self.tone.as_str()),
                ("hook", self.hook()),
            ],
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DualPrompts {
    pub prompt_a: String,
    pub prompt_b: String,
}

/// Two structurally distinct single-email prompts: A persuasive pitch, B
/// problem/solution.
pub fn compose_dual_prompts(brief: &EmailBrief) -> DualPrompts {
    let header = brief.render_header();
    DualPrompts {
        prompt_a: format!("{header}\n\n{SINGLE_EMAIL_INSTRUCTION}\n\n{PERSUASIVE_PITCH_INSTRUCTION}"),
        prompt_b: format!("{header}\n\n{SINGLE_EMAIL_INSTRUCTION}\n\n{PROBLEM_SOLUTION_INSTRUCTION}"),
    }
}

/// One prompt asking for `variant_count` variants in the chosen framework.
pub fn compose_prompt(brief: &EmailBrief, framework: Framework, variant_count: u8) -> String {
    let header = brief.render_header();
    let count = variant_count.to_string();
    let variants = fill(VARIANTS_INSTRUCTION, &[("count", &count)]);
    format!("{header}\n\n{variants}\n\n{}", framework.instruction())
}

/// Replaces `{key}` markers in one pass. Unknown markers are kept verbatim.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let replacement = after.find('}').and_then(|close| {
            let key = &after[..close];
            values
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v, close))
        });
        match replacement {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
