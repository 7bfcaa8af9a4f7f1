// Email analysis: pro-only scoring of a drafted email.
// All LLM calls go through llm_client.

pub mod analyzer;
pub mod handlers;
pub mod prompts;
