// Email generation.
// Flow: compose prompt(s) → entitlement gate → LLM → increment usage → history.
// All LLM calls go through llm_client.

pub mod composer;
pub mod gate;
pub mod handlers;
pub mod prompts;
pub mod writer;
