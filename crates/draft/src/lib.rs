//! Draft orchestrator for maildraft.
//!
//! Turns one [`DraftRequest`](maildraft_core::DraftRequest) into one
//! [`DraftResponse`](maildraft_core::DraftResponse) through two sequential
//! external calls: knowledge retrieval, then model invocation with a
//! prefilled greeting.
//!
//! - [`prompt`]: fixed instructions and per-request prompt composition
//! - [`orchestrator`]: the linear Retrieve → Compose → Invoke → Cite pipeline
//! - [`handler`]: serverless-style event boundary with status codes
//! - [`validation`]: request body rules shared with the gateway

pub mod handler;
pub mod orchestrator;
pub mod prompt;
pub mod validation;

#[cfg(test)]
mod test_helpers;

pub use handler::{HandlerEvent, HandlerResponse, handle_event};
pub use orchestrator::{DraftOrchestrator, OrchestratorConfig};
pub use prompt::{FALLBACK_SENTENCE, GREETING_PREFILL, PromptBundle, SYSTEM_PROMPT, compose_prompt};
pub use validation::{parse_draft_request, validate_draft_request};
