//! # maildraft Core
//!
//! Domain types, traits, and error definitions for the maildraft
//! email-drafting assistant. This crate has **zero framework dependencies**:
//! it defines the request/response model and the two external
//! collaborators (knowledge retriever and language model) that the other
//! crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator is a trait here. Implementations live in
//! `maildraft-providers`. This enables:
//! - Swapping HTTP backends via configuration
//! - Testing the orchestrator with in-memory fakes
//! - Clean dependency graph (all crates depend inward on core)

pub mod draft;
pub mod error;
pub mod message;
pub mod model;
pub mod provider;
pub mod retriever;

// Re-export key types at crate root for ergonomics
pub use draft::{ConversationTurn, DraftRequest, DraftResponse, Speaker};
pub use error::{DraftError, ErrorEnvelope, ProviderError, RetrievalError, ValidationError};
pub use message::{Message, Role};
pub use model::ModelId;
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use retriever::{RetrievalQuery, RetrievedPassage, Retriever, SourceLocation};
