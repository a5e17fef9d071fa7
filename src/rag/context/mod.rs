//! Context building for RAG prompts
//!
//! Provides utilities for assembling retrieved passages into the system
//! instruction sent alongside the user's question.

mod builder;
mod templates;

pub use builder::{ContextBuilder, PASSAGE_SEPARATOR};
pub use templates::{PromptTemplates, DEFAULT_TEMPLATE};
