//! Generator module for answer generation
//!
//! Provides a trait-based abstraction over chat-completion backends and the
//! hosted OpenAI-compatible implementation.

pub mod chat_completion;
pub mod config;

pub use chat_completion::{ChatCompletionGenerator, CompletionError};
pub use config::{GeneratorConfig, SamplingParams, DEFAULT_BASE_URL, DEFAULT_MODEL};

use crate::rag::query::ChatMessage;
use anyhow::Result;
use std::sync::Arc;

/// Trait for answer generation backends
pub trait Generator: Send + Sync {
    /// Produce a completion for the given messages
    ///
    /// Implementations make exactly one request per call.
    fn generate(&self, messages: &[ChatMessage], params: &SamplingParams) -> Result<String>;

    /// Get the model name/identifier
    fn model_name(&self) -> &str;

    /// Whether a credential is configured; without one `generate` must not be called
    fn has_credentials(&self) -> bool;
}

/// Factory function for creating generators
pub fn create_generator(config: GeneratorConfig) -> Result<Arc<dyn Generator>> {
    Ok(Arc::new(ChatCompletionGenerator::new(config)?))
}
