//! RAG (Retrieval-Augmented Generation) Pipeline
//!
//! Answers questions about the processed documents by retrieving the most
//! similar chunks and sending them, with the question, to a hosted model.
//!
//! # Architecture
//!
//! ```text
//! Question
//!     │
//!     ▼
//! ┌─────────────┐
//! │  Retriever  │  ← top-K chunks by cosine similarity
//! └─────────────┘
//!     │
//!     ▼ SearchResults
//! ┌─────────────┐
//! │   Context   │  ← passages joined into the system instruction
//! │   Builder   │
//! └─────────────┘
//!     │
//!     ▼ [system, user]
//! ┌─────────────┐
//! │  Generator  │  ← OpenAI-compatible chat completion (Groq)
//! └─────────────┘
//!     │
//!     ▼
//! RagResponse
//! ```

pub mod context;
pub mod generator;
pub mod pipeline;
pub mod query;

// Re-exports for convenience
pub use context::{ContextBuilder, PromptTemplates};
pub use generator::{
    create_generator, ChatCompletionGenerator, CompletionError, Generator, GeneratorConfig,
    SamplingParams,
};
pub use pipeline::{RagConfig, RagPipeline};
pub use query::{ChatMessage, RagQuery, RagResponse, Role};
