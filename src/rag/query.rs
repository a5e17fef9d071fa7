//! RAG query and response types
//!
//! Defines the chat message model shared by the session history and the
//! completion wire format, plus pipeline input/output.

use serde::{Deserialize, Serialize};

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Query input for RAG pipeline
#[derive(Debug, Clone)]
pub struct RagQuery {
    /// The user's question
    pub query: String,
    /// Number of chunks to retrieve
    pub top_k: usize,
}

impl RagQuery {
    /// Create a new RAG query
    pub fn new(query: &str) -> Self {
        Self {
            query: query.to_string(),
            top_k: 5,
        }
    }

    /// Set the number of chunks to retrieve
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }
}

/// Response from RAG pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagResponse {
    /// Generated answer
    pub answer: String,
    /// Joined passages sent to the model
    pub context: String,
    /// Number of retrieved chunks placed in the context
    pub chunks_used: usize,
    /// Retrieval time in milliseconds
    pub retrieval_time_ms: u64,
    /// Generation time in milliseconds
    pub generation_time_ms: u64,
}

impl RagResponse {
    /// Get total processing time in milliseconds
    pub fn total_time_ms(&self) -> u64 {
        self.retrieval_time_ms + self.generation_time_ms
    }
}

impl std::fmt::Display for RagResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.answer)?;
        writeln!(
            f,
            "\n({} passages, retrieval={}ms, generation={}ms, total={}ms)",
            self.chunks_used,
            self.retrieval_time_ms,
            self.generation_time_ms,
            self.total_time_ms()
        )
    }
}
