//! Single-user study session
//!
//! Owns the processed documents, the search index built from them and the
//! chat history. All state lives in memory for the lifetime of the session.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::data::{display_name, Chunk, Chunker, DocumentLoader};
use crate::embedding::Embedder;
use crate::rag::{ChatMessage, Generator, RagConfig, RagPipeline};
use crate::retrieval::{build_retriever, HnswConfig, IndexKind, Retriever};

mod builder;
mod error;

pub use builder::SessionBuilder;
pub use error::{Notice, NoticeLevel, SessionError};

/// Components a session is assembled from
pub struct SessionParts {
    pub loader: Box<dyn DocumentLoader>,
    pub chunker: Box<dyn Chunker>,
    pub embedder: Arc<dyn Embedder>,
    pub generator: Arc<dyn Generator>,
    pub index_kind: IndexKind,
    pub hnsw: HnswConfig,
    pub rag: RagConfig,
    /// Name of the secret the generator's credential comes from
    pub credential_key: String,
}

/// Searchable index over the last processed documents
pub struct KnowledgeBase {
    retriever: Arc<dyn Retriever>,
}

impl KnowledgeBase {
    pub fn retriever(&self) -> Arc<dyn Retriever> {
        Arc::clone(&self.retriever)
    }

    /// Number of indexed chunks
    pub fn len(&self) -> usize {
        self.retriever.len()
    }

    pub fn is_empty(&self) -> bool {
        self.retriever.is_empty()
    }
}

/// Outcome of a successful processing action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessSummary {
    /// Display names of the files that were read
    pub documents: Vec<String>,
    /// Number of chunks in the new index
    pub chunks: usize,
    /// Files that could not be read, with the reason
    pub skipped: Vec<(String, String)>,
}

impl ProcessSummary {
    pub fn message(&self) -> String {
        format!("{} document(s) processed!", self.documents.len())
    }
}

/// Whether questions can be answered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    Ready,
    WaitingForDocuments,
}

impl SessionStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ready => "Ready to answer",
            Self::WaitingForDocuments => "Waiting for documents",
        }
    }
}

/// Read-only view of the session for rendering
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub document_names: Vec<String>,
    pub history: Vec<ChatMessage>,
    pub status: SessionStatus,
    pub chunk_count: usize,
    pub embedder_name: String,
    pub model_name: String,
}

/// Session state plus the components that act on it
pub struct Session {
    loader: Box<dyn DocumentLoader>,
    chunker: Box<dyn Chunker>,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
    index_kind: IndexKind,
    hnsw: HnswConfig,
    rag: RagConfig,
    credential_key: String,

    document_names: Vec<String>,
    index: Option<KnowledgeBase>,
    history: Vec<ChatMessage>,
}

impl Session {
    pub fn new(parts: SessionParts) -> Self {
        Self {
            loader: parts.loader,
            chunker: parts.chunker,
            embedder: parts.embedder,
            generator: parts.generator,
            index_kind: parts.index_kind,
            hnsw: parts.hnsw,
            rag: parts.rag,
            credential_key: parts.credential_key,
            document_names: Vec::new(),
            index: None,
            history: Vec::new(),
        }
    }

    /// Extract, chunk and index the given files, replacing any previous index
    ///
    /// Files that fail to load are skipped and reported. When no text at all
    /// can be extracted the previous documents and index are kept.
    pub fn process_documents(&mut self, paths: &[PathBuf]) -> Result<ProcessSummary, SessionError> {
        if paths.is_empty() {
            return Err(SessionError::NoFiles);
        }

        tracing::info!("Processing {} file(s)", paths.len());

        let mut names = Vec::with_capacity(paths.len());
        let mut skipped = Vec::new();
        let mut chunks: Vec<Chunk> = Vec::new();

        for path in paths {
            let document = match self.loader.load(path) {
                Ok(document) => document,
                Err(e) => {
                    tracing::warn!("Skipping {:?}: {:#}", path, e);
                    skipped.push((display_name(path), format!("{:#}", e)));
                    continue;
                }
            };

            names.push(document.source.clone());

            if !document.has_text() {
                tracing::warn!("{} has no extractable text", document.source);
                continue;
            }

            match self.chunker.chunk(&document) {
                Ok(doc_chunks) => {
                    tracing::debug!("{}: {} chunks", document.source, doc_chunks.len());
                    chunks.extend(doc_chunks);
                }
                Err(e) => {
                    tracing::warn!("Failed to chunk {}: {:#}", document.source, e);
                    skipped.push((document.source.clone(), format!("{:#}", e)));
                }
            }
        }

        if chunks.is_empty() {
            return Err(SessionError::NoExtractableText);
        }

        let retriever = build_retriever(
            self.index_kind,
            chunks,
            Arc::clone(&self.embedder),
            self.hnsw.clone(),
        )
        .map_err(SessionError::Indexing)?;

        let summary = ProcessSummary {
            documents: names.clone(),
            chunks: retriever.len(),
            skipped,
        };

        self.document_names = names;
        self.index = Some(KnowledgeBase { retriever });

        tracing::info!("{} ({} chunks)", summary.message(), summary.chunks);
        Ok(summary)
    }

    /// Answer a question and record the exchange in the history
    ///
    /// Pre-check failures leave the history untouched and make no request.
    /// A failed completion is recorded as an assistant message `Error: ...`.
    pub fn ask(&mut self, question: &str) -> Result<&ChatMessage, SessionError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(SessionError::EmptyQuestion);
        }

        if !self.generator.has_credentials() {
            return Err(SessionError::MissingCredential {
                key: self.credential_key.clone(),
            });
        }

        let retriever = match &self.index {
            Some(index) => index.retriever(),
            None => return Err(SessionError::NoDocuments),
        };

        self.history.push(ChatMessage::user(question));

        let pipeline = RagPipeline::new(retriever, Arc::clone(&self.generator), self.rag.clone());
        let reply = match pipeline.answer(pipeline.query(question)) {
            Ok(response) => {
                tracing::info!(
                    "Answered from {} passages in {}ms",
                    response.chunks_used,
                    response.total_time_ms()
                );
                response.answer
            }
            Err(e) => {
                tracing::warn!("Answer failed: {:#}", e);
                format!("Error: {:#}", e)
            }
        };

        self.history.push(ChatMessage::assistant(reply));
        Ok(&self.history[self.history.len() - 1])
    }

    /// Empty the chat history; documents and index are kept
    pub fn clear_chat(&mut self) {
        self.history.clear();
    }

    pub fn status(&self) -> SessionStatus {
        if self.index.is_some() {
            SessionStatus::Ready
        } else {
            SessionStatus::WaitingForDocuments
        }
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn document_names(&self) -> &[String] {
        &self.document_names
    }

    pub fn index(&self) -> Option<&KnowledgeBase> {
        self.index.as_ref()
    }

    pub fn rag_config(&self) -> &RagConfig {
        &self.rag
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            document_names: self.document_names.clone(),
            history: self.history.clone(),
            status: self.status(),
            chunk_count: self.index.as_ref().map(KnowledgeBase::len).unwrap_or(0),
            embedder_name: self.embedder.model_name().to_string(),
            model_name: self.generator.model_name().to_string(),
        }
    }
}
