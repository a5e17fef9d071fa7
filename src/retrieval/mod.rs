//! Retrieval engines
//!
//! Implements exact (flat) and approximate (HNSW) dense retrieval over chunk
//! embeddings.

use crate::data::Chunk;
use crate::embedding::{Embedder, Embedding};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub mod dense;
pub mod flat;

// Re-exports
pub use dense::*;
pub use flat::*;

/// Number of chunk texts sent to the embedder at once while indexing
const INDEX_BATCH_SIZE: usize = 64;

/// Search result with chunk and relevance score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Chunk ID
    pub chunk_id: String,
    /// The actual chunk content and metadata
    pub chunk: Chunk,
    /// Relevance score (higher is better)
    pub score: f32,
    /// Rank in the result list (1-indexed)
    pub rank: usize,
}

/// Index metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexMetadata {
    /// Model name used for embeddings
    pub model_name: String,
    /// Embedding dimension
    pub dimension: usize,
    /// Number of chunks indexed
    pub num_chunks: usize,
    /// Index creation timestamp
    pub created_at: String,
}

impl IndexMetadata {
    fn new(embedder: &dyn Embedder, dimension: usize, num_chunks: usize) -> Self {
        Self {
            model_name: embedder.model_name().to_string(),
            dimension,
            num_chunks,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Trait for retrieval engines
pub trait Retriever: Send + Sync {
    /// Retrieve top-k most relevant chunks for a query
    fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>>;

    /// Get the name of this retriever
    fn name(&self) -> &str;

    /// Number of indexed chunks
    fn len(&self) -> usize;

    /// Whether the index holds no chunks
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Metadata describing the index
    fn metadata(&self) -> &IndexMetadata;
}

/// Vector index implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    /// Exact cosine search over every vector
    #[default]
    Flat,
    /// Approximate nearest neighbour graph
    Hnsw,
}

impl std::str::FromStr for IndexKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "flat" | "exact" => Ok(Self::Flat),
            "hnsw" => Ok(Self::Hnsw),
            _ => Err(anyhow::anyhow!(
                "Invalid index kind: {}. Valid options: flat, hnsw",
                s
            )),
        }
    }
}

impl std::fmt::Display for IndexKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Flat => write!(f, "flat"),
            Self::Hnsw => write!(f, "hnsw"),
        }
    }
}

/// Embed all chunks and build the requested index
pub fn build_retriever(
    kind: IndexKind,
    chunks: Vec<Chunk>,
    embedder: Arc<dyn Embedder>,
    hnsw_config: HnswConfig,
) -> Result<Arc<dyn Retriever>> {
    if chunks.is_empty() {
        anyhow::bail!("Cannot build index with empty chunks");
    }

    let start = std::time::Instant::now();
    let embeddings = embed_chunks(&chunks, embedder.as_ref())?;
    tracing::debug!(
        "Embedded {} chunks in {:.2?}",
        chunks.len(),
        start.elapsed()
    );

    let retriever: Arc<dyn Retriever> = match kind {
        IndexKind::Flat => Arc::new(FlatRetriever::build(chunks, embeddings, embedder)?),
        IndexKind::Hnsw => Arc::new(HnswRetriever::build(chunks, embeddings, embedder, hnsw_config)?),
    };

    tracing::info!(
        "Built {} index with {} chunks",
        retriever.name(),
        retriever.len()
    );

    Ok(retriever)
}

fn embed_chunks(chunks: &[Chunk], embedder: &dyn Embedder) -> Result<Vec<Embedding>> {
    let mut embeddings = Vec::with_capacity(chunks.len());

    for batch in chunks.chunks(INDEX_BATCH_SIZE) {
        let texts: Vec<&str> = batch.iter().map(|c| c.content.as_str()).collect();
        let vectors = embedder
            .embed_batch(&texts)
            .context("Failed to embed chunks")?;
        embeddings.extend(vectors);
    }

    Ok(embeddings)
}
