//! Dense retrieval using HNSW
//!
//! Approximate nearest neighbor search via hnsw_rs.

use crate::data::Chunk;
use crate::embedding::{Embedder, Embedding};
use crate::retrieval::{IndexMetadata, Retriever, SearchResult};
use anyhow::{Context, Result};
use hnsw_rs::hnsw::{Hnsw, Neighbour};
use hnsw_rs::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Dense retriever using HNSW for approximate nearest neighbor search
pub struct HnswRetriever {
    /// HNSW index for vector search
    hnsw: Hnsw<'static, f32, DistCosine>,
    /// Chunks addressed by HNSW point ID
    chunks: Vec<Chunk>,
    /// Embedder for query encoding
    embedder: Arc<dyn Embedder>,
    /// Search breadth
    ef_search: usize,
    /// Index metadata
    metadata: IndexMetadata,
}

/// Configuration for HNSW index
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HnswConfig {
    /// Maximum number of connections per layer (default: 16)
    pub max_connections: usize,
    /// Size of the dynamic candidate list (default: 200)
    pub ef_construction: usize,
    /// Maximum number of layers (default: 16)
    pub max_layers: u8,
    /// Candidate list size while searching (default: 64)
    pub ef_search: usize,
}

impl Default for HnswConfig {
    fn default() -> Self {
        Self {
            max_connections: 16,
            ef_construction: 200,
            max_layers: 16,
            ef_search: 64,
        }
    }
}

impl HnswRetriever {
    /// Build a new HNSW index from chunks and embeddings
    pub fn build(
        chunks: Vec<Chunk>,
        embeddings: Vec<Embedding>,
        embedder: Arc<dyn Embedder>,
        config: HnswConfig,
    ) -> Result<Self> {
        if chunks.len() != embeddings.len() {
            anyhow::bail!(
                "Chunk count ({}) doesn't match embedding count ({})",
                chunks.len(),
                embeddings.len()
            );
        }

        if chunks.is_empty() {
            anyhow::bail!("Cannot build index with empty chunks");
        }

        let dimension = embeddings[0].len();
        tracing::debug!(
            "Building HNSW index: {} chunks, {} dimensions",
            chunks.len(),
            dimension
        );

        let mut hnsw: Hnsw<f32, DistCosine> = Hnsw::new(
            config.max_connections,
            chunks.len(),
            config.max_layers.min(16) as usize,
            config.ef_construction,
            DistCosine,
        );

        for (point_id, embedding) in embeddings.iter().enumerate() {
            hnsw.insert((embedding.as_slice(), point_id));
        }
        hnsw.set_searching_mode(true);

        let metadata = IndexMetadata::new(embedder.as_ref(), dimension, chunks.len());

        Ok(Self {
            hnsw,
            chunks,
            embedder,
            ef_search: config.ef_search,
            metadata,
        })
    }
}

impl Retriever for HnswRetriever {
    fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        let query_embedding = self.embedder.embed(query)
            .context("Failed to embed query")?;

        let neighbors: Vec<Neighbour> = self.hnsw.search(
            query_embedding.as_slice(),
            top_k,
            self.ef_search.max(top_k),
        );

        let mut results = Vec::with_capacity(neighbors.len());
        for neighbor in &neighbors {
            if let Some(chunk) = self.chunks.get(neighbor.d_id) {
                // hnsw_rs returns cosine distance; report similarity
                results.push(SearchResult {
                    chunk_id: chunk.id.clone(),
                    chunk: chunk.clone(),
                    score: 1.0 - neighbor.distance,
                    rank: results.len() + 1,
                });
            }
        }

        Ok(results)
    }

    fn name(&self) -> &str {
        "hnsw"
    }

    fn len(&self) -> usize {
        self.chunks.len()
    }

    fn metadata(&self) -> &IndexMetadata {
        &self.metadata
    }
}
