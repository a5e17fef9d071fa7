//! Exact dense retrieval
//!
//! Brute-force cosine similarity over every indexed vector.

use crate::data::Chunk;
use crate::embedding::{cosine_similarity, Embedder, Embedding};
use crate::retrieval::{IndexMetadata, Retriever, SearchResult};
use anyhow::{Context, Result};
use std::cmp::Ordering;
use std::sync::Arc;

/// Flat retriever holding chunks and their embeddings in insertion order
pub struct FlatRetriever {
    chunks: Vec<Chunk>,
    embeddings: Vec<Embedding>,
    embedder: Arc<dyn Embedder>,
    metadata: IndexMetadata,
}

impl FlatRetriever {
    /// Build a flat index from chunks and their embeddings
    pub fn build(
        chunks: Vec<Chunk>,
        embeddings: Vec<Embedding>,
        embedder: Arc<dyn Embedder>,
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
        if let Some(bad) = embeddings.iter().position(|e| e.len() != dimension) {
            anyhow::bail!(
                "Embedding {} has dimension {}, expected {}",
                bad,
                embeddings[bad].len(),
                dimension
            );
        }

        let metadata = IndexMetadata::new(embedder.as_ref(), dimension, chunks.len());

        Ok(Self {
            chunks,
            embeddings,
            embedder,
            metadata,
        })
    }

    /// Score every chunk against an already embedded query
    pub fn search_embedding(&self, query: &[f32], top_k: usize) -> Vec<SearchResult> {
        let mut scored: Vec<(usize, f32)> = self
            .embeddings
            .iter()
            .map(|e| cosine_similarity(query, e))
            .enumerate()
            .collect();

        // Stable sort keeps insertion order among equal scores
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        scored
            .into_iter()
            .take(top_k)
            .enumerate()
            .map(|(rank, (idx, score))| SearchResult {
                chunk_id: self.chunks[idx].id.clone(),
                chunk: self.chunks[idx].clone(),
                score,
                rank: rank + 1,
            })
            .collect()
    }
}

impl Retriever for FlatRetriever {
    fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        let query_embedding = self.embedder.embed(query)
            .context("Failed to embed query")?;

        Ok(self.search_embedding(&query_embedding, top_k))
    }

    fn name(&self) -> &str {
        "flat"
    }

    fn len(&self) -> usize {
        self.chunks.len()
    }

    fn metadata(&self) -> &IndexMetadata {
        &self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::tests::{chunk, token_embedder};

    #[test]
    fn test_scores_are_sorted_and_ranked() {
        let chunks = vec![chunk("a", "a"), chunk("b", "b"), chunk("c", "c")];
        let embeddings = vec![vec![0.0, 1.0], vec![1.0, 0.0], vec![0.7, 0.7]];
        let retriever = FlatRetriever::build(chunks, embeddings, token_embedder()).unwrap();

        let results = retriever.search_embedding(&[1.0, 0.0], 3);

        let ids: Vec<&str> = results.iter().map(|r| r.chunk_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
        assert_eq!(results.iter().map(|r| r.rank).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!(results[0].score >= results[1].score);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let chunks = vec![chunk("first", "x"), chunk("second", "x")];
        let embeddings = vec![vec![1.0, 0.0], vec![1.0, 0.0]];
        let retriever = FlatRetriever::build(chunks, embeddings, token_embedder()).unwrap();

        let results = retriever.search_embedding(&[1.0, 0.0], 2);
        assert_eq!(results[0].chunk_id, "first");
        assert_eq!(results[1].chunk_id, "second");
    }

    #[test]
    fn test_top_k_larger_than_index() {
        let chunks = vec![chunk("only", "photosynthesis in plants")];
        let embedder = token_embedder();
        let embeddings = vec![embedder.embed("photosynthesis in plants").unwrap()];
        let retriever = FlatRetriever::build(chunks, embeddings, embedder).unwrap();

        let results = retriever.retrieve("photosynthesis", 5).unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_mismatched_inputs_rejected() {
        let chunks = vec![chunk("a", "a"), chunk("b", "b")];
        assert!(FlatRetriever::build(chunks.clone(), vec![vec![1.0]], token_embedder()).is_err());
        assert!(FlatRetriever::build(chunks, vec![vec![1.0], vec![1.0, 0.0]], token_embedder()).is_err());
    }
}
