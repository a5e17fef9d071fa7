//! Embedding backend implementations
//!
//! The sentence-transformer backend runs locally through candle; the token and
//! mock backends need no model download.

use crate::embedding::{normalize_embedding, DevicePreference, Embedder, Embedding, EmbeddingConfig};
use anyhow::Result;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use unicode_segmentation::UnicodeSegmentation;

#[cfg(feature = "candle")]
pub mod minilm;

#[cfg(feature = "candle")]
pub use minilm::MiniLmEmbedder;

/// Dimension used by the model-free backends (matches MiniLM-L6)
pub const FALLBACK_DIMENSION: usize = 384;

/// Mock embedder for testing (generates random but deterministic embeddings)
pub struct MockEmbedder {
    config: EmbeddingConfig,
    dimension: usize,
    name: String,
}

impl MockEmbedder {
    /// Create a new mock embedder
    pub fn new(config: EmbeddingConfig, dimension: usize) -> Self {
        let name = format!("mock-{}", dimension);
        Self { config, dimension, name }
    }

    /// Generate a deterministic embedding based on text hash
    fn generate_embedding(&self, text: &str) -> Embedding {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let mut state = hasher.finish();

        let mut embedding = Vec::with_capacity(self.dimension);
        for _ in 0..self.dimension {
            // Simple LCG
            state = state.wrapping_mul(1103515245).wrapping_add(12345);
            let value = ((state / 65536) % 10000) as f32 / 10000.0 - 0.5;
            embedding.push(value);
        }

        if self.config.normalize {
            normalize_embedding(&mut embedding);
        }
        embedding
    }
}

impl Embedder for MockEmbedder {
    fn embed(&self, text: &str) -> Result<Embedding> {
        Ok(self.generate_embedding(text))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        Ok(texts.iter().map(|&text| self.generate_embedding(text)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.name
    }
}

/// Hashed bag-of-words embedder
///
/// Each lower-cased word is hashed into one of `dimension` buckets and the
/// bucket counts are term-frequency normalized. Texts sharing vocabulary end
/// up close in cosine space, which is enough for offline use and tests.
pub struct TokenEmbedder {
    config: EmbeddingConfig,
    dimension: usize,
    name: String,
}

impl TokenEmbedder {
    /// Create a new token-based embedder
    pub fn new(config: EmbeddingConfig, dimension: usize) -> Self {
        let name = format!("token-hash-{}", dimension);
        Self { config, dimension, name }
    }

    fn generate_embedding(&self, text: &str) -> Embedding {
        let mut embedding = vec![0.0; self.dimension];

        let tokens: Vec<String> = text.unicode_words().map(|w| w.to_lowercase()).collect();
        if tokens.is_empty() {
            return embedding;
        }

        for token in &tokens {
            let mut hasher = DefaultHasher::new();
            token.hash(&mut hasher);
            let idx = (hasher.finish() as usize) % self.dimension;
            embedding[idx] += 1.0;
        }

        let total_tokens = tokens.len() as f32;
        for val in embedding.iter_mut() {
            *val /= total_tokens;
        }

        if self.config.normalize {
            normalize_embedding(&mut embedding);
        }

        embedding
    }
}

impl Embedder for TokenEmbedder {
    fn embed(&self, text: &str) -> Result<Embedding> {
        Ok(self.generate_embedding(text))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        Ok(texts.iter().map(|&text| self.generate_embedding(text)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.name
    }
}

/// Create an embedder based on backend name
pub fn create_embedder(
    backend: &str,
    config: EmbeddingConfig,
    device: DevicePreference,
) -> Result<Arc<dyn Embedder>> {
    match backend {
        "minilm" => {
            #[cfg(feature = "candle")]
            {
                Ok(Arc::new(MiniLmEmbedder::new(config, device)?))
            }
            #[cfg(not(feature = "candle"))]
            {
                let _ = (config, device);
                anyhow::bail!("MiniLM backend not enabled. Compile with --features candle")
            }
        }
        "token" => Ok(Arc::new(TokenEmbedder::new(config, FALLBACK_DIMENSION))),
        "mock" => Ok(Arc::new(MockEmbedder::new(config, FALLBACK_DIMENSION))),
        _ => {
            tracing::warn!("Unknown backend '{}', using token-based embedder", backend);
            Ok(Arc::new(TokenEmbedder::new(config, FALLBACK_DIMENSION)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::cosine_similarity;

    #[test]
    fn test_mock_embedder() {
        let config = EmbeddingConfig {
            model_name: "test-model".to_string(),
            normalize: true,
            ..Default::default()
        };
        let embedder = MockEmbedder::new(config, 128);

        let text = "Hello, world!";
        let emb = embedder.embed(text).unwrap();

        assert_eq!(emb.len(), 128);

        // Should be deterministic
        let emb2 = embedder.embed(text).unwrap();
        assert_eq!(emb, emb2);

        // Different text should give different embedding
        let emb3 = embedder.embed("Different text").unwrap();
        assert_ne!(emb, emb3);
    }

    #[test]
    fn test_token_embedder_similarity() {
        let embedder = TokenEmbedder::new(EmbeddingConfig::default(), 256);

        let question = embedder.embed("What do mitochondria produce?").unwrap();
        let related = embedder.embed("Mitochondria produce ATP for the cell.").unwrap();
        let unrelated = embedder.embed("The treaty was signed in 1648.").unwrap();

        assert_eq!(question.len(), 256);
        assert!(cosine_similarity(&question, &related) > cosine_similarity(&question, &unrelated));
    }

    #[test]
    fn test_token_embedder_is_case_insensitive() {
        let embedder = TokenEmbedder::new(EmbeddingConfig::default(), 64);

        let a = embedder.embed("Photosynthesis").unwrap();
        let b = embedder.embed("photosynthesis").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_token_embedder_empty_text() {
        let embedder = TokenEmbedder::new(EmbeddingConfig::default(), 32);
        let emb = embedder.embed("  ... ").unwrap();
        assert!(emb.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_embedder_batch() {
        let embedder = MockEmbedder::new(EmbeddingConfig::default(), 64);

        let texts = vec!["text1", "text2", "text3"];
        let embeddings = embedder.embed_batch(&texts).unwrap();

        assert_eq!(embeddings.len(), 3);
        assert_eq!(embeddings[0].len(), 64);
    }

    #[test]
    fn test_create_embedder_fallbacks() {
        let embedder =
            create_embedder("token", EmbeddingConfig::default(), DevicePreference::Cpu).unwrap();
        assert_eq!(embedder.dimension(), FALLBACK_DIMENSION);

        let unknown =
            create_embedder("word2vec", EmbeddingConfig::default(), DevicePreference::Cpu).unwrap();
        assert_eq!(unknown.dimension(), FALLBACK_DIMENSION);
    }

    #[test]
    fn test_model_free_backends_report_own_name() {
        let token =
            create_embedder("token", EmbeddingConfig::default(), DevicePreference::Cpu).unwrap();
        assert_eq!(token.model_name(), "token-hash-384");

        let mock = create_embedder("mock", EmbeddingConfig::default(), DevicePreference::Cpu).unwrap();
        assert_eq!(mock.model_name(), "mock-384");
    }
}
