//! Session assembly from settings

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::Settings;
use crate::data::{create_chunker, Chunker, DocumentLoader, MultiFormatLoader};
use crate::embedding::{create_embedder, Embedder};
use crate::rag::{create_generator, Generator};

use super::{Session, SessionParts};

/// Builds a [`Session`] from [`Settings`], with optional component overrides
pub struct SessionBuilder {
    settings: Settings,
    api_key: Option<String>,
    loader: Option<Box<dyn DocumentLoader>>,
    chunker: Option<Box<dyn Chunker>>,
    embedder: Option<Arc<dyn Embedder>>,
    generator: Option<Arc<dyn Generator>>,
}

impl SessionBuilder {
    /// Start from settings and the resolved API key (if any)
    pub fn from_settings(settings: &Settings, api_key: Option<String>) -> Self {
        Self {
            settings: settings.clone(),
            api_key,
            loader: None,
            chunker: None,
            embedder: None,
            generator: None,
        }
    }

    pub fn with_loader(mut self, loader: Box<dyn DocumentLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn with_chunker(mut self, chunker: Box<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    pub fn with_embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn with_generator(mut self, generator: Arc<dyn Generator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Create any component not supplied explicitly and assemble the session
    ///
    /// Loading the embedding model may download it on first use.
    pub fn build(self) -> Result<Session> {
        let settings = self.settings;
        settings.validate()?;

        let loader = self
            .loader
            .unwrap_or_else(|| Box::new(MultiFormatLoader::new()));

        let chunker = self
            .chunker
            .unwrap_or_else(|| create_chunker(&settings.ingest.strategy, settings.chunk_config()));

        let embedder = match self.embedder {
            Some(embedder) => embedder,
            None => create_embedder(
                &settings.embedding.backend,
                settings.embedding_config(),
                settings.embedding.device,
            )
            .context("Failed to initialize embedding model")?,
        };

        let generator = match self.generator {
            Some(generator) => generator,
            None => create_generator(settings.generator_config(self.api_key))?,
        };

        tracing::info!(
            "Session ready: embedder={}, index={}, model={}",
            embedder.model_name(),
            settings.retrieval.index,
            generator.model_name()
        );

        Ok(Session::new(SessionParts {
            loader,
            chunker,
            embedder,
            generator,
            index_kind: settings.retrieval.index,
            hnsw: settings.retrieval.hnsw.clone(),
            rag: settings.rag_config(),
            credential_key: settings.llm.api_key_env.clone(),
        }))
    }
}
