//! RAG Pipeline orchestration
//!
//! Coordinates retrieval and generation for question answering over the
//! processed documents.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Instant;

use crate::retrieval::Retriever;

use super::context::{ContextBuilder, DEFAULT_TEMPLATE};
use super::generator::{Generator, SamplingParams};
use super::query::{RagQuery, RagResponse};

/// Configuration for the RAG pipeline
#[derive(Debug, Clone)]
pub struct RagConfig {
    /// Number of chunks to retrieve
    pub top_k: usize,

    /// System prompt template to use
    pub template_name: String,

    /// Sampling parameters for generation
    pub sampling_params: SamplingParams,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            template_name: DEFAULT_TEMPLATE.to_string(),
            sampling_params: SamplingParams::default(),
        }
    }
}

impl RagConfig {
    /// Create a new config with specified top_k
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Set template name
    pub fn with_template(mut self, template: &str) -> Self {
        self.template_name = template.to_string();
        self
    }

    /// Set sampling parameters
    pub fn with_sampling_params(mut self, params: SamplingParams) -> Self {
        self.sampling_params = params;
        self
    }
}

/// RAG Pipeline for document question-answering
///
/// 1. Retrieve the top-K chunks for the question
/// 2. Render them into the system instruction
/// 3. Send `[system, user]` to the generator once
pub struct RagPipeline {
    retriever: Arc<dyn Retriever>,
    generator: Arc<dyn Generator>,
    context_builder: ContextBuilder,
    config: RagConfig,
}

impl RagPipeline {
    /// Create a new pipeline
    pub fn new(
        retriever: Arc<dyn Retriever>,
        generator: Arc<dyn Generator>,
        config: RagConfig,
    ) -> Self {
        Self {
            retriever,
            generator,
            context_builder: ContextBuilder::new(),
            config,
        }
    }

    /// Replace the context builder (custom templates)
    pub fn with_context_builder(mut self, context_builder: ContextBuilder) -> Self {
        self.context_builder = context_builder;
        self
    }

    /// Answer a question from the indexed documents
    pub fn answer(&self, query: RagQuery) -> Result<RagResponse> {
        let retrieval_start = Instant::now();
        let search_results = self
            .retriever
            .retrieve(&query.query, query.top_k)
            .context("Retrieval failed")?;
        let retrieval_time_ms = retrieval_start.elapsed().as_millis() as u64;

        tracing::debug!(
            "Retrieved {} chunks in {}ms",
            search_results.len(),
            retrieval_time_ms
        );

        let (messages, context) = self.context_builder.build_messages(
            &query.query,
            &search_results,
            &self.config.template_name,
        );

        let generation_start = Instant::now();
        let answer = self
            .generator
            .generate(&messages, &self.config.sampling_params)?;
        let generation_time_ms = generation_start.elapsed().as_millis() as u64;

        Ok(RagResponse {
            answer,
            context,
            chunks_used: search_results.len(),
            retrieval_time_ms,
            generation_time_ms,
        })
    }

    /// Build a query with the configured top-K
    pub fn query(&self, question: &str) -> RagQuery {
        RagQuery::new(question).with_top_k(self.config.top_k)
    }

    /// Get the retriever reference
    pub fn retriever(&self) -> &dyn Retriever {
        self.retriever.as_ref()
    }

    /// Get the config
    pub fn config(&self) -> &RagConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::query::{ChatMessage, Role};
    use crate::retrieval::tests::{chunk, token_embedder};
    use crate::retrieval::{build_retriever, HnswConfig, IndexKind};
    use std::sync::Mutex;

    /// Records every prompt and replies with a fixed answer
    struct EchoGenerator {
        prompts: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl Generator for EchoGenerator {
        fn generate(&self, messages: &[ChatMessage], _params: &SamplingParams) -> Result<String> {
            self.prompts.lock().unwrap().push(messages.to_vec());
            Ok("Mitochondria produce ATP.".to_string())
        }

        fn model_name(&self) -> &str {
            "echo"
        }

        fn has_credentials(&self) -> bool {
            true
        }
    }

    #[test]
    fn test_rag_config_defaults() {
        let config = RagConfig::default();

        assert_eq!(config.top_k, 5);
        assert_eq!(config.template_name, "study");
        assert_eq!(config.sampling_params, SamplingParams::default());
    }

    #[test]
    fn test_answer_sends_system_and_user_once() {
        let chunks = vec![
            chunk("c1", "Mitochondria produce ATP through respiration"),
            chunk("c2", "The Treaty of Westphalia was signed in 1648"),
        ];
        let retriever =
            build_retriever(IndexKind::Flat, chunks, token_embedder(), HnswConfig::default()).unwrap();
        let generator = Arc::new(EchoGenerator {
            prompts: Mutex::new(Vec::new()),
        });

        let pipeline = RagPipeline::new(retriever, generator.clone(), RagConfig::default().with_top_k(1));
        let response = pipeline.answer(pipeline.query("What do mitochondria produce?")).unwrap();

        assert_eq!(response.answer, "Mitochondria produce ATP.");
        assert_eq!(response.chunks_used, 1);
        assert!(response.context.contains("Mitochondria produce ATP"));

        let prompts = generator.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0].len(), 2);
        assert_eq!(prompts[0][0].role, Role::System);
        assert_eq!(prompts[0][1].content, "What do mitochondria produce?");
    }
}
