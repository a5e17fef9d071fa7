//! Sentence-transformer embedder running on candle
//!
//! Loads a BERT-family sentence-transformer (all-MiniLM-L6-v2 by default) from
//! the Hugging Face Hub and produces mean-pooled, L2-normalized embeddings.

use anyhow::{anyhow, Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig, DTYPE};
use hf_hub::api::sync::Api;
use std::path::PathBuf;
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};

use crate::embedding::device::select_device;
use crate::embedding::{DevicePreference, Embedder, Embedding, EmbeddingConfig};

/// Files fetched from the Hub (or read from a local model directory)
struct ModelFiles {
    config: PathBuf,
    tokenizer: PathBuf,
    weights: PathBuf,
}

impl ModelFiles {
    fn resolve(model_id_or_path: &str) -> Result<Self> {
        let local = std::path::Path::new(model_id_or_path);
        if local.is_dir() {
            tracing::info!("Loading embedding model from local path: {}", model_id_or_path);
            return Ok(Self {
                config: local.join("config.json"),
                tokenizer: local.join("tokenizer.json"),
                weights: local.join("model.safetensors"),
            });
        }

        tracing::info!("Fetching embedding model from Hugging Face Hub: {}", model_id_or_path);
        let api = Api::new().context("Failed to initialize Hugging Face Hub API")?;
        let repo = api.model(model_id_or_path.to_string());

        Ok(Self {
            config: repo.get("config.json").context("Failed to download config.json")?,
            tokenizer: repo
                .get("tokenizer.json")
                .context("Failed to download tokenizer.json")?,
            weights: repo
                .get("model.safetensors")
                .context("Failed to download model.safetensors")?,
        })
    }
}

/// BERT sentence embedder with mean pooling
pub struct MiniLmEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    config: EmbeddingConfig,
    device: Device,
    hidden_size: usize,
}

impl MiniLmEmbedder {
    /// Load the model named in `config.model_name`
    pub fn new(config: EmbeddingConfig, device: DevicePreference) -> Result<Self> {
        let device = select_device(device)?;
        let files = ModelFiles::resolve(&config.model_name)?;

        let bert_config: BertConfig = serde_json::from_str(
            &std::fs::read_to_string(&files.config)
                .context(format!("Failed to read {:?}", files.config))?,
        )
        .context("Failed to parse config.json")?;
        let hidden_size = bert_config.hidden_size;

        let mut tokenizer = Tokenizer::from_file(&files.tokenizer)
            .map_err(|e| anyhow!("Failed to load tokenizer: {}", e))?;
        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::BatchLongest,
            ..Default::default()
        }));
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: config.max_length,
                ..Default::default()
            }))
            .map_err(|e| anyhow!("Failed to set truncation: {}", e))?;

        // SAFETY: the weights file is not modified while mapped
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[files.weights], DTYPE, &device)? };
        let model = BertModel::load(vb, &bert_config).context("Failed to load BERT weights")?;

        tracing::info!(
            "Embedding model ready: {} (dim={}, device={:?})",
            config.model_name,
            hidden_size,
            device
        );

        Ok(Self {
            model,
            tokenizer,
            config,
            device,
            hidden_size,
        })
    }

    /// Embed one padded batch, returning a [batch, hidden] tensor
    fn embed_batch_tensor(&self, texts: &[&str]) -> Result<Tensor> {
        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| anyhow!("Batch tokenization failed: {}", e))?;

        let batch_size = encodings.len();
        let seq_len = encodings.first().map(|e| e.get_ids().len()).unwrap_or(0);

        let mut input_ids = Vec::with_capacity(batch_size * seq_len);
        let mut type_ids = Vec::with_capacity(batch_size * seq_len);
        let mut mask = Vec::with_capacity(batch_size * seq_len);
        for encoding in &encodings {
            input_ids.extend_from_slice(encoding.get_ids());
            type_ids.extend_from_slice(encoding.get_type_ids());
            mask.extend_from_slice(encoding.get_attention_mask());
        }

        let input_ids = Tensor::from_vec(input_ids, (batch_size, seq_len), &self.device)?;
        let type_ids = Tensor::from_vec(type_ids, (batch_size, seq_len), &self.device)?;
        let mask = Tensor::from_vec(mask, (batch_size, seq_len), &self.device)?;

        let hidden = self.model.forward(&input_ids, &type_ids, Some(&mask))?;

        // Mean over real tokens only
        let mask = mask.to_dtype(DType::F32)?.unsqueeze(2)?;
        let summed = hidden.broadcast_mul(&mask)?.sum(1)?;
        let counts = mask.sum(1)?.clamp(1e-9, f64::MAX)?;
        let mut pooled = summed.broadcast_div(&counts)?;

        if self.config.normalize {
            let norms = pooled.sqr()?.sum_keepdim(1)?.sqrt()?.clamp(1e-12, f64::MAX)?;
            pooled = pooled.broadcast_div(&norms)?;
        }

        Ok(pooled)
    }
}

impl Embedder for MiniLmEmbedder {
    fn embed(&self, text: &str) -> Result<Embedding> {
        self.embed_batch(&[text])?
            .pop()
            .ok_or_else(|| anyhow!("Embedding model returned no vector"))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let mut all_embeddings = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.config.batch_size.max(1)) {
            let batch: Vec<Vec<f32>> = self.embed_batch_tensor(chunk)?.to_vec2()?;
            all_embeddings.extend(batch);
        }

        tracing::debug!("Embedded {} texts", all_embeddings.len());
        Ok(all_embeddings)
    }

    fn dimension(&self) -> usize {
        self.hidden_size
    }

    fn model_name(&self) -> &str {
        &self.config.model_name
    }
}
