//! Application settings and secret resolution
//!
//! Settings come from built-in defaults, optionally overlaid by a TOML file.
//! The completion API key is never read from the settings file; it is
//! resolved from `secrets.toml` first and the process environment second.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::data::{ChunkConfig, DEFAULT_SEPARATORS};
use crate::embedding::{DevicePreference, EmbeddingConfig};
use crate::rag::context::DEFAULT_TEMPLATE;
use crate::rag::generator::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::rag::{GeneratorConfig, RagConfig, SamplingParams};
use crate::retrieval::{HnswConfig, IndexKind};

/// Settings file picked up from the working directory when present
pub const DEFAULT_SETTINGS_FILE: &str = "studybuddy.toml";

/// Secrets file consulted before the environment
pub const DEFAULT_SECRETS_FILE: &str = "secrets.toml";

/// Top-level settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub ingest: IngestSettings,
    pub embedding: EmbeddingSettings,
    pub retrieval: RetrievalSettings,
    pub llm: LlmSettings,
}

/// Text extraction and chunking
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestSettings {
    /// Chunking strategy: "recursive" or "fixed"
    pub strategy: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub separators: Vec<String>,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            strategy: "recursive".to_string(),
            chunk_size: 1000,
            chunk_overlap: 200,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Embedding model
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Backend: "minilm", "token" or "mock"
    pub backend: String,
    /// Hub model ID or local model directory
    pub model: String,
    pub normalize: bool,
    pub max_length: usize,
    pub batch_size: usize,
    pub device: DevicePreference,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        let defaults = EmbeddingConfig::default();
        Self {
            backend: "minilm".to_string(),
            model: defaults.model_name,
            normalize: defaults.normalize,
            max_length: defaults.max_length,
            batch_size: defaults.batch_size,
            device: DevicePreference::Cpu,
        }
    }
}

/// Vector index and search
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub index: IndexKind,
    pub top_k: usize,
    pub hnsw: HnswConfig,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            index: IndexKind::Flat,
            top_k: 5,
            hnsw: HnswConfig::default(),
        }
    }
}

/// Hosted completion endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    /// Name of the secret holding the API key
    pub api_key_env: String,
    /// System prompt template
    pub template: String,
}

impl Default for LlmSettings {
    fn default() -> Self {
        let sampling = SamplingParams::default();
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: sampling.temperature,
            max_tokens: sampling.max_tokens,
            timeout_secs: 120,
            api_key_env: "GROQ_API_KEY".to_string(),
            template: DEFAULT_TEMPLATE.to_string(),
        }
    }
}

impl Settings {
    /// Load settings from `path`, or from `studybuddy.toml` when it exists
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let settings = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Path::new(DEFAULT_SETTINGS_FILE);
                if default_path.is_file() {
                    Self::from_file(default_path)?
                } else {
                    Self::default()
                }
            }
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Parse a TOML settings file; missing sections keep their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read settings file: {:?}", path))?;
        let settings: Settings = toml::from_str(&content)
            .context(format!("Failed to parse settings file: {:?}", path))?;

        tracing::debug!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Reject values the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        self.chunk_config().validate()?;
        if self.retrieval.top_k == 0 {
            anyhow::bail!("retrieval.top_k must be at least 1");
        }
        if self.embedding.batch_size == 0 {
            anyhow::bail!("embedding.batch_size must be at least 1");
        }
        Ok(())
    }

    pub fn chunk_config(&self) -> ChunkConfig {
        ChunkConfig {
            chunk_size: self.ingest.chunk_size,
            chunk_overlap: self.ingest.chunk_overlap,
            separators: self.ingest.separators.clone(),
        }
    }

    pub fn embedding_config(&self) -> EmbeddingConfig {
        EmbeddingConfig {
            model_name: self.embedding.model.clone(),
            normalize: self.embedding.normalize,
            max_length: self.embedding.max_length,
            batch_size: self.embedding.batch_size,
        }
    }

    pub fn rag_config(&self) -> RagConfig {
        RagConfig::default()
            .with_top_k(self.retrieval.top_k)
            .with_template(&self.llm.template)
            .with_sampling_params(
                SamplingParams::default()
                    .with_temperature(self.llm.temperature)
                    .with_max_tokens(self.llm.max_tokens),
            )
    }

    pub fn generator_config(&self, api_key: Option<String>) -> GeneratorConfig {
        GeneratorConfig::new(&self.llm.model)
            .with_base_url(&self.llm.base_url)
            .with_timeout_secs(self.llm.timeout_secs)
            .with_api_key(api_key)
    }
}

/// Resolve a secret by name
///
/// Looks in the secrets file first (`secrets.toml` unless another path is
/// given), then in the environment after loading `.env`. Empty values count
/// as missing.
pub fn resolve_secret(key: &str, secrets_file: Option<&Path>) -> Option<String> {
    let secrets_path: PathBuf = secrets_file
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SECRETS_FILE));

    if let Some(value) = read_secrets_file(&secrets_path, key) {
        tracing::debug!("Resolved {} from {:?}", key, secrets_path);
        return Some(value);
    }

    dotenv::dotenv().ok();
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn read_secrets_file(path: &Path, key: &str) -> Option<String> {
    let content = std::fs::read_to_string(path).ok()?;

    let table: toml::Table = match toml::from_str(&content) {
        Ok(table) => table,
        Err(e) => {
            tracing::warn!("Ignoring unreadable secrets file {:?}: {}", path, e);
            return None;
        }
    };

    table
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .filter(|v| !v.trim().is_empty())
}
