//! Command-line interface
//!
//! Provides CLI commands for the interactive UI, one-shot questions and
//! retrieval-only search.

use crate::config::{resolve_secret, Settings};
use crate::embedding::DevicePreference;
use crate::retrieval::IndexKind;
use crate::session::{Session, SessionBuilder, SessionError};
use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

/// Options shared by every command; each overrides the settings file
#[derive(Debug, Clone, Default, Args)]
pub struct GlobalArgs {
    /// Settings file (default: ./studybuddy.toml when present)
    #[arg(long, global = true, env = "STUDYBUDDY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Secrets file consulted before the environment (default: ./secrets.toml)
    #[arg(long, global = true, env = "STUDYBUDDY_SECRETS")]
    pub secrets: Option<PathBuf>,

    /// Embedding backend: minilm, token, or mock
    #[arg(long, global = true)]
    pub embedder: Option<String>,

    /// Vector index: flat or hnsw
    #[arg(long, global = true)]
    pub index: Option<IndexKind>,

    /// Chat completion model
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Number of passages retrieved per question
    #[arg(long, global = true)]
    pub top_k: Option<usize>,

    /// Device for the embedding model: cpu, cuda, metal, or auto
    #[arg(long, global = true)]
    pub device: Option<DevicePreference>,
}

impl GlobalArgs {
    /// Overlay the command-line options onto `settings`
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(ref embedder) = self.embedder {
            settings.embedding.backend = embedder.clone();
        }
        if let Some(index) = self.index {
            settings.retrieval.index = index;
        }
        if let Some(ref model) = self.model {
            settings.llm.model = model.clone();
        }
        if let Some(top_k) = self.top_k {
            settings.retrieval.top_k = top_k;
        }
        if let Some(device) = self.device {
            settings.embedding.device = device;
        }
    }

    /// Load settings, apply overrides and resolve the API key
    pub fn load(&self) -> Result<(Settings, Option<String>)> {
        let mut settings = Settings::load(self.config.as_deref())?;
        self.apply(&mut settings);
        settings.validate()?;

        let api_key = resolve_secret(&settings.llm.api_key_env, self.secrets.as_deref());
        if api_key.is_none() {
            tracing::warn!("{} is not set; questions cannot be answered", settings.llm.api_key_env);
        }

        Ok((settings, api_key))
    }
}

/// Execute the tui command
pub fn tui(args: &GlobalArgs, files: Vec<PathBuf>) -> Result<()> {
    let (settings, api_key) = args.load()?;
    crate::tui::run_tui(settings, api_key, files)
}

fn processed_session(settings: &Settings, api_key: Option<String>, files: &[PathBuf]) -> Result<Session> {
    let mut session = SessionBuilder::from_settings(settings, api_key).build()?;

    let summary = session.process_documents(files)?;
    for (name, reason) in &summary.skipped {
        eprintln!("Skipped {}: {}", name, reason);
    }
    tracing::info!("{}", summary.message());

    Ok(session)
}

/// Execute the ask command: process the files, then answer one question
pub fn ask(args: &GlobalArgs, files: Vec<PathBuf>, question: String) -> Result<()> {
    let (settings, api_key) = args.load()?;
    if api_key.is_none() {
        return Err(SessionError::MissingCredential { key: settings.llm.api_key_env }.into());
    }

    let mut session = processed_session(&settings, api_key, &files)?;
    let answer = session.ask(&question)?;

    println!("{}", answer.content);
    Ok(())
}

/// Execute the search command: process the files and print the passages a
/// question would retrieve, without contacting the completion API
pub fn search(args: &GlobalArgs, files: Vec<PathBuf>, query: String) -> Result<()> {
    let (settings, api_key) = args.load()?;
    let session = processed_session(&settings, api_key, &files)?;
    let top_k = session.rag_config().top_k;
    let index = session
        .index()
        .context("No index was built from the given files")?;

    let results = index.retriever().retrieve(&query, top_k)?;

    println!("\nQuery: {}", query);
    println!("Retriever: {}", index.retriever().name());
    println!("Found {} results:\n", results.len());

    for result in &results {
        println!("Rank {}: {} (score: {:.4})", result.rank, result.chunk_id, result.score);
        println!("  Document: {}", result.chunk.document_id);
        println!("  Content: {}", result.chunk.content.chars().take(200).collect::<String>());
        if result.chunk.content.chars().count() > 200 {
            println!("  ...");
        }
        println!();
    }

    Ok(())
}
