//! # StudyBuddy
//!
//! Ask questions about your PDFs from the terminal.
//!
//! ## Overview
//!
//! StudyBuddy extracts the text of the PDFs you give it, splits it into
//! overlapping chunks, embeds them with a sentence-transformer model and keeps
//! them in an in-memory vector index. Each question retrieves the most similar
//! chunks and sends them, together with the question, to a hosted chat
//! completion model (Groq by default).
//!
//! ## Architecture
//!
//! - `config` - Settings file and secret resolution
//! - `data` - Document loading and chunking
//! - `embedding` - Sentence embeddings (MiniLM via Candle, or offline backends)
//! - `retrieval` - Exact and HNSW vector search
//! - `rag` - Prompt assembly and hosted chat completions
//! - `session` - Documents, index and chat history of one user session
//! - `tui` - Terminal user interface
//! - `cli` - Command-line interface
//! - `utils` - Cache directory and logging setup

pub mod config;
pub mod data;
pub mod embedding;
pub mod retrieval;
pub mod rag;
pub mod session;
pub mod tui;
pub mod cli;
pub mod utils;

// Re-export commonly used types
pub use anyhow::{Error, Result};
pub use config::Settings;
pub use session::{Session, SessionBuilder, SessionError};
