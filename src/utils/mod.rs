//! Common utilities
//!
//! Cache directory and logging setup shared by the CLI and the TUI.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log filter used when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "studybuddy=info";

/// Log file written while the TUI owns the terminal
pub const LOG_FILE_NAME: &str = "studybuddy.log";

/// Get the default cache directory
pub fn get_cache_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE"))?;
    let cache_dir = Path::new(&home).join(".cache/studybuddy");
    fs::create_dir_all(&cache_dir)
        .context(format!("Failed to create cache directory: {:?}", cache_dir))?;
    Ok(cache_dir)
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Log to stderr
pub fn init_stderr_logging() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Log to `studybuddy.log` in the cache directory, returning its path
pub fn init_file_logging() -> Result<PathBuf> {
    let path = get_cache_dir()?.join(LOG_FILE_NAME);
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .context(format!("Failed to open log file: {:?}", path))?;

    tracing_subscriber::registry()
        .with(env_filter())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false),
        )
        .init();

    Ok(path)
}
