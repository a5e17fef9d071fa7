//! Document loaders for uploaded files
//!
//! PDF is the primary upload format; plain text and markdown are accepted
//! for scripting and tests.

use crate::data::{Document, DocumentMetadata};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Trait for loading documents from various sources
pub trait DocumentLoader: Send + Sync {
    /// Load a document from the given path
    fn load(&self, path: &Path) -> Result<Document>;

    /// Check if this loader can handle the given file extension
    fn can_load(&self, path: &Path) -> bool;
}

/// Text file loader
pub struct TextLoader;

impl DocumentLoader for TextLoader {
    fn load(&self, path: &Path) -> Result<Document> {
        let content = fs::read_to_string(path)
            .context(format!("Failed to read text file: {:?}", path))?;

        let file_type = match extension_of(path).as_deref() {
            Some("md") | Some("markdown") => "md",
            _ => "txt",
        };

        let metadata = DocumentMetadata {
            file_path: Some(path.to_path_buf()),
            file_type: file_type.to_string(),
            size: Some(content.len()),
            page_count: None,
            pages_with_text: None,
            custom: HashMap::new(),
        };

        Ok(Document::new(
            generate_document_id(path),
            display_name(path),
            content,
            metadata,
        ))
    }

    fn can_load(&self, path: &Path) -> bool {
        matches!(
            extension_of(path).as_deref(),
            Some("txt") | Some("md") | Some("markdown")
        )
    }
}

/// PDF file loader
///
/// Text is extracted page by page. Pages without extractable text (scans,
/// blank pages) are skipped; every kept page is terminated by a newline.
pub struct PdfLoader;

impl PdfLoader {
    /// Join per-page text, dropping pages that carry no text
    pub fn join_pages(pages: &[String]) -> (String, usize) {
        let mut text = String::new();
        let mut kept = 0;

        for page in pages {
            if page.trim().is_empty() {
                continue;
            }
            text.push_str(page);
            text.push('\n');
            kept += 1;
        }

        (text, kept)
    }

    #[cfg(feature = "pdf")]
    fn extract_pages(path: &Path) -> Result<Vec<String>> {
        // pdf-extract panics on some malformed inputs
        let result = std::panic::catch_unwind(|| pdf_extract::extract_text_by_pages(path));

        match result {
            Ok(Ok(pages)) => Ok(pages),
            Ok(Err(e)) => anyhow::bail!("Failed to extract text from PDF {:?}: {}", path, e),
            Err(_) => anyhow::bail!("PDF extractor crashed on {:?}", path),
        }
    }
}

impl DocumentLoader for PdfLoader {
    fn load(&self, _path: &Path) -> Result<Document> {
        #[cfg(feature = "pdf")]
        {
            let pages = Self::extract_pages(_path)?;
            let (content, pages_with_text) = Self::join_pages(&pages);

            let skipped = pages.len() - pages_with_text;
            if skipped > 0 {
                tracing::debug!(
                    "{:?}: skipped {} of {} pages without text",
                    _path,
                    skipped,
                    pages.len()
                );
            }

            let file_size = fs::metadata(_path)?.len() as usize;

            let doc_metadata = DocumentMetadata {
                file_path: Some(_path.to_path_buf()),
                file_type: "pdf".to_string(),
                size: Some(file_size),
                page_count: Some(pages.len()),
                pages_with_text: Some(pages_with_text),
                custom: HashMap::new(),
            };

            Ok(Document::new(
                generate_document_id(_path),
                display_name(_path),
                content,
                doc_metadata,
            ))
        }

        #[cfg(not(feature = "pdf"))]
        {
            anyhow::bail!("PDF support not enabled. Compile with --features pdf")
        }
    }

    fn can_load(&self, path: &Path) -> bool {
        extension_of(path).as_deref() == Some("pdf")
    }
}

/// Multi-format document loader that delegates to specific loaders
pub struct MultiFormatLoader {
    loaders: Vec<Box<dyn DocumentLoader>>,
}

impl MultiFormatLoader {
    /// Create a new multi-format loader with all supported loaders
    pub fn new() -> Self {
        let loaders: Vec<Box<dyn DocumentLoader>> = vec![
            Box::new(PdfLoader),
            Box::new(TextLoader),
        ];

        Self { loaders }
    }
}

impl DocumentLoader for MultiFormatLoader {
    /// Load a document, automatically selecting the appropriate loader
    fn load(&self, path: &Path) -> Result<Document> {
        for loader in &self.loaders {
            if loader.can_load(path) {
                return loader.load(path);
            }
        }

        anyhow::bail!("No loader found for file: {:?}", path)
    }

    fn can_load(&self, path: &Path) -> bool {
        self.loaders.iter().any(|l| l.can_load(path))
    }
}

impl Default for MultiFormatLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// File name shown to the user for an uploaded path
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Generate a unique document ID based on file path
fn generate_document_id(path: &Path) -> String {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    path.to_string_lossy().hash(&mut hasher);
    format!("doc_{:x}", hasher.finish())
}
