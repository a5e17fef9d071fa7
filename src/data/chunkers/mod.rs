//! Text chunking strategies
//!
//! Implements recursive separator-based splitting (the default) and
//! fixed-size overlapping windows.

use crate::data::{Chunk, Document};
use anyhow::Result;
use std::collections::VecDeque;

/// Separators tried in order by the recursive chunker
pub const DEFAULT_SEPARATORS: &[&str] = &["\n\n", "\n", ". ", " ", ""];

/// Trait for text chunking strategies
pub trait Chunker: Send + Sync {
    /// Split a document into chunks
    fn chunk(&self, document: &Document) -> Result<Vec<Chunk>>;
}

/// Configuration for chunking
#[derive(Debug, Clone)]
pub struct ChunkConfig {
    /// Maximum size of each chunk in characters
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters
    pub chunk_overlap: usize,
    /// Separators tried in order by the recursive strategy
    pub separators: Vec<String>,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ChunkConfig {
    /// Check the size/overlap relationship
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            anyhow::bail!("chunk_size must be greater than zero");
        }
        if self.chunk_overlap >= self.chunk_size {
            anyhow::bail!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap,
                self.chunk_size
            );
        }
        Ok(())
    }
}

/// Recursive character splitter
///
/// Splits on the first separator present in the text, merges the pieces back
/// up to `chunk_size` characters with trailing overlap, and recurses with the
/// remaining separators into pieces that are still too long.
pub struct RecursiveChunker {
    config: ChunkConfig,
    separators: Vec<String>,
}

impl RecursiveChunker {
    /// Create a recursive chunker using the configured separators
    pub fn new(config: ChunkConfig) -> Self {
        let separators = if config.separators.is_empty() {
            DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect()
        } else {
            config.separators.clone()
        };
        Self { config, separators }
    }

    /// Split raw text into chunk strings
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.separators)
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut final_chunks = Vec::new();

        // Pick the first separator that occurs in the text
        let mut separator = separators.last().map(String::as_str).unwrap_or("");
        let mut remaining: &[String] = &[];
        for (i, sep) in separators.iter().enumerate() {
            if sep.is_empty() {
                separator = "";
                break;
            }
            if text.contains(sep.as_str()) {
                separator = sep;
                remaining = &separators[i + 1..];
                break;
            }
        }

        let splits = split_keeping_separator(text, separator);

        let mut good_splits: Vec<&str> = Vec::new();
        for piece in splits {
            if char_len(piece) < self.config.chunk_size {
                good_splits.push(piece);
                continue;
            }

            if !good_splits.is_empty() {
                final_chunks.extend(self.merge_splits(&good_splits));
                good_splits.clear();
            }

            if remaining.is_empty() {
                final_chunks.push(piece.to_string());
            } else {
                final_chunks.extend(self.split_recursive(piece, remaining));
            }
        }

        if !good_splits.is_empty() {
            final_chunks.extend(self.merge_splits(&good_splits));
        }

        final_chunks
    }

    /// Merge small pieces into chunks of at most `chunk_size` characters
    fn merge_splits(&self, splits: &[&str]) -> Vec<String> {
        let chunk_size = self.config.chunk_size;
        let chunk_overlap = self.config.chunk_overlap;

        let mut docs = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for piece in splits {
            let len = char_len(piece);

            if total + len > chunk_size && !current.is_empty() {
                if total > chunk_size {
                    tracing::warn!(
                        "Created a chunk of size {}, which is longer than the specified {}",
                        total,
                        chunk_size
                    );
                }

                push_trimmed(&mut docs, &current);

                // Keep a tail of the current window as overlap
                while total > chunk_overlap || (total + len > chunk_size && total > 0) {
                    match current.pop_front() {
                        Some(front) => total -= char_len(front),
                        None => break,
                    }
                }
            }

            current.push_back(piece);
            total += len;
        }

        push_trimmed(&mut docs, &current);
        docs
    }
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, document: &Document) -> Result<Vec<Chunk>> {
        let content = &document.content;
        let pieces = self.split_text(content);

        let mut chunks = Vec::with_capacity(pieces.len());
        let mut search_from = 0usize;
        let mut previous_len = 0usize;

        for (chunk_index, text) in pieces.into_iter().enumerate() {
            // Locate the chunk in the source, starting just after the previous
            // chunk minus the configured overlap
            let offset = floor_char_boundary(
                content,
                (search_from + previous_len).saturating_sub(self.config.chunk_overlap),
            );
            let start_pos = content[offset..]
                .find(text.as_str())
                .map(|i| offset + i)
                .or_else(|| content.find(text.as_str()))
                .unwrap_or(offset);
            let end_pos = (start_pos + text.len()).min(content.len());

            search_from = start_pos;
            previous_len = text.len();

            chunks.push(Chunk::new(
                format!("{}_{}", document.id, chunk_index),
                document.id.clone(),
                text,
                start_pos,
                end_pos,
                chunk_index,
                document.metadata.clone(),
            ));
        }

        Ok(chunks)
    }
}

/// Fixed-size chunker that splits text into overlapping character windows
pub struct FixedSizeChunker {
    config: ChunkConfig,
}

impl FixedSizeChunker {
    /// Create a new fixed-size chunker with the given configuration
    pub fn new(config: ChunkConfig) -> Self {
        Self { config }
    }
}

impl Chunker for FixedSizeChunker {
    fn chunk(&self, document: &Document) -> Result<Vec<Chunk>> {
        let mut chunks = Vec::new();
        let content = &document.content;

        // Byte offset of every char, plus the end of the string
        let boundaries: Vec<usize> = content
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(content.len()))
            .collect();
        let num_chars = boundaries.len() - 1;

        if num_chars == 0 {
            return Ok(chunks);
        }

        let mut start = 0;
        let mut chunk_index = 0;

        while start < num_chars {
            let end = (start + self.config.chunk_size).min(num_chars);
            let start_pos = boundaries[start];
            let end_pos = boundaries[end];
            let text = &content[start_pos..end_pos];

            if !text.trim().is_empty() {
                chunks.push(Chunk::new(
                    format!("{}_{}", document.id, chunk_index),
                    document.id.clone(),
                    text.to_string(),
                    start_pos,
                    end_pos,
                    chunk_index,
                    document.metadata.clone(),
                ));
                chunk_index += 1;
            }

            if end >= num_chars {
                break;
            }
            let next = end.saturating_sub(self.config.chunk_overlap);
            if next <= start {
                break; // Prevent infinite loop
            }
            start = next;
        }

        Ok(chunks)
    }
}

/// Create a chunker based on strategy name
pub fn create_chunker(strategy: &str, config: ChunkConfig) -> Box<dyn Chunker> {
    match strategy {
        "recursive" => Box::new(RecursiveChunker::new(config)),
        "fixed" => Box::new(FixedSizeChunker::new(config)),
        _ => {
            tracing::warn!("Unknown chunking strategy '{}', using recursive", strategy);
            Box::new(RecursiveChunker::new(config))
        }
    }
}

/// Split text on a separator, attaching the separator to the following piece.
/// An empty separator splits into single characters. Empty pieces are dropped.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect();
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    for (idx, _) in text.match_indices(separator) {
        if idx > start {
            pieces.push(&text[start..idx]);
        }
        start = idx;
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }

    pieces.into_iter().filter(|p| !p.is_empty()).collect()
}

fn push_trimmed(docs: &mut Vec<String>, window: &VecDeque<&str>) {
    let joined: String = window.iter().copied().collect();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        docs.push(trimmed.to_string());
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    while !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}
