//! System prompt templates
//!
//! Each template carries a `{context}` placeholder that receives the joined
//! retrieved passages.

use std::collections::HashMap;

/// Name of the template used when none is configured
pub const DEFAULT_TEMPLATE: &str = "study";

/// Prompt templates for different use cases
pub struct PromptTemplates {
    templates: HashMap<String, String>,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        let mut templates = HashMap::new();

        templates.insert(
            DEFAULT_TEMPLATE.to_string(),
            concat!(
                "You are a helpful study assistant. Use ONLY the following context extracted ",
                "from the user's documents to answer the question. If the answer is not in the ",
                "context, say: \"I couldn't find the answer in the provided documents.\"\n\n",
                "Context:\n{context}"
            )
            .to_string(),
        );

        templates.insert(
            "concise".to_string(),
            concat!(
                "Answer the user's question using only the context below. Be concise and direct. ",
                "If the context does not contain the answer, say: \"I couldn't find the answer ",
                "in the provided documents.\"\n\n",
                "Context:\n{context}"
            )
            .to_string(),
        );

        Self { templates }
    }
}

impl PromptTemplates {
    /// Create a new empty template collection
    pub fn new() -> Self {
        Self {
            templates: HashMap::new(),
        }
    }

    /// Get a template by name, falling back to the study template
    pub fn get(&self, name: &str) -> &str {
        self.templates
            .get(name)
            .or_else(|| self.templates.get(DEFAULT_TEMPLATE))
            .map(|s| s.as_str())
            .unwrap_or("{context}")
    }

    /// Register a custom template
    pub fn register(&mut self, name: &str, template: &str) {
        self.templates.insert(name.to_string(), template.to_string());
    }

    /// Check if a template exists
    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// List all available template names
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.templates.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}
