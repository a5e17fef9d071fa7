//! Context builder for RAG prompts
//!
//! Joins retrieved passages and renders the two-message prompt sent to the
//! completion endpoint.

use crate::rag::query::ChatMessage;
use crate::retrieval::SearchResult;

use super::templates::PromptTemplates;

/// Separator placed between retrieved passages
pub const PASSAGE_SEPARATOR: &str = "\n\n---\n\n";

/// Builds context from retrieved chunks for LLM prompts
pub struct ContextBuilder {
    templates: PromptTemplates,
}

impl ContextBuilder {
    /// Create a new context builder with default templates
    pub fn new() -> Self {
        Self {
            templates: PromptTemplates::default(),
        }
    }

    /// Create a context builder with custom templates
    pub fn with_templates(templates: PromptTemplates) -> Self {
        Self { templates }
    }

    /// Join chunk texts in retrieval order
    pub fn build(&self, results: &[SearchResult]) -> String {
        results
            .iter()
            .map(|r| r.chunk.content.as_str())
            .collect::<Vec<_>>()
            .join(PASSAGE_SEPARATOR)
    }

    /// Render the system instruction for a context string
    pub fn format_system_prompt(&self, context: &str, template_name: &str) -> String {
        self.templates.get(template_name).replace("{context}", context)
    }

    /// Build the `[system, user]` message pair for a question
    ///
    /// Returns the messages together with the joined context.
    pub fn build_messages(
        &self,
        query: &str,
        results: &[SearchResult],
        template_name: &str,
    ) -> (Vec<ChatMessage>, String) {
        let context = self.build(results);
        let messages = vec![
            ChatMessage::system(self.format_system_prompt(&context, template_name)),
            ChatMessage::user(query),
        ];
        (messages, context)
    }

    /// Get access to templates for customization
    pub fn templates_mut(&mut self) -> &mut PromptTemplates {
        &mut self.templates
    }
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Chunk, DocumentMetadata};
    use crate::rag::query::Role;

    fn make_search_result(chunk_id: &str, content: &str, score: f32) -> SearchResult {
        SearchResult {
            chunk_id: chunk_id.to_string(),
            chunk: Chunk {
                id: chunk_id.to_string(),
                document_id: "doc1".to_string(),
                content: content.to_string(),
                start_pos: 0,
                end_pos: content.len(),
                chunk_index: 0,
                metadata: DocumentMetadata::default(),
            },
            score,
            rank: 1,
        }
    }

    #[test]
    fn test_build_joins_with_separator() {
        let builder = ContextBuilder::new();
        let results = vec![
            make_search_result("c1", "First passage", 0.95),
            make_search_result("c2", "Second passage", 0.85),
        ];

        assert_eq!(builder.build(&results), "First passage\n\n---\n\nSecond passage");
    }

    #[test]
    fn test_build_empty_results() {
        let builder = ContextBuilder::new();
        assert_eq!(builder.build(&[]), "");
    }

    #[test]
    fn test_system_prompt_embeds_context() {
        let builder = ContextBuilder::new();
        let prompt = builder.format_system_prompt("Cells divide by mitosis.", "study");

        assert!(prompt.starts_with("You are a helpful study assistant."));
        assert!(prompt.ends_with("\n\nContext:\nCells divide by mitosis."));
    }

    #[test]
    fn test_build_messages_is_system_then_user() {
        let builder = ContextBuilder::new();
        let results = vec![make_search_result("c1", "Osmosis moves water.", 0.9)];

        let (messages, context) = builder.build_messages("What is osmosis?", &results, "study");

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[0].content.contains("Osmosis moves water."));
        assert_eq!(messages[1], ChatMessage::user("What is osmosis?"));
        assert_eq!(context, "Osmosis moves water.");
    }
}
