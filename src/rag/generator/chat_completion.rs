//! Hosted chat-completion generator
//!
//! Talks to any OpenAI-compatible `/chat/completions` endpoint (Groq by
//! default) with a blocking HTTP client. One request per call; failures are
//! returned as-is without retries.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::config::{GeneratorConfig, SamplingParams};
use super::Generator;
use crate::rag::query::ChatMessage;

/// Failures of a completion request
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("no API key configured")]
    MissingCredential,

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("the model returned no answer")]
    EmptyResponse,

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

// --- OpenAI-compatible serde structs ---

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Generator backed by a hosted OpenAI-compatible API
pub struct ChatCompletionGenerator {
    client: Client,
    config: GeneratorConfig,
}

impl ChatCompletionGenerator {
    /// Create a new generator; no request is made until `generate`
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        tracing::info!(
            "Completion endpoint configured: url={}, model={}",
            config.completions_url(),
            config.model
        );

        Ok(Self { client, config })
    }

    /// Send one completion request
    pub fn complete(
        &self,
        messages: &[ChatMessage],
        params: &SamplingParams,
    ) -> std::result::Result<String, CompletionError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(CompletionError::MissingCredential)?;

        let request = ChatRequest {
            model: &self.config.model,
            messages,
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        };

        let response = self
            .client
            .post(self.config.completions_url())
            .bearer_auth(api_key)
            .json(&request)
            .send()?;

        let status = response.status();
        let body = response.text()?;

        if !status.is_success() {
            return Err(CompletionError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&body).map_err(|e| CompletionError::Api {
            status: status.as_u16(),
            message: format!("unreadable response body: {}", e),
        })?;

        extract_answer(parsed)
    }
}

impl Generator for ChatCompletionGenerator {
    fn generate(&self, messages: &[ChatMessage], params: &SamplingParams) -> Result<String> {
        let started = std::time::Instant::now();
        let answer = self.complete(messages, params)?;
        tracing::debug!(
            "Completion from {} in {:.2?} ({} chars)",
            self.config.model,
            started.elapsed(),
            answer.len()
        );
        Ok(answer)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }

    fn has_credentials(&self) -> bool {
        self.config.api_key.is_some()
    }
}

/// Provider error text, falling back to the raw body
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => envelope.error.message,
        Err(_) if body.trim().is_empty() => "empty error body".to_string(),
        Err(_) => body.trim().to_string(),
    }
}

fn extract_answer(response: ChatResponse) -> std::result::Result<String, CompletionError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(CompletionError::EmptyResponse)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_format() {
        let messages = vec![ChatMessage::system("ctx"), ChatMessage::user("q")];
        let request = ChatRequest {
            model: "llama-3.3-70b-versatile",
            messages: &messages,
            temperature: 0.2,
            max_tokens: 2048,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "llama-3.3-70b-versatile");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "q");
        assert_eq!(json["max_tokens"], 2048);
    }

    #[test]
    fn test_error_message_prefers_provider_text() {
        let body = r#"{"error":{"message":"Invalid API Key","type":"invalid_request_error"}}"#;
        assert_eq!(error_message(body), "Invalid API Key");
        assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
        assert_eq!(error_message(""), "empty error body");
    }

    #[test]
    fn test_extract_answer() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"ATP"}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_answer(response).unwrap(), "ATP");

        let empty: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(extract_answer(empty), Err(CompletionError::EmptyResponse)));
    }

    #[test]
    fn test_missing_key_makes_no_request() {
        // Unroutable base URL: a request attempt would surface as Transport
        let config = GeneratorConfig::default().with_base_url("http://127.0.0.1:9");
        let generator = ChatCompletionGenerator::new(config).unwrap();

        assert!(!generator.has_credentials());
        let result = generator.complete(&[ChatMessage::user("q")], &SamplingParams::default());
        assert!(matches!(result, Err(CompletionError::MissingCredential)));
    }
}
