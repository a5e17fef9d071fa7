//! Chat-completion client against a mock OpenAI-compatible server.
//!
//! The client is blocking, so every call runs on tokio's blocking pool.

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use studybuddy::rag::{
    ChatCompletionGenerator, ChatMessage, CompletionError, Generator, GeneratorConfig,
    SamplingParams,
};
use studybuddy::session::SessionBuilder;
use studybuddy::Settings;

const MODEL: &str = "llama-3.3-70b-versatile";

fn messages() -> Vec<ChatMessage> {
    vec![
        ChatMessage::system("Context:\nATP stores energy."),
        ChatMessage::user("What is ATP?"),
    ]
}

async fn generate(base_url: String, api_key: Option<&str>) -> anyhow::Result<String> {
    let api_key = api_key.map(str::to_string);
    tokio::task::spawn_blocking(move || {
        let config = GeneratorConfig::new(MODEL)
            .with_base_url(&base_url)
            .with_api_key(api_key);
        let generator = ChatCompletionGenerator::new(config)?;
        generator.generate(&messages(), &SamplingParams::default())
    })
    .await
    .unwrap()
}

#[tokio::test]
async fn test_successful_completion() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/openai/v1/chat/completions"))
        .and(header("authorization", "Bearer gsk_test"))
        .and(body_partial_json(json!({
            "model": MODEL,
            "max_tokens": 2048,
            "messages": [
                { "role": "system", "content": "Context:\nATP stores energy." },
                { "role": "user", "content": "What is ATP?" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [
                { "index": 0, "message": { "role": "assistant", "content": "ATP is the cell's energy currency." } }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let answer = generate(format!("{}/openai/v1/", server.uri()), Some("gsk_test"))
        .await
        .unwrap();

    assert_eq!(answer, "ATP is the cell's energy currency.");
}

#[tokio::test]
async fn test_api_error_carries_provider_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": { "message": "Invalid API Key", "type": "invalid_request_error" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = generate(server.uri(), Some("gsk_wrong")).await.unwrap_err();

    assert_eq!(format!("{:#}", err), "API error (401): Invalid API Key");
    assert!(matches!(
        err.downcast_ref::<CompletionError>(),
        Some(CompletionError::Api { status: 401, .. })
    ));
}

#[tokio::test]
async fn test_empty_choices_is_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let err = generate(server.uri(), Some("gsk_test")).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<CompletionError>(),
        Some(CompletionError::EmptyResponse)
    ));
}

#[tokio::test]
async fn test_missing_key_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = generate(server.uri(), None).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<CompletionError>(),
        Some(CompletionError::MissingCredential)
    ));
}

#[tokio::test]
async fn test_session_records_completion_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream unavailable"))
        .expect(1)
        .mount(&server)
        .await;

    let base_url = server.uri();
    let history = tokio::task::spawn_blocking(move || {
        let dir = tempfile::tempdir().unwrap();
        let notes = dir.path().join("notes.txt");
        std::fs::write(&notes, "ATP stores and transfers energy in cells.").unwrap();

        let mut settings = Settings::default();
        settings.embedding.backend = "token".to_string();
        settings.llm.base_url = base_url;

        let mut session = SessionBuilder::from_settings(&settings, Some("gsk_test".to_string()))
            .build()
            .unwrap();
        session.process_documents(&[notes]).unwrap();
        session.ask("What is ATP?").unwrap();
        session.history().to_vec()
    })
    .await
    .unwrap();

    assert_eq!(
        history,
        vec![
            ChatMessage::user("What is ATP?"),
            ChatMessage::assistant("Error: API error (500): upstream unavailable"),
        ]
    );
}
