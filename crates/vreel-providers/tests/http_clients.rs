//! HTTP-level tests for the vendor clients against a mock server.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vreel_providers::{
    ClaudeClient, ClaudeConfig, DeepgramClient, DeepgramConfig, ProviderError,
    TextAnalysisProvider, TranscriptionProvider,
};

fn deepgram_client(server: &MockServer) -> DeepgramClient {
    DeepgramClient::new(DeepgramConfig {
        api_key: "dg-test-key".to_string(),
        base_url: server.uri(),
        timeout: Duration::from_secs(5),
    })
    .unwrap()
}

fn claude_client(server: &MockServer) -> ClaudeClient {
    ClaudeClient::new(ClaudeConfig {
        api_key: "sk-test-key".to_string(),
        base_url: server.uri(),
        model: "claude-3-5-sonnet-20241022".to_string(),
        timeout: Duration::from_secs(5),
    })
    .unwrap()
}

#[tokio::test]
async fn test_deepgram_transcribe_maps_utterances() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/listen"))
        .and(query_param("model", "nova-3"))
        .and(query_param("utterances", "true"))
        .and(header("Authorization", "Token dg-test-key"))
        .and(body_partial_json(json!({"url": "https://cdn.example/v1.mp4"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": {
                "channels": [{
                    "alternatives": [{"transcript": "Hello there. General remark."}],
                    "detected_language": "en"
                }],
                "utterances": [
                    {
                        "start": 0.0, "end": 1.8, "transcript": "Hello there.",
                        "words": [
                            {"word": "hello", "start": 0.0, "end": 0.6, "confidence": 0.99},
                            {"word": "there", "start": 0.7, "end": 1.1, "confidence": 0.97}
                        ]
                    },
                    {"start": 2.0, "end": 3.5, "transcript": "General remark.", "words": []}
                ]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let transcript = deepgram_client(&server)
        .transcribe("https://cdn.example/v1.mp4", None)
        .await
        .unwrap();

    assert_eq!(transcript.language, "en");
    assert_eq!(transcript.segments.len(), 2);
    assert_eq!(transcript.segments[0].words.len(), 2);
    assert_eq!(transcript.full_text, "Hello there. General remark.");
}

#[tokio::test]
async fn test_deepgram_passes_language_hint() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/listen"))
        .and(query_param("language", "fr"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": {"channels": [], "utterances": []}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let transcript = deepgram_client(&server)
        .transcribe("https://cdn.example/v2.mp4", Some("fr"))
        .await
        .unwrap();

    assert_eq!(transcript.language, "fr");
    assert!(transcript.segments.is_empty());
}

#[tokio::test]
async fn test_deepgram_rate_limit_is_transient() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/listen"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .mount(&server)
        .await;

    let err = deepgram_client(&server)
        .transcribe("https://cdn.example/v3.mp4", None)
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::RateLimited(_)));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_deepgram_client_error_is_permanent() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/listen"))
        .respond_with(ResponseTemplate::new(400).set_body_string("unsupported media"))
        .mount(&server)
        .await;

    let err = deepgram_client(&server)
        .transcribe("https://cdn.example/bad.bin", None)
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::Rejected(_)));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn test_claude_analyze_concatenates_text_blocks() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "sk-test-key"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(
            json!({"model": "claude-3-5-sonnet-20241022", "max_tokens": 4096}),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [
                {"type": "text", "text": "{\"overallScore\": "},
                {"type": "text", "text": "70}"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let text = claude_client(&server).analyze("prompt").await.unwrap();
    assert_eq!(text, "{\"overallScore\": 70}");
}

#[tokio::test]
async fn test_claude_overloaded_is_transient() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(529).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let err = claude_client(&server).analyze("prompt").await.unwrap_err();
    assert!(matches!(err, ProviderError::Unavailable(_)));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_claude_empty_content_is_invalid_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"content": []})))
        .mount(&server)
        .await;

    let err = claude_client(&server).analyze("prompt").await.unwrap_err();
    assert!(matches!(err, ProviderError::InvalidResponse(_)));
}
