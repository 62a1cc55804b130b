//! # Gemini Provider Tests
//!
//! Verifies the wire format of the two Gemini endpoints against a mock
//! server: payload shape, auth placement, and response parsing.

use ragline::prompts::IMAGE_CAPTION_PROMPT;
use ragline::providers::ai::{CaptionProvider, EmbeddingProvider, GeminiCaptionProvider, GeminiEmbeddingProvider, ImagePayload};
use ragline_test_utils::setup_tracing;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn embedding_request_shape_and_response_parsing() {
    setup_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/embedding-001:embedContent"))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(json!({
            "model": "models/embedding-001",
            "task_type": "RETRIEVAL_DOCUMENT",
            "content": { "parts": [{ "text": "hello corpus" }] }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "embedding": { "values": [0.1, 0.2, 0.3] }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = GeminiEmbeddingProvider::new(
        format!("{}/v1beta/models/embedding-001:embedContent", server.uri()),
        "test-key".to_string(),
        "embedding-001".to_string(),
    )
    .expect("provider construction should not fail");

    let vector = provider.embed("hello corpus").await.expect("embed failed");
    assert_eq!(vector, vec![0.1, 0.2, 0.3]);
}

#[tokio::test]
async fn embedding_error_status_is_surfaced() {
    setup_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&server)
        .await;

    let provider = GeminiEmbeddingProvider::new(
        server.uri(),
        "test-key".to_string(),
        "embedding-001".to_string(),
    )
    .expect("provider construction should not fail");

    let result = provider.embed("anything").await;
    assert!(result.is_err());
}

#[tokio::test]
async fn caption_request_carries_inline_data_and_prompt() {
    setup_tracing();
    let server = MockServer::start().await;

    // [1, 2, 3] base64-encodes to "AQID".
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
        .and(query_param("key", "test-key"))
        .and(body_partial_json(json!({
            "contents": [{
                "parts": [
                    { "inline_data": { "mime_type": "image/webp", "data": "AQID" } },
                    { "text": IMAGE_CAPTION_PROMPT }
                ]
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "  a bar chart with two series  " }] }
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = GeminiCaptionProvider::new(
        format!(
            "{}/v1beta/models/gemini-1.5-flash:generateContent",
            server.uri()
        ),
        "test-key".to_string(),
    )
    .expect("provider construction should not fail");

    let caption = provider
        .caption(
            &ImagePayload {
                bytes: vec![1, 2, 3],
                mime_type: "image/webp".to_string(),
            },
            IMAGE_CAPTION_PROMPT,
        )
        .await
        .expect("caption failed");

    assert_eq!(caption, "a bar chart with two series");
}

#[tokio::test]
async fn caption_with_no_candidates_is_an_error() {
    setup_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&server)
        .await;

    let provider = GeminiCaptionProvider::new(server.uri(), "test-key".to_string())
        .expect("provider construction should not fail");

    let result = provider
        .caption(
            &ImagePayload {
                bytes: vec![0],
                mime_type: "image/png".to_string(),
            },
            IMAGE_CAPTION_PROMPT,
        )
        .await;

    assert!(result.is_err());
}
