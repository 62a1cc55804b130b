//! # Gemini Providers
//!
//! Implementations of the provider traits against the Google Gemini API:
//! one for the text-embedding endpoint and one for the multimodal
//! `generateContent` endpoint used for image captioning.

use crate::errors::EmbedError;
use crate::providers::ai::{CaptionProvider, EmbeddingProvider, ImagePayload};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use tracing::debug;

// --- Embedding request and response structures ---

#[derive(Serialize, Debug)]
struct EmbeddingRequest<'a> {
    model: String,
    content: EmbeddingContent<'a>,
    task_type: &'static str,
}

#[derive(Serialize, Debug)]
struct EmbeddingContent<'a> {
    parts: Vec<EmbeddingPart<'a>>,
}

#[derive(Serialize, Debug)]
struct EmbeddingPart<'a> {
    text: &'a str,
}

#[derive(Deserialize, Debug)]
struct EmbeddingResponse {
    embedding: EmbeddingValue,
}

#[derive(Deserialize, Debug)]
struct EmbeddingValue {
    values: Vec<f32>,
}

// --- Caption request and response structures ---

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        inline_data: InlineData,
    },
}

#[derive(Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Deserialize, Debug)]
struct GenerateResponse {
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    content: ContentResponse,
}

#[derive(Deserialize, Debug)]
struct ContentResponse {
    parts: Vec<PartResponse>,
}

#[derive(Deserialize, Debug)]
struct PartResponse {
    text: String,
}

/// A provider for the Gemini text-embedding endpoint.
#[derive(Clone, Debug)]
pub struct GeminiEmbeddingProvider {
    client: ReqwestClient,
    api_url: String,
    api_key: String,
    model: String,
}

impl GeminiEmbeddingProvider {
    /// Creates a new `GeminiEmbeddingProvider`.
    pub fn new(api_url: String, api_key: String, model: String) -> Result<Self, EmbedError> {
        let client = ReqwestClient::builder()
            .build()
            .map_err(EmbedError::ReqwestClientBuild)?;
        Ok(Self {
            client,
            api_url,
            api_key,
            model,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbeddingProvider {
    async fn embed(&self, content: &str) -> Result<Vec<f32>, EmbedError> {
        // Gemini requires the model name to be prefixed with "models/" in the payload.
        let model_name = if self.model.starts_with("models/") {
            self.model.clone()
        } else {
            format!("models/{}", self.model)
        };

        let request_body = EmbeddingRequest {
            model: model_name,
            content: EmbeddingContent {
                parts: vec![EmbeddingPart { text: content }],
            },
            task_type: "RETRIEVAL_DOCUMENT",
        };
        debug!(payload = ?request_body, "--> Sending request to Gemini Embeddings API");

        let response = self
            .client
            .post(&self.api_url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(EmbedError::AiRequest)?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(EmbedError::AiApi(error_text));
        }

        let embedding_response: EmbeddingResponse = response
            .json()
            .await
            .map_err(EmbedError::AiDeserialization)?;

        Ok(embedding_response.embedding.values)
    }
}

/// A provider for the multimodal Gemini `generateContent` endpoint, used to
/// caption images.
#[derive(Clone, Debug)]
pub struct GeminiCaptionProvider {
    client: ReqwestClient,
    api_url: String,
    api_key: String,
}

impl GeminiCaptionProvider {
    /// Creates a new `GeminiCaptionProvider`.
    pub fn new(api_url: String, api_key: String) -> Result<Self, EmbedError> {
        let client = ReqwestClient::builder()
            .build()
            .map_err(EmbedError::ReqwestClientBuild)?;
        Ok(Self {
            client,
            api_url,
            api_key,
        })
    }
}

#[async_trait]
impl CaptionProvider for GeminiCaptionProvider {
    async fn caption(&self, image: &ImagePayload, prompt: &str) -> Result<String, EmbedError> {
        let request_body = GenerateRequest {
            contents: vec![Content {
                parts: vec![
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: image.mime_type.clone(),
                            data: BASE64.encode(&image.bytes),
                        },
                    },
                    Part::Text {
                        text: prompt.to_string(),
                    },
                ],
            }],
        };

        let response = self
            .client
            .post(&self.api_url)
            .query(&[("key", &self.api_key)])
            .json(&request_body)
            .send()
            .await
            .map_err(EmbedError::AiRequest)?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(EmbedError::AiApi(error_text));
        }

        let generate_response: GenerateResponse = response
            .json()
            .await
            .map_err(EmbedError::AiDeserialization)?;

        let caption = generate_response
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.trim().to_string())
            .unwrap_or_default();

        if caption.is_empty() {
            return Err(EmbedError::AiApi(
                "captioning model returned no text".to_string(),
            ));
        }

        Ok(caption)
    }
}
