use thiserror::Error;

/// Custom error types for the embedding pipeline.
#[derive(Error, Debug)]
pub enum EmbedError {
    #[error("Failed to build Reqwest client: {0}")]
    ReqwestClientBuild(reqwest::Error),
    #[error("Failed to send request to the AI service: {0}")]
    AiRequest(reqwest::Error),
    #[error("Failed to deserialize AI service response: {0}")]
    AiDeserialization(reqwest::Error),
    #[error("AI service returned an error: {0}")]
    AiApi(String),
    #[error("Failed to download image from {url}: {reason}")]
    ImageFetch { url: String, reason: String },
    #[error("API key is missing")]
    MissingApiKey,
    #[error("Invalid chunking parameters: overlap ({overlap}) must be smaller than chunk size ({chunk_size})")]
    InvalidChunking { chunk_size: usize, overlap: usize },
    #[error("Storage error: {0}")]
    Storage(#[from] turso::Error),
}
