pub mod gemini;

use crate::errors::EmbedError;
use async_trait::async_trait;
use dyn_clone::DynClone;
use std::fmt::Debug;

pub use gemini::{GeminiCaptionProvider, GeminiEmbeddingProvider};

/// An image payload ready for the captioning service: raw bytes plus the
/// MIME type the serving host declared for them.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// A trait for services that turn text into a fixed-length vector.
///
/// The vector length is defined by the remote model; callers must not assume
/// a particular dimensionality.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync + Debug + DynClone {
    /// Embeds a single piece of text with retrieval-document intent.
    async fn embed(&self, content: &str) -> Result<Vec<f32>, EmbedError>;
}

dyn_clone::clone_trait_object!(EmbeddingProvider);

/// A trait for multimodal services that describe an image as free text.
#[async_trait]
pub trait CaptionProvider: Send + Sync + Debug + DynClone {
    /// Produces a caption for the image, guided by `prompt`.
    async fn caption(&self, image: &ImagePayload, prompt: &str) -> Result<String, EmbedError>;
}

dyn_clone::clone_trait_object!(CaptionProvider);
