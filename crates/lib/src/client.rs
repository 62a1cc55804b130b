//! # Retrying Service Client
//!
//! Wraps the two remote operations (embed text, caption image) with bounded
//! retry and exponential backoff. Every attempt first funnels through the
//! shared [`RateLimiter`], and exhausted retries surface as `None` so that
//! callers skip the item instead of aborting the run. All of the pipeline's
//! resilience lives here.

use crate::errors::EmbedError;
use crate::limiter::RateLimiter;
use crate::prompts::IMAGE_CAPTION_PROMPT;
use crate::providers::ai::{CaptionProvider, EmbeddingProvider, ImagePayload};
use reqwest::Client as ReqwestClient;
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

/// MIME type assumed when the image host omits a `Content-Type` header.
/// A known approximation carried over from the upstream corpus, where most
/// hotlinked images are webp; it may mis-tag other formats.
const DEFAULT_IMAGE_MIME: &str = "image/webp";

const DEFAULT_EMBED_RETRIES: u32 = 3;
const DEFAULT_CAPTION_RETRIES: u32 = 2;

/// Rate-limited, retry-tolerant client over the remote AI service.
#[derive(Clone, Debug)]
pub struct EmbedClient {
    embedder: Box<dyn EmbeddingProvider>,
    captioner: Box<dyn CaptionProvider>,
    limiter: Arc<RateLimiter>,
    http: ReqwestClient,
    max_embed_retries: u32,
    max_caption_retries: u32,
}

impl EmbedClient {
    /// Creates a client over the given providers, sharing `limiter` with any
    /// other callers in the run.
    pub fn new(
        embedder: Box<dyn EmbeddingProvider>,
        captioner: Box<dyn CaptionProvider>,
        limiter: Arc<RateLimiter>,
    ) -> Result<Self, EmbedError> {
        let http = ReqwestClient::builder()
            .build()
            .map_err(EmbedError::ReqwestClientBuild)?;
        Ok(Self {
            embedder,
            captioner,
            limiter,
            http,
            max_embed_retries: DEFAULT_EMBED_RETRIES,
            max_caption_retries: DEFAULT_CAPTION_RETRIES,
        })
    }

    /// Overrides the total attempt budgets for the two operations.
    pub fn with_max_retries(mut self, embed: u32, caption: u32) -> Self {
        self.max_embed_retries = embed.max(1);
        self.max_caption_retries = caption.max(1);
        self
    }

    /// Embeds a piece of text, retrying transient failures.
    ///
    /// Returns `None` once the attempt budget is exhausted; the caller is
    /// expected to skip the item.
    pub async fn embed_text(&self, content: &str) -> Option<Vec<f32>> {
        for attempt in 0..self.max_embed_retries {
            self.limiter.acquire().await;
            match self.embedder.embed(content).await {
                Ok(vector) => return Some(vector),
                Err(e) if attempt + 1 == self.max_embed_retries => {
                    warn!(
                        error = %e,
                        attempts = self.max_embed_retries,
                        content = %preview(content),
                        "embedding failed after all retries; skipping item"
                    );
                    return None;
                }
                Err(e) => {
                    let delay = backoff(attempt);
                    warn!(
                        error = %e,
                        attempt = attempt + 1,
                        retry_in_secs = delay.as_secs(),
                        "embedding attempt failed; retrying"
                    );
                    sleep(delay).await;
                }
            }
        }
        None
    }

    /// Downloads an image and produces a caption for it, retrying transient
    /// failures. A non-success download status counts as a retryable failure.
    pub async fn caption_image(&self, url: &str) -> Option<String> {
        for attempt in 0..self.max_caption_retries {
            self.limiter.acquire().await;
            match self.try_caption(url).await {
                Ok(caption) => return Some(caption),
                Err(e) if attempt + 1 == self.max_caption_retries => {
                    warn!(
                        error = %e,
                        attempts = self.max_caption_retries,
                        url = %url,
                        "captioning failed after all retries; skipping image"
                    );
                    return None;
                }
                Err(e) => {
                    let delay = backoff(attempt);
                    warn!(
                        error = %e,
                        attempt = attempt + 1,
                        url = %url,
                        retry_in_secs = delay.as_secs(),
                        "captioning attempt failed; retrying"
                    );
                    sleep(delay).await;
                }
            }
        }
        None
    }

    /// Single caption attempt: fetch the bytes, work out the MIME type, and
    /// hand the payload plus the fixed description prompt to the provider.
    async fn try_caption(&self, url: &str) -> Result<String, EmbedError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| EmbedError::ImageFetch {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(EmbedError::ImageFetch {
                url: url.to_string(),
                reason: format!("status {}", response.status()),
            });
        }

        let mime_type = match response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
        {
            Some(value) => value.to_string(),
            None => {
                debug!(url = %url, "image host omitted Content-Type; assuming {DEFAULT_IMAGE_MIME}");
                DEFAULT_IMAGE_MIME.to_string()
            }
        };

        let bytes = response
            .bytes()
            .await
            .map_err(|e| EmbedError::ImageFetch {
                url: url.to_string(),
                reason: e.to_string(),
            })?
            .to_vec();

        self.captioner
            .caption(&ImagePayload { bytes, mime_type }, IMAGE_CAPTION_PROMPT)
            .await
    }
}

/// Exponential backoff: 1s, 2s, 4s, ... between attempts. The exponent is
/// capped so oversized retry budgets cannot overflow the shift.
fn backoff(attempt: u32) -> Duration {
    Duration::from_secs(1u64 << attempt.min(16))
}

/// Truncates content for log lines.
fn preview(content: &str) -> String {
    const MAX: usize = 80;
    if content.chars().count() <= MAX {
        content.to_string()
    } else {
        let head: String = content.chars().take(MAX).collect();
        format!("{head}…")
    }
}
