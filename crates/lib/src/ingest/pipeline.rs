//! # Ingestion Pipeline
//!
//! Drives the whole run: reads chunk records and image references from the
//! store, pushes them through the retrying client, and accumulates the
//! output set. Processing is strictly sequential, one remote call in flight
//! at a time, because the shared rate limiter enforces a global quota.
//!
//! The pipeline itself has no retry logic; every per-item failure has
//! already been retried inside [`EmbedClient`](crate::client::EmbedClient)
//! and is handled here by skipping the item.

use crate::client::EmbedClient;
use crate::errors::EmbedError;
use crate::ingest::sources::ChunkStore;
use crate::output::EmbeddingSet;
use tracing::{info, warn};

/// Counts describing what a run accomplished. A run always terminates with
/// a record count, even when that count is zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineSummary {
    /// Text chunks read from the store.
    pub text_chunks_seen: usize,
    /// Image references read from the store.
    pub images_seen: usize,
    /// Records appended to the output set.
    pub records: usize,
    /// Text chunks dropped after exhausted retries.
    pub skipped_text: usize,
    /// Images dropped after a captioning or embedding failure.
    pub skipped_images: usize,
    /// Items dropped because their vector length disagreed with the run's.
    pub skipped_ragged: usize,
}

/// Orchestrates one full corpus-to-embeddings run.
pub struct IngestionPipeline {
    store: ChunkStore,
    client: EmbedClient,
}

impl IngestionPipeline {
    pub fn new(store: ChunkStore, client: EmbedClient) -> Self {
        Self { store, client }
    }

    /// Processes every text chunk and image reference, returning the
    /// accumulated output set and a summary of what was skipped.
    pub async fn run(&self) -> Result<(EmbeddingSet, PipelineSummary), EmbedError> {
        let mut output = EmbeddingSet::new();
        let mut summary = PipelineSummary::default();

        // The first accepted vector fixes the run's dimension; anything
        // disagreeing with it would make the output ragged.
        let mut expected_dim: Option<usize> = None;

        // Pass 1: text chunks.
        let chunks = self.store.text_chunks().await?;
        summary.text_chunks_seen = chunks.len();
        info!(count = chunks.len(), "embedding text chunks");

        for chunk in &chunks {
            match self.client.embed_text(&chunk.content).await {
                Some(vector) => {
                    if accept_dimension(&mut expected_dim, vector.len(), &chunk.source_url) {
                        output.push(chunk.content.clone(), vector, chunk.source_url.clone());
                    } else {
                        summary.skipped_ragged += 1;
                    }
                }
                None => summary.skipped_text += 1,
            }
        }

        // Pass 2: images, captioned and then embedded through the same path.
        let image_urls = self.store.image_urls().await?;
        summary.images_seen = image_urls.len();
        info!(count = image_urls.len(), "captioning and embedding images");

        for url in &image_urls {
            let Some(caption) = self.client.caption_image(url).await else {
                summary.skipped_images += 1;
                continue;
            };
            let Some(vector) = self.client.embed_text(&caption).await else {
                summary.skipped_images += 1;
                continue;
            };
            if accept_dimension(&mut expected_dim, vector.len(), url) {
                output.push(format!("[IMAGE] {caption}"), vector, url.clone());
            } else {
                summary.skipped_ragged += 1;
            }
        }

        summary.records = output.len();
        info!(
            records = summary.records,
            skipped_text = summary.skipped_text,
            skipped_images = summary.skipped_images,
            skipped_ragged = summary.skipped_ragged,
            "ingestion run complete"
        );

        Ok((output, summary))
    }
}

fn accept_dimension(expected: &mut Option<usize>, actual: usize, source: &str) -> bool {
    match expected {
        None => {
            *expected = Some(actual);
            true
        }
        Some(dim) if *dim == actual => true,
        Some(dim) => {
            warn!(
                expected = *dim,
                actual,
                source = %source,
                "embedding dimension mismatch; skipping item"
            );
            false
        }
    }
}
