//! # Output Artifact
//!
//! The final product of a run: three parallel sequences (chunk contents,
//! embedding vectors, provenance URLs) of equal length, suitable for
//! downstream vector-similarity lookup. Positional alignment across the
//! three sequences is the structure's invariant, so the fields are private
//! and the only mutator appends to all three at once.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Parallel arrays of content, embedding, and provenance URL.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmbeddingSet {
    chunks: Vec<String>,
    embeddings: Vec<Vec<f32>>,
    source_urls: Vec<String>,
}

impl EmbeddingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one complete record. All three sequences grow together; a
    /// failed item never reaches this method.
    pub fn push(&mut self, content: String, embedding: Vec<f32>, source_url: String) {
        self.chunks.push(content);
        self.embeddings.push(embedding);
        self.source_urls.push(source_url);
    }

    /// Number of records in the set.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn chunks(&self) -> &[String] {
        &self.chunks
    }

    pub fn embeddings(&self) -> &[Vec<f32>] {
        &self.embeddings
    }

    pub fn source_urls(&self) -> &[String] {
        &self.source_urls
    }

    /// Writes the set to `path` as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        info!(records = self.len(), path = %path.display(), "saved embedding set");
        Ok(())
    }

    /// Reads a previously saved set from `path`.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}
