//! # Discourse Preprocessing
//!
//! Reads scraped Discourse topic JSON files and fills the chunk store with
//! cleaned, chunked post text. Each chunk's provenance URL points back at
//! the topic so answers can cite the forum thread.

use crate::chunker::{split_text, ChunkConfig};
use crate::errors::EmbedError;
use crate::ingest::sources::ChunkStore;
use scraper::Html;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

/// Posts whose cleaned text is shorter than this carry no embeddable
/// content (single emoji replies, "+1" posts) and are dropped.
const MIN_POST_CHARS: usize = 20;

#[derive(Error, Debug)]
pub enum DiscourseIngestError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Store operation failed: {0}")]
    Store(#[from] EmbedError),
}

/// What a discourse ingestion pass accomplished.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscourseIngestReport {
    pub topics: usize,
    pub chunks: usize,
    pub skipped_files: usize,
}

// --- Scraped topic file shape ---

#[derive(Deserialize)]
struct TopicFile {
    post_data: TopicData,
}

#[derive(Deserialize)]
struct TopicData {
    #[serde(default = "default_topic_id")]
    id: i64,
    #[serde(default)]
    slug: String,
    #[serde(default)]
    post_stream: PostStream,
}

fn default_topic_id() -> i64 {
    -1
}

#[derive(Deserialize, Default)]
struct PostStream {
    #[serde(default)]
    posts: Vec<Post>,
}

#[derive(Deserialize)]
struct Post {
    #[serde(default)]
    id: i64,
    /// Rendered post HTML, as Discourse serves it.
    #[serde(default)]
    cooked: String,
}

/// Ingests every `.json` topic file under `dir` into the store.
///
/// Unparseable or structurally wrong files are logged and skipped; a single
/// bad scrape never aborts the batch.
pub async fn ingest_discourse_dir(
    store: &ChunkStore,
    dir: &Path,
    base_url: &str,
    config: &ChunkConfig,
) -> Result<DiscourseIngestReport, DiscourseIngestError> {
    config.validate()?;

    let mut report = DiscourseIngestReport::default();
    let mut paths: Vec<_> = std::fs::read_dir(dir)?
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    for path in paths {
        let raw = std::fs::read_to_string(&path)?;
        let topic: TopicFile = match serde_json::from_str(&raw) {
            Ok(topic) => topic,
            Err(e) => {
                warn!(file = %path.display(), error = %e, "skipping malformed topic JSON");
                report.skipped_files += 1;
                continue;
            }
        };

        let TopicData {
            id: topic_id,
            slug,
            post_stream,
        } = topic.post_data;

        for post in post_stream.posts {
            let cleaned = html_to_text(&post.cooked);
            if cleaned.chars().count() < MIN_POST_CHARS {
                continue;
            }
            for (i, chunk) in split_text(&cleaned, config)?.iter().enumerate() {
                let source_url = format!("{base_url}/t/{slug}/{topic_id}/{i}");
                store
                    .insert_discourse_chunk(post.id, topic_id, i as i64, chunk, &source_url)
                    .await?;
                report.chunks += 1;
            }
        }
        report.topics += 1;
    }

    info!(
        topics = report.topics,
        chunks = report.chunks,
        skipped_files = report.skipped_files,
        "discourse ingestion complete"
    );
    Ok(report)
}

/// Flattens rendered post HTML to whitespace-normalized text.
fn html_to_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let text: Vec<_> = fragment.root_element().text().collect();
    text.join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
