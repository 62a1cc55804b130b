//! # Markdown Preprocessing
//!
//! Walks a directory tree of annotated Markdown documents and fills the
//! chunk store: the provenance URL comes from a `<!-- source_url: ... -->`
//! comment, hotlinked images are collected for the captioning pass, and the
//! remaining prose is stripped of Markdown syntax and chunked.

use crate::chunker::{split_text, ChunkConfig};
use crate::errors::EmbedError;
use crate::ingest::sources::ChunkStore;
use regex::Regex;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum MarkdownIngestError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Store operation failed: {0}")]
    Store(#[from] EmbedError),
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

/// What a markdown ingestion pass accomplished.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownIngestReport {
    pub files: usize,
    pub chunks: usize,
    pub image_urls: usize,
}

/// Ingests every `.md` file under `dir` (recursively) into the store.
pub async fn ingest_markdown_dir(
    store: &ChunkStore,
    dir: &Path,
    config: &ChunkConfig,
) -> Result<MarkdownIngestReport, MarkdownIngestError> {
    config.validate()?;

    let source_url_re = Regex::new(r"<!--\s*source_url:\s*(.*?)\s*-->")?;
    let image_re = Regex::new(r"!\[.*?\]\((.*?)\)")?;

    let mut report = MarkdownIngestReport::default();
    for file_path in markdown_files(dir)? {
        let text = std::fs::read_to_string(&file_path)?;
        let path_str = file_path.to_string_lossy();

        // Provenance annotation added upstream; files without one still get
        // chunked, with empty provenance.
        let source_url = source_url_re
            .captures(&text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();
        if source_url.is_empty() {
            warn!(file = %path_str, "markdown file has no source_url annotation");
        }

        for captures in image_re.captures_iter(&text) {
            if let Some(url) = captures.get(1) {
                store.insert_image_url(&path_str, url.as_str()).await?;
                report.image_urls += 1;
            }
        }

        let cleaned = strip_markdown(&text)?;
        for (i, chunk) in split_text(&cleaned, config)?.iter().enumerate() {
            store
                .insert_markdown_chunk(&path_str, i as i64, chunk, &source_url)
                .await?;
            report.chunks += 1;
        }
        report.files += 1;
    }

    info!(
        files = report.files,
        chunks = report.chunks,
        image_urls = report.image_urls,
        "markdown ingestion complete"
    );
    Ok(report)
}

/// Removes Markdown formatting, leaving plain prose for embedding: HTML
/// comments (including the provenance annotation), code blocks and inline
/// code, headers, links, images, and emphasis markers.
fn strip_markdown(text: &str) -> Result<String, regex::Error> {
    let comment_re = Regex::new(r"(?s)<!--.*?-->")?;
    let code_re = Regex::new(r"(?s)`{1,3}.*?`{1,3}")?;
    let header_re = Regex::new(r"#+\s*")?;
    let image_re = Regex::new(r"!\[.*?\]\(.*?\)")?;
    let link_re = Regex::new(r"\[.*?\]\(.*?\)")?;
    let emphasis_re = Regex::new(r"\*\*|__|\*|_")?;

    let cleaned = comment_re.replace_all(text, "");
    let cleaned = code_re.replace_all(&cleaned, "");
    let cleaned = header_re.replace_all(&cleaned, "");
    // Images before links: the image syntax is a superset.
    let cleaned = image_re.replace_all(&cleaned, "");
    let cleaned = link_re.replace_all(&cleaned, "");
    let cleaned = emphasis_re.replace_all(&cleaned, "");
    Ok(cleaned.into_owned())
}

/// Collects `.md` files under `root`, depth-first, in a stable order.
fn markdown_files(root: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut dirs = vec![root.to_path_buf()];
    while let Some(dir) = dirs.pop() {
        let mut entries: Vec<_> = std::fs::read_dir(&dir)?
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(|e| e.path())
            .collect();
        entries.sort();
        for path in entries {
            if path.is_dir() {
                dirs.push(path);
            } else if path.extension().is_some_and(|ext| ext == "md") {
                files.push(path);
            }
        }
    }
    Ok(files)
}
