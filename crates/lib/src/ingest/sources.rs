//! # Chunk Store
//!
//! SQLite-backed store (via Turso) holding the pre-chunked corpus the
//! pipeline consumes: markdown chunks, discourse chunks, and hotlinked image
//! URLs. The preprocessing ingestors write to it; the pipeline only reads.

use crate::errors::EmbedError;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};
use tracing::warn;
use turso::{params, Database, Value as TursoValue};

/// Which corpus a chunk came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkOrigin {
    Markdown,
    Discourse,
}

/// A bounded piece of source text, immutable once produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkRecord {
    pub content: String,
    pub source_url: String,
    pub origin: ChunkOrigin,
    pub chunk_index: i64,
}

const TABLE_CREATION_SQL: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS markdown_chunks (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        file_path TEXT,
        chunk_index INTEGER,
        content TEXT,
        source_url TEXT
    )",
    "CREATE TABLE IF NOT EXISTS discourse_chunks (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        post_id INTEGER,
        topic_id INTEGER,
        chunk_index INTEGER,
        content TEXT,
        source_url TEXT
    )",
    "CREATE TABLE IF NOT EXISTS image_chunks (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        file_path TEXT,
        image_url TEXT
    )",
];

/// A handle to the local SQLite chunk database.
///
/// Holds a `Database` instance, which manages a connection pool. Cloning
/// shares the same underlying database, which is how tests share an
/// in-memory instance.
#[derive(Clone)]
pub struct ChunkStore {
    pub db: Database,
}

impl ChunkStore {
    /// Opens (or creates) the store at `db_path`. Use `":memory:"` for an
    /// isolated in-memory database in tests.
    pub async fn new(db_path: &str) -> Result<Self, EmbedError> {
        let db = turso::Builder::new_local(db_path).build().await?;

        // WAL mode helps concurrent readers on file-backed databases and is
        // harmless for in-memory ones. PRAGMA returns a row, so use `query`.
        let conn = db.connect()?;
        conn.query("PRAGMA journal_mode=WAL;", ()).await?;

        Ok(Self { db })
    }

    /// Ensures all tables exist. Idempotent, safe on every startup.
    pub async fn initialize_schema(&self) -> Result<(), EmbedError> {
        let conn = self.db.connect()?;
        for statement in TABLE_CREATION_SQL {
            conn.execute(statement, ()).await?;
        }
        Ok(())
    }

    pub async fn insert_markdown_chunk(
        &self,
        file_path: &str,
        chunk_index: i64,
        content: &str,
        source_url: &str,
    ) -> Result<(), EmbedError> {
        let conn = self.db.connect()?;
        conn.execute(
            "INSERT INTO markdown_chunks (file_path, chunk_index, content, source_url)
             VALUES (?, ?, ?, ?)",
            params![file_path, chunk_index, content, source_url],
        )
        .await?;
        Ok(())
    }

    pub async fn insert_discourse_chunk(
        &self,
        post_id: i64,
        topic_id: i64,
        chunk_index: i64,
        content: &str,
        source_url: &str,
    ) -> Result<(), EmbedError> {
        let conn = self.db.connect()?;
        conn.execute(
            "INSERT INTO discourse_chunks (post_id, topic_id, chunk_index, content, source_url)
             VALUES (?, ?, ?, ?, ?)",
            params![post_id, topic_id, chunk_index, content, source_url],
        )
        .await?;
        Ok(())
    }

    pub async fn insert_image_url(
        &self,
        file_path: &str,
        image_url: &str,
    ) -> Result<(), EmbedError> {
        let conn = self.db.connect()?;
        conn.execute(
            "INSERT INTO image_chunks (file_path, image_url) VALUES (?, ?)",
            params![file_path, image_url],
        )
        .await?;
        Ok(())
    }

    /// Fetches every text chunk: markdown rows first, then discourse rows,
    /// each in insertion order.
    pub async fn text_chunks(&self) -> Result<Vec<ChunkRecord>, EmbedError> {
        let conn = self.db.connect()?;
        let mut records = Vec::new();

        for (origin, sql) in [
            (
                ChunkOrigin::Markdown,
                "SELECT content, source_url, chunk_index FROM markdown_chunks ORDER BY id",
            ),
            (
                ChunkOrigin::Discourse,
                "SELECT content, source_url, chunk_index FROM discourse_chunks ORDER BY id",
            ),
        ] {
            let mut stmt = conn.prepare(sql).await?;
            let mut rows = stmt.query(()).await?;
            while let Some(row) = rows.next().await? {
                records.push(ChunkRecord {
                    content: text_value(row.get_value(0)?),
                    source_url: text_value(row.get_value(1)?),
                    origin,
                    chunk_index: integer_value(row.get_value(2)?),
                });
            }
        }

        Ok(records)
    }

    /// Fetches every hotlinked image URL. A missing `image_chunks` table is
    /// tolerated and treated as an empty corpus, not a fatal error.
    pub async fn image_urls(&self) -> Result<Vec<String>, EmbedError> {
        let conn = self.db.connect()?;
        let mut stmt = match conn
            .prepare("SELECT image_url FROM image_chunks ORDER BY id")
            .await
        {
            Ok(stmt) => stmt,
            Err(e) => {
                warn!(error = %e, "image_chunks table unavailable; continuing without images");
                return Ok(Vec::new());
            }
        };

        let mut urls = Vec::new();
        let mut rows = stmt.query(()).await?;
        while let Some(row) = rows.next().await? {
            urls.push(text_value(row.get_value(0)?));
        }
        Ok(urls)
    }
}

impl Debug for ChunkStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkStore").finish_non_exhaustive()
    }
}

fn text_value(v: TursoValue) -> String {
    match v {
        TursoValue::Text(s) => s,
        _ => String::new(),
    }
}

fn integer_value(v: TursoValue) -> i64 {
    match v {
        TursoValue::Integer(i) => i,
        _ => 0,
    }
}
