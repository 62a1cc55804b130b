//! # Shared Test Utilities
//!
//! Mock providers and database setup helpers so tests are isolated and
//! repeatable without touching the real AI service.

use anyhow::Result;
use async_trait::async_trait;
use dotenvy::dotenv;
use ragline::errors::EmbedError;
use ragline::ingest::ChunkStore;
use ragline::providers::ai::{CaptionProvider, EmbeddingProvider, ImagePayload};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, Once};

static INIT: Once = Once::new();

/// Initializes the tracing subscriber and loads .env for tests.
pub fn setup_tracing() {
    INIT.call_once(|| {
        dotenv().ok();
        tracing_subscriber::fmt::init();
    });
}

// --- Test Setup ---

/// A helper struct to manage database creation for each test.
pub struct TestSetup {
    pub store: ChunkStore,
}

impl TestSetup {
    /// Creates a new, isolated in-memory chunk store with the full schema.
    pub async fn new() -> Result<Self> {
        let store = ChunkStore::new(":memory:").await?;
        store.initialize_schema().await?;
        Ok(Self { store })
    }

    /// Creates a store whose `image_chunks` table is deliberately absent,
    /// simulating a corpus scraped before image support existed.
    pub async fn new_without_image_table() -> Result<Self> {
        let store = ChunkStore::new(":memory:").await?;
        let conn = store.db.connect()?;
        conn.execute(
            "CREATE TABLE markdown_chunks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                file_path TEXT,
                chunk_index INTEGER,
                content TEXT,
                source_url TEXT
            )",
            (),
        )
        .await?;
        conn.execute(
            "CREATE TABLE discourse_chunks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                post_id INTEGER,
                topic_id INTEGER,
                chunk_index INTEGER,
                content TEXT,
                source_url TEXT
            )",
            (),
        )
        .await?;
        Ok(Self { store })
    }
}

// --- Mock Embedding Provider ---

type EmbedScript = VecDeque<Result<Vec<f32>, String>>;

/// Scripted embedding provider: plays back a queue of results, then falls
/// back to a fixed vector. Records every input for assertions.
#[derive(Clone, Debug)]
pub struct MockEmbeddingProvider {
    script: Arc<Mutex<EmbedScript>>,
    fallback: Vec<f32>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockEmbeddingProvider {
    /// Plays back `script` in order, then keeps returning `fallback`.
    pub fn with_script(script: Vec<Result<Vec<f32>, String>>, fallback: Vec<f32>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into())),
            fallback,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Always succeeds with `vector`.
    pub fn always_ok(vector: Vec<f32>) -> Self {
        Self::with_script(Vec::new(), vector)
    }

    /// Always fails with `message`. The scripted failures outlast any retry
    /// budget used in tests.
    pub fn always_fail(message: &str) -> Self {
        let script = (0..64).map(|_| Err(message.to_string())).collect();
        Self::with_script(script, Vec::new())
    }

    /// Number of embed calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// The inputs passed to `embed`, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed(&self, content: &str) -> Result<Vec<f32>, EmbedError> {
        self.calls.lock().unwrap().push(content.to_string());
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(vector)) => Ok(vector),
            Some(Err(message)) => Err(EmbedError::AiApi(message)),
            None => Ok(self.fallback.clone()),
        }
    }
}

// --- Mock Caption Provider ---

type CaptionScript = VecDeque<Result<String, String>>;

/// Scripted caption provider. Records the MIME type and prompt of every
/// request so tests can assert on the payload the client built.
#[derive(Clone, Debug)]
pub struct MockCaptionProvider {
    script: Arc<Mutex<CaptionScript>>,
    fallback: String,
    requests: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockCaptionProvider {
    pub fn with_script(script: Vec<Result<String, String>>, fallback: &str) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into())),
            fallback: fallback.to_string(),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Always succeeds with `caption`.
    pub fn always_ok(caption: &str) -> Self {
        Self::with_script(Vec::new(), caption)
    }

    /// The `(mime_type, prompt)` pairs seen so far, in order.
    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl CaptionProvider for MockCaptionProvider {
    async fn caption(&self, image: &ImagePayload, prompt: &str) -> Result<String, EmbedError> {
        self.requests
            .lock()
            .unwrap()
            .push((image.mime_type.clone(), prompt.to_string()));
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(caption)) => Ok(caption),
            Some(Err(message)) => Err(EmbedError::AiApi(message)),
            None => Ok(self.fallback.clone()),
        }
    }
}
