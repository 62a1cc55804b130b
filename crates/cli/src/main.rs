//! # ragline-cli
//!
//! Command-line front end for the embedding pipeline: `chunk` fills the
//! local chunk store from corpus directories, `embed` turns the store into
//! the embedding-set artifact.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ragline::chunker::ChunkConfig;
use ragline::ingest::{ingest_discourse_dir, ingest_markdown_dir, ChunkStore, IngestionPipeline};
use ragline::providers::ai::{GeminiCaptionProvider, GeminiEmbeddingProvider};
use ragline::{EmbedClient, EmbedError, RateLimiter};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

// --- CLI Definition ---

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to the SQLite chunk database.
    #[arg(long, global = true, default_value = "data/knowledge_base.db")]
    db_path: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Chunk corpus files into the local store
    Chunk(ChunkArgs),
    /// Embed stored chunks and images into the output artifact
    Embed(EmbedArgs),
}

#[derive(Parser, Debug)]
struct ChunkArgs {
    /// Directory of annotated markdown files to ingest
    #[arg(long)]
    markdown_dir: Option<PathBuf>,

    /// Directory of scraped discourse topic JSON files to ingest
    #[arg(long)]
    discourse_dir: Option<PathBuf>,

    /// Base URL used to build discourse provenance links
    #[arg(long, default_value = "https://discourse.onlinedegree.iitm.ac.in")]
    discourse_base_url: String,

    /// Maximum chunk width in characters
    #[arg(long, default_value_t = 1000)]
    chunk_size: usize,

    /// Character overlap between consecutive chunks
    #[arg(long, default_value_t = 200)]
    overlap: usize,
}

#[derive(Parser, Debug)]
struct EmbedArgs {
    /// Where to write the embedding-set artifact
    #[arg(long, default_value = "data/embeddings.json")]
    output: PathBuf,

    /// Gemini embedding model name
    #[arg(long, default_value = "embedding-001")]
    embedding_model: String,

    /// Gemini multimodal model used for image captioning
    #[arg(long, default_value = "gemini-1.5-flash")]
    caption_model: String,

    /// Maximum calls per second to the AI service
    #[arg(long, default_value_t = 2.0)]
    rps: f64,

    /// Maximum calls per sliding minute to the AI service
    #[arg(long, default_value_t = 60)]
    rpm: usize,

    /// Total attempts per text embedding
    #[arg(long, default_value_t = 3)]
    embed_retries: u32,

    /// Total attempts per image caption
    #[arg(long, default_value_t = 2)]
    caption_retries: u32,
}

// --- Main Application Entry ---

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match &cli.command {
        Commands::Chunk(args) => handle_chunk(&cli.db_path, args).await,
        Commands::Embed(args) => handle_embed(&cli.db_path, args).await,
    }
}

// --- Command Handlers ---

async fn handle_chunk(db_path: &str, args: &ChunkArgs) -> Result<()> {
    let config = ChunkConfig {
        chunk_size: args.chunk_size,
        overlap: args.overlap,
    };
    config.validate()?;

    let store = ChunkStore::new(db_path).await?;
    store.initialize_schema().await?;

    if let Some(dir) = &args.markdown_dir {
        let report = ingest_markdown_dir(&store, dir, &config)
            .await
            .with_context(|| format!("markdown ingestion from {} failed", dir.display()))?;
        println!(
            "Markdown: {} files -> {} chunks, {} image URLs",
            report.files, report.chunks, report.image_urls
        );
    }

    if let Some(dir) = &args.discourse_dir {
        let report = ingest_discourse_dir(&store, dir, &args.discourse_base_url, &config)
            .await
            .with_context(|| format!("discourse ingestion from {} failed", dir.display()))?;
        println!(
            "Discourse: {} topics -> {} chunks ({} malformed files skipped)",
            report.topics, report.chunks, report.skipped_files
        );
    }

    if args.markdown_dir.is_none() && args.discourse_dir.is_none() {
        println!("Nothing to do: pass --markdown-dir and/or --discourse-dir.");
    }
    Ok(())
}

async fn handle_embed(db_path: &str, args: &EmbedArgs) -> Result<()> {
    // The credential is the one piece of configuration that has no default;
    // without it nothing can run, so fail before touching the store.
    let api_key = std::env::var("GENAI_API_KEY")
        .map_err(|_| EmbedError::MissingApiKey)
        .context("set GENAI_API_KEY in the environment or a .env file")?;

    let embed_url = format!(
        "{GEMINI_API_BASE}/{model}:embedContent",
        model = args.embedding_model
    );
    let caption_url = format!(
        "{GEMINI_API_BASE}/{model}:generateContent",
        model = args.caption_model
    );
    info!(embed_url = %embed_url, caption_url = %caption_url, "configured Gemini endpoints");

    let embedder = GeminiEmbeddingProvider::new(
        embed_url,
        api_key.clone(),
        args.embedding_model.clone(),
    )?;
    let captioner = GeminiCaptionProvider::new(caption_url, api_key)?;

    let limiter = Arc::new(RateLimiter::new(args.rps, args.rpm));
    let client = EmbedClient::new(Box::new(embedder), Box::new(captioner), limiter)?
        .with_max_retries(args.embed_retries, args.caption_retries);

    let store = ChunkStore::new(db_path).await?;
    let pipeline = IngestionPipeline::new(store, client);
    let (output, summary) = pipeline.run().await?;

    if let Some(parent) = args.output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    output.save(&args.output)?;

    println!(
        "Saved {} embeddings to {} ({} text chunks and {} images skipped)",
        summary.records,
        args.output.display(),
        summary.skipped_text,
        summary.skipped_images + summary.skipped_ragged
    );
    Ok(())
}
