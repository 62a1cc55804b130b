//! # ragline
//!
//! Turns a heterogeneous text/image corpus (markdown documents, forum
//! threads, hotlinked images) into a flat set of vector embeddings for
//! downstream semantic retrieval.
//!
//! The crate is organized around four pieces:
//! - [`chunker`]: splits arbitrary-length text into bounded, overlapping
//!   chunks.
//! - [`limiter`]: a process-wide throttle on calls to the remote AI service.
//! - [`client`]: the rate-limited, retry-tolerant client over the embedding
//!   and captioning operations.
//! - [`ingest`]: the store of chunk records and the pipeline that drives a
//!   full run, accumulating an [`output::EmbeddingSet`].

pub mod chunker;
pub mod client;
pub mod errors;
pub mod ingest;
pub mod limiter;
pub mod output;
pub mod prompts;
pub mod providers;

pub use chunker::{split_text, ChunkConfig};
pub use client::EmbedClient;
pub use errors::EmbedError;
pub use ingest::{IngestionPipeline, PipelineSummary};
pub use limiter::RateLimiter;
pub use output::EmbeddingSet;
