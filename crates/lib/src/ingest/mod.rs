//! # Ingestion
//!
//! Everything between raw corpus files and the final embedding set: the
//! preprocessing ingestors that fill the chunk store, the store itself, and
//! the pipeline that turns stored chunks into vectors.

pub mod discourse;
pub mod markdown;
pub mod pipeline;
pub mod sources;

pub use discourse::{ingest_discourse_dir, DiscourseIngestError, DiscourseIngestReport};
pub use markdown::{ingest_markdown_dir, MarkdownIngestError, MarkdownIngestReport};
pub use pipeline::{IngestionPipeline, PipelineSummary};
pub use sources::{ChunkOrigin, ChunkRecord, ChunkStore};
