//! # Preprocessing Ingestor Tests
//!
//! Covers the markdown and discourse ingestors against temporary corpus
//! directories: annotation extraction, markdown stripping, image URL
//! collection, and skip-on-malformed-JSON behavior.

use ragline::chunker::ChunkConfig;
use ragline::ingest::{ingest_discourse_dir, ingest_markdown_dir, ChunkOrigin};
use ragline_test_utils::{setup_tracing, TestSetup};
use std::fs;

#[tokio::test]
async fn markdown_files_are_annotated_cleaned_and_chunked() -> anyhow::Result<()> {
    setup_tracing();
    let setup = TestSetup::new().await?;
    let dir = tempfile::tempdir()?;

    fs::write(
        dir.path().join("lesson.md"),
        "<!-- source_url: https://docs.example.com/lesson -->\n\
         # Heading\n\n\
         Some **bold** prose with a [link](https://elsewhere) and `inline code`.\n\n\
         ![a chart](https://img.example.com/chart.webp)\n",
    )?;

    let report =
        ingest_markdown_dir(&setup.store, dir.path(), &ChunkConfig::default()).await?;

    assert_eq!(report.files, 1);
    assert_eq!(report.image_urls, 1);
    assert_eq!(report.chunks, 1);

    let chunks = setup.store.text_chunks().await?;
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].origin, ChunkOrigin::Markdown);
    assert_eq!(chunks[0].source_url, "https://docs.example.com/lesson");
    // Markdown syntax is stripped before chunking.
    assert_eq!(chunks[0].content, "Heading Some bold prose with a and .");

    let images = setup.store.image_urls().await?;
    assert_eq!(images, ["https://img.example.com/chart.webp"]);
    Ok(())
}

#[tokio::test]
async fn markdown_without_annotation_gets_empty_provenance() -> anyhow::Result<()> {
    setup_tracing();
    let setup = TestSetup::new().await?;
    let dir = tempfile::tempdir()?;
    fs::write(dir.path().join("orphan.md"), "Plain prose, no annotation.")?;

    ingest_markdown_dir(&setup.store, dir.path(), &ChunkConfig::default()).await?;

    let chunks = setup.store.text_chunks().await?;
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].source_url, "");
    Ok(())
}

#[tokio::test]
async fn long_markdown_is_split_into_overlapping_chunks() -> anyhow::Result<()> {
    setup_tracing();
    let setup = TestSetup::new().await?;
    let dir = tempfile::tempdir()?;

    let body = "word ".repeat(600); // ~3000 normalized chars
    fs::write(
        dir.path().join("long.md"),
        format!("<!-- source_url: https://docs/long -->\n{body}"),
    )?;

    let config = ChunkConfig::default();
    let report = ingest_markdown_dir(&setup.store, dir.path(), &config).await?;
    assert!(report.chunks > 1);

    let chunks = setup.store.text_chunks().await?;
    for (i, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.chunk_index, i as i64);
        assert!(chunk.content.chars().count() <= config.chunk_size);
    }
    Ok(())
}

#[tokio::test]
async fn discourse_topics_are_cleaned_and_cited() -> anyhow::Result<()> {
    setup_tracing();
    let setup = TestSetup::new().await?;
    let dir = tempfile::tempdir()?;

    fs::write(
        dir.path().join("topic_42.json"),
        serde_json::json!({
            "post_data": {
                "id": 42,
                "slug": "setting-up-the-toolchain",
                "post_stream": {
                    "posts": [
                        { "id": 7, "cooked": "<p>Install the toolchain with the steps below.</p>" },
                        { "id": 8, "cooked": "<p>+1</p>" }
                    ]
                }
            }
        })
        .to_string(),
    )?;

    let report = ingest_discourse_dir(
        &setup.store,
        dir.path(),
        "https://forum.example.com",
        &ChunkConfig::default(),
    )
    .await?;

    assert_eq!(report.topics, 1);
    // The "+1" post is below the minimum length and is dropped.
    assert_eq!(report.chunks, 1);

    let chunks = setup.store.text_chunks().await?;
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].origin, ChunkOrigin::Discourse);
    assert_eq!(chunks[0].content, "Install the toolchain with the steps below.");
    assert_eq!(
        chunks[0].source_url,
        "https://forum.example.com/t/setting-up-the-toolchain/42/0"
    );
    Ok(())
}

#[tokio::test]
async fn malformed_topic_json_is_skipped_not_fatal() -> anyhow::Result<()> {
    setup_tracing();
    let setup = TestSetup::new().await?;
    let dir = tempfile::tempdir()?;

    fs::write(dir.path().join("bad.json"), "{ not json at all")?;
    fs::write(
        dir.path().join("good.json"),
        serde_json::json!({
            "post_data": {
                "id": 9,
                "slug": "a-valid-topic",
                "post_stream": {
                    "posts": [
                        { "id": 1, "cooked": "<p>This valid post survives the bad neighbor.</p>" }
                    ]
                }
            }
        })
        .to_string(),
    )?;

    let report = ingest_discourse_dir(
        &setup.store,
        dir.path(),
        "https://forum.example.com",
        &ChunkConfig::default(),
    )
    .await?;

    assert_eq!(report.skipped_files, 1);
    assert_eq!(report.topics, 1);
    assert_eq!(report.chunks, 1);
    Ok(())
}

#[tokio::test]
async fn invalid_chunk_config_fails_before_processing() -> anyhow::Result<()> {
    setup_tracing();
    let setup = TestSetup::new().await?;
    let dir = tempfile::tempdir()?;
    fs::write(dir.path().join("doc.md"), "content")?;

    let bad_config = ChunkConfig {
        chunk_size: 100,
        overlap: 100,
    };
    let result = ingest_markdown_dir(&setup.store, dir.path(), &bad_config).await;
    assert!(result.is_err());

    // Nothing was ingested.
    assert!(setup.store.text_chunks().await?.is_empty());
    Ok(())
}
