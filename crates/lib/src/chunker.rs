//! # Text Chunking
//!
//! Splits arbitrary-length text into bounded, overlapping windows, the unit
//! of embedding for the rest of the pipeline. Splitting is a pure function of
//! its inputs: no I/O, deterministic, restartable.

use crate::errors::EmbedError;

/// Parameters controlling how source text is windowed into chunks.
#[derive(Debug, Clone, Copy)]
pub struct ChunkConfig {
    /// Maximum chunk width in characters.
    pub chunk_size: usize,
    /// Character overlap between consecutive chunks, to preserve context
    /// across chunk boundaries.
    pub overlap: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            overlap: 200,
        }
    }
}

impl ChunkConfig {
    /// Rejects parameter combinations that would make the window loop
    /// non-terminating. Called once before any processing starts.
    pub fn validate(&self) -> Result<(), EmbedError> {
        if self.chunk_size == 0 || self.overlap >= self.chunk_size {
            return Err(EmbedError::InvalidChunking {
                chunk_size: self.chunk_size,
                overlap: self.overlap,
            });
        }
        Ok(())
    }
}

/// Splits text into overlapping, fixed-width chunks.
///
/// The input is whitespace-normalized first (runs collapsed to a single
/// space, leading/trailing trimmed). Text that fits within `chunk_size`
/// comes back as a single chunk; empty input yields no chunks. Longer text
/// is windowed with a step of `chunk_size - overlap`, and the final window
/// may be shorter than `chunk_size`.
///
/// An invalid config is rejected here as well as at startup, so the window
/// loop can never run with a non-positive step.
///
/// Windows are measured in characters, not bytes, so multi-byte text never
/// splits inside a code point.
pub fn split_text(text: &str, config: &ChunkConfig) -> Result<Vec<String>, EmbedError> {
    config.validate()?;

    let normalized = normalize_whitespace(text);
    if normalized.is_empty() {
        return Ok(Vec::new());
    }

    let chars: Vec<char> = normalized.chars().collect();
    if chars.len() <= config.chunk_size {
        return Ok(vec![normalized]);
    }

    let step = config.chunk_size - config.overlap;
    let mut chunks = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let end = std::cmp::min(start + config.chunk_size, chars.len());
        chunks.push(chars[start..end].iter().collect());
        start += step;
    }
    Ok(chunks)
}

/// Collapses consecutive whitespace to single spaces and trims the ends.
fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_no_chunks() {
        let config = ChunkConfig::default();
        assert!(split_text("", &config).unwrap().is_empty());
        assert!(split_text("   \n\t  ", &config).unwrap().is_empty());
    }

    #[test]
    fn short_input_yields_single_normalized_chunk() {
        let config = ChunkConfig::default();
        let chunks = split_text("  hello\n\n  world\t again ", &config).unwrap();
        assert_eq!(chunks, vec!["hello world again".to_string()]);
    }

    #[test]
    fn input_at_exact_chunk_size_is_not_split() {
        let config = ChunkConfig::default();
        let text = "a".repeat(1000);
        let chunks = split_text(&text, &config).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].len(), 1000);
    }

    #[test]
    fn long_input_is_windowed_with_overlap() {
        let config = ChunkConfig::default();
        let text = "a".repeat(2400);
        let chunks = split_text(&text, &config).unwrap();

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 1000);
        assert_eq!(chunks[1].len(), 1000);
        // Last window starts at 1600 and runs to the end, unpadded.
        assert_eq!(chunks[2].len(), 800);
    }

    #[test]
    fn consecutive_chunks_share_the_overlap() {
        let config = ChunkConfig {
            chunk_size: 10,
            overlap: 4,
        };
        // Distinct characters so overlap content is verifiable.
        let text: String = ('a'..='z').collect();
        let chunks = split_text(&text, &config).unwrap();

        for pair in chunks.windows(2) {
            // The final window may be shorter than the overlap itself.
            let shared = 4.min(pair[1].chars().count());
            let prev: Vec<char> = pair[0].chars().collect();
            let prev_tail: String = prev[prev.len() - shared..].iter().collect();
            let next_head: String = pair[1].chars().take(shared).collect();
            assert_eq!(prev_tail, next_head);
        }
    }

    #[test]
    fn chunk_count_matches_window_arithmetic() {
        // With L > chunk_size and step s = chunk_size - overlap, the number
        // of windows is ceil((L - overlap) / s).
        let cases = [(2400usize, 1000usize, 200usize), (5000, 4096, 200), (1001, 1000, 200), (3000, 500, 100)];
        for (len, chunk_size, overlap) in cases {
            let config = ChunkConfig {
                chunk_size,
                overlap,
            };
            let text = "x".repeat(len);
            let step = chunk_size - overlap;
            let expected = (len - overlap).div_ceil(step);
            assert_eq!(
                split_text(&text, &config).unwrap().len(),
                expected,
                "len={len} chunk_size={chunk_size} overlap={overlap}"
            );
        }
    }

    #[test]
    fn multibyte_text_splits_on_character_boundaries() {
        let config = ChunkConfig {
            chunk_size: 5,
            overlap: 1,
        };
        let text = "日本語のテキストです";
        let chunks = split_text(text, &config).unwrap();
        assert!(chunks.iter().all(|c| c.chars().count() <= 5));
    }

    #[test]
    fn overlap_must_be_smaller_than_chunk_size() {
        let config = ChunkConfig {
            chunk_size: 200,
            overlap: 200,
        };
        assert!(matches!(
            config.validate(),
            Err(EmbedError::InvalidChunking { .. })
        ));

        let config = ChunkConfig {
            chunk_size: 1000,
            overlap: 200,
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn split_text_rejects_invalid_config_itself() {
        // The guard holds even when callers skip the startup validation.
        let config = ChunkConfig {
            chunk_size: 100,
            overlap: 100,
        };
        assert!(matches!(
            split_text("some text", &config),
            Err(EmbedError::InvalidChunking { .. })
        ));

        let config = ChunkConfig {
            chunk_size: 0,
            overlap: 0,
        };
        assert!(split_text("some text", &config).is_err());
    }
}
