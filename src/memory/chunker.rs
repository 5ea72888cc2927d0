// src/memory/chunker.rs

use std::collections::VecDeque;
use thiserror::Error;

/// Separators tried in order, coarsest first. The empty separator splits
/// into single characters and always succeeds.
pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChunkerError {
    #[error("chunk_size must be greater than zero")]
    ZeroChunkSize,

    #[error("overlap ({overlap}) must be smaller than chunk_size ({chunk_size})")]
    OverlapTooLarge { chunk_size: usize, overlap: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkerConfig {
    pub chunk_size: usize, // characters
    pub overlap: usize,    // characters shared between neighbours
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            overlap: 200,
        }
    }
}

impl ChunkerConfig {
    pub fn validate(&self) -> Result<(), ChunkerError> {
        if self.chunk_size == 0 {
            return Err(ChunkerError::ZeroChunkSize);
        }
        if self.overlap >= self.chunk_size {
            return Err(ChunkerError::OverlapTooLarge {
                chunk_size: self.chunk_size,
                overlap: self.overlap,
            });
        }
        Ok(())
    }
}

/// Recursive character splitter.
///
/// Text is split on the coarsest separator present, pieces that are still too
/// long are split again with the next separator, and small pieces are merged
/// back together up to `chunk_size` characters with up to `overlap`
/// characters repeated at the start of the following chunk.
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    config: ChunkerConfig,
}

impl RecursiveChunker {
    pub fn new(config: ChunkerConfig) -> Result<Self, ChunkerError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn with_default() -> Self {
        Self {
            config: ChunkerConfig::default(),
        }
    }

    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Main entry point: split a text blob into ordered, overlapping chunks
    pub fn split_text(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        self.split_recursive(text, &DEFAULT_SEPARATORS)
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let mut final_chunks = Vec::new();

        // Pick the first separator that occurs in the text
        let mut separator = "";
        let mut remaining: &[&str] = &[];
        for (i, sep) in separators.iter().enumerate() {
            if sep.is_empty() {
                separator = sep;
                remaining = &[];
                break;
            }
            if text.contains(sep) {
                separator = sep;
                remaining = &separators[i + 1..];
                break;
            }
        }

        let splits: Vec<&str> = if separator.is_empty() {
            text.char_indices()
                .map(|(i, c)| &text[i..i + c.len_utf8()])
                .collect()
        } else {
            text.split(separator).filter(|s| !s.is_empty()).collect()
        };

        let mut good_splits: Vec<&str> = Vec::new();
        for split in splits {
            if char_len(split) < self.config.chunk_size {
                good_splits.push(split);
                continue;
            }

            if !good_splits.is_empty() {
                final_chunks.extend(self.merge_splits(&good_splits, separator));
                good_splits.clear();
            }
            if remaining.is_empty() {
                final_chunks.push(split.to_string());
            } else {
                final_chunks.extend(self.split_recursive(split, remaining));
            }
        }

        if !good_splits.is_empty() {
            final_chunks.extend(self.merge_splits(&good_splits, separator));
        }

        final_chunks
    }

    /// Greedily join small splits into chunks, carrying a tail of at most
    /// `overlap` characters into the next chunk.
    fn merge_splits(&self, splits: &[&str], separator: &str) -> Vec<String> {
        let sep_len = char_len(separator);
        let mut docs = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for &split in splits {
            let len = char_len(split);
            let joined_len = |current: &VecDeque<&str>| if current.is_empty() { 0 } else { sep_len };

            if total + len + joined_len(&current) > self.config.chunk_size {
                if !current.is_empty() {
                    if let Some(doc) = join_trimmed(&current, separator) {
                        docs.push(doc);
                    }
                    // Drop from the front until the tail fits the overlap and
                    // leaves room for the incoming split.
                    while total > self.config.overlap
                        || (total + len + joined_len(&current) > self.config.chunk_size
                            && total > 0)
                    {
                        let Some(front) = current.pop_front() else {
                            break;
                        };
                        total -= char_len(front) + if current.is_empty() { 0 } else { sep_len };
                    }
                }
            }

            current.push_back(split);
            total += len + if current.len() > 1 { sep_len } else { 0 };
        }

        if let Some(doc) = join_trimmed(&current, separator) {
            docs.push(doc);
        }

        docs
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn join_trimmed(parts: &VecDeque<&str>, separator: &str) -> Option<String> {
    let joined = parts.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        (0..n).map(|i| format!("word{i}")).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_config_validation() {
        assert!(ChunkerConfig::default().validate().is_ok());
        assert_eq!(
            RecursiveChunker::new(ChunkerConfig { chunk_size: 0, overlap: 0 }).unwrap_err(),
            ChunkerError::ZeroChunkSize
        );
        assert!(RecursiveChunker::new(ChunkerConfig { chunk_size: 10, overlap: 10 }).is_err());
    }

    #[test]
    fn test_blank_text_yields_no_chunks() {
        let chunker = RecursiveChunker::with_default();
        assert!(chunker.split_text("").is_empty());
        assert!(chunker.split_text("  \n\n \t").is_empty());
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunker = RecursiveChunker::with_default();
        let chunks = chunker.split_text("hello world");
        assert_eq!(chunks, vec!["hello world".to_string()]);
    }

    #[test]
    fn test_chunks_respect_size_and_overlap() {
        let chunker = RecursiveChunker::new(ChunkerConfig {
            chunk_size: 100,
            overlap: 20,
        })
        .unwrap();
        let text = words(200);
        let chunks = chunker.split_text(&text);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 100, "chunk too long: {}", chunk.len());
        }
        // Neighbouring chunks share words
        for pair in chunks.windows(2) {
            let last_word = pair[0].split_whitespace().last().unwrap();
            assert!(pair[1].contains(last_word));
        }
        // Every word survives
        assert!(chunks.last().unwrap().ends_with("word199"));
        assert!(chunks[0].starts_with("word0 "));
    }

    #[test]
    fn test_prefers_paragraph_boundaries() {
        let chunker = RecursiveChunker::new(ChunkerConfig {
            chunk_size: 40,
            overlap: 0,
        })
        .unwrap();
        let text = "First paragraph here.\n\nSecond paragraph here.\n\nThird one.";
        let chunks = chunker.split_text(text);

        assert_eq!(chunks[0], "First paragraph here.");
        assert!(chunks.iter().any(|c| c.starts_with("Second")));
    }

    #[test]
    fn test_unbroken_text_falls_back_to_characters() {
        let chunker = RecursiveChunker::new(ChunkerConfig {
            chunk_size: 10,
            overlap: 2,
        })
        .unwrap();
        let text = "x".repeat(35);
        let chunks = chunker.split_text(&text);

        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
        assert!(chunks.len() >= 4);
    }

    #[test]
    fn test_multibyte_text_is_safe() {
        let chunker = RecursiveChunker::new(ChunkerConfig {
            chunk_size: 5,
            overlap: 1,
        })
        .unwrap();
        let chunks = chunker.split_text("ééééééééééé");
        assert!(chunks.iter().all(|c| c.chars().count() <= 5));
    }
}
