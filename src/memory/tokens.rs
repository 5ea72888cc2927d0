// src/memory/tokens.rs
// Cost functions for the prompt context budget

use std::fmt;
use thiserror::Error;
use tiktoken_rs::CoreBPE;

#[derive(Debug, Error)]
#[error("failed to load tokenizer: {0}")]
pub struct TokenizerError(String);

/// Measures how much of the context budget a piece of text consumes.
pub trait TokenCounter: Send + Sync {
    fn count(&self, text: &str) -> usize;
    fn unit(&self) -> &'static str;
}

/// Budget measured in characters.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharCounter;

impl TokenCounter for CharCounter {
    fn count(&self, text: &str) -> usize {
        text.chars().count()
    }

    fn unit(&self) -> &'static str {
        "chars"
    }
}

/// Budget measured in BPE tokens (cl100k_base).
pub struct TiktokenCounter {
    bpe: CoreBPE,
}

impl TiktokenCounter {
    pub fn cl100k() -> Result<Self, TokenizerError> {
        let bpe = tiktoken_rs::cl100k_base().map_err(|e| TokenizerError(e.to_string()))?;
        Ok(Self { bpe })
    }
}

impl TokenCounter for TiktokenCounter {
    fn count(&self, text: &str) -> usize {
        self.bpe.encode_with_special_tokens(text).len()
    }

    fn unit(&self) -> &'static str {
        "tokens"
    }
}

impl fmt::Debug for TiktokenCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TiktokenCounter(cl100k_base)")
    }
}
