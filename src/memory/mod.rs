// src/memory/mod.rs

pub mod chunker;
pub mod conversation;
pub mod llm_provider;
pub mod prompt;
pub mod tokens;

pub use chunker::{ChunkerConfig, ChunkerError, RecursiveChunker};
pub use conversation::{ConversationTurn, Role};
pub use llm_provider::{GenerationSettings, GroqProvider, LLMError, LLMProvider};
pub use prompt::{
    create_prompt, create_summary_prompt, format_history, select_context, AssembledPrompt,
    BudgetUnit, ContextSelection, HistoryWindow, PromptOptions,
};
pub use tokens::{CharCounter, TiktokenCounter, TokenCounter, TokenizerError};
