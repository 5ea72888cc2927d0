//! Per-user chat sessions.
//!
//! A [`Session`] owns the chunk set of the most recently processed upload and
//! the conversation about it. Handlers mutate the session in place and return
//! an outcome carrying a [`Notice`] for the client to display.

pub mod store;

use crate::config::ApiConfig;
use crate::extract::{self, CsvMode, FileKind, UploadedFile};
use crate::memory::{
    create_prompt, create_summary_prompt, ChunkerError, ConversationTurn, LLMProvider,
    PromptOptions, RecursiveChunker, TokenCounter, TokenizerError,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

pub use store::{SessionHandle, SessionStore};

/// Assistant reply used when a question arrives before any file was processed.
pub const NO_DOCUMENTS_WARNING: &str = "⚠️ Please upload and process a file first.";

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Chunker(#[from] ChunkerError),

    #[error(transparent)]
    Tokenizer(#[from] TokenizerError),
}

/// Transient status banner returned with every handler result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "level", content = "message", rename_all = "lowercase")]
pub enum Notice {
    Success(String),
    Info(String),
    Warning(String),
    Error(String),
}

impl Notice {
    pub fn message(&self) -> &str {
        match self {
            Notice::Success(m) | Notice::Info(m) | Notice::Warning(m) | Notice::Error(m) => m,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Notice::Error(_))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SummarySettings {
    pub enabled: bool,
    pub prefix_chars: usize,
}

impl Default for SummarySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            prefix_chars: 3000,
        }
    }
}

/// Everything a session handler needs besides the session itself. Shared by
/// all sessions.
#[derive(Clone)]
pub struct ChatEngine {
    pub provider: Arc<dyn LLMProvider>,
    pub counter: Arc<dyn TokenCounter>,
    pub chunker: RecursiveChunker,
    pub prompt_options: PromptOptions,
    pub csv_mode: CsvMode,
    pub summary: SummarySettings,
}

impl ChatEngine {
    pub fn from_config(
        config: &ApiConfig,
        provider: Arc<dyn LLMProvider>,
    ) -> Result<Self, EngineError> {
        Ok(Self {
            provider,
            counter: config.budget_unit.counter()?,
            chunker: RecursiveChunker::new(config.chunker_config())?,
            prompt_options: config.prompt_options(),
            csv_mode: config.csv_mode,
            summary: SummarySettings {
                enabled: config.summary_enabled,
                prefix_chars: config.summary_prefix_chars,
            },
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessOutcome {
    pub notice: Notice,
    pub chunk_count: usize,
    /// Per-file problems; processing still went ahead
    pub warnings: Vec<String>,
    pub summary: Option<String>,
    /// Whether the previous chunks and conversation were replaced
    pub reset: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    Answered { answer: String, used_chunks: usize },
    NoDocuments { answer: String },
    Rejected(Notice),
    Failed(Notice),
}

impl TurnOutcome {
    pub fn answer(&self) -> Option<&str> {
        match self {
            TurnOutcome::Answered { answer, .. } | TurnOutcome::NoDocuments { answer } => {
                Some(answer)
            }
            TurnOutcome::Rejected(_) | TurnOutcome::Failed(_) => None,
        }
    }

    pub fn notice(&self) -> Option<Notice> {
        match self {
            TurnOutcome::Answered { .. } => None,
            TurnOutcome::NoDocuments { answer } => Some(Notice::Warning(answer.clone())),
            TurnOutcome::Rejected(n) | TurnOutcome::Failed(n) => Some(n.clone()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub file_type: Option<FileKind>,
    pub chunk_count: usize,
    pub summary: Option<String>,
    pub conversation: Vec<ConversationTurn>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    chunks: Vec<String>,
    conversation: Vec<ConversationTurn>,
    file_kind: Option<FileKind>,
    summary: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4())
    }

    pub fn with_id(id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id,
            chunks: Vec::new(),
            conversation: Vec::new(),
            file_kind: None,
            summary: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn chunks(&self) -> &[String] {
        &self.chunks
    }

    pub fn conversation(&self) -> &[ConversationTurn] {
        &self.conversation
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn file_kind(&self) -> Option<FileKind> {
        self.file_kind
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id,
            file_type: self.file_kind,
            chunk_count: self.chunks.len(),
            summary: self.summary.clone(),
            conversation: self.conversation.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// Extract, chunk and install a new file set. The previous chunks,
    /// conversation and summary are discarded only when the new set yields
    /// some text.
    pub async fn process_files(
        &mut self,
        kind: FileKind,
        files: Vec<UploadedFile>,
        engine: &ChatEngine,
    ) -> ProcessOutcome {
        let file_count = files.len();
        let chunker = engine.chunker.clone();
        let csv_mode = engine.csv_mode;

        // PDF parsing and splitting are CPU-bound
        let joined = tokio::task::spawn_blocking(move || {
            let extraction = extract::extract_text(kind, &files, csv_mode);
            let chunks = if extraction.is_blank() {
                Vec::new()
            } else {
                chunker.split_text(&extraction.text)
            };
            (extraction, chunks)
        })
        .await;

        let (extraction, chunks) = match joined {
            Ok(result) => result,
            Err(e) => {
                warn!(session = %self.id, error = %e, "Extraction task failed");
                return ProcessOutcome {
                    notice: Notice::Error(format!("Failed to process {} files: {}", kind, e)),
                    chunk_count: self.chunks.len(),
                    warnings: Vec::new(),
                    summary: self.summary.clone(),
                    reset: false,
                };
            }
        };

        let mut warnings = extraction.warnings;
        if chunks.is_empty() {
            info!(session = %self.id, files = file_count, kind = %kind, "No text extracted");
            return ProcessOutcome {
                notice: Notice::Info(format!(
                    "No text could be extracted from the uploaded {} files.",
                    kind
                )),
                chunk_count: self.chunks.len(),
                warnings,
                summary: self.summary.clone(),
                reset: false,
            };
        }

        self.chunks = chunks;
        self.conversation.clear();
        self.file_kind = Some(kind);
        self.summary = None;
        self.updated_at = Utc::now();

        info!(
            session = %self.id,
            files = file_count,
            kind = %kind,
            chunks = self.chunks.len(),
            "Processed upload"
        );

        if engine.summary.enabled {
            let prompt = create_summary_prompt(&extraction.text, kind, engine.summary.prefix_chars);
            match engine.provider.generate(&prompt).await {
                Ok(summary) => self.summary = Some(summary),
                Err(e) => {
                    warn!(session = %self.id, error = %e, "Summary generation failed");
                    warnings.push(format!("Summary unavailable: {}", e));
                }
            }
        }

        ProcessOutcome {
            notice: Notice::Success(format!(
                "Processed {} into {} chunks.",
                kind,
                self.chunks.len()
            )),
            chunk_count: self.chunks.len(),
            warnings,
            summary: self.summary.clone(),
            reset: true,
        }
    }

    /// Answer one question. Both turns are appended on success; on a failed
    /// completion the conversation is left as it was.
    pub async fn ask(&mut self, question: &str, engine: &ChatEngine) -> TurnOutcome {
        let question = question.trim();
        if question.is_empty() {
            return TurnOutcome::Rejected(Notice::Warning(
                "Question must not be empty.".to_string(),
            ));
        }

        self.conversation.push(ConversationTurn::user(question));
        self.updated_at = Utc::now();

        if self.chunks.is_empty() {
            self.conversation
                .push(ConversationTurn::assistant(NO_DOCUMENTS_WARNING));
            return TurnOutcome::NoDocuments {
                answer: NO_DOCUMENTS_WARNING.to_string(),
            };
        }

        let prompt = create_prompt(
            &self.chunks,
            &self.conversation,
            question,
            &engine.prompt_options,
            engine.counter.as_ref(),
        );
        info!(
            session = %self.id,
            used_chunks = prompt.used_chunks,
            total_chunks = self.chunks.len(),
            context_cost = prompt.context_cost,
            unit = engine.counter.unit(),
            "Assembled prompt"
        );

        match engine.provider.generate(&prompt.text).await {
            Ok(answer) => {
                self.conversation.push(ConversationTurn::assistant(answer.clone()));
                TurnOutcome::Answered {
                    answer,
                    used_chunks: prompt.used_chunks,
                }
            }
            Err(e) => {
                self.conversation.pop();
                warn!(session = %self.id, error = %e, "Completion failed");
                TurnOutcome::Failed(Notice::Error(format!(
                    "The assistant could not answer: {}",
                    e
                )))
            }
        }
    }
}
