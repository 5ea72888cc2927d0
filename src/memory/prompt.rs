// src/memory/prompt.rs
// Context selection + prompt assembly for the completion service

use crate::extract::FileKind;
use crate::memory::conversation::ConversationTurn;
use crate::memory::tokens::{CharCounter, TiktokenCounter, TokenCounter, TokenizerError};
use std::str::FromStr;
use std::sync::Arc;

const ANSWER_PREAMBLE: &str = "You are a helpful assistant. Use the following context to answer the question below. If the answer is not in the context, say \"Answer is not available in the context.\"";

const PDF_SUMMARY_PREAMBLE: &str = "You are a helpful assistant. Summarize the following document excerpt. Structure the summary as:\n1. Main topic\n2. Key points (as a short bullet list)\n3. Conclusions or takeaways";

const CSV_SUMMARY_PREAMBLE: &str = "You are a helpful data analyst. Summarize the following dataset description. Structure the summary as:\n1. What the dataset describes\n2. Key columns and what they contain\n3. Notable patterns, ranges or values";

/// Unit the context budget is measured in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetUnit {
    Chars,
    Tokens,
}

impl BudgetUnit {
    pub fn counter(&self) -> Result<Arc<dyn TokenCounter>, TokenizerError> {
        Ok(match self {
            BudgetUnit::Chars => Arc::new(CharCounter),
            BudgetUnit::Tokens => Arc::new(TiktokenCounter::cl100k()?),
        })
    }
}

impl FromStr for BudgetUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "chars" | "characters" => Ok(BudgetUnit::Chars),
            "tokens" => Ok(BudgetUnit::Tokens),
            _ => Err(format!("Unknown budget unit: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryWindow {
    Full,
    Last(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptOptions {
    pub max_context_budget: usize,
    pub history_window: HistoryWindow,
}

impl Default for PromptOptions {
    fn default() -> Self {
        Self {
            max_context_budget: 3000,
            history_window: HistoryWindow::Last(4),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextSelection {
    pub text: String,
    pub used_chunks: usize,
    pub cost: usize,
}

#[derive(Debug, Clone)]
pub struct AssembledPrompt {
    pub text: String,
    pub used_chunks: usize,
    pub context_cost: usize,
}

/// Greedy prefix selection: take chunks in order until the next one would
/// push the running cost over `budget`. Chunks are never truncated.
pub fn select_context<S: AsRef<str>>(
    chunks: &[S],
    budget: usize,
    counter: &dyn TokenCounter,
) -> ContextSelection {
    let mut text = String::new();
    let mut cost = 0;
    let mut used_chunks = 0;

    for chunk in chunks {
        let chunk = chunk.as_ref();
        let chunk_cost = counter.count(chunk);
        if cost + chunk_cost > budget {
            break;
        }
        text.push_str(chunk);
        text.push('\n');
        cost += chunk_cost;
        used_chunks += 1;
    }

    ContextSelection {
        text,
        used_chunks,
        cost,
    }
}

pub fn format_history(turns: &[ConversationTurn], window: HistoryWindow) -> String {
    let visible = match window {
        HistoryWindow::Full => turns,
        HistoryWindow::Last(n) => &turns[turns.len().saturating_sub(n)..],
    };

    let mut history = String::new();
    for turn in visible {
        history.push_str(turn.role.label());
        history.push_str(": ");
        history.push_str(&turn.content);
        history.push('\n');
    }
    history
}

pub fn create_prompt<S: AsRef<str>>(
    chunks: &[S],
    conversation: &[ConversationTurn],
    question: &str,
    options: &PromptOptions,
    counter: &dyn TokenCounter,
) -> AssembledPrompt {
    let context = select_context(chunks, options.max_context_budget, counter);
    let history = format_history(conversation, options.history_window);

    let text = format!(
        "\n{ANSWER_PREAMBLE}\n\nContext:\n{}\n\nConversation History:\n{}\n\nCurrent Question:\n{}\n\nAnswer:\n",
        context.text, history, question
    );

    AssembledPrompt {
        text,
        used_chunks: context.used_chunks,
        context_cost: context.cost,
    }
}

/// One-shot summarisation prompt over the first `prefix_chars` characters.
pub fn create_summary_prompt(text: &str, kind: FileKind, prefix_chars: usize) -> String {
    let preamble = match kind {
        FileKind::Pdf => PDF_SUMMARY_PREAMBLE,
        FileKind::Csv => CSV_SUMMARY_PREAMBLE,
    };
    let excerpt = truncate_chars(text, prefix_chars);
    format!("{preamble}\n\nContent:\n{excerpt}\n\nSummary:\n")
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
