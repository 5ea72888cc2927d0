//! Text extraction from uploaded files.
//!
//! One upload batch always has a single declared [`FileKind`]. Every file in
//! the batch is converted to text and the results are concatenated into one
//! blob. A file that fails to parse never aborts the batch: it is replaced by
//! an inline error line and reported in [`Extraction::warnings`].

pub mod pdf;
pub mod table;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("{0}")]
    Pdf(String),

    #[error("{0}")]
    Csv(#[from] csv::Error),

    #[error("No columns to parse from file")]
    NoColumns,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Pdf,
    Csv,
}

impl FileKind {
    pub fn extension(&self) -> &'static str {
        match self {
            FileKind::Pdf => "pdf",
            FileKind::Csv => "csv",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FileKind::Pdf => "PDF",
            FileKind::Csv => "CSV",
        }
    }

    /// True when the filename carries this kind's extension (any case).
    pub fn matches_filename(&self, filename: &str) -> bool {
        Path::new(filename)
            .extension()
            .and_then(|s| s.to_str())
            .map(|ext| ext.eq_ignore_ascii_case(self.extension()))
            .unwrap_or(false)
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FileKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pdf" => Ok(FileKind::Pdf),
            "csv" => Ok(FileKind::Csv),
            _ => Err(format!("Unknown file type: {}", s)),
        }
    }
}

/// How CSV files are turned into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CsvMode {
    /// Whole table as aligned plain text
    Table,
    /// Shape and column names followed by a markdown sample of the first rows
    Summary,
}

impl FromStr for CsvMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "table" => Ok(CsvMode::Table),
            "summary" => Ok(CsvMode::Summary),
            _ => Err(format!("Unknown CSV mode: {}", s)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub text: String,
    /// One entry per file that could not be read
    pub warnings: Vec<String>,
}

impl Extraction {
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Convert a batch of files of one declared kind into a single text blob.
pub fn extract_text(kind: FileKind, files: &[UploadedFile], csv_mode: CsvMode) -> Extraction {
    let mut extraction = Extraction::default();

    match kind {
        FileKind::Pdf => {
            for file in files {
                match pdf::pdf_text(&file.bytes) {
                    Ok(text) => {
                        debug!(file = %file.name, chars = text.len(), "Extracted PDF text");
                        extraction.text.push_str(&text);
                    }
                    Err(e) => {
                        let message = format!("Error reading PDF {}: {}", file.name, e);
                        warn!(file = %file.name, error = %e, "PDF extraction failed");
                        extraction.text.push_str(&message);
                        extraction.text.push('\n');
                        extraction.warnings.push(message);
                    }
                }
            }
        }
        FileKind::Csv => {
            let mut parts = Vec::with_capacity(files.len());
            for file in files {
                let rendered = table::parse_csv(&file.bytes).map(|t| match csv_mode {
                    CsvMode::Table => t.render_plain(),
                    CsvMode::Summary => t.render_summary(&file.name),
                });
                match rendered {
                    Ok(text) => parts.push(text),
                    Err(e) => {
                        let message = format!("Error reading CSV {}: {}", file.name, e);
                        warn!(file = %file.name, error = %e, "CSV extraction failed");
                        parts.push(message.clone());
                        extraction.warnings.push(message);
                    }
                }
            }
            extraction.text = parts.join("\n\n");
        }
    }

    extraction
}
