//! Error types for the diagnosis time pipeline.
//!
//! Per-record conditions that are not errors (no mention, no candidates,
//! nothing attached) are modelled as `None` / fallback, never as variants here.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiagnosisTimeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown extraction method '{0}' (expected 'parsing' or 'char_dist')")]
    InvalidMethod(String),

    #[error("Temporal tagger failed: {0}")]
    Tagger(String),

    #[error("Dependency parse unavailable: {0}")]
    ParseUnavailable(String),

    #[error("Malformed dependency tree: {0}")]
    MalformedTree(String),

    #[error("CoNLL-U parse error at line {line}: {message}")]
    Conllu { line: usize, message: String },

    #[error("Mention span {start}..{end} is not a single syntactic constituent")]
    NoConstituent { start: usize, end: usize },

    #[error("Record timed out after {0}s")]
    Timeout(u64),
}

pub type DiagnosisTimeResult<T> = Result<T, DiagnosisTimeError>;
