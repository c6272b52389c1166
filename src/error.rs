//! Typed errors for the extraction, embedding, and search layers.
//!
//! Orchestration code (ingestion, CLI, server) wraps these in
//! [`anyhow::Error`]; the enums exist so callers and tests can match on the
//! failure kind where it matters.

use thiserror::Error;

/// Failure to turn a file into text. Never escapes [`crate::extract::extract`];
/// the pipeline logs it and treats the file as empty.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF extraction failed: {0}")]
    Pdf(String),

    #[error("DOCX extraction failed: {0}")]
    Docx(String),
}

/// Failure of an embedding call.
#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("remote embedding backend requires a credential in ${0}")]
    MissingCredentials(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("embedding API error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),

    #[error("embedding count mismatch: sent {expected} texts, got {got} vectors")]
    CountMismatch { expected: usize, got: usize },
}

/// Hard rejections at the search boundary. Everything else degrades to an
/// empty result set.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("query must not be empty")]
    EmptyQuery,
}
