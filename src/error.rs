//! Error handling for report parsing and study generation.
//!
//! Provides error types with context for malformed simulator reports,
//! incomplete study specifications, and the collaborator layers (file I/O,
//! table export, simulator invocation).

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StudyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Malformed report at line {line}: {reason}")]
    MalformedReport { line: usize, reason: String },

    #[error("Missing required field: {field}")]
    MissingRequiredField { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("Cannot classify report delimiter: {reason}")]
    UnrecognizedDelimiter { reason: String },

    #[error("Failed to load study definition from {path}: {reason}")]
    StudyLoad { path: PathBuf, reason: String },

    #[error("Simulator tool not found: {reason}")]
    ToolNotFound { reason: String },

    #[error("Simulator run failed: {reason}")]
    Simulator { reason: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl StudyError {
    /// Create a malformed report error for a 1-based line number
    pub fn malformed(line: usize, reason: impl Into<String>) -> Self {
        Self::MalformedReport {
            line,
            reason: reason.into(),
        }
    }

    /// Create a missing required field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingRequiredField {
            field: field.into(),
        }
    }

    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a study load error
    pub fn study_load(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::StudyLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn simulator(reason: impl Into<String>) -> Self {
        Self::Simulator {
            reason: reason.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, StudyError>;
