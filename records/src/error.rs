//! Error types for record loading and configuration.
//!
//! Provides a unified error type covering all failure modes: I/O,
//! serialization, boundary validation, and empty inputs.

use note_funnel_core::RecordValidationError;
use thiserror::Error;

/// Errors that can occur while loading records or configuration.
#[derive(Debug, Error)]
pub enum RecordsError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// A loaded record failed boundary validation.
    #[error("invalid record: {0}")]
    InvalidRecord(#[from] RecordValidationError),

    /// Configuration values out of range.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// File extension is neither JSON nor YAML.
    #[error("unsupported record file: {0}")]
    UnsupportedFormat(String),

    /// A directory contained no record files.
    #[error("no record files found in {0}")]
    NoRecordFiles(String),
}

/// Convenience alias for results with [`RecordsError`].
pub type Result<T> = std::result::Result<T, RecordsError>;
