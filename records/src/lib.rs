//! Record batch loading and analyzer configuration.
//!
//! This crate is the I/O boundary of the analyzer: it reads exported pipeline
//! run records from JSON or YAML files and validates them, and it loads the
//! YAML configuration that carries gate thresholds and the note length budget.
//!
//! # Quick start
//!
//! ```no_run
//! use note_funnel_records::{AnalyzerConfig, RecordBatch};
//!
//! // Load every record file in a directory, in file-name order
//! let batch = RecordBatch::from_path("exports/").unwrap();
//! println!("{} records", batch.len());
//!
//! // Thresholds and limits
//! let config = AnalyzerConfig::load("note-funnel.yml").unwrap();
//! assert!(config.length.limit > 0);
//! ```

mod config;
mod error;
mod loader;

pub use config::{
    AnalyzerConfig, BatchConfig, EvaluationConfig, LengthConfig, MAX_LENGTH_LIMIT, MAX_URL_COST,
};
pub use error::{RecordsError, Result};
pub use loader::{RecordBatch, RecordSource};
