//! Core types for pipeline outcome analysis.
//!
//! This crate defines the data model shared by the analyzer, the record
//! loader and the CLI:
//!
//! - [`PipelineRunRecord`]: one evaluated content item with its sparse
//!   [`FilterScores`] and final outcome.
//! - [`Verdict`]: the structured status / note / url / reasoning extracted
//!   from a model's free-text answer.
//! - [`StageOutcome`] and [`AnalysisResult`]: the ordered gate trace for one
//!   record and the first stage at which it stopped passing.
//! - [`FlowGraph`]: the weighted funnel graph aggregated over a batch.
//!
//! Canonical stage names and the node priority table live in [`labels`].
//! Boundary checks on incoming records ([`validate_record`],
//! [`validate_batch`]) catch non-finite scores and missing identifiers before
//! they reach the analyzer.
//!
//! # Example
//!
//! ```
//! use note_funnel_core::*;
//!
//! let record = PipelineRunRecord::new("rec-1")
//!     .with_note("The post misstates the flood date.")
//!     .with_scores(FilterScores {
//!         url_quality: Some(0.9),
//!         ..Default::default()
//!     });
//!
//! assert!(record.has_note());
//! assert_eq!(record.scores.url_quality, Some(0.9));
//! assert!(record.scores.positive_claims.is_none());
//! assert!(validate_record(&record).is_empty());
//! ```

pub mod labels;
mod types;
mod validate;

pub use labels::KnownStatus;
pub use types::*;
pub use validate::{RecordValidationError, validate_batch, validate_record};
