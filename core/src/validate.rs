//! Boundary validation for incoming records.
//!
//! The analyzer assumes every defined score is a finite number and that
//! record identifiers are usable as keys. These checks run where records
//! enter the system (the loader, or any caller building records by hand)
//! rather than inside the analyzer, which is total over well-formed input.
//!
//! # Examples
//!
//! ```
//! use note_funnel_core::*;
//!
//! let good = PipelineRunRecord::new("rec-1");
//! assert!(validate_record(&good).is_empty());
//!
//! let bad = PipelineRunRecord::new("rec-2").with_scores(FilterScores {
//!     url_quality: Some(f64::NAN),
//!     ..Default::default()
//! });
//! assert_eq!(
//!     validate_record(&bad),
//!     vec![RecordValidationError::NonFiniteScore {
//!         id: "rec-2".into(),
//!         field: "url_quality",
//!     }]
//! );
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::PipelineRunRecord;

/// Record validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordValidationError {
    /// Record identifier is empty or whitespace-only.
    #[error("record id cannot be empty")]
    EmptyId,
    /// A defined score is NaN or infinite.
    #[error("record {id}: score `{field}` is not a finite number")]
    NonFiniteScore { id: String, field: &'static str },
    /// Two records in the same batch share an identifier.
    #[error("duplicate record id in batch: {0}")]
    DuplicateId(String),
}

/// Validates a single record.
pub fn validate_record(record: &PipelineRunRecord) -> Vec<RecordValidationError> {
    let mut errors = Vec::new();

    if record.id.trim().is_empty() {
        errors.push(RecordValidationError::EmptyId);
        return errors;
    }

    for (field, score) in record.scores.named() {
        if score.is_some_and(|s| !s.is_finite()) {
            errors.push(RecordValidationError::NonFiniteScore {
                id: record.id.clone(),
                field,
            });
        }
    }

    errors
}

/// Validates a batch: every record individually, then identifier uniqueness.
///
/// Stops at the first record with errors, like schema package validation.
///
/// # Examples
///
/// ```
/// use note_funnel_core::*;
///
/// let batch = vec![PipelineRunRecord::new("a"), PipelineRunRecord::new("a")];
/// assert_eq!(
///     validate_batch(&batch),
///     vec![RecordValidationError::DuplicateId("a".into())]
/// );
/// ```
pub fn validate_batch(records: &[PipelineRunRecord]) -> Vec<RecordValidationError> {
    let mut errors = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for record in records {
        errors.extend(validate_record(record));
        if !errors.is_empty() {
            return errors;
        }
        if !seen.insert(record.id.as_str()) {
            errors.push(RecordValidationError::DuplicateId(record.id.clone()));
            return errors;
        }
    }

    errors
}
