//! Error type for verdict extraction.

use thiserror::Error;

/// The only way verdict extraction can fail.
///
/// Every non-blank input produces a verdict, falling back to the legacy
/// line heuristic when the labeled format does not match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Input was empty or whitespace-only.
    #[error("ParseError: empty content")]
    EmptyContent,
}
