//! Canonical stage, status and flow-node labels.
//!
//! Every label the stage evaluator can emit for a known gate is defined here,
//! together with [`NODE_PRIORITY`], the funnel-order table used to lay out
//! flow-graph nodes. When a new gate is added to the pipeline its label (and
//! its `Failed: …` pseudo-label) must be added to the table, otherwise it is
//! placed after the known labels.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Virtual node every trace starts from.
pub const START: &str = "Start";

pub const VERIFIABLE_FACT_FILTER: &str = "Verifiable Fact Filter";
pub const NOTE_GENERATED: &str = "Note Generated";
pub const UNKNOWN_STATUS: &str = "Unknown Status";
pub const URL_QUALITY_FILTER: &str = "URL Quality Filter";
pub const URL_CONTENT_FILTER: &str = "URL Content Filter";
pub const POSITIVE_CLAIMS_FILTER: &str = "Positive Claims Filter";
pub const SIGNIFICANT_CORRECTION_FILTER: &str = "Significant Correction Filter";
pub const HELPFULNESS_PREDICTION: &str = "Helpfulness Prediction";
pub const PLATFORM_ACCEPTANCE_SCORE: &str = "Platform Acceptance Score";

/// Failure attribution for a record whose [`NOTE_GENERATED`] stage failed.
pub const NO_NOTE_GENERATED: &str = "No note generated";

/// Catch-all attribution for a record that passed every tracked gate but was
/// never posted.
pub const UNKNOWN_REASON: &str = "Unknown Reason";

pub const POSTED: &str = "Posted";
pub const PASSED_ALL_TRACKED_FILTERS: &str = "Passed All Tracked Filters";

/// Prefix of failure pseudo-nodes in the flow graph.
pub const FAILED_PREFIX: &str = "Failed: ";

/// Status text recognized by the extractor.
///
/// Model output is free text, so any status outside this set is carried
/// through verbatim; this enum only names the values the funnel knows how to
/// place.
///
/// # Examples
///
/// ```
/// use note_funnel_core::KnownStatus;
///
/// let status = KnownStatus::from_label("correction with trustworthy citation");
/// assert_eq!(status, Some(KnownStatus::CorrectionWithTrustworthyCitation));
/// assert!(status.unwrap().is_qualifying());
/// assert_eq!(KnownStatus::from_label("MAYBE?"), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KnownStatus {
    /// The only status that lets a run continue into the downstream filters.
    CorrectionWithTrustworthyCitation,
    CorrectionWithoutTrustworthyCitation,
    NoMissingContext,
}

impl KnownStatus {
    pub const ALL: [KnownStatus; 3] = [
        KnownStatus::CorrectionWithTrustworthyCitation,
        KnownStatus::CorrectionWithoutTrustworthyCitation,
        KnownStatus::NoMissingContext,
    ];

    /// Returns the canonical upper-case label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CorrectionWithTrustworthyCitation => "CORRECTION WITH TRUSTWORTHY CITATION",
            Self::CorrectionWithoutTrustworthyCitation => {
                "CORRECTION WITHOUT TRUSTWORTHY CITATION"
            }
            Self::NoMissingContext => "NO MISSING CONTEXT",
        }
    }

    /// Matches a status label case-insensitively, ignoring surrounding
    /// whitespace.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(label))
    }

    pub fn is_qualifying(self) -> bool {
        self == Self::CorrectionWithTrustworthyCitation
    }
}

impl fmt::Display for KnownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status value that admits a run into the downstream filter stages.
pub const QUALIFYING_STATUS: &str = "CORRECTION WITH TRUSTWORTHY CITATION";

/// Builds the failure pseudo-label for a stage.
///
/// # Examples
///
/// ```
/// use note_funnel_core::labels::failure_label;
///
/// assert_eq!(failure_label("URL Quality Filter"), "Failed: URL Quality Filter");
/// ```
pub fn failure_label(stage: &str) -> String {
    format!("{FAILED_PREFIX}{stage}")
}

/// Returns `true` for `Failed: …` pseudo-labels.
pub fn is_failure_label(label: &str) -> bool {
    label.starts_with(FAILED_PREFIX)
}

/// Node names owned by the funnel itself: the start, every gate stage other
/// than the status outcome, and the terminals.
pub const STRUCTURAL_LABELS: &[&str] = &[
    START,
    VERIFIABLE_FACT_FILTER,
    NOTE_GENERATED,
    URL_QUALITY_FILTER,
    URL_CONTENT_FILTER,
    POSITIVE_CLAIMS_FILTER,
    SIGNIFICANT_CORRECTION_FILTER,
    HELPFULNESS_PREDICTION,
    PLATFORM_ACCEPTANCE_SCORE,
    POSTED,
    PASSED_ALL_TRACKED_FILTERS,
];

/// Returns `true` when `label` names a structural node or a `Failed: …`
/// pseudo-node, so it cannot double as a status outcome.
///
/// # Examples
///
/// ```
/// use note_funnel_core::labels::is_reserved_label;
///
/// assert!(is_reserved_label("Start"));
/// assert!(is_reserved_label("Failed: anything"));
/// assert!(!is_reserved_label("NO MISSING CONTEXT"));
/// assert!(!is_reserved_label("start"));
/// ```
pub fn is_reserved_label(label: &str) -> bool {
    STRUCTURAL_LABELS.contains(&label) || is_failure_label(label)
}

/// Non-terminal nodes in funnel order: start, gatekeepers, status outcomes,
/// filters, then the known failure pseudo-nodes grouped together.
///
/// Terminal nodes are listed separately in [`TERMINAL_PRIORITY`] because
/// unrecognized failure labels are placed between the two tables.
pub const NODE_PRIORITY: &[&str] = &[
    START,
    VERIFIABLE_FACT_FILTER,
    NOTE_GENERATED,
    "CORRECTION WITH TRUSTWORTHY CITATION",
    "CORRECTION WITHOUT TRUSTWORTHY CITATION",
    "NO MISSING CONTEXT",
    UNKNOWN_STATUS,
    URL_QUALITY_FILTER,
    URL_CONTENT_FILTER,
    POSITIVE_CLAIMS_FILTER,
    SIGNIFICANT_CORRECTION_FILTER,
    HELPFULNESS_PREDICTION,
    PLATFORM_ACCEPTANCE_SCORE,
    "Failed: Verifiable Fact Filter",
    "Failed: Note Generated",
    "Failed: CORRECTION WITHOUT TRUSTWORTHY CITATION",
    "Failed: NO MISSING CONTEXT",
    "Failed: Unknown Status",
    "Failed: URL Quality Filter",
    "Failed: URL Content Filter",
    "Failed: Positive Claims Filter",
    "Failed: Significant Correction Filter",
    "Failed: Platform Acceptance Score",
];

/// Terminal nodes, always laid out last among known labels.
pub const TERMINAL_PRIORITY: &[&str] = &[POSTED, PASSED_ALL_TRACKED_FILTERS];
