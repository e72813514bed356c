//! Record, verdict, trace and flow-graph type definitions.
//!
//! Records arrive from the record store as loosely-typed bags of optional
//! fields. Every gate score is modeled as `Option<f64>`: `None` means the gate
//! did not run for that record, which is never the same as failing it. Input
//! field names accept both snake_case and the store's camelCase spelling.

use serde::{Deserialize, Deserializer, Serialize};

use crate::labels::KnownStatus;

/// Numeric scores produced by the pipeline's filter gates.
///
/// # Examples
///
/// ```
/// use note_funnel_core::FilterScores;
///
/// let scores: FilterScores = serde_json::from_str(
///     r#"{"urlQuality": 0.8, "positive_claims": null}"#,
/// ).unwrap();
/// assert_eq!(scores.url_quality, Some(0.8));
/// assert_eq!(scores.positive_claims, None);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterScores {
    #[serde(
        default,
        alias = "verifiableFact",
        alias = "verifiableFactScore",
        skip_serializing_if = "Option::is_none"
    )]
    pub verifiable_fact: Option<f64>,
    #[serde(
        default,
        alias = "urlQuality",
        alias = "urlFilter",
        skip_serializing_if = "Option::is_none"
    )]
    pub url_quality: Option<f64>,
    #[serde(
        default,
        alias = "urlContent",
        alias = "urlContentFilter",
        skip_serializing_if = "Option::is_none"
    )]
    pub url_content: Option<f64>,
    #[serde(
        default,
        alias = "positiveClaims",
        alias = "positiveClaimsFilter",
        skip_serializing_if = "Option::is_none"
    )]
    pub positive_claims: Option<f64>,
    #[serde(
        default,
        alias = "significantCorrection",
        alias = "disagreementFilter",
        skip_serializing_if = "Option::is_none"
    )]
    pub significant_correction: Option<f64>,
    #[serde(
        default,
        alias = "helpfulnessPrediction",
        alias = "predictedHelpfulness",
        skip_serializing_if = "Option::is_none"
    )]
    pub helpfulness: Option<f64>,
    #[serde(
        default,
        alias = "platformAcceptance",
        alias = "platformScore",
        skip_serializing_if = "Option::is_none"
    )]
    pub platform_acceptance: Option<f64>,
}

impl FilterScores {
    /// Iterates every score slot with its field name, defined or not.
    pub fn named(&self) -> [(&'static str, Option<f64>); 7] {
        [
            ("verifiable_fact", self.verifiable_fact),
            ("url_quality", self.url_quality),
            ("url_content", self.url_content),
            ("positive_claims", self.positive_claims),
            ("significant_correction", self.significant_correction),
            ("helpfulness", self.helpfulness),
            ("platform_acceptance", self.platform_acceptance),
        ]
    }

    /// Number of gates that ran.
    pub fn defined_count(&self) -> usize {
        self.named().iter().filter(|(_, s)| s.is_some()).count()
    }
}

/// One evaluated content item.
///
/// # Examples
///
/// ```
/// use note_funnel_core::PipelineRunRecord;
///
/// let record: PipelineRunRecord = serde_json::from_str(r#"{
///     "id": "rec42",
///     "url": "https://example.com/status/1",
///     "fullResult": "Status: NO MISSING CONTEXT\nNote: fine",
///     "note": "fine",
///     "urlQuality": 0.7,
///     "wasPosted": 1
/// }"#).unwrap();
///
/// assert!(record.posted);
/// assert_eq!(record.scores.url_quality, Some(0.7));
/// assert!(record.full_result.is_some());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineRunRecord {
    /// Opaque identifier assigned by the record store.
    pub id: String,
    /// URL of the reviewed post.
    #[serde(default, alias = "postUrl", alias = "tweetUrl")]
    pub url: String,
    /// Raw model answer the verdict is extracted from.
    #[serde(
        default,
        alias = "fullResult",
        skip_serializing_if = "Option::is_none"
    )]
    pub full_result: Option<String>,
    /// Generated correction text.
    #[serde(
        default,
        alias = "noteText",
        alias = "correction",
        skip_serializing_if = "Option::is_none"
    )]
    pub note: Option<String>,
    #[serde(flatten)]
    pub scores: FilterScores,
    /// Whether the note was published. Accepts a boolean or a number.
    #[serde(
        default,
        alias = "wasPosted",
        deserialize_with = "deserialize_outcome_flag"
    )]
    pub posted: bool,
}

impl PipelineRunRecord {
    /// Creates an empty record with the given identifier.
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            ..Default::default()
        }
    }

    pub fn with_url(mut self, url: &str) -> Self {
        self.url = url.to_string();
        self
    }

    pub fn with_full_result(mut self, text: &str) -> Self {
        self.full_result = Some(text.to_string());
        self
    }

    pub fn with_note(mut self, note: &str) -> Self {
        self.note = Some(note.to_string());
        self
    }

    pub fn with_scores(mut self, scores: FilterScores) -> Self {
        self.scores = scores;
        self
    }

    /// Marks the record as published.
    pub fn mark_posted(mut self) -> Self {
        self.posted = true;
        self
    }

    /// Returns `true` when a non-blank note was generated.
    pub fn has_note(&self) -> bool {
        self.note.as_deref().is_some_and(|n| !n.trim().is_empty())
    }
}

fn deserialize_outcome_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OutcomeFlag {
        Bool(bool),
        Number(f64),
    }

    Ok(match Option::<OutcomeFlag>::deserialize(deserializer)? {
        Some(OutcomeFlag::Bool(flag)) => flag,
        Some(OutcomeFlag::Number(n)) => n != 0.0,
        None => false,
    })
}

/// Structured verdict extracted from a model's free-text answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    /// Status label, verbatim when not one of the known statuses.
    pub status: String,
    /// Correction body with embedded links removed.
    pub note: String,
    /// First URL found, or empty.
    pub url: String,
    /// Text preceding the status line; absent for legacy-format answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

impl Verdict {
    /// Classifies the status against the known set.
    ///
    /// # Examples
    ///
    /// ```
    /// use note_funnel_core::{KnownStatus, Verdict};
    ///
    /// let verdict = Verdict {
    ///     status: "NO MISSING CONTEXT".into(),
    ///     ..Default::default()
    /// };
    /// assert_eq!(verdict.known_status(), Some(KnownStatus::NoMissingContext));
    /// ```
    pub fn known_status(&self) -> Option<KnownStatus> {
        KnownStatus::from_label(&self.status)
    }

    pub fn has_url(&self) -> bool {
        !self.url.is_empty()
    }
}

/// One named step in a record's gate trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageOutcome {
    pub label: String,
    pub passed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
}

impl StageOutcome {
    /// A stage without a numeric score.
    pub fn check(label: &str, passed: bool) -> Self {
        Self {
            label: label.to_string(),
            passed,
            score: None,
            threshold: None,
        }
    }

    /// A stage decided by a score against a threshold.
    pub fn scored(label: &str, passed: bool, score: f64, threshold: Option<f64>) -> Self {
        Self {
            label: label.to_string(),
            passed,
            score: Some(score),
            threshold,
        }
    }
}

/// A record together with its full gate trace.
///
/// `failed_at` names the first stage (or status) at which the trace stopped
/// passing, `"No note generated"` when no note exists, or `"Unknown Reason"`
/// when every tracked gate passed but the record was not posted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub record: PipelineRunRecord,
    pub stages: Vec<StageOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<String>,
}

impl AnalysisResult {
    /// First stage in evaluation order that did not pass.
    pub fn first_failure(&self) -> Option<&StageOutcome> {
        self.stages.iter().find(|stage| !stage.passed)
    }

    /// Returns `true` when every recorded stage passed.
    pub fn passed_all(&self) -> bool {
        self.stages.iter().all(|stage| stage.passed)
    }

    pub fn stage(&self, label: &str) -> Option<&StageOutcome> {
        self.stages.iter().find(|stage| stage.label == label)
    }
}

/// Node of the funnel graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowNode {
    pub name: String,
}

/// Weighted directed edge between two nodes, referenced by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowLink {
    pub source: String,
    pub target: String,
    pub value: u64,
}

/// Funnel graph aggregated over a batch of traces.
///
/// # Examples
///
/// ```
/// use note_funnel_core::{FlowGraph, FlowLink, FlowNode};
///
/// let graph = FlowGraph {
///     nodes: vec![
///         FlowNode { name: "Start".into() },
///         FlowNode { name: "Note Generated".into() },
///     ],
///     links: vec![FlowLink {
///         source: "Start".into(),
///         target: "Note Generated".into(),
///         value: 3,
///     }],
/// };
/// assert_eq!(graph.link_value("Start", "Note Generated"), 3);
/// assert_eq!(graph.link_value("Start", "Posted"), 0);
/// assert_eq!(graph.position("Note Generated"), Some(1));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowGraph {
    pub nodes: Vec<FlowNode>,
    pub links: Vec<FlowLink>,
}

impl FlowGraph {
    /// Node names in layout order.
    pub fn node_names(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.name.as_str()).collect()
    }

    /// Position of a node in layout order.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.name == name)
    }

    /// Weight of the `source → target` edge, `0` when absent.
    pub fn link_value(&self, source: &str, target: &str) -> u64 {
        self.links
            .iter()
            .find(|l| l.source == source && l.target == target)
            .map_or(0, |l| l.value)
    }

    /// Sum of all edge weights leaving `source`.
    pub fn outflow(&self, source: &str) -> u64 {
        self.links
            .iter()
            .filter(|l| l.source == source)
            .map(|l| l.value)
            .sum()
    }
}

/// Number of records attributed to one failure label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureCount {
    pub label: String,
    pub count: usize,
}
