//! Per-record stage evaluation.
//!
//! Replays the gates a record passed through and attributes the first
//! failure. Evaluation runs in two phases:
//!
//! - **Gatekeepers** (verifiable-fact filter, note generation, status):
//!   short-circuit. A failure here terminates the trace, since later gates
//!   have nothing to act on.
//! - **Filters** (URL quality, URL content, positive claims, significant
//!   correction, helpfulness, platform acceptance): only reached by the
//!   qualifying status. The first failure is attributed, but every filter
//!   with a score is still recorded.
//!
//! Scores that are absent mean the gate never ran and produce no stage.

use serde::{Deserialize, Serialize};

use note_funnel_core::labels::{
    HELPFULNESS_PREDICTION, NO_NOTE_GENERATED, NOTE_GENERATED, PLATFORM_ACCEPTANCE_SCORE,
    POSITIVE_CLAIMS_FILTER, QUALIFYING_STATUS, SIGNIFICANT_CORRECTION_FILTER, UNKNOWN_REASON,
    UNKNOWN_STATUS, URL_CONTENT_FILTER, URL_QUALITY_FILTER, VERIFIABLE_FACT_FILTER,
    is_reserved_label,
};
use note_funnel_core::{AnalysisResult, FilterScores, PipelineRunRecord, StageOutcome};
use tracing::debug;

use crate::verdict::extract_verdict;

/// Default threshold a filter score must exceed.
pub const DEFAULT_PASS_THRESHOLD: f64 = 0.5;

/// Default minimum platform acceptance score (inclusive).
pub const DEFAULT_PLATFORM_ACCEPTANCE_FLOOR: f64 = -0.5;

/// Thresholds and the qualifying status used by [`evaluate_record`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationPolicy {
    /// Filter scores must be strictly greater than this to pass.
    pub pass_threshold: f64,
    /// Platform acceptance scores pass at or above this floor.
    pub platform_acceptance_floor: f64,
    /// The status that admits a record into the filter phase.
    pub qualifying_status: String,
}

impl Default for EvaluationPolicy {
    fn default() -> Self {
        Self {
            pass_threshold: DEFAULT_PASS_THRESHOLD,
            platform_acceptance_floor: DEFAULT_PLATFORM_ACCEPTANCE_FLOOR,
            qualifying_status: QUALIFYING_STATUS.to_string(),
        }
    }
}

/// How a score decides a stage.
#[derive(Debug, Clone, Copy)]
enum Gate {
    /// Pass iff score > threshold.
    Above(f64),
    /// Pass iff score >= floor.
    AtLeast(f64),
    /// Always passes; recorded for visibility only.
    Informational,
}

impl Gate {
    fn passes(self, score: f64) -> bool {
        match self {
            Gate::Above(threshold) => score > threshold,
            Gate::AtLeast(floor) => score >= floor,
            Gate::Informational => true,
        }
    }

    fn threshold(self) -> Option<f64> {
        match self {
            Gate::Above(threshold) | Gate::AtLeast(threshold) => Some(threshold),
            Gate::Informational => None,
        }
    }

    fn outcome(self, label: &str, score: f64) -> StageOutcome {
        StageOutcome::scored(label, self.passes(score), score, self.threshold())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TraceState {
    Evaluating,
    Terminated,
}

/// Accumulates stage outcomes for one record.
#[derive(Debug)]
struct StageTrace {
    stages: Vec<StageOutcome>,
    failed_at: Option<String>,
    state: TraceState,
}

impl StageTrace {
    fn new() -> Self {
        Self {
            stages: Vec::new(),
            failed_at: None,
            state: TraceState::Evaluating,
        }
    }

    fn is_evaluating(&self) -> bool {
        self.state == TraceState::Evaluating
    }

    /// Records a gatekeeper stage; a failure terminates the trace with
    /// `attribution` as the failure label.
    fn gate(&mut self, outcome: StageOutcome, attribution: &str) {
        let passed = outcome.passed;
        self.stages.push(outcome);
        if !passed {
            self.failed_at = Some(attribution.to_string());
            self.state = TraceState::Terminated;
        }
    }

    /// Records a filter stage; the first failure is attributed but the trace
    /// keeps evaluating.
    fn record(&mut self, outcome: StageOutcome) {
        if !outcome.passed && self.failed_at.is_none() {
            self.failed_at = Some(outcome.label.clone());
        }
        self.stages.push(outcome);
    }

    fn finish(mut self, record: PipelineRunRecord, posted: bool) -> AnalysisResult {
        if self.is_evaluating() && self.failed_at.is_none() && !posted {
            self.failed_at = Some(UNKNOWN_REASON.to_string());
        }
        AnalysisResult {
            record,
            stages: self.stages,
            failed_at: self.failed_at,
        }
    }
}

/// Evaluates one record into its stage trace.
///
/// Never fails: absent scores skip their stage and an unreadable model
/// answer yields an `"Unknown Status"` failing stage.
///
/// # Examples
///
/// ```
/// use note_funnel_analysis::stages::{EvaluationPolicy, evaluate_record};
/// use note_funnel_core::{FilterScores, PipelineRunRecord};
///
/// let record = PipelineRunRecord::new("rec-1")
///     .with_note("Flooding began on May 4.")
///     .with_full_result(
///         "Status: CORRECTION WITH TRUSTWORTHY CITATION\nNote: Flooding began on May 4.",
///     )
///     .with_scores(FilterScores {
///         positive_claims: Some(0.3),
///         helpfulness: Some(0.1),
///         ..Default::default()
///     });
///
/// let result = evaluate_record(&record, &EvaluationPolicy::default());
/// assert_eq!(result.failed_at.as_deref(), Some("Positive Claims Filter"));
/// assert!(result.stage("Helpfulness Prediction").unwrap().passed);
/// ```
pub fn evaluate_record(record: &PipelineRunRecord, policy: &EvaluationPolicy) -> AnalysisResult {
    let mut trace = StageTrace::new();

    run_gatekeepers(&mut trace, record, policy);
    if trace.is_evaluating() {
        run_filters(&mut trace, &record.scores, policy);
    }

    let result = trace.finish(record.clone(), record.posted);
    debug!(
        id = %record.id,
        stages = result.stages.len(),
        failed_at = result.failed_at.as_deref().unwrap_or("-"),
        "evaluated record"
    );
    result
}

fn run_gatekeepers(trace: &mut StageTrace, record: &PipelineRunRecord, policy: &EvaluationPolicy) {
    if let Some(score) = record.scores.verifiable_fact {
        let outcome = Gate::Above(policy.pass_threshold).outcome(VERIFIABLE_FACT_FILTER, score);
        trace.gate(outcome, VERIFIABLE_FACT_FILTER);
        if !trace.is_evaluating() {
            return;
        }
    }

    trace.gate(
        StageOutcome::check(NOTE_GENERATED, record.has_note()),
        NO_NOTE_GENERATED,
    );
    if !trace.is_evaluating() {
        return;
    }

    let status = record
        .full_result
        .as_deref()
        .and_then(|text| match extract_verdict(text) {
            Ok(verdict) => Some(verdict.status),
            Err(err) => {
                debug!(id = %record.id, error = %err, "no verdict in full result");
                None
            }
        })
        .filter(|status| !status.is_empty())
        .filter(|status| {
            let reserved = is_reserved_label(status);
            if reserved {
                debug!(id = %record.id, status = %status, "status collides with a funnel node");
            }
            !reserved
        });

    match status {
        Some(status) => {
            let passed = status == policy.qualifying_status;
            trace.gate(StageOutcome::check(&status, passed), &status);
        }
        None => trace.gate(StageOutcome::check(UNKNOWN_STATUS, false), UNKNOWN_STATUS),
    }
}

fn run_filters(trace: &mut StageTrace, scores: &FilterScores, policy: &EvaluationPolicy) {
    let filter = Gate::Above(policy.pass_threshold);
    let filters = [
        (URL_QUALITY_FILTER, scores.url_quality, filter),
        (URL_CONTENT_FILTER, scores.url_content, filter),
        (POSITIVE_CLAIMS_FILTER, scores.positive_claims, filter),
        (SIGNIFICANT_CORRECTION_FILTER, scores.significant_correction, filter),
        (HELPFULNESS_PREDICTION, scores.helpfulness, Gate::Informational),
        (
            PLATFORM_ACCEPTANCE_SCORE,
            scores.platform_acceptance,
            Gate::AtLeast(policy.platform_acceptance_floor),
        ),
    ];

    for (label, score, gate) in filters {
        if let Some(score) = score {
            trace.record(gate.outcome(label, score));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUALIFYING_ANSWER: &str = "Status: CORRECTION WITH TRUSTWORTHY CITATION\n\
                                     Note: The date is wrong. https://example.org/a";

    fn qualifying(scores: FilterScores) -> PipelineRunRecord {
        PipelineRunRecord::new("q")
            .with_note("The date is wrong.")
            .with_full_result(QUALIFYING_ANSWER)
            .with_scores(scores)
    }

    fn labels(result: &AnalysisResult) -> Vec<&str> {
        result.stages.iter().map(|s| s.label.as_str()).collect()
    }

    fn evaluate(record: &PipelineRunRecord) -> AnalysisResult {
        evaluate_record(record, &EvaluationPolicy::default())
    }

    #[test]
    fn test_failing_fact_filter_short_circuits() {
        let record = PipelineRunRecord::new("r")
            .with_note("note")
            .with_full_result(QUALIFYING_ANSWER)
            .with_scores(FilterScores {
                verifiable_fact: Some(0.3),
                url_quality: Some(0.9),
                ..Default::default()
            });

        let result = evaluate(&record);
        assert_eq!(result.stages.len(), 1);
        assert_eq!(result.stages[0].label, VERIFIABLE_FACT_FILTER);
        assert_eq!(result.stages[0].score, Some(0.3));
        assert_eq!(result.stages[0].threshold, Some(0.5));
        assert_eq!(result.failed_at.as_deref(), Some(VERIFIABLE_FACT_FILTER));
    }

    #[test]
    fn test_fact_filter_at_threshold_fails() {
        let record = PipelineRunRecord::new("r").with_scores(FilterScores {
            verifiable_fact: Some(0.5),
            ..Default::default()
        });
        let result = evaluate(&record);
        assert_eq!(result.failed_at.as_deref(), Some(VERIFIABLE_FACT_FILTER));
    }

    #[test]
    fn test_missing_note_stops_before_status() {
        let record = PipelineRunRecord::new("r")
            .with_note("   ")
            .with_full_result(QUALIFYING_ANSWER);

        let result = evaluate(&record);
        assert_eq!(labels(&result), vec![NOTE_GENERATED]);
        assert!(!result.stages[0].passed);
        assert_eq!(result.failed_at.as_deref(), Some(NO_NOTE_GENERATED));
    }

    #[test]
    fn test_passing_fact_filter_then_missing_note() {
        let record = PipelineRunRecord::new("r").with_scores(FilterScores {
            verifiable_fact: Some(0.8),
            ..Default::default()
        });
        let result = evaluate(&record);
        assert_eq!(labels(&result), vec![VERIFIABLE_FACT_FILTER, NOTE_GENERATED]);
        assert_eq!(result.failed_at.as_deref(), Some(NO_NOTE_GENERATED));
    }

    #[test]
    fn test_non_qualifying_status_skips_filters() {
        let record = PipelineRunRecord::new("r")
            .with_note("n")
            .with_full_result("NO MISSING CONTEXT\n\nThe post is accurate.")
            .with_scores(FilterScores {
                url_quality: Some(0.1),
                ..Default::default()
            });

        let result = evaluate(&record);
        assert_eq!(labels(&result), vec![NOTE_GENERATED, "NO MISSING CONTEXT"]);
        assert!(!result.stages[1].passed);
        assert_eq!(result.failed_at.as_deref(), Some("NO MISSING CONTEXT"));
    }

    #[test]
    fn test_free_text_status_is_kept_verbatim() {
        let record = PipelineRunRecord::new("r")
            .with_note("n")
            .with_full_result("Status: Needs more research\nNote: unclear");
        let result = evaluate(&record);
        assert_eq!(result.failed_at.as_deref(), Some("Needs more research"));
    }

    #[test]
    fn test_missing_full_result_is_unknown_status() {
        let record = PipelineRunRecord::new("r").with_note("n");
        let result = evaluate(&record);
        assert_eq!(labels(&result), vec![NOTE_GENERATED, UNKNOWN_STATUS]);
        assert_eq!(result.failed_at.as_deref(), Some(UNKNOWN_STATUS));
    }

    #[test]
    fn test_blank_full_result_is_unknown_status() {
        let record = PipelineRunRecord::new("r")
            .with_note("n")
            .with_full_result(" \n ");
        let result = evaluate(&record);
        assert_eq!(result.failed_at.as_deref(), Some(UNKNOWN_STATUS));
    }

    #[test]
    fn test_status_naming_a_funnel_node_is_unknown_status() {
        for answer in ["Start\nThe post is fine.", "Posted", "Failed: Note Generated\nx"] {
            let record = PipelineRunRecord::new("r")
                .with_note("n")
                .with_full_result(answer);
            let result = evaluate(&record);
            assert_eq!(labels(&result), vec![NOTE_GENERATED, UNKNOWN_STATUS], "{answer}");
            assert_eq!(result.failed_at.as_deref(), Some(UNKNOWN_STATUS), "{answer}");
        }
    }

    #[test]
    fn test_positive_claims_failure_with_informational_helpfulness() {
        let record = qualifying(FilterScores {
            positive_claims: Some(0.3),
            helpfulness: Some(0.05),
            ..Default::default()
        });

        let result = evaluate(&record);
        assert_eq!(result.failed_at.as_deref(), Some(POSITIVE_CLAIMS_FILTER));
        let helpfulness = result.stage(HELPFULNESS_PREDICTION).unwrap();
        assert!(helpfulness.passed);
        assert_eq!(helpfulness.threshold, None);
    }

    #[test]
    fn test_filters_keep_recording_after_first_failure() {
        let record = qualifying(FilterScores {
            url_quality: Some(0.2),
            url_content: Some(0.9),
            positive_claims: Some(0.1),
            significant_correction: Some(0.7),
            helpfulness: Some(0.4),
            platform_acceptance: Some(-0.9),
            ..Default::default()
        });

        let result = evaluate(&record);
        assert_eq!(
            labels(&result),
            vec![
                NOTE_GENERATED,
                QUALIFYING_STATUS,
                URL_QUALITY_FILTER,
                URL_CONTENT_FILTER,
                POSITIVE_CLAIMS_FILTER,
                SIGNIFICANT_CORRECTION_FILTER,
                HELPFULNESS_PREDICTION,
                PLATFORM_ACCEPTANCE_SCORE,
            ]
        );
        assert_eq!(result.failed_at.as_deref(), Some(URL_QUALITY_FILTER));
        assert!(!result.stage(PLATFORM_ACCEPTANCE_SCORE).unwrap().passed);
    }

    #[test]
    fn test_platform_acceptance_floor_is_inclusive() {
        let at_floor = evaluate(&qualifying(FilterScores {
            platform_acceptance: Some(-0.5),
            ..Default::default()
        }));
        let stage = at_floor.stage(PLATFORM_ACCEPTANCE_SCORE).unwrap();
        assert!(stage.passed);
        assert_eq!(stage.threshold, Some(-0.5));

        let below = evaluate(&qualifying(FilterScores {
            platform_acceptance: Some(-0.51),
            ..Default::default()
        }));
        assert_eq!(below.failed_at.as_deref(), Some(PLATFORM_ACCEPTANCE_SCORE));
    }

    #[test]
    fn test_all_passed_but_not_posted_is_unknown_reason() {
        let result = evaluate(&qualifying(FilterScores {
            url_quality: Some(0.9),
            ..Default::default()
        }));
        assert!(result.passed_all());
        assert_eq!(result.failed_at.as_deref(), Some(UNKNOWN_REASON));
    }

    #[test]
    fn test_all_passed_and_posted_has_no_failure() {
        let record = qualifying(FilterScores {
            url_quality: Some(0.9),
            platform_acceptance: Some(0.2),
            ..Default::default()
        })
        .mark_posted();
        let result = evaluate(&record);
        assert!(result.passed_all());
        assert_eq!(result.failed_at, None);
    }

    #[test]
    fn test_posted_record_with_failed_filter_keeps_attribution() {
        let record = qualifying(FilterScores {
            url_content: Some(0.1),
            ..Default::default()
        })
        .mark_posted();
        let result = evaluate(&record);
        assert_eq!(result.failed_at.as_deref(), Some(URL_CONTENT_FILTER));
    }

    #[test]
    fn test_custom_policy_thresholds() {
        let policy = EvaluationPolicy {
            pass_threshold: 0.2,
            platform_acceptance_floor: 0.0,
            qualifying_status: "APPROVED".into(),
        };
        let record = PipelineRunRecord::new("r")
            .with_note("n")
            .with_full_result("Status: APPROVED\nNote: n")
            .with_scores(FilterScores {
                url_quality: Some(0.3),
                platform_acceptance: Some(-0.1),
                ..Default::default()
            });
        let result = evaluate_record(&record, &policy);
        assert!(result.stage(URL_QUALITY_FILTER).unwrap().passed);
        assert_eq!(result.failed_at.as_deref(), Some(PLATFORM_ACCEPTANCE_SCORE));
    }

    #[test]
    fn test_record_is_carried_unchanged() {
        let record = qualifying(FilterScores::default()).with_url("https://example.com/p/1");
        let result = evaluate(&record);
        assert_eq!(result.record, record);
    }
}
