//! Response payload for one analysis run.

use serde::{Deserialize, Serialize};

use note_funnel_core::{AnalysisResult, FailureCount, FlowGraph};

/// Outcome counts across a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    /// Records whose outcome flag says they were published.
    pub posted: usize,
    /// Records whose every recorded stage passed.
    pub passed_all: usize,
    /// Records with a failure attribution.
    pub failed: usize,
}

impl AnalysisSummary {
    pub fn from_results(results: &[AnalysisResult]) -> Self {
        let mut summary = Self::default();
        for result in results {
            if result.record.posted {
                summary.posted += 1;
            }
            if result.passed_all() {
                summary.passed_all += 1;
            }
            if result.failed_at.is_some() {
                summary.failed += 1;
            }
        }
        summary
    }
}

/// Everything a diagram renderer needs for one batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    /// RFC 3339 timestamp, set by the caller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
    /// Number of records analyzed.
    pub total: usize,
    pub summary: AnalysisSummary,
    pub results: Vec<AnalysisResult>,
    pub flow: FlowGraph,
    pub failure_breakdown: Vec<FailureCount>,
}

#[cfg(test)]
mod tests {
    use note_funnel_core::{PipelineRunRecord, StageOutcome};

    use super::*;

    fn result(posted: bool, passed: bool, failed_at: Option<&str>) -> AnalysisResult {
        let mut record = PipelineRunRecord::new("r");
        record.posted = posted;
        AnalysisResult {
            record,
            stages: vec![StageOutcome::check("Note Generated", passed)],
            failed_at: failed_at.map(String::from),
        }
    }

    #[test]
    fn test_summary_counts() {
        let results = vec![
            result(true, true, None),
            result(false, true, Some("Unknown Reason")),
            result(false, false, Some("No note generated")),
        ];
        let summary = AnalysisSummary::from_results(&results);
        assert_eq!(
            summary,
            AnalysisSummary {
                posted: 1,
                passed_all: 2,
                failed: 2,
            }
        );
    }

    #[test]
    fn test_response_omits_missing_timestamp() {
        let response = AnalysisResponse {
            generated_at: None,
            total: 0,
            summary: AnalysisSummary::default(),
            results: Vec::new(),
            flow: FlowGraph::default(),
            failure_breakdown: Vec::new(),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("generated_at"));
        assert!(json.contains("\"total\":0"));
        assert!(json.contains("\"failure_breakdown\":[]"));
    }
}
