//! Pipeline outcome analysis.
//!
//! This crate turns a batch of [`PipelineRunRecord`]s into a funnel view of
//! where runs of the content-review pipeline were rejected. Its pieces, in
//! data-flow order:
//!
//! - [`verdict::extract_verdict`]: structured status / note / url /
//!   reasoning from a model's free-text answer.
//! - [`length::evaluate_length`]: note length with URLs counted at a fixed
//!   cost.
//! - [`stages::evaluate_record`]: the ordered gate trace of one record and
//!   its failure attribution.
//! - [`flow::build_flow_graph`] and [`flow::failure_breakdown`]: the
//!   weighted funnel graph and failure counts for a batch.
//!
//! [`analyze_records`] runs the whole chain and returns an
//! [`AnalysisResponse`]. Everything here is pure: no I/O, no shared state.
//!
//! # Example
//!
//! ```
//! use note_funnel_analysis::{AnalysisOptions, analyze_records};
//! use note_funnel_core::{FilterScores, PipelineRunRecord};
//!
//! let records = vec![
//!     PipelineRunRecord::new("a"),
//!     PipelineRunRecord::new("b")
//!         .with_note("Flooding began on May 4.")
//!         .with_full_result("NO MISSING CONTEXT\n\nThe post is accurate."),
//!     PipelineRunRecord::new("c").with_scores(FilterScores {
//!         verifiable_fact: Some(0.2),
//!         ..Default::default()
//!     }),
//! ];
//!
//! let response = analyze_records(&records, &AnalysisOptions::default());
//! assert_eq!(response.total, 3);
//! assert_eq!(response.flow.link_value("Start", "Note Generated"), 2);
//! assert_eq!(response.failure_breakdown.len(), 3);
//! ```
//!
//! [`PipelineRunRecord`]: note_funnel_core::PipelineRunRecord

pub mod error;
pub mod flow;
pub mod length;
pub mod output;
pub mod report;
pub mod stages;
mod text;
pub mod verdict;

use note_funnel_core::{AnalysisResult, PipelineRunRecord};
use rayon::prelude::*;
use tracing::{info, warn};

pub use error::ParseError;
pub use report::{AnalysisResponse, AnalysisSummary};
pub use stages::EvaluationPolicy;

/// Settings for one [`analyze_records`] call.
#[derive(Debug, Clone, Default)]
pub struct AnalysisOptions {
    pub policy: EvaluationPolicy,
    /// Analyze at most this many records, taken from the front of the batch.
    pub limit: Option<usize>,
    /// Worker threads for stage evaluation (default: rayon's global pool).
    pub jobs: Option<usize>,
}

/// Evaluates every record, in parallel, preserving input order.
pub fn evaluate_batch(
    records: &[PipelineRunRecord],
    policy: &EvaluationPolicy,
    jobs: Option<usize>,
) -> Vec<AnalysisResult> {
    let evaluate = || -> Vec<AnalysisResult> {
        records
            .par_iter()
            .map(|record| stages::evaluate_record(record, policy))
            .collect()
    };

    match jobs.filter(|jobs| *jobs > 0) {
        Some(jobs) => match rayon::ThreadPoolBuilder::new().num_threads(jobs).build() {
            Ok(pool) => pool.install(evaluate),
            Err(err) => {
                warn!(error = %err, "failed to build thread pool, using global pool");
                evaluate()
            }
        },
        None => evaluate(),
    }
}

/// Analyzes a batch of records end to end.
///
/// Applies the batch cap, evaluates each record, then aggregates the traces
/// into the funnel graph and failure breakdown. `generated_at` is left unset
/// for the caller to fill.
pub fn analyze_records(
    records: &[PipelineRunRecord],
    options: &AnalysisOptions,
) -> AnalysisResponse {
    let batch = match options.limit {
        Some(limit) if limit < records.len() => &records[..limit],
        _ => records,
    };

    let results = evaluate_batch(batch, &options.policy, options.jobs);
    let flow = flow::build_flow_graph(&results);
    let failure_breakdown = flow::failure_breakdown(&results);
    let summary = AnalysisSummary::from_results(&results);

    info!(
        total = results.len(),
        posted = summary.posted,
        failed = summary.failed,
        nodes = flow.nodes.len(),
        links = flow.links.len(),
        "analyzed batch"
    );

    AnalysisResponse {
        generated_at: None,
        total: results.len(),
        summary,
        results,
        flow,
        failure_breakdown,
    }
}
