//! Funnel aggregation over stage traces.
//!
//! Each [`AnalysisResult`] contributes a path of edges starting at the
//! virtual `Start` node. Edge weights are counted per exact
//! `(source, target)` pair in an [`EdgeCounts`] map built for the call, and
//! the final [`FlowGraph`] lays its nodes out by the funnel priority table in
//! [`note_funnel_core::labels`].

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use note_funnel_core::labels::{
    NODE_PRIORITY, PASSED_ALL_TRACKED_FILTERS, POSTED, START, TERMINAL_PRIORITY, failure_label,
    is_failure_label,
};
use note_funnel_core::{AnalysisResult, FailureCount, FlowGraph, FlowLink, FlowNode};
use rayon::prelude::*;

/// Multiset of `(source, target)` transitions.
///
/// Shards built over disjoint parts of a batch combine with
/// [`EdgeCounts::merge`]; summing per key is commutative and associative, so
/// merge order never changes the result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeCounts {
    counts: BTreeMap<(String, String), u64>,
}

impl EdgeCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one `source → target` transition.
    pub fn add(&mut self, source: &str, target: &str) {
        *self
            .counts
            .entry((source.to_string(), target.to_string()))
            .or_insert(0) += 1;
    }

    /// Counts every transition of one trace.
    pub fn add_trace(&mut self, result: &AnalysisResult) {
        for (source, target) in trace_edges(result) {
            self.add(&source, &target);
        }
    }

    /// Sums two shards.
    pub fn merge(mut self, other: EdgeCounts) -> EdgeCounts {
        for (key, value) in other.counts {
            *self.counts.entry(key).or_insert(0) += value;
        }
        self
    }

    /// Weight of one transition, `0` when never seen.
    pub fn get(&self, source: &str, target: &str) -> u64 {
        self.counts
            .get(&(source.to_string(), target.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// Number of distinct transitions.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Lays the counts out as a graph. `Start` is always present.
    pub fn into_graph(self) -> FlowGraph {
        let mut labels: BTreeSet<&str> = BTreeSet::new();
        labels.insert(START);
        for (source, target) in self.counts.keys() {
            labels.insert(source.as_str());
            labels.insert(target.as_str());
        }

        let ordered = order_nodes(labels);
        let positions: HashMap<&str, usize> = ordered
            .iter()
            .enumerate()
            .map(|(index, label)| (label.as_str(), index))
            .collect();

        let mut links: Vec<FlowLink> = self
            .counts
            .iter()
            .map(|((source, target), value)| FlowLink {
                source: source.clone(),
                target: target.clone(),
                value: *value,
            })
            .collect();
        links.sort_by_key(|link| {
            (
                positions.get(link.source.as_str()).copied(),
                positions.get(link.target.as_str()).copied(),
            )
        });

        FlowGraph {
            nodes: ordered.into_iter().map(|name| FlowNode { name }).collect(),
            links,
        }
    }
}

/// Synthesizes the edge path of one trace.
///
/// The path runs from `Start` through each passing stage. The first failing
/// stage is entered and then exits to its `Failed: …` node, ending the path.
/// A path with no failing stage ends at `Posted` or
/// `Passed All Tracked Filters` depending on the record's outcome.
///
/// # Examples
///
/// ```
/// use note_funnel_analysis::flow::trace_edges;
/// use note_funnel_core::{AnalysisResult, PipelineRunRecord, StageOutcome};
///
/// let result = AnalysisResult {
///     record: PipelineRunRecord::new("r"),
///     stages: vec![
///         StageOutcome::check("Note Generated", true),
///         StageOutcome::check("NO MISSING CONTEXT", false),
///     ],
///     failed_at: Some("NO MISSING CONTEXT".into()),
/// };
///
/// let edges = trace_edges(&result);
/// assert_eq!(edges, vec![
///     ("Start".to_string(), "Note Generated".to_string()),
///     ("Note Generated".to_string(), "NO MISSING CONTEXT".to_string()),
///     ("NO MISSING CONTEXT".to_string(), "Failed: NO MISSING CONTEXT".to_string()),
/// ]);
/// ```
pub fn trace_edges(result: &AnalysisResult) -> Vec<(String, String)> {
    let mut edges = Vec::with_capacity(result.stages.len() + 1);
    let mut previous = START.to_string();

    for stage in &result.stages {
        edges.push((previous, stage.label.clone()));
        if !stage.passed {
            edges.push((stage.label.clone(), failure_label(&stage.label)));
            return edges;
        }
        previous = stage.label.clone();
    }

    let terminal = if result.record.posted {
        POSTED
    } else {
        PASSED_ALL_TRACKED_FILTERS
    };
    edges.push((previous, terminal.to_string()));
    edges
}

/// Aggregates a batch of traces into a funnel graph.
///
/// An empty batch yields a graph with only the `Start` node.
pub fn build_flow_graph(results: &[AnalysisResult]) -> FlowGraph {
    let mut counts = EdgeCounts::new();
    for result in results {
        counts.add_trace(result);
    }
    counts.into_graph()
}

/// [`build_flow_graph`] with per-thread shards merged at the end.
///
/// Produces exactly the same graph as the sequential version.
pub fn build_flow_graph_parallel(results: &[AnalysisResult]) -> FlowGraph {
    results
        .par_iter()
        .fold(EdgeCounts::new, |mut counts, result| {
            counts.add_trace(result);
            counts
        })
        .reduce(EdgeCounts::new, EdgeCounts::merge)
        .into_graph()
}

/// Orders node labels for presentation.
///
/// Known labels follow [`NODE_PRIORITY`]; unrecognized `Failed: …` labels
/// come next in alphabetical order, then the terminal nodes, then every other
/// unrecognized label alphabetically. The result depends only on the set of
/// labels given, not on their order or multiplicity.
///
/// # Examples
///
/// ```
/// use note_funnel_analysis::flow::order_nodes;
///
/// let ordered = order_nodes(["Posted", "Zeta", "Failed: Custom", "Start", "Note Generated"]);
/// assert_eq!(ordered, vec!["Start", "Note Generated", "Failed: Custom", "Posted", "Zeta"]);
/// ```
pub fn order_nodes<I, S>(labels: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let unique: BTreeSet<String> = labels
        .into_iter()
        .map(|label| label.as_ref().to_string())
        .collect();
    let mut ordered: Vec<String> = unique.into_iter().collect();
    ordered.sort_by(|a, b| compare_nodes(a, b));
    ordered
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum NodeGroup {
    Known,
    UnknownFailure,
    Terminal,
    Other,
}

fn node_rank(label: &str) -> (NodeGroup, usize) {
    if let Some(index) = NODE_PRIORITY.iter().position(|known| *known == label) {
        (NodeGroup::Known, index)
    } else if let Some(index) = TERMINAL_PRIORITY.iter().position(|known| *known == label) {
        (NodeGroup::Terminal, index)
    } else if is_failure_label(label) {
        (NodeGroup::UnknownFailure, 0)
    } else {
        (NodeGroup::Other, 0)
    }
}

fn compare_nodes(a: &str, b: &str) -> Ordering {
    node_rank(a).cmp(&node_rank(b)).then_with(|| a.cmp(b))
}

/// Counts failure attributions across a batch.
///
/// Sorted by count descending; equal counts are ordered by label. Records
/// without a failure attribution are not counted.
pub fn failure_breakdown(results: &[AnalysisResult]) -> Vec<FailureCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for failed_at in results.iter().filter_map(|r| r.failed_at.as_deref()) {
        *counts.entry(failed_at).or_insert(0) += 1;
    }

    let mut breakdown: Vec<FailureCount> = counts
        .into_iter()
        .map(|(label, count)| FailureCount {
            label: label.to_string(),
            count,
        })
        .collect();
    // Stable: ties keep the BTreeMap's alphabetical order.
    breakdown.sort_by(|a, b| b.count.cmp(&a.count));
    breakdown
}
