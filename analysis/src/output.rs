//! Output formatting for analysis responses and verdicts.

use note_funnel_core::Verdict;

use crate::report::AnalysisResponse;

/// Supported output formats.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum OutputFormat {
    Json,
    Yaml,
    Markdown,
    Table,
}

/// Formats an analysis response in the requested output format.
pub fn format_response(
    response: &AnalysisResponse,
    format: OutputFormat,
) -> Result<String, String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(response)
            .map_err(|e| format!("JSON serialization failed: {e}")),
        OutputFormat::Yaml => {
            serde_yaml::to_string(response).map_err(|e| format!("YAML serialization failed: {e}"))
        }
        OutputFormat::Markdown => Ok(response_to_markdown(response)),
        OutputFormat::Table => Ok(response_to_table(response)),
    }
}

/// Formats an extracted verdict in the requested output format.
pub fn format_verdict(verdict: &Verdict, format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(verdict)
            .map_err(|e| format!("JSON serialization failed: {e}")),
        OutputFormat::Yaml => {
            serde_yaml::to_string(verdict).map_err(|e| format!("YAML serialization failed: {e}"))
        }
        OutputFormat::Markdown => Ok(verdict_to_markdown(verdict)),
        OutputFormat::Table => Ok(verdict_to_table(verdict)),
    }
}

fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 * 100.0 / total as f64
    }
}

fn response_to_markdown(response: &AnalysisResponse) -> String {
    let mut out = String::new();

    out.push_str("# Pipeline Funnel\n\n");
    if let Some(ref generated_at) = response.generated_at {
        out.push_str(&format!("**Generated:** {generated_at}\n\n"));
    }
    out.push_str(&format!("**Records analyzed:** {}\n\n", response.total));
    out.push_str(&format!(
        "**Posted:** {} ({:.0}%)  **Passed all tracked filters:** {}  **Failed:** {}\n\n",
        response.summary.posted,
        percent(response.summary.posted, response.total),
        response.summary.passed_all,
        response.summary.failed
    ));

    if !response.failure_breakdown.is_empty() {
        out.push_str("## Failure Breakdown\n\n");
        out.push_str("| Failed At | Count | Share |\n");
        out.push_str("|-----------|-------|-------|\n");
        for entry in &response.failure_breakdown {
            out.push_str(&format!(
                "| {} | {} | {:.0}% |\n",
                entry.label,
                entry.count,
                percent(entry.count, response.total)
            ));
        }
        out.push('\n');
    }

    if !response.flow.links.is_empty() {
        out.push_str("## Flow\n\n");
        out.push_str("| Source | Target | Count |\n");
        out.push_str("|--------|--------|-------|\n");
        for link in &response.flow.links {
            out.push_str(&format!(
                "| {} | {} | {} |\n",
                link.source, link.target, link.value
            ));
        }
        out.push('\n');
    }

    out
}

fn response_to_table(response: &AnalysisResponse) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "Records: {}  Posted: {}  Passed all: {}  Failed: {}\n",
        response.total,
        response.summary.posted,
        response.summary.passed_all,
        response.summary.failed
    ));

    if !response.failure_breakdown.is_empty() {
        let width = response
            .failure_breakdown
            .iter()
            .map(|entry| entry.label.len())
            .max()
            .unwrap_or(0);
        out.push_str("\nFailed at:\n");
        for entry in &response.failure_breakdown {
            out.push_str(&format!(
                "  {:<width$}  {:>6}  {:>5.1}%\n",
                entry.label,
                entry.count,
                percent(entry.count, response.total)
            ));
        }
    }

    if !response.flow.links.is_empty() {
        out.push_str("\nFlow:\n");
        for link in &response.flow.links {
            out.push_str(&format!(
                "  {} -> {}  {}\n",
                link.source, link.target, link.value
            ));
        }
    }

    out
}

fn verdict_to_markdown(verdict: &Verdict) -> String {
    let mut out = String::new();
    out.push_str(&format!("**Status:** {}\n\n", verdict.status));
    if !verdict.note.is_empty() {
        out.push_str(&format!("{}\n\n", verdict.note));
    }
    if verdict.has_url() {
        out.push_str(&format!("**Source:** <{}>\n\n", verdict.url));
    }
    if let Some(ref reasoning) = verdict.reasoning {
        if !reasoning.is_empty() {
            out.push_str(&format!("**Reasoning:** {reasoning}\n\n"));
        }
    }
    out
}

fn verdict_to_table(verdict: &Verdict) -> String {
    let mut out = String::new();
    out.push_str(&format!("Status:    {}\n", verdict.status));
    out.push_str(&format!("Note:      {}\n", verdict.note));
    out.push_str(&format!("URL:       {}\n", verdict.url));
    if let Some(ref reasoning) = verdict.reasoning {
        out.push_str(&format!("Reasoning: {reasoning}\n"));
    }
    out
}
