//! Verdict extraction from free-text model answers.
//!
//! Two answer shapes are recognized, tried in order:
//!
//! 1. **Labeled**: a `Status: …` line plus a `Note: …` block running to the
//!    end of the answer (or up to the status line, when the note comes
//!    first). Anything before both labels is the model's reasoning.
//! 2. **Legacy**: the first non-empty line is the status, the first line
//!    carrying a URL supplies the link, and every other line is the note.
//!
//! Extraction never fails on malformed text; only blank input is rejected.

use regex::Regex;
use std::sync::LazyLock;

use note_funnel_core::Verdict;
use tracing::debug;

use crate::error::ParseError;
use crate::text::{URL_RE, normalize_line_endings};

// SAFETY: These regexes are compile-time constants and are validated by tests.
static STATUS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[ \t]*status:[ \t]*(\S.*?)[ \t]*$").expect("static regex must compile")
});
static NOTE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?ims)^[ \t]*note:(.*)\z").expect("static regex must compile"));
static REASONING_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\[?reasoning\]?:?\s*").expect("static regex must compile")
});

/// Extracts a [`Verdict`] from a model answer.
///
/// # Errors
///
/// Returns [`ParseError::EmptyContent`] when `text` is empty or
/// whitespace-only.
///
/// # Examples
///
/// ```
/// use note_funnel_analysis::verdict::extract_verdict;
///
/// let answer = "\
/// [Reasoning]: The post gives the wrong date.
/// Status: CORRECTION WITH TRUSTWORTHY CITATION
/// Note: Flooding began on May 4, not May 14. https://weather.gov/flooding
/// ";
///
/// let verdict = extract_verdict(answer).unwrap();
/// assert_eq!(verdict.status, "CORRECTION WITH TRUSTWORTHY CITATION");
/// assert_eq!(verdict.url, "https://weather.gov/flooding");
/// assert_eq!(verdict.note, "Flooding began on May 4, not May 14.");
/// assert_eq!(verdict.reasoning.as_deref(), Some("The post gives the wrong date."));
///
/// assert!(extract_verdict("   ").is_err());
/// ```
pub fn extract_verdict(text: &str) -> Result<Verdict, ParseError> {
    if text.trim().is_empty() {
        return Err(ParseError::EmptyContent);
    }

    let normalized = normalize_line_endings(text);
    if let Some(verdict) = parse_labeled(&normalized) {
        debug!(status = %verdict.status, "extracted labeled verdict");
        return Ok(verdict);
    }

    let verdict = parse_legacy(&normalized);
    debug!(status = %verdict.status, "extracted legacy verdict");
    Ok(verdict)
}

fn parse_labeled(text: &str) -> Option<Verdict> {
    let status_caps = STATUS_RE.captures(text)?;
    let status_line = status_caps.get(0)?;
    let status = status_caps.get(1)?.as_str().trim().to_string();

    // A note after the status runs to the end of the answer. A note written
    // before the status stops at the status line.
    let after = &text[status_line.end()..];
    let before = &text[..status_line.start()];
    let (block, preamble_end) = match NOTE_RE.captures(after) {
        Some(caps) => (caps.get(1)?.as_str(), status_line.start()),
        None => {
            let caps = NOTE_RE.captures(before)?;
            (caps.get(1)?.as_str(), caps.get(0)?.start())
        }
    };

    let url = URL_RE
        .find(block)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();
    let note = URL_RE.replace_all(block, "").trim().to_string();

    let preamble = text[..preamble_end].trim();
    let reasoning = REASONING_TAG_RE.replace(preamble, "").trim().to_string();

    Some(Verdict {
        status,
        note,
        url,
        reasoning: Some(reasoning),
    })
}

fn parse_legacy(text: &str) -> Verdict {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let status = lines.first().copied().unwrap_or_default().to_string();

    let url_hit = lines
        .iter()
        .enumerate()
        .find_map(|(index, line)| URL_RE.find(line).map(|m| (index, m.as_str())));
    let url_index = url_hit.map(|(index, _)| index);
    let url = url_hit.map(|(_, url)| url.to_string()).unwrap_or_default();

    let note = lines
        .iter()
        .enumerate()
        .filter(|(index, _)| *index != 0 && Some(*index) != url_index)
        .map(|(_, line)| *line)
        .collect::<Vec<_>>()
        .join(" ");

    Verdict {
        status,
        note,
        url,
        reasoning: None,
    }
}
