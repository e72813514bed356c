//! Note length evaluation under URL normalization.
//!
//! The platform counts every link at a fixed cost regardless of its length,
//! so a note is measured with each URL collapsed to [`LengthPolicy::url_cost`]
//! characters.

use serde::{Deserialize, Serialize};

use crate::text::URL_RE;

/// Character budget for one note.
pub const NOTE_CHARACTER_LIMIT: usize = 280;

/// Normalized cost of one URL.
///
/// Product documentation elsewhere describes a larger fixed cost per link;
/// the evaluator takes the cost from [`LengthPolicy`] so either value can be
/// configured.
pub const URL_CHARACTER_COST: usize = 1;

/// Budget and URL cost used by [`evaluate_length`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LengthPolicy {
    pub limit: usize,
    pub url_cost: usize,
}

impl Default for LengthPolicy {
    fn default() -> Self {
        Self {
            limit: NOTE_CHARACTER_LIMIT,
            url_cost: URL_CHARACTER_COST,
        }
    }
}

/// Result of measuring one note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LengthEvaluation {
    pub valid: bool,
    pub character_count: usize,
    pub limit: usize,
    pub reasoning: String,
}

/// Measures `text` against `policy`.
///
/// Every URL match adds `policy.url_cost`; every other character adds 1.
/// The count saturates at `usize::MAX`.
///
/// # Examples
///
/// ```
/// use note_funnel_analysis::length::{LengthPolicy, evaluate_length};
///
/// let eval = evaluate_length(
///     "hello https://example.com/very/long/path world",
///     &LengthPolicy::default(),
/// );
/// assert_eq!(eval.character_count, 13);
/// assert!(eval.valid);
///
/// let short_links = LengthPolicy { limit: 280, url_cost: 23 };
/// let eval = evaluate_length("see https://example.com", &short_links);
/// assert_eq!(eval.character_count, 27);
/// ```
pub fn evaluate_length(text: &str, policy: &LengthPolicy) -> LengthEvaluation {
    let mut count: usize = 0;
    let mut cursor = 0;
    for url in URL_RE.find_iter(text) {
        count = count
            .saturating_add(text[cursor..url.start()].chars().count())
            .saturating_add(policy.url_cost);
        cursor = url.end();
    }
    count = count.saturating_add(text[cursor..].chars().count());

    let valid = count <= policy.limit;
    let reasoning = if valid {
        format!(
            "Note is {count} characters, within the {} character limit.",
            policy.limit
        )
    } else {
        format!(
            "Note is {count} characters, exceeding the {} character limit by {}.",
            policy.limit,
            count - policy.limit
        )
    };

    LengthEvaluation {
        valid,
        character_count: count,
        limit: policy.limit,
        reasoning,
    }
}

/// [`evaluate_length`] with the default policy.
pub fn evaluate_note_length(text: &str) -> LengthEvaluation {
    evaluate_length(text, &LengthPolicy::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_counts_as_fixed_cost() {
        let eval = evaluate_note_length("hello https://example.com/very/long/path world");
        assert_eq!(eval.character_count, 13);
        assert!(eval.valid);
        assert_eq!(eval.limit, 280);
    }

    #[test]
    fn test_empty_text() {
        let eval = evaluate_note_length("");
        assert_eq!(eval.character_count, 0);
        assert!(eval.valid);
    }

    #[test]
    fn test_adjacent_urls_each_cost_once() {
        // Whitespace separates the matches; each link is one unit.
        let eval = evaluate_note_length("https://a.example https://b.example");
        assert_eq!(eval.character_count, 3);
    }

    #[test]
    fn test_exactly_at_limit_is_valid() {
        let text = "a".repeat(280);
        let eval = evaluate_note_length(&text);
        assert!(eval.valid);
        assert_eq!(eval.character_count, 280);
    }

    #[test]
    fn test_over_limit_reports_overage() {
        let text = "a".repeat(285);
        let eval = evaluate_note_length(&text);
        assert!(!eval.valid);
        assert_eq!(eval.character_count, 285);
        assert!(eval.reasoning.contains("285"), "{}", eval.reasoning);
        assert!(eval.reasoning.contains("by 5"), "{}", eval.reasoning);
    }

    #[test]
    fn test_long_url_does_not_push_note_over_limit() {
        let text = format!("{} https://example.com/{}", "a".repeat(270), "p".repeat(200));
        let eval = evaluate_note_length(&text);
        assert_eq!(eval.character_count, 272);
        assert!(eval.valid);
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        let eval = evaluate_note_length("héllo wörld");
        assert_eq!(eval.character_count, 11);
    }

    #[test]
    fn test_custom_policy() {
        let policy = LengthPolicy {
            limit: 10,
            url_cost: 23,
        };
        let eval = evaluate_length("x https://t.co/abc", &policy);
        assert_eq!(eval.character_count, 25);
        assert!(!eval.valid);
        assert_eq!(eval.limit, 10);
    }

    #[test]
    fn test_huge_url_cost_saturates() {
        let policy = LengthPolicy {
            limit: 280,
            url_cost: usize::MAX,
        };
        let eval = evaluate_length("https://a.example https://b.example", &policy);
        assert_eq!(eval.character_count, usize::MAX);
        assert!(!eval.valid);
        assert!(eval.reasoning.contains("exceeding"), "{}", eval.reasoning);
    }
}
