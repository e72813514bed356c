//! Shared text patterns.

use regex::Regex;
use std::sync::LazyLock;

// SAFETY: These regexes are compile-time constants and are validated by tests.
pub(crate) static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+").expect("static regex must compile"));

/// Converts `\r\n` and lone `\r` line endings to `\n`.
pub(crate) fn normalize_line_endings(raw: &str) -> String {
    raw.replace("\r\n", "\n").replace('\r', "\n")
}
