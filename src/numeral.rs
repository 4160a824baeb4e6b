use std::sync::LazyLock;

use regex::Regex;

static DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9][0-9 \u{00A0}]*").expect("compile digit run pattern"));

/// Parses the first digit run in `text`, treating ASCII spaces and
/// non-breaking spaces as digit grouping (`"12 345"` → `12345`).
///
/// Returns `None` for absent input, text without digits, or values that do
/// not fit in a `u64`.
#[must_use]
pub fn parse_count(text: Option<&str>) -> Option<u64> {
    let run = DIGIT_RUN.find(text?)?;
    let digits = run
        .as_str()
        .chars()
        .filter(char::is_ascii_digit)
        .collect::<String>();
    digits.parse().ok()
}
