use std::sync::LazyLock;

use regex::Regex;

use crate::numeral::parse_count;

/// Digit run with space/NBSP grouping; never crosses a line break.
const COUNT: &str = r"(?P<count>[0-9][0-9 \u{00A0}]*)";

const AVAILABLE_KEYWORD: &str = r"(?:dostępn\w*|available|wolny\w*|wolne|free)";

#[derive(Debug)]
pub struct Pattern {
    pub label: &'static str,
    regex: Regex,
}

impl Pattern {
    fn new(label: &'static str, source: &str) -> Self {
        let regex = Regex::new(source)
            .unwrap_or_else(|err| panic!("compile pattern {label}: {err}"));
        Self { label, regex }
    }

    /// Parsed count of the first match in `text`.
    pub fn find(&self, text: &str) -> Option<Match> {
        let captures = self.regex.captures(text)?;
        let count = parse_count(captures.name("count").map(|m| m.as_str()))?;
        Some(Match {
            label: self.label,
            count,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub label: &'static str,
    pub count: u64,
}

pub static SOLD_PATTERNS: LazyLock<Vec<Pattern>> = LazyLock::new(|| {
    vec![
        Pattern::new(
            "sold-tickets",
            &format!(r"(?i)\b(?:sprzedane\s+bilety|sold\s+tickets)\s*:\s*{COUNT}"),
        ),
        Pattern::new(
            "number-sold",
            &format!(
                r"(?i)\b(?:liczba\s+sprzedanych(?:\s+bilet(?:ów|ow))?|number\s+(?:of\s+tickets\s+)?sold)\s*:\s*{COUNT}"
            ),
        ),
        Pattern::new(
            "sold-n-tickets",
            &format!(r"(?i)\b(?:sprzedano|sold)\s+{COUNT}\s*(?:bilet(?:ów|ow|y)?|tickets?)\b"),
        ),
    ]
});

/// Keyword-first phrasing is tried before count-first so that
/// "available: 45" never picks up a number printed ahead of it.
pub static AVAILABLE_PATTERNS: LazyLock<Vec<Pattern>> = LazyLock::new(|| {
    vec![
        Pattern::new(
            "keyword-count",
            &format!(r"(?i)\b{AVAILABLE_KEYWORD}[^0-9]*\b{COUNT}"),
        ),
        Pattern::new(
            "count-keyword",
            &format!(r"(?i)\b{COUNT}\s*(?:miejsc\w*\s+|seats?\s+)?{AVAILABLE_KEYWORD}"),
        ),
    ]
});

pub static GLOBAL_AVAILABLE: LazyLock<Pattern> = LazyLock::new(|| {
    Pattern::new(
        "global-available",
        &format!(r"(?i)\b(?:dostępne|available)\s*:\s*{COUNT}"),
    )
});

fn first_match(patterns: &[Pattern], text: &str) -> Option<Match> {
    patterns.iter().find_map(|pattern| pattern.find(text))
}

/// Sold ticket count from a whole-page text blob.
pub fn find_sold(text: &str) -> Option<Match> {
    first_match(&SOLD_PATTERNS, text)
}

/// Available/free count from a single element's text.
pub fn find_available(text: &str) -> Option<Match> {
    first_match(&AVAILABLE_PATTERNS, text)
}

/// Whole-page "Available: N" fallback.
pub fn find_global_available(text: &str) -> Option<Match> {
    GLOBAL_AVAILABLE.find(text)
}
