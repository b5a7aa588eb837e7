//! Season resolution from free text.
//!
//! A season is an integer year. An explicit 4-digit year in the question
//! wins; phrases like "this year" or "ytd" resolve to the current calendar
//! year, which is also the default when the question names no year at all.
//! The resolved season governs which source tables are legal downstream
//! (see the question-aware linter).

use chrono::Datelike;
use once_cell::sync::Lazy;
use regex::Regex;

/// Matches any plausible season year (1800s through 2000s).
pub static YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(18|19|20)\d{2}\b").expect("year regex"));

static CURRENT_SEASON_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(this\s+year|this\s+season|current\s+season|ytd|year\s+to\s+date)\b")
        .expect("current-season regex")
});

/// Extract the first explicit year mentioned in the text.
pub fn extract_year(text: &str) -> Option<i32> {
    YEAR_RE
        .find(text)
        .and_then(|m| m.as_str().parse::<i32>().ok())
}

/// Calendar context the pipeline resolves seasons against.
///
/// Constructed once per process; tests pin `current_year` to a fixed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeasonContext {
    pub current_year: i32,
}

impl SeasonContext {
    pub fn new(current_year: i32) -> Self {
        Self { current_year }
    }

    /// Context for today's date.
    pub fn from_today() -> Self {
        Self {
            current_year: chrono::Utc::now().year(),
        }
    }

    /// Resolve the season a question refers to.
    ///
    /// Explicit year first, then current-season phrases, then the current
    /// year as the default.
    pub fn resolve(&self, question: &str) -> i32 {
        if let Some(year) = extract_year(question) {
            return year;
        }
        // "this year"/"ytd" and the no-year default both land on the
        // current calendar year; the phrase check is kept so the intent
        // is explicit rather than accidental.
        if CURRENT_SEASON_RE.is_match(question) {
            return self.current_year;
        }
        self.current_year
    }
}
