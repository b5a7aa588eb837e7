//! Fuzzy resolution of free-text stat mentions to catalog keys.
//!
//! A small fixed synonym table is tried first, then a weighted similarity
//! score over every catalog key plus two generated variants per key
//! (underscore-to-space, and naive singularization by stripping a trailing
//! "s"). Below the acceptance cutoff the resolver reports no match rather
//! than guessing.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{Domain, StatCatalog, StatCatalogEntry};

/// Common spoken names for stat columns, singular and plural spellings.
static SYNONYMS: &[(&str, &str)] = &[
    ("home run", "hr"),
    ("home runs", "hr"),
    ("homer", "hr"),
    ("homers", "hr"),
    ("hr", "hr"),
    ("strikeout", "so"),
    ("strikeouts", "so"),
    ("k", "so"),
    ("ks", "so"),
    ("walk", "bb"),
    ("walks", "bb"),
    ("stolen base", "sb"),
    ("stolen bases", "sb"),
    ("runs batted in", "rbi"),
    ("batting average", "avg"),
];

static TRAILING_S: Lazy<Regex> = Lazy::new(|| Regex::new(r"s\b").expect("trailing-s regex"));

/// The two generated lookup variants for a catalog key, plus the key itself.
fn variants(key: &str) -> Vec<String> {
    let pretty = key.replace('_', " ").trim().to_string();
    let singular = TRAILING_S.replace_all(&pretty, "").to_string();
    let mut out = vec![key.to_string()];
    if !out.contains(&pretty) {
        out.push(pretty);
    }
    if !singular.is_empty() && !out.contains(&singular) {
        out.push(singular);
    }
    out
}

/// True when `phrase`'s words occur consecutively in `words`.
fn contains_phrase(words: &[&str], phrase: &str) -> bool {
    let pw: Vec<&str> = phrase.split_whitespace().collect();
    if pw.is_empty() || pw.len() > words.len() {
        return false;
    }
    words.windows(pw.len()).any(|w| w == pw.as_slice())
}

/// Similarity on a 0-100 scale.
fn similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b) * 100.0
}

/// Best alignment of `candidate` against the query, on a 0-100 scale.
///
/// Questions arrive whole ("top 10 home run hitters in 2022"), so a plain
/// edit distance against a short stat name is useless; score the candidate
/// against every word window of comparable width and take the best.
fn best_window_score(query: &str, candidate: &str) -> f64 {
    let words: Vec<&str> = query.split_whitespace().collect();
    if words.is_empty() {
        return 0.0;
    }
    if query == candidate {
        return 100.0;
    }
    // Exact phrase hit: strong but below a full-string match.
    if candidate.len() >= 2 && contains_phrase(&words, candidate) {
        return 95.0;
    }
    let cand_words = candidate.split_whitespace().count().max(1);
    let mut best = similarity(query, candidate);
    for size in 1..=(cand_words + 1).min(words.len()) {
        for window in words.windows(size) {
            let joined = window.join(" ");
            best = best.max(similarity(&joined, candidate));
        }
    }
    best
}

/// Resolve a free-text stat mention to a catalog entry.
///
/// `text` is expected lowercased. Returns `None` when nothing clears the
/// score cutoff (0-100); the caller falls through to the next router stage.
pub fn resolve_stat<'c>(
    text: &str,
    catalog: &'c StatCatalog,
    domain_hint: Option<Domain>,
    score_cutoff: u8,
) -> Option<&'c StatCatalogEntry> {
    let q = text.trim().to_lowercase();
    if q.is_empty() || catalog.is_empty() {
        return None;
    }

    // Whole-text synonym, then synonym phrases inside the text.
    for (phrase, key) in SYNONYMS {
        if q == *phrase {
            if let Some(entry) = catalog.lookup(key, domain_hint) {
                return Some(entry);
            }
        }
    }
    let words: Vec<&str> = q.split_whitespace().collect();
    for (phrase, key) in SYNONYMS {
        if contains_phrase(&words, phrase) {
            if let Some(entry) = catalog.lookup(key, domain_hint) {
                return Some(entry);
            }
        }
    }

    // Fuzzy pass over catalog entries and their variants. Iteration puts
    // batting entries first and only a strictly better score displaces the
    // running best, so column names shared by both tables tie toward
    // batting when no hint narrows the domain.
    let mut best: Option<(f64, &StatCatalogEntry)> = None;
    for entry in catalog.iter() {
        if domain_hint.map(|hint| entry.domain != hint).unwrap_or(false) {
            continue;
        }
        for variant in variants(&entry.stat_key) {
            let score = best_window_score(&q, &variant);
            if best.map(|(s, _)| score > s).unwrap_or(true) {
                best = Some((score, entry));
            }
        }
    }

    match best {
        Some((score, entry)) if score >= f64::from(score_cutoff) => Some(entry),
        _ => None,
    }
}
