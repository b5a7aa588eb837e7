//! Traded-player invariant enforcer.
//!
//! A player traded mid-season appears under multiple team rows for the same
//! (player, season) in the counting tables, and the same tables may carry a
//! synthetic season-total row under the reserved team code `TOT`. A correct
//! single-season leaders query must count each player exactly once: the TOT
//! row when present, otherwise the aggregate across the real team rows with
//! sentinel rows excluded.
//!
//! The enforcer checks that any season-filtered query against the counting
//! tables exhibits both structural signatures, and rejects outright when
//! either is missing. It never repairs: silently patching aggregation logic
//! can mask a wrong answer.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::catalog::{BATTING_TABLE, PITCHING_TABLE};

/// Violations of the traded-player safeguard.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LeadersViolation {
    #[error(
        "missing traded-player safeguards (DISTINCT ON dedup + COALESCE of \
         MAX 'TOT' over SUM of non-'TOT')"
    )]
    MissingTradeSafeguards,

    #[error("illegal WHERE team = 'TOT' filter in leaders query")]
    IllegalTotFilter,
}

/// Season filtered by a bound marker or a literal year.
static SEASON_FILTER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bseason\s*=\s*(:season\b|(18|19|20)\d{2}\b)").expect("season-filter regex")
});

/// De-duplication keyed on player id, season and trimmed team name.
static DISTINCT_ON_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)DISTINCT\s+ON\s*\(\s*[a-z_]*\.?idfg\s*,\s*[a-z_]*\.?season\s*,\s*TRIM\(\s*[a-z_]*\.?team\s*\)\s*\)",
    )
    .expect("distinct-on regex")
});

static COALESCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bCOALESCE\s*\(").expect("coalesce regex"));

/// Aggregate filter picking the sentinel team-total row.
static TOT_FILTER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)FILTER\s*\(\s*WHERE\s+team\s*=\s*'TOT'\s*\)").expect("tot-filter regex")
});

/// Aggregate filter excluding the sentinel rows.
static NON_TOT_FILTER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)FILTER\s*\(\s*WHERE\s+team\s+NOT\s+IN\s*\(\s*'TOT'\s*,\s*'---'\s*\)\s*\)")
        .expect("non-tot-filter regex")
});

/// WHERE-clause filter on the sentinel team code.
static WHERE_TOT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bWHERE\b[^;]*\bteam\s*=\s*'TOT'").expect("where-tot regex")
});

/// Enforce the traded-player invariants on a candidate query.
///
/// Applies only to SQL that touches one of the two canonical counting
/// tables and filters on a season value; everything else passes untouched.
pub fn enforce_leaders_invariants(sql: &str) -> Result<(), LeadersViolation> {
    let touches_counting_tables = sql.contains(BATTING_TABLE) || sql.contains(PITCHING_TABLE);
    if !touches_counting_tables || !SEASON_FILTER_RE.is_match(sql) {
        return Ok(());
    }

    let has_dedup = DISTINCT_ON_RE.is_match(sql);
    let has_trade_safe =
        COALESCE_RE.is_match(sql) && TOT_FILTER_RE.is_match(sql) && NON_TOT_FILTER_RE.is_match(sql);
    if !(has_dedup && has_trade_safe) {
        return Err(LeadersViolation::MissingTradeSafeguards);
    }

    // The mandatory aggregate FILTER clauses themselves contain
    // "WHERE team = 'TOT'"; mask them before scanning for a WHERE-clause
    // sentinel filter, which discards every non-traded player.
    let masked = TOT_FILTER_RE.replace_all(sql, "FILTER_TOT");
    let masked = NON_TOT_FILTER_RE.replace_all(&masked, "FILTER_NON_TOT");
    if WHERE_TOT_RE.is_match(&masked) {
        return Err(LeadersViolation::IllegalTotFilter);
    }
    Ok(())
}
