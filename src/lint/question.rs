//! Question-aware lint rules.
//!
//! Applied when the original question text is available alongside the
//! candidate SQL. In practice that means model-fallback output, whose
//! shape is not constrained by any template. Encodes the season-availability rules:
//! which tables are legal for which seasons, and which question topics the
//! warehouse simply cannot answer.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{looks_like_sql, LintMeta, LintReport};
use crate::season::extract_year;

/// Counting stats whose single-season leaderboards must be unqualified.
pub const COUNTING_STATS: &[&str] = &[
    "hr", "rbi", "sb", "r", "h", "doubles", "triples", "bb", "so", "cs", "ibb", "hbp",
];

/// First season with advanced FanGraphs splits.
const ADVANCED_ERA_FLOOR: i32 = 2002;

static LEADER_TRIG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(league\s+leaders?|leaders?|most|top\s+\d+|who\s+has)\b")
        .expect("leader-trigger regex")
});

static CAREER_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(career|all[-\s]?time|since\s+\d{4}|over\s+\d+\s+seasons|rolling|span|multi[-\s]?year)\b",
    )
    .expect("career-words regex")
});

/// Question topics this warehouse has no data for.
static UNAVAILABLE_TRIG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(handedness|left[-\s]?handed|right[-\s]?handed|statcast|pitch[-\s]?by[-\s]?pitch|game\s*(log|by\s*game)|exit\s*velocity|launch\s*angle|swing\s*speed|spray\s*chart|catch\s*probability)\b",
    )
    .expect("unavailable-trigger regex")
});

/// Advanced split tables, restricted to the 2002+ era.
static ADVANCED_TABLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\bfrom\s+fangraphs_(?:batting_advanced|pitching_advanced|plate_discipline|batted_ball|pitching_batted_ball|batter_pitch_type_summary|pitching_pitch_type_summary)\b",
    )
    .expect("advanced-table regex")
});

/// The four core historical (Lahman) tables.
static LAHMAN_TABLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bfrom\s+(batting|pitching|teams|people)\b").expect("lahman-table regex")
});

static QUALIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(pa|ip)\s*>=\s*\d").expect("qualifier regex"));

static YEAR_COUNT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(18|19|20)\d{2}\b").expect("year-count regex"));

/// A leaderboard question about exactly one explicit season.
pub fn is_single_season_leaderboard(question: &str) -> bool {
    if !LEADER_TRIG.is_match(question) {
        return false;
    }
    if YEAR_COUNT_RE.find_iter(question).count() != 1 {
        return false;
    }
    !CAREER_WORDS.is_match(question)
}

/// A single-season leaderboard over a fixed counting stat.
pub fn is_counting_stat_leaderboard(question: &str) -> bool {
    let ql = question.to_lowercase();
    COUNTING_STATS.iter().any(|s| ql.contains(s)) && is_single_season_leaderboard(question)
}

/// True when the question asks for data this warehouse does not carry.
pub fn requests_unavailable_data(question: &str) -> bool {
    UNAVAILABLE_TRIG.is_match(question)
}

/// Lint a candidate SQL string against the question that produced it.
pub fn lint_question_sql(question: &str, sql: &str, current_year: i32) -> LintReport {
    let mut reasons = Vec::new();
    let s = sql.trim().to_lowercase();

    // Anything that doesn't open with SQL is a refusal or failure message.
    if !looks_like_sql(&s) {
        return LintReport::rejected("Output is not SQL.");
    }

    if requests_unavailable_data(question) {
        reasons.push(
            "Question requests unavailable data (handedness/Statcast/game-by-game/etc.)."
                .to_string(),
        );
    }

    if is_single_season_leaderboard(question) {
        if s.contains("filter(") {
            reasons.push("Single-season leaderboard must not use FILTER().".to_string());
        }
        // TOT and non-TOT computed in one step double counts traded players.
        let mentions_tot = s.contains("team = 'tot'") || s.contains("team='tot'");
        let mentions_non_tot =
            s.contains("team not in ('tot','---')") || s.contains("team not in('tot','---')");
        if mentions_tot && mentions_non_tot {
            reasons.push(
                "Do not compute TOT and non-TOT in the same SELECT/CTE for single-season leaders."
                    .to_string(),
            );
        }
        if is_counting_stat_leaderboard(question) && QUALIFIER_RE.is_match(&s) {
            reasons
                .push("Do not apply PA/IP thresholds to counting-stat leaderboards.".to_string());
        }
    }

    let year = extract_year(question).unwrap_or(current_year);

    // Current-year data lives only in the live per-season source.
    if year == current_year && LAHMAN_TABLE_RE.is_match(&s) {
        reasons.push("Current-season query must use FanGraphs tables, not Lahman.".to_string());
    }

    if year < ADVANCED_ERA_FLOOR && ADVANCED_TABLE_RE.is_match(&s) {
        reasons.push(format!(
            "Advanced FanGraphs metrics are unavailable before {} for this database.",
            ADVANCED_ERA_FLOOR
        ));
    }

    let meta = LintMeta {
        uses_lahman: LAHMAN_TABLE_RE.is_match(&s),
        uses_fangraphs: s.contains("from fangraphs_"),
    };

    LintReport {
        ok: reasons.is_empty(),
        reasons,
        meta,
    }
}
