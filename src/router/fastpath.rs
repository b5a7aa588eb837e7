//! Deterministic leaderboard fast path.
//!
//! The highest-traffic question shape ("top N <stat> in <year>") never
//! needs a model call: resolve the stat against the catalog, pick the
//! canonical template for its domain and aggregation, render, lint, and
//! enforce the traded-player invariants. The same question always yields
//! byte-identical SQL.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::catalog::{resolver::resolve_stat, Aggregation, Domain, SortDirection, StatCatalog};
use crate::config::Settings;
use crate::lint::leaders::{enforce_leaders_invariants, LeadersViolation};
use crate::lint::{normalize_sql, SqlLintError};
use crate::query::{ParamValue, QuerySource, ResolvedQuery};
use crate::templates::render::{render_identifiers, RenderError};
use crate::templates::TemplateSet;

/// Result type for routing operations.
pub type RouteResult<T> = Result<T, RouteError>;

/// Failures while assembling a deterministic query.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Lint(#[from] SqlLintError),

    #[error(transparent)]
    Leaders(#[from] LeadersViolation),

    #[error("no template named '{0}' in the loaded set")]
    UnknownTemplate(String),

    #[error("preset SQL is not read-only")]
    NotReadOnly,
}

static ORDER_BY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bORDER\s+BY\b").expect("order-by regex"));

static LIMIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bLIMIT\b").expect("limit regex"));

static PITCHING_HINT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bpitch(?:er|ers|ing)\b").expect("pitching-hint regex"));

static BATTING_HINT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:hitters?|batters?|batting|hitting)\b").expect("batting-hint regex")
});

/// Domain named by the question itself, if any.
///
/// Both counting tables carry hr, so, bb, h and g; the hint steers those
/// shared stat names to the right table ("most strikeouts by pitchers").
fn question_domain(lower: &str) -> Option<Domain> {
    if PITCHING_HINT_RE.is_match(lower) {
        Some(Domain::Pitching)
    } else if BATTING_HINT_RE.is_match(lower) {
        Some(Domain::Batting)
    } else {
        None
    }
}

/// Replace the ORDER BY clause with one ranking on `label`.
///
/// Splices strictly between the ORDER BY keyword and any trailing LIMIT, so
/// the row cap survives the rewrite. SQL without an ORDER BY is returned
/// unchanged.
pub fn rewrite_order_by(sql: &str, label: &str, direction: SortDirection) -> String {
    let Some(m) = ORDER_BY_RE.find(sql) else {
        return sql.to_string();
    };
    let tail_start = LIMIT_RE
        .find_at(sql, m.end())
        .map(|l| l.start())
        .unwrap_or(sql.len());
    format!(
        "{}ORDER BY \"{}\" {} NULLS LAST, name {}",
        &sql[..m.start()],
        label,
        direction.as_sql(),
        &sql[tail_start..]
    )
    .trim()
    .to_string()
}

/// Canonical template for a stat's domain and aggregation.
///
/// The qualified variants split the same way: counting stats keep their
/// SUM across stints, rate stats their AVG.
fn template_name(domain: Domain, aggregation: Aggregation, qualified: bool) -> &'static str {
    match (domain, aggregation) {
        (Domain::Batting, Aggregation::Sum) if qualified => "leaders_batting_qualified_counting",
        (Domain::Batting, Aggregation::Avg) if qualified => "leaders_batting_qualified_rate",
        (Domain::Batting, Aggregation::Sum) => "leaders_batting_counting",
        (Domain::Batting, Aggregation::Avg) => "leaders_batting_rate",
        (Domain::Pitching, Aggregation::Sum) => "leaders_pitching_counting",
        (Domain::Pitching, Aggregation::Avg) => "leaders_pitching_rate",
    }
}

/// Try to answer a question deterministically.
///
/// `Ok(None)` means the stat did not resolve and the caller should fall
/// through to the next router stage. Any error after resolution is a real
/// failure: the template set or its SQL is broken, not the question.
pub fn try_fastpath(
    question: &str,
    season: i32,
    top_n: i64,
    catalog: &StatCatalog,
    templates: &TemplateSet,
    settings: &Settings,
) -> RouteResult<Option<ResolvedQuery>> {
    let lower = question.to_lowercase();
    let Some(entry) = resolve_stat(
        &lower,
        catalog,
        question_domain(&lower),
        settings.resolver.score_cutoff,
    ) else {
        return Ok(None);
    };

    // "Qualified" leaderboards exist for batting only; a qualified pitching
    // question takes the normal pitching path.
    let qualified = lower.contains("qualified") && entry.domain == Domain::Batting;
    let name = template_name(entry.domain, entry.default_aggregation, qualified);
    let template = templates
        .get(name)
        .ok_or_else(|| RouteError::UnknownTemplate(name.to_string()))?;
    debug!(stat = %entry.stat_key, template = name, season, top_n, "fast path hit");

    let mut idents = BTreeMap::new();
    idents.insert("stat_col".to_string(), entry.stat_key.clone());
    idents.insert("stat_label".to_string(), entry.stat_key.clone());

    let mut sql = render_identifiers(&template.def.sql, &idents)?;
    if entry.sort_direction == SortDirection::Asc {
        sql = rewrite_order_by(&sql, &entry.stat_key, SortDirection::Asc);
    }
    let sql = normalize_sql(&sql)?;
    enforce_leaders_invariants(&sql)?;

    let mut resolved = ResolvedQuery::new(sql, QuerySource::FastPath)
        .bind("season", ParamValue::Int(i64::from(season)))
        .bind("top_n", ParamValue::Int(top_n));
    if qualified {
        resolved = resolved.bind(
            "min_pa",
            ParamValue::Int(settings.leaderboard.qualified_min_pa),
        );
    }
    Ok(Some(resolved))
}
