//! Post-generation SQL validation.
//!
//! Every router branch converges here before SQL may reach the execution
//! boundary. The checks are source-independent: fast-path, template, and
//! model output all pass through the same gate.
//!
//! - [`normalize_sql`]: unrendered-marker rejection and non-ASCII glyph
//!   normalization, applied to every candidate.
//! - [`leaders`]: the traded-player invariant enforcer.
//! - [`question`]: question-aware rules applied when the original question
//!   text is available alongside the candidate SQL (the model path).

pub mod leaders;
pub mod question;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Non-ASCII comparison glyphs models like to emit.
const ASCII_FIXES: &[(&str, &str)] = &[("\u{2264}", "<="), ("\u{2265}", ">=")];

/// Leading keywords that mark a response as SQL rather than prose.
static SQL_LEADING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(select|with|explain|insert|update|delete|create\s+view|create\s+table)\b")
        .expect("sql-leading regex")
});

static WRITE_KEYWORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(insert|update|delete|create|alter|drop|truncate|grant|revoke)\b")
        .expect("write-keyword regex")
});

static READ_LEADING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(select|with|explain)\b").expect("read-leading regex"));

/// Result type for lint operations.
pub type LintResult<T> = Result<T, SqlLintError>;

/// Fatal per-candidate lint failures.
#[derive(Debug, thiserror::Error)]
pub enum SqlLintError {
    #[error("unrendered template markers found in SQL")]
    UnrenderedMarker,
}

/// Outcome of the question-aware lint pass.
#[derive(Debug, Clone, Serialize)]
pub struct LintReport {
    pub ok: bool,
    pub reasons: Vec<String>,
    pub meta: LintMeta,
}

/// Table-usage hints for observability.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct LintMeta {
    pub uses_lahman: bool,
    pub uses_fangraphs: bool,
}

impl LintReport {
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            ok: false,
            reasons: vec![reason.into()],
            meta: LintMeta::default(),
        }
    }
}

/// Marker check plus glyph normalization.
///
/// Rejects SQL with residual template markers; normalizes `≤`/`≥` to their
/// ASCII equivalents. Applied to every candidate regardless of source.
pub fn normalize_sql(sql: &str) -> LintResult<String> {
    if sql.contains("{{") || sql.contains("}}") {
        return Err(SqlLintError::UnrenderedMarker);
    }
    let mut out = sql.to_string();
    for (bad, good) in ASCII_FIXES {
        if out.contains(bad) {
            out = out.replace(bad, good);
        }
    }
    Ok(out)
}

/// Conservative "looks like SQL" classification of model output.
///
/// Anything not starting with a recognized leading keyword is treated as a
/// refusal or failure message, never executed.
pub fn looks_like_sql(text: &str) -> bool {
    SQL_LEADING_RE.is_match(text)
}

/// True when the SQL can safely be handed to a read-only executor.
pub fn is_read_only(sql: &str) -> bool {
    READ_LEADING_RE.is_match(sql) && !WRITE_KEYWORD_RE.is_match(sql)
}
