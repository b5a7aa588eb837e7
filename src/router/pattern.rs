//! Ordered pattern router.
//!
//! Walks the template set in declaration order and returns the first
//! template whose pattern list matches the question. Matching is strictly
//! first-match-wins at both levels, so overlapping patterns are resolved by
//! declaration order, never by specificity.
//!
//! Parameter values come from three places, later wins: template defaults
//! (literals or magic tokens), then named capture groups from the matching
//! pattern. A captured stat label only survives if the whitelist maps it to
//! a known column; anything else fails the template rather than flowing
//! into SQL. The whitelist also carries each label's aggregation class, and
//! a template that declares one (SUM for counting shapes, AVG for rate
//! shapes) rejects labels of the other class so the walk can reach a
//! template whose SQL aggregates correctly.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::catalog::Aggregation;
use crate::query::ParamValue;
use crate::season::{extract_year, SeasonContext};
use crate::templates::{
    CompiledTemplate, ParamType, TemplateSet, MAGIC_CURRENT_YEAR, MAGIC_SEASON_FROM_QUERY,
};

/// Whitelist mapping spoken stat labels to counting-table columns.
///
/// The only route by which question text can ever become a SQL identifier.
/// Patterns are matched against the captured label, not the full question.
static STAT_LABELS: Lazy<Vec<(Regex, &'static str, Aggregation)>> = Lazy::new(|| {
    [
        (r"(?i)^(hr|home\s*runs?|homers?)$", "hr", Aggregation::Sum),
        (r"(?i)^(rbi|rbis|runs\s+batted\s+in)$", "rbi", Aggregation::Sum),
        (r"(?i)^(sb|stolen\s+bases?)$", "sb", Aggregation::Sum),
        (r"(?i)^(so|k|ks|strikeouts?)$", "so", Aggregation::Sum),
        (r"(?i)^(bb|walks?)$", "bb", Aggregation::Sum),
        (r"(?i)^(avg|ba|batting\s+average)$", "avg", Aggregation::Avg),
        (r"(?i)^(obp|on[-\s]base\s+percentage)$", "obp", Aggregation::Avg),
        (r"(?i)^(slg|slugging(\s+percentage)?)$", "slg", Aggregation::Avg),
        (r"(?i)^(r|runs?(\s+scored)?)$", "r", Aggregation::Sum),
        (r"(?i)^(h|hits?)$", "h", Aggregation::Sum),
    ]
    .into_iter()
    .map(|(p, col, agg)| (Regex::new(p).expect("stat-label regex"), col, agg))
    .collect()
});

/// Map a captured stat label to its column and aggregation class.
pub fn label_to_column(label: &str) -> Option<(&'static str, Aggregation)> {
    let trimmed = label.trim();
    STAT_LABELS
        .iter()
        .find(|(re, _, _)| re.is_match(trimmed))
        .map(|(_, col, agg)| (*col, *agg))
}

/// A successful route: the template name plus its split parameter sets.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateMatch {
    pub name: String,
    /// Values bound at execution time (`:season`, `:top_n`).
    pub bound: BTreeMap<String, ParamValue>,
    /// Whitelisted identifier substitutions (`stat_col`, `stat_label`).
    pub idents: BTreeMap<String, String>,
}

/// Parameter names substituted as identifiers rather than bound values.
const IDENT_PARAMS: &[&str] = &["stat_col", "stat_label"];

/// Route a question through the ordered template set.
///
/// Returns `None` when no template matches or when the first matching
/// template cannot assemble a complete, whitelisted parameter set. A failed
/// template is skipped and the walk continues.
pub fn route(
    question: &str,
    templates: &TemplateSet,
    seasons: &SeasonContext,
) -> Option<TemplateMatch> {
    for template in templates.iter() {
        for pattern in &template.patterns {
            let Some(caps) = pattern.captures(question) else {
                continue;
            };
            match assemble(template, pattern, &caps, question, seasons) {
                Some(routed) => return Some(routed),
                None => {
                    debug!(template = %template.def.name, "pattern matched but parameters incomplete");
                    break; // next template
                }
            }
        }
    }
    None
}

fn assemble(
    template: &CompiledTemplate,
    pattern: &Regex,
    caps: &regex::Captures<'_>,
    question: &str,
    seasons: &SeasonContext,
) -> Option<TemplateMatch> {
    let mut raw: BTreeMap<String, String> = BTreeMap::new();

    for (name, default) in &template.def.defaults {
        if let Some(value) = resolve_default(default, question, seasons) {
            raw.insert(name.clone(), value);
        }
    }

    // Capture groups override defaults.
    for cap_name in pattern.capture_names().flatten() {
        if let Some(m) = caps.name(cap_name) {
            raw.insert(cap_name.to_string(), m.as_str().trim().to_string());
        }
    }

    // The stat label must clear the whitelist before it may name a column,
    // and its aggregation class must agree with the template's SQL.
    if let Some(label) = raw.get("stat_label").cloned() {
        let (col, agg) = label_to_column(&label)?;
        if template.def.aggregation.map(|want| want != agg).unwrap_or(false) {
            return None;
        }
        raw.insert("stat_label".to_string(), label.trim().to_lowercase());
        raw.insert("stat_col".to_string(), col.to_string());
    }

    for required in &template.def.required {
        if !raw.contains_key(required) {
            return None;
        }
    }

    let mut bound = BTreeMap::new();
    let mut idents = BTreeMap::new();
    for (name, value) in raw {
        if IDENT_PARAMS.contains(&name.as_str()) {
            idents.insert(name, value);
            continue;
        }
        let coerced = match template.def.param_types.get(&name) {
            Some(ParamType::Int) => ParamValue::Int(value.parse().ok()?),
            Some(ParamType::Float) => ParamValue::Float(value.parse().ok()?),
            None => ParamValue::Text(value),
        };
        bound.insert(name, coerced);
    }

    Some(TemplateMatch {
        name: template.def.name.clone(),
        bound,
        idents,
    })
}

/// Resolve one default value: a magic token or a literal.
///
/// Returns `None` when a magic token cannot resolve (no year in the
/// question); the parameter then stays absent and the required check
/// decides the template's fate.
fn resolve_default(
    default: &serde_yaml::Value,
    question: &str,
    seasons: &SeasonContext,
) -> Option<String> {
    match default {
        serde_yaml::Value::String(s) if s == MAGIC_SEASON_FROM_QUERY => {
            extract_year(question).map(|y| y.to_string())
        }
        serde_yaml::Value::String(s) if s == MAGIC_CURRENT_YEAR => {
            Some(seasons.current_year.to_string())
        }
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
