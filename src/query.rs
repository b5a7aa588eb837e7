//! Output contract of the resolution pipeline.
//!
//! A `ResolvedQuery` is the only thing the pipeline ever hands to the
//! execution boundary: a final SQL string plus the values for its bound
//! placeholders. Bound values travel separately and are never interpolated
//! into the SQL text.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A value bound to a named placeholder (`:season`, `:top_n`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Text(v) => write!(f, "{}", v),
        }
    }
}

/// Which router stage produced a query. Carried for observability only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuerySource {
    /// Deterministic catalog-driven leaderboard branch.
    FastPath,
    /// A named pattern-matched template.
    Template(String),
    /// The generative-model fallback.
    Model,
    /// Caller-supplied vetted SQL (preset questions).
    Preset,
}

impl fmt::Display for QuerySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuerySource::FastPath => write!(f, "fast_path"),
            QuerySource::Template(name) => write!(f, "template:{}", name),
            QuerySource::Model => write!(f, "model"),
            QuerySource::Preset => write!(f, "preset"),
        }
    }
}

/// Final, linted SQL ready for the execution boundary.
///
/// Created fresh per question and never mutated. `sql_text` is guaranteed
/// free of template markers; `bound_params` is empty for literal-only SQL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedQuery {
    pub sql_text: String,
    pub bound_params: BTreeMap<String, ParamValue>,
    pub source: QuerySource,
}

impl ResolvedQuery {
    pub fn new(sql_text: impl Into<String>, source: QuerySource) -> Self {
        Self {
            sql_text: sql_text.into(),
            bound_params: BTreeMap::new(),
            source,
        }
    }

    /// Attach a bound parameter value.
    pub fn bind(mut self, name: impl Into<String>, value: ParamValue) -> Self {
        self.bound_params.insert(name.into(), value);
        self
    }
}
