//! Declarative SQL template definitions.
//!
//! Query shapes live in a YAML file, not in code: each template carries an
//! ordered pattern list, parameter defaults (literal or magic token), type
//! coercion rules, required parameters, and a SQL skeleton. Adding a new
//! query shape means adding a YAML entry.
//!
//! Two kinds of substitution points exist in a skeleton and they are never
//! collapsed into one step:
//! - bound value placeholders (`:season`, `:top_n`) stay in the SQL and are
//!   passed as query parameters;
//! - identifier placeholders (`{{stat_col}}`, `{{stat_label}}`) are textual
//!   substitutions restricted to whitelisted, catalog-resolved tokens (see
//!   [`render`]).
//!
//! Shared fragments (`{{fragments.name}}`) are expanded once at load time.

pub mod render;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::catalog::Aggregation;

/// Magic default: season extracted from the question's free text.
pub const MAGIC_SEASON_FROM_QUERY: &str = "!season_from_query";

/// Magic default: the current calendar year.
pub const MAGIC_CURRENT_YEAR: &str = "!current_year";

/// Result type for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Errors raised while loading template definitions.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("failed to read template file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse template definitions: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("template '{template}' references unknown fragment '{fragment}'")]
    UnknownFragment { template: String, fragment: String },

    #[error("template '{template}' has an invalid pattern: {source}")]
    BadPattern {
        template: String,
        source: Box<regex::Error>,
    },

    #[error("duplicate template name '{0}'")]
    DuplicateName(String),

    #[error("template not found: '{0}'")]
    NotFound(String),
}

/// Declared coercion for a routed parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    Int,
    Float,
}

/// One named query shape, as declared in YAML.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateDefinition {
    pub name: String,

    /// Ordered text-matching rules; first match wins.
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Parameter defaults: literals or magic tokens.
    #[serde(default)]
    pub defaults: BTreeMap<String, serde_yaml::Value>,

    /// Coercion rules per parameter.
    #[serde(default)]
    pub param_types: BTreeMap<String, ParamType>,

    /// Parameters that must resolve or the template is skipped.
    #[serde(default)]
    pub required: Vec<String>,

    /// Aggregation class the SQL body applies to `stat_col`. Routed stat
    /// labels must agree; absent means any label is acceptable.
    #[serde(default)]
    pub aggregation: Option<Aggregation>,

    /// Parameterized SQL body.
    pub sql: String,
}

#[derive(Debug, Deserialize)]
struct TemplateFile {
    #[serde(default)]
    fragments: BTreeMap<String, String>,
    templates: Vec<TemplateDefinition>,
}

/// A template with its patterns compiled and fragments expanded.
#[derive(Debug, Clone)]
pub struct CompiledTemplate {
    pub def: TemplateDefinition,
    pub patterns: Vec<Regex>,
}

/// The full ordered template set. Declaration order is match order.
#[derive(Debug, Clone, Default)]
pub struct TemplateSet {
    templates: Vec<CompiledTemplate>,
}

static FRAGMENT_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*fragments\.([a-z0-9_]+)\s*\}\}").expect("fragment regex"));

impl TemplateSet {
    /// Load and compile template definitions from a YAML file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> TemplateResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| TemplateError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_str(&content)
    }

    /// Parse template definitions from YAML text.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(yaml: &str) -> TemplateResult<Self> {
        let file: TemplateFile = serde_yaml::from_str(yaml)?;

        let mut seen = std::collections::HashSet::new();
        let mut templates = Vec::with_capacity(file.templates.len());
        for mut def in file.templates {
            if !seen.insert(def.name.clone()) {
                return Err(TemplateError::DuplicateName(def.name));
            }
            def.sql = expand_fragments(&def.name, &def.sql, &file.fragments)?;
            let patterns = def
                .patterns
                .iter()
                .map(|p| {
                    Regex::new(p).map_err(|source| TemplateError::BadPattern {
                        template: def.name.clone(),
                        source: Box::new(source),
                    })
                })
                .collect::<TemplateResult<Vec<_>>>()?;
            templates.push(CompiledTemplate { def, patterns });
        }
        Ok(Self { templates })
    }

    /// Templates in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &CompiledTemplate> {
        self.templates.iter()
    }

    pub fn get(&self, name: &str) -> Option<&CompiledTemplate> {
        self.templates.iter().find(|t| t.def.name == name)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// Expand `{{fragments.name}}` references. Unknown fragments are load errors.
fn expand_fragments(
    template: &str,
    sql: &str,
    fragments: &BTreeMap<String, String>,
) -> TemplateResult<String> {
    let mut out = String::with_capacity(sql.len());
    let mut last = 0;
    for caps in FRAGMENT_REF.captures_iter(sql) {
        let whole = caps.get(0).expect("capture 0");
        let name = &caps[1];
        let body = fragments
            .get(name)
            .ok_or_else(|| TemplateError::UnknownFragment {
                template: template.to_string(),
                fragment: name.to_string(),
            })?;
        out.push_str(&sql[last..whole.start()]);
        out.push_str(body.trim_end());
        last = whole.end();
    }
    out.push_str(&sql[last..]);
    Ok(out)
}
