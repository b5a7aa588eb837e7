//! Constrained identifier substitution.
//!
//! This is the injection-safety boundary: only whitelisted placeholder
//! names may appear in a skeleton, and only catalog-resolved or
//! regex-whitelisted values may fill them. Free-form user text never
//! reaches this pass. Any residual `{{`/`}}` marker in the output is a
//! hard failure, not a warning.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

/// Placeholder names a skeleton may use for identifier substitution.
const ALLOWED_PLACEHOLDERS: &[&str] = &["stat_col", "stat_label"];

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*([A-Za-z0-9_.]+)\s*\}\}").expect("placeholder regex"));

/// `stat_col` must be a bare column identifier.
static IDENT_VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][a-z0-9_]*$").expect("ident regex"));

/// `stat_label` appears inside double quotes in skeletons; spaces are fine,
/// quote characters are not.
static LABEL_VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][a-z0-9_ ]*$").expect("label regex"));

/// Result type for rendering.
pub type RenderResult<T> = Result<T, RenderError>;

/// Hard rendering failures.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("placeholder '{0}' is not an allowed identifier slot")]
    ForbiddenPlaceholder(String),

    #[error("no value provided for identifier placeholder '{0}'")]
    MissingIdentifier(String),

    #[error("value '{value}' is not a legal substitution for '{name}'")]
    IllegalValue { name: String, value: String },

    #[error("unrendered template markers remain in SQL")]
    UnrenderedMarker,
}

fn check_value(name: &str, value: &str) -> RenderResult<()> {
    let ok = match name {
        "stat_col" => IDENT_VALUE.is_match(value),
        "stat_label" => LABEL_VALUE.is_match(value),
        _ => false,
    };
    if ok {
        Ok(())
    } else {
        Err(RenderError::IllegalValue {
            name: name.to_string(),
            value: value.to_string(),
        })
    }
}

/// Substitute identifier placeholders into a SQL skeleton.
///
/// Bound value placeholders (`:season`, `:top_n`) are left untouched; they
/// travel separately as query parameters.
pub fn render_identifiers(
    skeleton: &str,
    idents: &BTreeMap<String, String>,
) -> RenderResult<String> {
    let mut out = String::with_capacity(skeleton.len());
    let mut last = 0;
    for caps in PLACEHOLDER.captures_iter(skeleton) {
        let whole = caps.get(0).expect("capture 0");
        let name = &caps[1];
        if !ALLOWED_PLACEHOLDERS.contains(&name) {
            return Err(RenderError::ForbiddenPlaceholder(name.to_string()));
        }
        let value = idents
            .get(name)
            .ok_or_else(|| RenderError::MissingIdentifier(name.to_string()))?;
        check_value(name, value)?;
        out.push_str(&skeleton[last..whole.start()]);
        out.push_str(value);
        last = whole.end();
    }
    out.push_str(&skeleton[last..]);

    if out.contains("{{") || out.contains("}}") {
        return Err(RenderError::UnrenderedMarker);
    }
    Ok(out.trim().to_string())
}
