//! Layered question-to-SQL resolution.
//!
//! ```text
//!   question
//!      |
//!      v
//!   fast path (catalog-driven leaderboards)     -- deterministic
//!      |  miss
//!      v
//!   pattern router (ordered YAML templates)     -- deterministic
//!      |  miss
//!      v
//!   model fallback (prompted generation)        -- nondeterministic
//!      |
//!      v
//!   lint gate ----> ResolvedQuery | Refusal
//! ```
//!
//! Control flows strictly downward. A deterministic stage that errs falls
//! through to the next stage rather than failing the question; only the
//! lint gate can turn a candidate into a refusal.

pub mod fastpath;
pub mod pattern;

pub use fastpath::{try_fastpath, RouteError, RouteResult};
pub use pattern::{route, TemplateMatch};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::catalog::StatCatalog;
use crate::config::Settings;
use crate::lint::leaders::enforce_leaders_invariants;
use crate::lint::question::{lint_question_sql, requests_unavailable_data};
use crate::lint::{is_read_only, normalize_sql};
use crate::llm::{build_prompt, ModelAdapter, ModelReply, PromptContext};
use crate::query::{ParamValue, QuerySource, ResolvedQuery};
use crate::season::SeasonContext;
use crate::templates::render::render_identifiers;
use crate::templates::TemplateSet;

static TOP_N_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\btop\s+(\d+)\b").expect("top-n regex"));

/// Outcome of resolving one question.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Linted SQL ready for the execution boundary.
    Query(ResolvedQuery),
    /// The pipeline declines to produce SQL; reasons are user-facing.
    Refusal { reasons: Vec<String> },
}

impl Resolution {
    fn refused(reason: impl Into<String>) -> Self {
        Resolution::Refusal {
            reasons: vec![reason.into()],
        }
    }
}

/// The full resolution pipeline.
///
/// Stages are optional by construction: without a catalog the fast path is
/// skipped, without a model adapter the pipeline is fully deterministic and
/// unrouted questions become refusals.
pub struct Pipeline {
    settings: Settings,
    seasons: SeasonContext,
    templates: TemplateSet,
    catalog: Option<StatCatalog>,
    model: Option<ModelAdapter>,
    schema_description: String,
    prompt_skeleton: String,
}

impl Pipeline {
    pub fn new(settings: Settings, templates: TemplateSet) -> Self {
        Self {
            settings,
            seasons: SeasonContext::from_today(),
            templates,
            catalog: None,
            model: None,
            schema_description: String::new(),
            prompt_skeleton: String::new(),
        }
    }

    /// Enable the deterministic fast path.
    pub fn with_catalog(mut self, catalog: StatCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Enable the model fallback.
    pub fn with_model(mut self, model: ModelAdapter) -> Self {
        self.model = Some(model);
        self
    }

    /// Pin the calendar context. Tests use this for reproducibility.
    pub fn with_seasons(mut self, seasons: SeasonContext) -> Self {
        self.seasons = seasons;
        self
    }

    /// Attach the schema description and prompt skeleton for the model stage.
    pub fn with_prompt(
        mut self,
        schema_description: impl Into<String>,
        prompt_skeleton: impl Into<String>,
    ) -> Self {
        self.schema_description = schema_description.into();
        self.prompt_skeleton = prompt_skeleton.into();
        self
    }

    pub fn seasons(&self) -> &SeasonContext {
        &self.seasons
    }

    /// Resolve a question into SQL or a refusal.
    pub async fn resolve(&self, question: &str) -> Resolution {
        // Questions about data the warehouse does not carry are refused
        // before any SQL is attempted.
        if requests_unavailable_data(question) {
            info!(question, "refused: requests unavailable data");
            return Resolution::refused(
                "This data (handedness splits, Statcast, game-by-game) is not in the database.",
            );
        }

        let season = self.seasons.resolve(question);
        let top_n = TOP_N_RE
            .captures(question)
            .and_then(|c| c[1].parse::<i64>().ok())
            .unwrap_or(self.settings.leaderboard.default_top_n);

        if let Some(catalog) = &self.catalog {
            match try_fastpath(
                question,
                season,
                top_n,
                catalog,
                &self.templates,
                &self.settings,
            ) {
                Ok(Some(resolved)) => {
                    info!(question, source = %resolved.source, "resolved via fast path");
                    return Resolution::Query(resolved);
                }
                Ok(None) => debug!(question, "fast path miss"),
                // A broken template set must not take the question down
                // with it; later stages may still answer.
                Err(err) => warn!(question, error = %err, "fast path failed, falling through"),
            }
        }

        if let Some(routed) = route(question, &self.templates, &self.seasons) {
            match self.render_routed(&routed) {
                Ok(resolved) => {
                    info!(question, source = %resolved.source, "resolved via template");
                    return Resolution::Query(resolved);
                }
                Err(err) => {
                    warn!(question, template = %routed.name, error = %err,
                          "routed template failed lint, falling through")
                }
            }
        }

        if let Some(adapter) = &self.model {
            return self.resolve_via_model(adapter, question, season).await;
        }

        Resolution::refused(
            "Could not generate a query: no deterministic route matched and \
             no model backend is configured.",
        )
    }

    fn render_routed(&self, routed: &TemplateMatch) -> RouteResult<ResolvedQuery> {
        let template = self
            .templates
            .get(&routed.name)
            .ok_or_else(|| RouteError::UnknownTemplate(routed.name.clone()))?;
        let sql = render_identifiers(&template.def.sql, &routed.idents)?;
        let sql = normalize_sql(&sql)?;
        enforce_leaders_invariants(&sql)?;

        let mut resolved = ResolvedQuery::new(sql, QuerySource::Template(routed.name.clone()));
        for (name, value) in &routed.bound {
            resolved = resolved.bind(name.clone(), value.clone());
        }
        // The qualified PA floor is settings-owned; templates declare the
        // parameter but never its value.
        if template.def.param_types.contains_key("min_pa") && !routed.bound.contains_key("min_pa")
        {
            resolved = resolved.bind(
                "min_pa",
                ParamValue::Int(self.settings.leaderboard.qualified_min_pa),
            );
        }
        Ok(resolved)
    }

    async fn resolve_via_model(
        &self,
        adapter: &ModelAdapter,
        question: &str,
        season: i32,
    ) -> Resolution {
        let prompt = build_prompt(
            &self.prompt_skeleton,
            &PromptContext {
                schema: &self.schema_description,
                question,
                season,
                current_year: self.seasons.current_year,
            },
        );

        let reply = match adapter.generate_sql(&prompt).await {
            Ok(reply) => reply,
            Err(err) => {
                warn!(question, error = %err, "model call failed");
                return Resolution::refused(format!("Model call failed: {}", err));
            }
        };

        let sql = match reply {
            ModelReply::Sql(sql) => sql,
            ModelReply::Refusal(text) => {
                info!(question, "model declined to answer");
                return Resolution::refused(if text.is_empty() {
                    "The model declined to answer.".to_string()
                } else {
                    text
                });
            }
        };

        let sql = match normalize_sql(&sql) {
            Ok(sql) => sql,
            Err(err) => return Resolution::refused(err.to_string()),
        };

        let report = lint_question_sql(question, &sql, self.seasons.current_year);
        if !report.ok {
            info!(question, reasons = ?report.reasons, "model SQL rejected by lint");
            return Resolution::Refusal {
                reasons: report.reasons,
            };
        }
        if let Err(violation) = enforce_leaders_invariants(&sql) {
            info!(question, error = %violation, "model SQL rejected by leaders enforcer");
            return Resolution::refused(violation.to_string());
        }

        info!(question, "resolved via model");
        Resolution::Query(ResolvedQuery::new(sql, QuerySource::Model))
    }

    /// Vet caller-supplied preset SQL through the same lint gate.
    ///
    /// Preset questions carry hand-written SQL; it is trusted for shape but
    /// still held to the read-only rule and the traded-player invariants.
    pub fn resolve_preset(&self, sql: &str) -> RouteResult<ResolvedQuery> {
        let sql = normalize_sql(sql)?;
        if !is_read_only(&sql) {
            return Err(RouteError::NotReadOnly);
        }
        enforce_leaders_invariants(&sql)?;
        Ok(ResolvedQuery::new(sql, QuerySource::Preset))
    }
}
