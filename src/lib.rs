//! # Dugout
//!
//! Natural-language leaderboard queries over a baseball statistics
//! warehouse.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                  Question (free text)                    │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [fast path: catalog + canonical templates]
//! ┌─────────────────────────────────────────────────────────┐
//! │        Deterministic leaderboard SQL (cache-stable)      │
//! └─────────────────────────────────────────────────────────┘
//!                          │ miss
//!                          ▼ [pattern router: ordered YAML templates]
//! ┌─────────────────────────────────────────────────────────┐
//! │        Parameterized template SQL (first match wins)     │
//! └─────────────────────────────────────────────────────────┘
//!                          │ miss
//!                          ▼ [model fallback: prompted generation]
//! ┌─────────────────────────────────────────────────────────┐
//! │          Candidate SQL (nondeterministic, untrusted)     │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [lint gate: safety + domain invariants]
//! ┌─────────────────────────────────────────────────────────┐
//! │              ResolvedQuery  |  Refusal                   │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Every branch converges on the same lint gate before SQL may reach the
//! execution boundary; there is no trusted path around it.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod lint;
pub mod llm;
pub mod query;
pub mod router;
pub mod season;
pub mod templates;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::cache::ResultCache;
    pub use crate::catalog::{
        build_catalog, Aggregation, Domain, SchemaProvider, SortDirection, SqliteSchema,
        StatCatalog, StatCatalogEntry, StaticSchema,
    };
    pub use crate::config::Settings;
    pub use crate::lint::{is_read_only, normalize_sql, LintReport};
    pub use crate::llm::{ModelAdapter, ScriptedModel, TextModel};
    pub use crate::query::{ParamValue, QuerySource, ResolvedQuery};
    pub use crate::router::{Pipeline, Resolution};
    pub use crate::season::SeasonContext;
    pub use crate::templates::TemplateSet;
}
