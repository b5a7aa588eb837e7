//! Stat catalog: which numeric columns exist, and how to rank them.
//!
//! Built once per session by introspecting the two canonical per-domain
//! counting tables, then treated as read-only. Each entry records the
//! source table, the default aggregation (integer storage ⇒ SUM, floating
//! ⇒ AVG), and the sort direction (ASC only for the fixed low-is-better
//! set). If introspection fails the build fails fatally: the fast path is
//! then entirely unavailable, never partially populated.

mod provider;
pub mod resolver;

pub use provider::{ColumnInfo, ProviderError, ProviderResult, SchemaProvider, SqliteSchema,
    StaticSchema};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Canonical batting counting table.
pub const BATTING_TABLE: &str = "fangraphs_batting_lahman_like";

/// Canonical pitching counting table.
pub const PITCHING_TABLE: &str = "fangraphs_pitching_lahman_like";

/// Identifier/name/team/season columns carry no stat value.
const IGNORED_COLUMNS: &[&str] = &["idfg", "name", "team", "season"];

/// Stats where a smaller value ranks first.
const LOW_IS_BETTER: &[&str] = &["era", "fip", "whip", "ra9", "bb9"];

/// Storage-type fragments that mark a column as numeric.
const NUMERIC_TYPE_HINTS: &[&str] = &["int", "numeric", "double", "real", "decimal"];

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors raised while building the catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Schema introspection failed; the catalog is unusable for this session.
    #[error("schema introspection failed: {0}")]
    Introspection(#[from] ProviderError),
}

/// Which table family a stat belongs to.
///
/// Ordered with batting first: unhinted lookups over column names that
/// exist in both counting tables resolve to the batting entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Batting,
    Pitching,
}

/// Default aggregation for a stat column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Aggregation {
    Sum,
    Avg,
}

impl Aggregation {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Aggregation::Sum => "SUM",
            Aggregation::Avg => "AVG",
        }
    }
}

/// Ranking direction for a stat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// One resolvable numeric stat.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatCatalogEntry {
    /// Canonical lowercase column identifier, unique across the catalog.
    pub stat_key: String,
    pub domain: Domain,
    /// The canonical per-domain counting table this stat lives in.
    pub source_table: &'static str,
    pub default_aggregation: Aggregation,
    pub sort_direction: SortDirection,
}

/// Immutable mapping from (domain, stat key) to catalog entry.
///
/// Both counting tables carry some of the same column names (hr, so, bb,
/// h, g), so the key alone does not identify an entry.
#[derive(Debug, Clone, Default)]
pub struct StatCatalog {
    entries: BTreeMap<(Domain, String), StatCatalogEntry>,
}

impl StatCatalog {
    /// Entry for a stat within one domain.
    pub fn get(&self, domain: Domain, stat_key: &str) -> Option<&StatCatalogEntry> {
        self.entries.get(&(domain, stat_key.to_string()))
    }

    /// Entry for a stat, honoring an optional domain hint.
    ///
    /// Without a hint, stat names present in both tables resolve to the
    /// batting entry.
    pub fn lookup(
        &self,
        stat_key: &str,
        domain_hint: Option<Domain>,
    ) -> Option<&StatCatalogEntry> {
        match domain_hint {
            Some(domain) => self.get(domain, stat_key),
            None => self
                .get(Domain::Batting, stat_key)
                .or_else(|| self.get(Domain::Pitching, stat_key)),
        }
    }

    /// Entries in (domain, stat key) order; batting entries first.
    pub fn iter(&self) -> impl Iterator<Item = &StatCatalogEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Build the stat catalog from live schema metadata.
///
/// Reads exactly the two canonical counting tables. Any introspection
/// failure aborts the whole build.
pub fn build_catalog(provider: &dyn SchemaProvider) -> CatalogResult<StatCatalog> {
    let mut entries = BTreeMap::new();
    for (table, domain) in [(BATTING_TABLE, Domain::Batting), (PITCHING_TABLE, Domain::Pitching)] {
        for column in provider.table_columns(table)? {
            let key = column.name.to_lowercase();
            if IGNORED_COLUMNS.contains(&key.as_str()) {
                continue;
            }
            let dtype = column.declared_type.to_lowercase();
            if !NUMERIC_TYPE_HINTS.iter().any(|hint| dtype.contains(hint)) {
                continue;
            }
            let default_aggregation = if dtype.contains("int") {
                Aggregation::Sum
            } else {
                Aggregation::Avg
            };
            let sort_direction = if LOW_IS_BETTER.contains(&key.as_str()) {
                SortDirection::Asc
            } else {
                SortDirection::Desc
            };
            entries.insert(
                (domain, key.clone()),
                StatCatalogEntry {
                    stat_key: key,
                    domain,
                    source_table: table,
                    default_aggregation,
                    sort_direction,
                },
            );
        }
    }
    Ok(StatCatalog { entries })
}
