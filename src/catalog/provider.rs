//! Schema metadata providers.
//!
//! The catalog builder reads column metadata through the `SchemaProvider`
//! trait so it can be fed from a live database handle, a bundled snapshot,
//! or a test fixture without changing the builder itself.

use std::collections::HashMap;

use rusqlite::Connection;

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors raised while fetching schema metadata.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("table not found in schema metadata: {0}")]
    TableNotFound(String),
}

/// A column's name and declared storage type, as reported by the warehouse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub declared_type: String,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
        }
    }
}

/// Read-only access to warehouse column metadata.
pub trait SchemaProvider {
    /// Columns of `table`, in declaration order.
    ///
    /// Must fail (not return an empty list) when the table is unknown, so
    /// a broken warehouse handle surfaces as a fatal catalog-build error
    /// rather than a silently empty catalog.
    fn table_columns(&self, table: &str) -> ProviderResult<Vec<ColumnInfo>>;
}

/// Provider backed by a SQLite database (demo database and test fixtures).
pub struct SqliteSchema {
    conn: Connection,
}

impl SqliteSchema {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Open a database file.
    pub fn open<P: AsRef<std::path::Path>>(path: P) -> ProviderResult<Self> {
        Ok(Self {
            conn: Connection::open(path)?,
        })
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> ProviderResult<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    /// Run DDL against the underlying connection.
    pub fn execute_batch(&self, ddl: &str) -> ProviderResult<()> {
        self.conn.execute_batch(ddl)?;
        Ok(())
    }
}

impl SchemaProvider for SqliteSchema {
    fn table_columns(&self, table: &str) -> ProviderResult<Vec<ColumnInfo>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, type FROM pragma_table_info(?1)")?;
        let columns = stmt
            .query_map([table], |row| {
                Ok(ColumnInfo {
                    name: row.get(0)?,
                    declared_type: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        if columns.is_empty() {
            return Err(ProviderError::TableNotFound(table.to_string()));
        }
        Ok(columns)
    }
}

/// Provider over a fixed, in-memory column listing.
///
/// Used when no live warehouse handle exists (the CLI's offline mode) and
/// by unit tests that need exact control over the column set.
#[derive(Debug, Clone, Default)]
pub struct StaticSchema {
    tables: HashMap<String, Vec<ColumnInfo>>,
}

impl StaticSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table's columns as `(name, declared_type)` pairs.
    pub fn with_table(mut self, table: &str, columns: &[(&str, &str)]) -> Self {
        self.tables.insert(
            table.to_string(),
            columns
                .iter()
                .map(|(n, t)| ColumnInfo::new(*n, *t))
                .collect(),
        );
        self
    }

    /// The bundled column layout of the two canonical counting tables.
    ///
    /// Mirrors `assets/schema_description.txt`; lets the CLI resolve
    /// questions without a warehouse connection.
    pub fn bundled() -> Self {
        Self::new()
            .with_table(
                super::BATTING_TABLE,
                &[
                    ("idfg", "integer"),
                    ("name", "text"),
                    ("team", "text"),
                    ("season", "integer"),
                    ("g", "integer"),
                    ("pa", "integer"),
                    ("ab", "integer"),
                    ("h", "integer"),
                    ("doubles", "integer"),
                    ("triples", "integer"),
                    ("hr", "integer"),
                    ("r", "integer"),
                    ("rbi", "integer"),
                    ("bb", "integer"),
                    ("ibb", "integer"),
                    ("so", "integer"),
                    ("hbp", "integer"),
                    ("sb", "integer"),
                    ("cs", "integer"),
                    ("avg", "double precision"),
                    ("obp", "double precision"),
                    ("slg", "double precision"),
                    ("ops", "double precision"),
                ],
            )
            .with_table(
                super::PITCHING_TABLE,
                &[
                    ("idfg", "integer"),
                    ("name", "text"),
                    ("team", "text"),
                    ("season", "integer"),
                    ("w", "integer"),
                    ("l", "integer"),
                    ("g", "integer"),
                    ("gs", "integer"),
                    ("sv", "integer"),
                    ("ip", "numeric"),
                    ("so", "integer"),
                    ("bb", "integer"),
                    ("hr", "integer"),
                    ("era", "double precision"),
                    ("fip", "double precision"),
                    ("whip", "double precision"),
                    ("ra9", "double precision"),
                    ("bb9", "double precision"),
                    ("k9", "double precision"),
                ],
            )
    }
}

impl SchemaProvider for StaticSchema {
    fn table_columns(&self, table: &str) -> ProviderResult<Vec<ColumnInfo>> {
        self.tables
            .get(table)
            .cloned()
            .ok_or_else(|| ProviderError::TableNotFound(table.to_string()))
    }
}
