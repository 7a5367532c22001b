//! Database Abstraction Layer
//!
//! Provides a platform-agnostic trait for the database operations the
//! collection core performs: preparing dynamically assembled statements,
//! running them with positional `?` parameters and reading back ordered rows.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_traits::database::{DatabaseAdapter, QueryValue};
//!
//! adapter.prepare("SELECT title FROM songs WHERE artist = ?").await?;
//! let rows = adapter
//!     .query(
//!         "SELECT title FROM songs WHERE artist = ?",
//!         &[QueryValue::Text("Daft Punk".into())],
//!     )
//!     .await?;
//! let title = rows[0].value(0);
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::{error::Result, platform::PlatformSendSync};

// =============================================================================
// Configuration
// =============================================================================

/// Database configuration for cross-platform initialization
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database file path or connection string
    pub database_url: String,

    /// Minimum number of connections in the pool
    pub min_connections: u32,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Maximum time to wait for a connection (seconds)
    pub acquire_timeout_secs: u64,

    /// Enable statement caching
    pub enable_cache: bool,

    /// Statement cache capacity
    pub cache_capacity: usize,
}

impl DatabaseConfig {
    /// Create a new database configuration with the given file path
    pub fn new(database_path: impl Into<PathBuf>) -> Self {
        let path = database_path.into();
        let database_url = format!("sqlite:{}", path.display());

        Self {
            database_url,
            max_connections: 5,
            ..Self::in_memory()
        }
    }

    /// Create a configuration for an in-memory database
    ///
    /// Limited to a single connection: every SQLite connection to
    /// `sqlite::memory:` opens its own private database.
    pub fn in_memory() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            min_connections: 1,
            max_connections: 1,
            acquire_timeout_secs: 30,
            enable_cache: true,
            cache_capacity: 100,
        }
    }

    /// Set the maximum number of pooled connections
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Set the statement cache capacity (0 disables caching)
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.enable_cache = capacity > 0;
        self.cache_capacity = capacity;
        self
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::in_memory()
    }
}

// =============================================================================
// Query Result Types
// =============================================================================

/// Represents a database value that can be null, integer, real, text, or blob
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QueryValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl QueryValue {
    /// Convert to i64 if possible
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            QueryValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Convert to f64 if possible
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            QueryValue::Real(r) => Some(*r),
            QueryValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Convert to &str if possible
    pub fn as_str(&self) -> Option<&str> {
        match self {
            QueryValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Convert to String (owned) if possible
    pub fn as_string(&self) -> Option<String> {
        self.as_str().map(str::to_string)
    }

    /// Interpret as a SQLite boolean (any non-zero integer)
    pub fn as_bool(&self) -> Option<bool> {
        self.as_i64().map(|v| v != 0)
    }

    /// Check if value is null
    pub fn is_null(&self) -> bool {
        matches!(self, QueryValue::Null)
    }
}

impl From<i64> for QueryValue {
    fn from(value: i64) -> Self {
        QueryValue::Integer(value)
    }
}

impl From<i32> for QueryValue {
    fn from(value: i32) -> Self {
        QueryValue::Integer(value as i64)
    }
}

impl From<f64> for QueryValue {
    fn from(value: f64) -> Self {
        QueryValue::Real(value)
    }
}

impl From<f32> for QueryValue {
    fn from(value: f32) -> Self {
        QueryValue::Real(value as f64)
    }
}

impl From<bool> for QueryValue {
    fn from(value: bool) -> Self {
        QueryValue::Integer(value as i64)
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Text(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Text(value)
    }
}

/// A single result row, keeping the column order of the `SELECT` list.
///
/// Columns can be read positionally (`value`) or by name (`get`). Name lookup
/// returns the first column with that name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryRow {
    columns: Vec<String>,
    values: Vec<QueryValue>,
}

impl QueryRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column to the end of the row.
    pub fn push(&mut self, column: impl Into<String>, value: QueryValue) {
        self.columns.push(column.into());
        self.values.push(value);
    }

    /// Builder form of [`push`](Self::push).
    pub fn with(mut self, column: impl Into<String>, value: QueryValue) -> Self {
        self.push(column, value);
        self
    }

    /// Value at the zero-based column position.
    pub fn value(&self, index: usize) -> Option<&QueryValue> {
        self.values.get(index)
    }

    /// Value of the named column.
    pub fn get(&self, column: &str) -> Option<&QueryValue> {
        self.columns
            .iter()
            .position(|name| name == column)
            .and_then(|index| self.values.get(index))
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// =============================================================================
// Database Adapter Trait
// =============================================================================

/// Database adapter trait for cross-platform database operations
///
/// ## Thread Safety
///
/// Implementations must be thread-safe on native targets (`Send + Sync`).
///
/// ## Parameters
///
/// Statements use positional `?` placeholders. `params` are bound in slice
/// order, so callers must keep their placeholder order and value order in
/// lock-step.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait DatabaseAdapter: PlatformSendSync {
    /// Check if the database connection is healthy
    async fn health_check(&self) -> Result<()>;

    /// Close all database connections
    async fn close(&self) -> Result<()>;

    /// Compile a statement without executing it.
    ///
    /// Returns [`BridgeError::PrepareFailed`](crate::BridgeError::PrepareFailed)
    /// when the SQL does not compile (syntax errors, unknown tables or columns).
    async fn prepare(&self, statement: &str) -> Result<()>;

    /// Execute a query and return all rows
    ///
    /// This method must use parameterized queries. Never concatenate user
    /// input directly into the query string.
    async fn query(&self, query: &str, params: &[QueryValue]) -> Result<Vec<QueryRow>>;

    /// Execute a statement that doesn't return rows, returning rows affected
    async fn execute(&self, statement: &str, params: &[QueryValue]) -> Result<u64>;

    /// Execute a query and return a single optional row
    async fn query_one_optional(
        &self,
        query: &str,
        params: &[QueryValue],
    ) -> Result<Option<QueryRow>>;

    /// Execute a query and return exactly one row
    async fn query_one(&self, query: &str, params: &[QueryValue]) -> Result<QueryRow>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_value_conversions() {
        let int_val = QueryValue::Integer(42);
        assert_eq!(int_val.as_i64(), Some(42));
        assert_eq!(int_val.as_f64(), Some(42.0));
        assert_eq!(int_val.as_bool(), Some(true));
        assert!(int_val.as_str().is_none());

        let text_val = QueryValue::Text("hello".to_string());
        assert_eq!(text_val.as_str(), Some("hello"));
        assert_eq!(text_val.as_string(), Some("hello".to_string()));
        assert!(text_val.as_i64().is_none());

        let null_val = QueryValue::Null;
        assert!(null_val.is_null());
        assert!(null_val.as_i64().is_none());
    }

    #[test]
    fn test_query_value_from() {
        assert_eq!(QueryValue::from(7i32), QueryValue::Integer(7));
        assert_eq!(QueryValue::from(true), QueryValue::Integer(1));
        assert_eq!(QueryValue::from("x"), QueryValue::Text("x".into()));
        assert_eq!(QueryValue::from(0.5f64), QueryValue::Real(0.5));
    }

    #[test]
    fn test_query_row_keeps_column_order() {
        let row = QueryRow::new()
            .with("title", QueryValue::Text("Aerodynamic".into()))
            .with("year", QueryValue::Integer(2001));

        assert_eq!(row.len(), 2);
        assert_eq!(row.value(0).and_then(QueryValue::as_str), Some("Aerodynamic"));
        assert_eq!(row.value(1).and_then(QueryValue::as_i64), Some(2001));
        assert_eq!(row.get("year").and_then(QueryValue::as_i64), Some(2001));
        assert!(row.value(2).is_none());
        assert!(row.get("album").is_none());
        assert_eq!(row.columns(), &["title".to_string(), "year".to_string()]);
    }

    #[test]
    fn test_database_config_builder() {
        let config = DatabaseConfig::in_memory();
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.min_connections, 1);
        assert_eq!(config.max_connections, 1);
        assert_eq!(config.acquire_timeout_secs, 30);
        assert!(config.enable_cache);
        assert_eq!(config.cache_capacity, 100);

        let config = DatabaseConfig::in_memory().max_connections(4).cache_capacity(0);
        assert_eq!(config.max_connections, 4);
        assert!(!config.enable_cache);
    }

    #[test]
    fn test_database_config_from_path() {
        let config = DatabaseConfig::new("collection.db");
        assert_eq!(config.database_url, "sqlite:collection.db");
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.min_connections, 1);
    }
}
