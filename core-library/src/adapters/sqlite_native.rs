//! Native SQLite Database Adapter
//!
//! Implements the `DatabaseAdapter` trait using `sqlx` with the native SQLite driver.
//!
//! ## Features
//!
//! - Connection pooling via [`crate::db::create_pool`]
//! - Statement preparation without execution (`prepare`)
//! - Rows returned in `SELECT` column order

use async_trait::async_trait;
use bridge_traits::database::{DatabaseAdapter, DatabaseConfig, QueryRow, QueryValue};
use bridge_traits::error::{BridgeError, Result};
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Column, Executor, Pool, Row, Sqlite};
use tracing::{debug, info, warn};

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

/// Native SQLite implementation of DatabaseAdapter
///
/// This adapter wraps a `sqlx::Pool<Sqlite>`.
pub struct SqliteAdapter {
    pool: Pool<Sqlite>,
}

impl SqliteAdapter {
    /// Create a new SqliteAdapter with the given configuration
    ///
    /// # Errors
    ///
    /// Returns error if connection pool creation fails
    pub async fn new(config: DatabaseConfig) -> Result<Self> {
        info!(database_url = %config.database_url, "Creating SQLite database adapter");

        let pool = crate::db::create_pool(&config)
            .await
            .map_err(|e| {
                BridgeError::DatabaseError(format!("Connection pool creation failed: {}", e))
            })?;

        Ok(Self { pool })
    }

    /// Create a new SqliteAdapter from an existing pool
    pub fn from_pool(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying connection pool
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Convert a sqlx row to a QueryRow, keeping column order
    fn row_to_query_row(row: &SqliteRow) -> QueryRow {
        let mut result = QueryRow::new();

        for column in row.columns() {
            let index = column.ordinal();

            // Try to get the value as different types
            let value = if let Ok(v) = row.try_get::<Option<i64>, _>(index) {
                v.map(QueryValue::Integer).unwrap_or(QueryValue::Null)
            } else if let Ok(v) = row.try_get::<Option<f64>, _>(index) {
                v.map(QueryValue::Real).unwrap_or(QueryValue::Null)
            } else if let Ok(v) = row.try_get::<Option<String>, _>(index) {
                v.map(QueryValue::Text).unwrap_or(QueryValue::Null)
            } else if let Ok(v) = row.try_get::<Option<Vec<u8>>, _>(index) {
                v.map(QueryValue::Blob).unwrap_or(QueryValue::Null)
            } else {
                QueryValue::Null
            };

            result.push(column.name(), value);
        }

        result
    }

    /// Bind positional parameters in slice order
    fn bind_params<'q>(query: SqliteQuery<'q>, params: &'q [QueryValue]) -> SqliteQuery<'q> {
        params.iter().fold(query, |query, param| match param {
            QueryValue::Null => query.bind(None::<i64>),
            QueryValue::Integer(i) => query.bind(*i),
            QueryValue::Real(r) => query.bind(*r),
            QueryValue::Text(s) => query.bind(s.as_str()),
            QueryValue::Blob(b) => query.bind(b.as_slice()),
        })
    }
}

#[async_trait]
impl DatabaseAdapter for SqliteAdapter {
    async fn health_check(&self) -> Result<()> {
        debug!("Performing database health check");

        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, "Database health check failed");
                BridgeError::DatabaseError(format!("Health check failed: {}", e))
            })?;

        debug!("Database health check passed");
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        info!("Closing database connection pool");
        self.pool.close().await;
        Ok(())
    }

    async fn prepare(&self, statement: &str) -> Result<()> {
        (&self.pool)
            .prepare(statement)
            .await
            .map(|_| ())
            .map_err(|e| BridgeError::PrepareFailed(e.to_string()))
    }

    async fn query(&self, query: &str, params: &[QueryValue]) -> Result<Vec<QueryRow>> {
        debug!(query = %query, param_count = params.len(), "Executing query");

        let sqlx_query = Self::bind_params(sqlx::query(query), params);

        let rows = sqlx_query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Query failed: {}", e)))?;

        let result: Vec<QueryRow> = rows.iter().map(Self::row_to_query_row).collect();

        debug!(row_count = result.len(), "Query executed successfully");
        Ok(result)
    }

    async fn execute(&self, statement: &str, params: &[QueryValue]) -> Result<u64> {
        debug!(statement = %statement, param_count = params.len(), "Executing statement");

        let result = Self::bind_params(sqlx::query(statement), params)
            .execute(&self.pool)
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Execute failed: {}", e)))?;

        let rows_affected = result.rows_affected();
        debug!(rows_affected, "Statement executed successfully");

        Ok(rows_affected)
    }

    async fn query_one_optional(
        &self,
        query: &str,
        params: &[QueryValue],
    ) -> Result<Option<QueryRow>> {
        debug!(query = %query, param_count = params.len(), "Executing query_one_optional");

        let row = Self::bind_params(sqlx::query(query), params)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Query one optional failed: {}", e)))?;

        Ok(row.as_ref().map(Self::row_to_query_row))
    }

    async fn query_one(&self, query: &str, params: &[QueryValue]) -> Result<QueryRow> {
        self.query_one_optional(query, params)
            .await?
            .ok_or_else(|| BridgeError::DatabaseError("Query returned no rows".to_string()))
    }
}
