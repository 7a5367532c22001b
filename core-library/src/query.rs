//! # Collection Query Builder
//!
//! Assembles the `SELECT` statements the collection view runs against the
//! songs table. Predicates are collected as a list of `WHERE` fragments plus a
//! parallel list of bound values; the statement is rendered once, prepared,
//! executed and handed back as a [`CollectionQueryCursor`].
//!
//! ## Binding
//!
//! Every `?` in a fragment has exactly one bound value, pushed at the same time
//! as the fragment. Values are bound positionally in fragment order, so the two
//! lists are only ever appended to together.
//!
//! ## Usage
//!
//! ```ignore
//! let mut query = CollectionQuery::new(adapter, "songs", &options, &SystemClock);
//! query.add_where_artist("Daft Punk");
//! query.add_where_rating("0.8", SqlOperator::Ge);
//! query.set_order_by("track");
//!
//! let mut cursor = query.exec().await?;
//! while cursor.next() {
//!     let title = cursor.value(1);
//! }
//! ```

use crate::error::{LibraryError, Result};
use crate::filter_options::{CollectionFilterOptions, FilterMode};
use crate::models::Song;
use crate::search::{parse_search_rating, SqlOperator};
use bridge_traits::database::{DatabaseAdapter, QueryRow, QueryValue};
use bridge_traits::time::Clock;
use std::sync::Arc;
use tracing::{debug, warn};

/// Tolerance applied to rating comparisons; ratings are stored as floats.
pub const RATING_TOLERANCE: f64 = 0.001;

/// Placeholder replaced by the songs table name when the statement is rendered.
pub const SONGS_TABLE_PLACEHOLDER: &str = "%songs_table";

const DUPLICATES_JOIN: &str = " INNER JOIN (select * from duplicated_songs) dsongs \
     ON (%songs_table.artist = dsongs.dup_artist \
     AND %songs_table.album = dsongs.dup_album \
     AND %songs_table.title = dsongs.dup_title)";

/// Value compared against a column in [`CollectionQuery::add_where`]
#[derive(Debug, Clone, PartialEq)]
pub enum WhereValue {
    /// Written into the statement as a literal instead of being bound.
    Int(i32),
    Long(i64),
    Real(f64),
    /// `None` is bound as an empty string, never as NULL.
    Text(Option<String>),
    /// Elements of an `IN (...)` list, bound one per placeholder.
    List(Vec<QueryValue>),
}

impl WhereValue {
    /// Values bound for this operand, one per placeholder.
    fn into_bound_values(self) -> Vec<QueryValue> {
        match self {
            WhereValue::Int(value) => vec![QueryValue::Integer(value as i64)],
            WhereValue::Long(value) => vec![QueryValue::Integer(value)],
            WhereValue::Real(value) => vec![QueryValue::Real(value)],
            WhereValue::Text(value) => vec![QueryValue::Text(value.unwrap_or_default())],
            WhereValue::List(values) => values,
        }
    }
}

impl From<i32> for WhereValue {
    fn from(value: i32) -> Self {
        WhereValue::Int(value)
    }
}

impl From<i64> for WhereValue {
    fn from(value: i64) -> Self {
        WhereValue::Long(value)
    }
}

impl From<f64> for WhereValue {
    fn from(value: f64) -> Self {
        WhereValue::Real(value)
    }
}

impl From<f32> for WhereValue {
    fn from(value: f32) -> Self {
        WhereValue::Real(value as f64)
    }
}

impl From<&str> for WhereValue {
    fn from(value: &str) -> Self {
        WhereValue::Text(Some(value.to_string()))
    }
}

impl From<String> for WhereValue {
    fn from(value: String) -> Self {
        WhereValue::Text(Some(value))
    }
}

impl From<Option<String>> for WhereValue {
    fn from(value: Option<String>) -> Self {
        WhereValue::Text(value)
    }
}

impl<T: Into<QueryValue>> From<Vec<T>> for WhereValue {
    fn from(values: Vec<T>) -> Self {
        WhereValue::List(values.into_iter().map(Into::into).collect())
    }
}

/// Single-use `SELECT` builder over a songs table
///
/// Construct with [`CollectionQuery::new`], add predicates, then call
/// [`exec`](Self::exec), which consumes the builder.
pub struct CollectionQuery {
    adapter: Arc<dyn DatabaseAdapter>,
    songs_table: String,
    column_spec: String,
    order_by: Option<String>,
    where_clauses: Vec<String>,
    bound_values: Vec<QueryValue>,
    include_unavailable: bool,
    duplicates_only: bool,
    limit: Option<u32>,
}

impl CollectionQuery {
    /// Create a builder for `songs_table`, seeded from the filter options.
    ///
    /// - `max_age` adds `ctime > ?` bound to `now - max_age`, saturating at the
    ///   `i64` range
    /// - [`FilterMode::Duplicates`] joins the `duplicated_songs` view
    /// - [`FilterMode::Untagged`] keeps songs missing artist, album or title
    pub fn new(
        adapter: Arc<dyn DatabaseAdapter>,
        songs_table: impl Into<String>,
        options: &CollectionFilterOptions,
        clock: &dyn Clock,
    ) -> Self {
        let mut query = Self {
            adapter,
            songs_table: songs_table.into(),
            column_spec: Song::COLUMN_SPEC.to_string(),
            order_by: None,
            where_clauses: Vec::new(),
            bound_values: Vec::new(),
            include_unavailable: false,
            duplicates_only: options.filter_mode == FilterMode::Duplicates,
            limit: None,
        };

        if let Some(max_age) = options.max_age {
            // Out-of-range ages clamp instead of overflowing
            let cutoff = clock.unix_timestamp().saturating_sub(max_age);
            query.push_clause("ctime > ?", vec![QueryValue::Integer(cutoff)]);
        }

        if options.filter_mode == FilterMode::Untagged {
            query.push_clause("(artist = '' OR album = '' OR title = '')", Vec::new());
        }

        query
    }

    // The only place clauses and bound values are appended.
    fn push_clause(&mut self, clause: impl Into<String>, values: Vec<QueryValue>) {
        self.where_clauses.push(clause.into());
        self.bound_values.extend(values);
    }

    /// Add `column <op> value`.
    ///
    /// [`SqlOperator::In`] expands to one placeholder per list element. For
    /// other operators `Int` values are inlined as literals and everything else
    /// is bound.
    pub fn add_where(
        &mut self,
        column: &str,
        value: impl Into<WhereValue>,
        op: SqlOperator,
    ) -> &mut Self {
        let value = value.into();

        match value {
            WhereValue::List(values) => {
                if op != SqlOperator::In {
                    warn!(column, op = %op, "List value used with a scalar operator, treating as IN");
                }
                self.push_in(column, values);
            }
            scalar if op == SqlOperator::In => self.push_in(column, scalar.into_bound_values()),
            WhereValue::Int(literal) => {
                self.push_clause(format!("{} {} {}", column, op.as_sql(), literal), Vec::new());
            }
            scalar => {
                self.push_clause(
                    format!("{} {} ?", column, op.as_sql()),
                    scalar.into_bound_values(),
                );
            }
        }
        self
    }

    fn push_in(&mut self, column: &str, values: Vec<QueryValue>) {
        let placeholders = vec!["?"; values.len()].join(",");
        self.push_clause(format!("{} IN ({})", column, placeholders), values);
    }

    /// Match songs by effective album artist: the track artist when no album
    /// artist is tagged, otherwise the album artist.
    pub fn add_where_artist(&mut self, artist: impl Into<String>) -> &mut Self {
        let artist = QueryValue::Text(artist.into());
        self.push_clause(
            "((artist = ? AND albumartist = '') OR albumartist = ?)",
            vec![artist.clone(), artist],
        );
        self
    }

    /// Compare `rating` against a rating typed by the user, with a tolerance of
    /// [`RATING_TOLERANCE`] on either side. Unparseable input compares against 0.
    pub fn add_where_rating(&mut self, rating: &str, op: SqlOperator) -> &mut Self {
        let rating = parse_search_rating(rating);
        let below = rating - RATING_TOLERANCE;
        let above = rating + RATING_TOLERANCE;

        match op {
            SqlOperator::Lt => self.add_where("rating", below, SqlOperator::Lt),
            SqlOperator::Gt => self.add_where("rating", above, SqlOperator::Gt),
            SqlOperator::Le => self.add_where("rating", above, SqlOperator::Le),
            SqlOperator::Ge => self.add_where("rating", below, SqlOperator::Ge),
            SqlOperator::Ne => {
                self.push_clause(
                    "(rating < ? OR rating > ?)",
                    vec![QueryValue::Real(below), QueryValue::Real(above)],
                );
                self
            }
            SqlOperator::Eq | SqlOperator::In => {
                self.add_where("rating", above, SqlOperator::Lt);
                self.add_where("rating", below, SqlOperator::Gt)
            }
        }
    }

    /// Restrict to compilations (`true`) or non-compilations.
    pub fn add_compilation_requirement(&mut self, compilation: bool) -> &mut Self {
        // Unary + keeps SQLite off the compilation index
        self.push_clause(
            format!("+compilation_effective = {}", u8::from(compilation)),
            Vec::new(),
        );
        self
    }

    pub fn set_column_spec(&mut self, column_spec: impl Into<String>) -> &mut Self {
        self.column_spec = column_spec.into();
        self
    }

    pub fn set_order_by(&mut self, order_by: impl Into<String>) -> &mut Self {
        let order_by = order_by.into();
        self.order_by = (!order_by.trim().is_empty()).then_some(order_by);
        self
    }

    pub fn set_include_unavailable(&mut self, include: bool) -> &mut Self {
        self.include_unavailable = include;
        self
    }

    pub fn set_duplicates_only(&mut self, duplicates_only: bool) -> &mut Self {
        self.duplicates_only = duplicates_only;
        self
    }

    pub fn set_limit(&mut self, limit: Option<u32>) -> &mut Self {
        self.limit = limit;
        self
    }

    pub fn songs_table(&self) -> &str {
        &self.songs_table
    }

    pub fn where_clauses(&self) -> &[String] {
        &self.where_clauses
    }

    /// Values bound to the statement, in placeholder order
    pub fn bound_values(&self) -> &[QueryValue] {
        &self.bound_values
    }

    /// Render the statement [`exec`](Self::exec) would run.
    pub fn statement(&self) -> String {
        let mut sql = format!("SELECT {} FROM {}", self.column_spec, self.songs_table);
        if self.duplicates_only {
            sql.push_str(DUPLICATES_JOIN);
        }

        let mut clauses: Vec<&str> = self.where_clauses.iter().map(String::as_str).collect();
        if !self.include_unavailable {
            clauses.push("unavailable = 0");
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        if let Some(order_by) = &self.order_by {
            sql.push_str(" ORDER BY ");
            sql.push_str(order_by);
        }

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        sql.replace(SONGS_TABLE_PLACEHOLDER, &self.songs_table)
    }

    /// Prepare and run the statement.
    ///
    /// A statement that fails to prepare is never executed and yields
    /// [`LibraryError::Prepare`].
    pub async fn exec(self) -> Result<CollectionQueryCursor> {
        let sql = self.statement();

        if let Err(error) = self.adapter.prepare(&sql).await {
            warn!(sql = %sql, error = %error, "Failed to prepare collection query");
            return Err(LibraryError::Prepare {
                sql,
                message: error.to_string(),
            });
        }

        debug!(sql = %sql, bound = self.bound_values.len(), "Executing collection query");
        let rows = self.adapter.query(&sql, &self.bound_values).await?;
        debug!(rows = rows.len(), "Collection query finished");

        Ok(CollectionQueryCursor::new(rows))
    }
}

impl std::fmt::Debug for CollectionQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionQuery")
            .field("sql", &self.statement())
            .field("bound_values", &self.bound_values)
            .finish()
    }
}

/// Rows returned by [`CollectionQuery::exec`]
///
/// Positioned before the first row; call [`next`](Self::next) before reading.
#[derive(Debug, Clone, Default)]
pub struct CollectionQueryCursor {
    rows: Vec<QueryRow>,
    position: Option<usize>,
}

impl CollectionQueryCursor {
    pub fn new(rows: Vec<QueryRow>) -> Self {
        Self {
            rows,
            position: None,
        }
    }

    /// Advance to the next row. Returns false once the rows are exhausted.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> bool {
        let next = self.position.map_or(0, |position| position + 1);
        self.position = Some(next.min(self.rows.len()));
        next < self.rows.len()
    }

    /// Current row
    pub fn row(&self) -> Option<&QueryRow> {
        self.position.and_then(|position| self.rows.get(position))
    }

    /// Column of the current row by position in the select list
    pub fn value(&self, column: usize) -> Option<&QueryValue> {
        self.row().and_then(|row| row.value(column))
    }

    pub fn value_by_name(&self, column: &str) -> Option<&QueryValue> {
        self.row().and_then(|row| row.get(column))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Hydrate every row as a [`Song`]; the query must select
    /// [`Song::COLUMN_SPEC`].
    pub fn into_songs(self) -> Vec<Song> {
        self.rows.iter().map(Song::from_row).collect()
    }

    pub fn into_rows(self) -> Vec<QueryRow> {
        self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use bridge_traits::time::FixedClock;
    use mockall::mock;
    use mockall::predicate::eq;

    mock! {
        Adapter {}

        #[async_trait]
        impl DatabaseAdapter for Adapter {
            async fn health_check(&self) -> BridgeResult<()>;
            async fn close(&self) -> BridgeResult<()>;
            async fn prepare(&self, statement: &str) -> BridgeResult<()>;
            async fn query(&self, query: &str, params: &[QueryValue]) -> BridgeResult<Vec<QueryRow>>;
            async fn execute(&self, statement: &str, params: &[QueryValue]) -> BridgeResult<u64>;
            async fn query_one_optional(
                &self,
                query: &str,
                params: &[QueryValue],
            ) -> BridgeResult<Option<QueryRow>>;
            async fn query_one(&self, query: &str, params: &[QueryValue]) -> BridgeResult<QueryRow>;
        }
    }

    fn query_with(adapter: MockAdapter, options: &CollectionFilterOptions) -> CollectionQuery {
        CollectionQuery::new(
            Arc::new(adapter),
            "songs",
            options,
            &FixedClock::at_unix(1_700_000_000),
        )
    }

    fn query() -> CollectionQuery {
        query_with(MockAdapter::new(), &CollectionFilterOptions::default())
    }

    fn real(value: &QueryValue) -> f64 {
        value.as_f64().unwrap_or(f64::NAN)
    }

    #[test]
    fn test_empty_query_hides_unavailable() {
        let mut query = query();
        query.set_column_spec("title");
        assert_eq!(query.statement(), "SELECT title FROM songs WHERE unavailable = 0");
        assert!(query.bound_values().is_empty());

        query.set_include_unavailable(true);
        assert_eq!(query.statement(), "SELECT title FROM songs");
    }

    #[test]
    fn test_in_list_binds_each_element() {
        let mut query = query();
        query.add_where("track", vec![1, 2, 3], SqlOperator::In);

        assert_eq!(query.where_clauses(), &["track IN (?,?,?)".to_string()]);
        assert_eq!(
            query.bound_values(),
            &[
                QueryValue::Integer(1),
                QueryValue::Integer(2),
                QueryValue::Integer(3)
            ]
        );
    }

    #[test]
    fn test_scalar_in_becomes_single_element_list() {
        let mut query = query();
        query.add_where("genre", "Jazz", SqlOperator::In);
        assert_eq!(query.where_clauses(), &["genre IN (?)".to_string()]);
        assert_eq!(query.bound_values(), &[QueryValue::Text("Jazz".into())]);
    }

    #[test]
    fn test_list_with_scalar_operator_is_treated_as_in() {
        let mut query = query();
        query.add_where("artist", vec!["Air", "Justice"], SqlOperator::Eq);
        assert_eq!(query.where_clauses(), &["artist IN (?,?)".to_string()]);
        assert_eq!(query.bound_values().len(), 2);
    }

    #[test]
    fn test_int_is_inlined() {
        let mut query = query();
        query.add_where("year", 2020, SqlOperator::Eq);
        query.add_where("track", 3, SqlOperator::Ge);

        assert_eq!(
            query.where_clauses(),
            &["year = 2020".to_string(), "track >= 3".to_string()]
        );
        assert!(query.bound_values().is_empty());
    }

    #[test]
    fn test_long_and_null_text_are_bound() {
        let mut query = query();
        query.add_where("ctime", 1_600_000_000i64, SqlOperator::Lt);
        query.add_where("genre", None::<String>, SqlOperator::Eq);

        assert_eq!(
            query.where_clauses(),
            &["ctime < ?".to_string(), "genre = ?".to_string()]
        );
        assert_eq!(
            query.bound_values(),
            &[
                QueryValue::Integer(1_600_000_000),
                QueryValue::Text(String::new())
            ]
        );
    }

    #[test]
    fn test_where_artist_binds_twice() {
        let mut query = query();
        query.add_where_artist("Air");
        assert_eq!(
            query.where_clauses(),
            &["((artist = ? AND albumartist = '') OR albumartist = ?)".to_string()]
        );
        assert_eq!(
            query.bound_values(),
            &[QueryValue::Text("Air".into()), QueryValue::Text("Air".into())]
        );
    }

    #[test]
    fn test_rating_equality_uses_tolerance() {
        let mut query = query();
        query.add_where_rating("4.0", SqlOperator::Eq);

        assert_eq!(
            query.where_clauses(),
            &["rating < ?".to_string(), "rating > ?".to_string()]
        );
        let bound = query.bound_values();
        assert!((real(&bound[0]) - 4.001).abs() < 1e-9);
        assert!((real(&bound[1]) - 3.999).abs() < 1e-9);
    }

    #[test]
    fn test_rating_operators() {
        let cases = [
            (SqlOperator::Lt, "rating < ?", 0.499),
            (SqlOperator::Gt, "rating > ?", 0.501),
            (SqlOperator::Le, "rating <= ?", 0.501),
            (SqlOperator::Ge, "rating >= ?", 0.499),
        ];
        for (op, clause, bound) in cases {
            let mut query = query();
            query.add_where_rating("0.5", op);
            assert_eq!(query.where_clauses(), &[clause.to_string()]);
            assert!((real(&query.bound_values()[0]) - bound).abs() < 1e-9);
        }

        let mut query = query();
        query.add_where_rating("0.5", SqlOperator::Ne);
        assert_eq!(query.where_clauses(), &["(rating < ? OR rating > ?)".to_string()]);
        assert_eq!(query.bound_values().len(), 2);
    }

    #[test]
    fn test_unparseable_rating_compares_against_zero() {
        let mut query = query();
        query.add_where_rating("lots", SqlOperator::Gt);
        assert!((real(&query.bound_values()[0]) - RATING_TOLERANCE).abs() < 1e-9);
    }

    #[test]
    fn test_compilation_requirement_keeps_planner_hint() {
        let mut query = query();
        query.add_compilation_requirement(true);
        query.add_compilation_requirement(false);
        assert_eq!(
            query.where_clauses(),
            &[
                "+compilation_effective = 1".to_string(),
                "+compilation_effective = 0".to_string()
            ]
        );
    }

    #[test]
    fn test_filter_options_seed_clauses() {
        let options = CollectionFilterOptions::default()
            .with_mode(FilterMode::Untagged)
            .with_max_age(3600);
        let query = query_with(MockAdapter::new(), &options);

        assert_eq!(
            query.where_clauses(),
            &[
                "ctime > ?".to_string(),
                "(artist = '' OR album = '' OR title = '')".to_string()
            ]
        );
        assert_eq!(query.bound_values(), &[QueryValue::Integer(1_700_000_000 - 3600)]);
    }

    #[test]
    fn test_max_age_cutoff_saturates() {
        let options = CollectionFilterOptions::default().with_max_age(i64::MIN);
        let query = query_with(MockAdapter::new(), &options);
        assert_eq!(query.where_clauses(), &["ctime > ?".to_string()]);
        assert_eq!(query.bound_values(), &[QueryValue::Integer(i64::MAX)]);

        let options = CollectionFilterOptions::default().with_max_age(-1);
        let query = query_with(MockAdapter::new(), &options);
        assert_eq!(query.bound_values(), &[QueryValue::Integer(1_700_000_001)]);

        let options = CollectionFilterOptions::default().with_max_age(i64::MAX);
        let query = query_with(MockAdapter::new(), &options);
        assert_eq!(
            query.bound_values(),
            &[QueryValue::Integer(1_700_000_000 - i64::MAX)]
        );
    }

    #[test]
    fn test_duplicates_join_order_and_limit() {
        let options = CollectionFilterOptions::default().with_mode(FilterMode::Duplicates);
        let mut query = query_with(MockAdapter::new(), &options);
        query
            .set_column_spec("%songs_table.ROWID, title")
            .set_order_by("artist, album")
            .set_limit(Some(25))
            .add_where("artist", "Air", SqlOperator::Eq);

        assert_eq!(
            query.statement(),
            "SELECT songs.ROWID, title FROM songs INNER JOIN (select * from duplicated_songs) dsongs \
             ON (songs.artist = dsongs.dup_artist AND songs.album = dsongs.dup_album \
             AND songs.title = dsongs.dup_title) \
             WHERE artist = ? AND unavailable = 0 ORDER BY artist, album LIMIT 25"
        );
    }

    #[tokio::test]
    async fn test_exec_binds_values_in_clause_order() {
        let mut adapter = MockAdapter::new();
        adapter.expect_prepare().times(1).returning(|_| Ok(()));
        adapter
            .expect_query()
            .withf(|sql: &str, params: &[QueryValue]| {
                sql.ends_with("WHERE ((artist = ? AND albumartist = '') OR albumartist = ?) AND year = 2001 AND title = ? AND unavailable = 0")
                    && params
                        == [
                            QueryValue::Text("Daft Punk".into()),
                            QueryValue::Text("Daft Punk".into()),
                            QueryValue::Text("Digital Love".into()),
                        ]
            })
            .times(1)
            .returning(|_, _| {
                Ok(vec![
                    QueryRow::new().with("title", QueryValue::Text("Digital Love".into()))
                ])
            });

        let mut query = query_with(adapter, &CollectionFilterOptions::default());
        query
            .add_where_artist("Daft Punk")
            .add_where("year", 2001, SqlOperator::Eq)
            .add_where("title", "Digital Love", SqlOperator::Eq);

        let mut cursor = query.exec().await.unwrap();
        assert_eq!(cursor.len(), 1);
        assert!(cursor.value(0).is_none());
        assert!(cursor.next());
        assert_eq!(
            cursor.value_by_name("title").and_then(QueryValue::as_str),
            Some("Digital Love")
        );
        assert!(!cursor.next());
        assert!(cursor.row().is_none());
    }

    #[tokio::test]
    async fn test_exec_stops_when_prepare_fails() {
        let mut adapter = MockAdapter::new();
        adapter
            .expect_prepare()
            .with(eq("SELECT title FROM songs WHERE bogus( AND unavailable = 0"))
            .times(1)
            .returning(|_| Err(BridgeError::PrepareFailed("near \"(\": syntax error".into())));
        adapter.expect_query().never();

        let mut query = query_with(adapter, &CollectionFilterOptions::default());
        query.set_column_spec("title");
        query.push_clause("bogus(", Vec::new());

        match query.exec().await {
            Err(LibraryError::Prepare { sql, message }) => {
                assert!(sql.contains("bogus("));
                assert!(message.contains("syntax error"));
            }
            other => panic!("expected prepare failure, got {:?}", other.map(|c| c.len())),
        }
    }

    #[test]
    fn test_cursor_on_empty_result() {
        let mut cursor = CollectionQueryCursor::default();
        assert!(cursor.is_empty());
        assert!(!cursor.next());
        assert!(!cursor.next());
        assert!(cursor.value(0).is_none());
    }
}
