//! # Collection Backend
//!
//! Entry point for the collection view: hands out query builders bound to the
//! configured songs table, runs the common song queries and turns their
//! results into a [`CollectionTree`].
//!
//! ## Usage
//!
//! ```ignore
//! let backend = CollectionBackend::from_pool(pool, CollectionConfig::default())?;
//! let options = CollectionFilterOptions::default().with_filter_text("artist:air");
//!
//! let tree = backend.load_tree(&options).await?;
//! let filter = backend.filter(&options);
//! for id in filter.visible_items(&tree) {
//!     // render row
//! }
//! ```

use crate::config::CollectionConfig;
use crate::error::Result;
use crate::filter::CollectionFilter;
use crate::filter_options::CollectionFilterOptions;
use crate::models::Song;
use crate::query::CollectionQuery;
use crate::search::SqlOperator;
use crate::tree::CollectionTree;
use bridge_traits::database::DatabaseAdapter;
use bridge_traits::time::{Clock, SystemClock};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Default ordering of song queries; keeps insertion order.
const DEFAULT_ORDER_BY: &str = "%songs_table.ROWID";

/// Runs collection queries against a songs table
pub struct CollectionBackend {
    adapter: Arc<dyn DatabaseAdapter>,
    config: CollectionConfig,
    clock: Arc<dyn Clock>,
}

impl CollectionBackend {
    /// Create a backend over `adapter`.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::Config`](crate::LibraryError::Config) if the
    /// configuration does not validate.
    pub fn new(adapter: Arc<dyn DatabaseAdapter>, config: CollectionConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            adapter,
            config,
            clock: Arc::new(SystemClock),
        })
    }

    /// Create a backend over an existing SQLite pool.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_pool(pool: sqlx::SqlitePool, config: CollectionConfig) -> Result<Self> {
        let adapter = crate::adapters::SqliteAdapter::from_pool(pool);
        Self::new(Arc::new(adapter), config)
    }

    /// Replace the time source used for `max_age` cutoffs.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &CollectionConfig {
        &self.config
    }

    pub fn adapter(&self) -> Arc<dyn DatabaseAdapter> {
        Arc::clone(&self.adapter)
    }

    /// Query builder for the configured table, seeded from `options` and the
    /// configured unavailable policy and row limit.
    pub fn new_query(&self, options: &CollectionFilterOptions) -> CollectionQuery {
        let mut query = CollectionQuery::new(
            Arc::clone(&self.adapter),
            self.config.songs_table.clone(),
            options,
            self.clock.as_ref(),
        );
        query
            .set_include_unavailable(self.config.include_unavailable)
            .set_limit(self.config.default_limit)
            .set_order_by(DEFAULT_ORDER_BY);
        query
    }

    #[instrument(skip(self, options), fields(mode = ?options.filter_mode))]
    pub async fn all_songs(&self, options: &CollectionFilterOptions) -> Result<Vec<Song>> {
        let songs = self.new_query(options).exec().await?.into_songs();
        debug!(count = songs.len(), "Loaded songs");
        Ok(songs)
    }

    /// Songs whose effective album artist is `artist`.
    #[instrument(skip(self, options))]
    pub async fn songs_by_artist(
        &self,
        artist: &str,
        options: &CollectionFilterOptions,
    ) -> Result<Vec<Song>> {
        let mut query = self.new_query(options);
        query.add_where_artist(artist);
        let songs = query.exec().await?.into_songs();
        debug!(count = songs.len(), "Loaded songs by artist");
        Ok(songs)
    }

    #[instrument(skip(self, options))]
    pub async fn compilation_songs(&self, options: &CollectionFilterOptions) -> Result<Vec<Song>> {
        let mut query = self.new_query(options);
        query.add_compilation_requirement(true);
        let songs = query.exec().await?.into_songs();
        debug!(count = songs.len(), "Loaded compilation songs");
        Ok(songs)
    }

    /// Songs matching a rating expression such as `>=0.8`, `<>0` or `0.6`.
    #[instrument(skip(self, options))]
    pub async fn songs_with_rating(
        &self,
        expression: &str,
        options: &CollectionFilterOptions,
    ) -> Result<Vec<Song>> {
        let (op, value) = SqlOperator::split_prefix(expression);
        let mut query = self.new_query(options);
        query.add_where_rating(value, op);
        let songs = query.exec().await?.into_songs();
        debug!(count = songs.len(), "Loaded songs by rating");
        Ok(songs)
    }

    /// Group songs into a tree using the configured grouping.
    pub fn build_tree(&self, songs: Vec<Song>) -> CollectionTree {
        CollectionTree::from_songs(self.config.grouping, songs)
    }

    /// Load every song matching `options` into a tree.
    pub async fn load_tree(&self, options: &CollectionFilterOptions) -> Result<CollectionTree> {
        let songs = self.all_songs(options).await?;
        Ok(self.build_tree(songs))
    }

    /// Tree filter for the search text in `options`.
    pub fn filter(&self, options: &CollectionFilterOptions) -> CollectionFilter {
        CollectionFilter::new(options.filter_text.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grouping::{GroupBy, Grouping};
    use crate::LibraryError;
    use bridge_traits::time::FixedClock;

    async fn backend(config: CollectionConfig) -> CollectionBackend {
        let pool = crate::db::create_test_pool().await.unwrap();
        CollectionBackend::from_pool(pool, config).unwrap()
    }

    #[tokio::test]
    async fn test_rejects_invalid_config() {
        let pool = crate::db::create_test_pool().await.unwrap();
        let config = CollectionConfig {
            grouping: Grouping::new(GroupBy::None, GroupBy::None, GroupBy::None),
            ..Default::default()
        };
        assert!(matches!(
            CollectionBackend::from_pool(pool, config),
            Err(LibraryError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_new_query_applies_config() {
        let config = CollectionConfig {
            include_unavailable: true,
            default_limit: Some(10),
            ..Default::default()
        };
        let backend = backend(config)
            .await
            .with_clock(Arc::new(FixedClock::at_unix(1_000)));

        let mut query = backend.new_query(&CollectionFilterOptions::default().with_max_age(100));
        query.set_column_spec("title");

        assert_eq!(
            query.statement(),
            "SELECT title FROM songs WHERE ctime > ? ORDER BY songs.ROWID LIMIT 10"
        );
        assert_eq!(
            query.bound_values(),
            &[bridge_traits::database::QueryValue::Integer(900)]
        );
    }

    #[tokio::test]
    async fn test_filter_uses_option_text() {
        let backend = backend(CollectionConfig::default()).await;
        let filter =
            backend.filter(&CollectionFilterOptions::default().with_filter_text("genre:jazz miles"));
        assert_eq!(filter.query().free_text(), "miles");
    }
}
