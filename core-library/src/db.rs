//! # Database Connection Pool Module
//!
//! Provides the SQLite connection pool the collection queries run on.
//!
//! ## Features
//!
//! - **WAL Mode**: Enabled for better concurrency (multiple readers, one writer)
//! - **Connection Pooling**: Configurable min/max connections with timeouts
//! - **Statement Caching**: Prepared statement caching per connection
//! - **Foreign Keys**: Enforced for referential integrity
//! - **Health Checks**: Connection validation
//!
//! The songs table is owned by the collection store; this module does not run
//! migrations. [`create_test_pool`] creates the minimal schema the query
//! builder needs so tests can run against a real database.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bridge_traits::database::DatabaseConfig;
//! use core_library::db::create_pool;
//!
//! let pool = create_pool(&DatabaseConfig::new("collection.db")).await?;
//! ```

use crate::models::Song;
use crate::{LibraryError, Result};
use bridge_traits::database::DatabaseConfig;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Schema used by [`create_test_pool`]: the songs table columns the collection
/// queries read, plus the view duplicates-only queries join against.
const TEST_SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS songs (
        title TEXT NOT NULL DEFAULT '',
        album TEXT NOT NULL DEFAULT '',
        artist TEXT NOT NULL DEFAULT '',
        albumartist TEXT NOT NULL DEFAULT '',
        genre TEXT NOT NULL DEFAULT '',
        composer TEXT NOT NULL DEFAULT '',
        performer TEXT NOT NULL DEFAULT '',
        grouping TEXT NOT NULL DEFAULT '',
        year INTEGER NOT NULL DEFAULT 0,
        originalyear INTEGER NOT NULL DEFAULT 0,
        disc INTEGER NOT NULL DEFAULT 0,
        track INTEGER NOT NULL DEFAULT 0,
        filetype TEXT NOT NULL DEFAULT 'unknown',
        bitrate INTEGER NOT NULL DEFAULT 0,
        samplerate INTEGER NOT NULL DEFAULT 0,
        bitdepth INTEGER NOT NULL DEFAULT 0,
        rating REAL NOT NULL DEFAULT -1,
        compilation_effective INTEGER NOT NULL DEFAULT 0,
        unavailable INTEGER NOT NULL DEFAULT 0,
        ctime INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE INDEX IF NOT EXISTS idx_comp_artist ON songs (compilation_effective, artist)",
    "CREATE VIEW IF NOT EXISTS duplicated_songs AS
        SELECT artist AS dup_artist, album AS dup_album, title AS dup_title
        FROM songs
        GROUP BY artist, album, title
        HAVING COUNT(*) > 1",
];

/// Create a configured SQLite connection pool
///
/// This function:
/// 1. Configures SQLite connection options (WAL mode, foreign keys, etc.)
/// 2. Creates a connection pool with the specified configuration
/// 3. Performs a health check
///
/// # Errors
///
/// Returns an error if:
/// - The database URL is invalid or the file cannot be accessed
/// - Connection pool creation fails
/// - Health check fails
pub async fn create_pool(config: &DatabaseConfig) -> Result<Pool<Sqlite>> {
    info!(
        database_url = %config.database_url,
        min_connections = config.min_connections,
        max_connections = config.max_connections,
        "Creating database connection pool"
    );

    let mut connect_options =
        SqliteConnectOptions::from_str(&config.database_url).map_err(LibraryError::Database)?;

    connect_options = connect_options
        // Enable WAL mode for better concurrency
        .journal_mode(SqliteJournalMode::Wal)
        // NORMAL synchronous mode for good balance of safety and speed
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true)
        .create_if_missing(true)
        // 64MB page cache
        .pragma("cache_size", "-64000");

    if config.enable_cache {
        connect_options = connect_options.statement_cache_capacity(config.cache_capacity);
    }

    debug!("SQLite connection options configured");

    let pool = SqlitePoolOptions::new()
        .min_connections(config.min_connections)
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect_with(connect_options)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to create connection pool");
            LibraryError::Database(e)
        })?;

    info!(
        connections = pool.size(),
        "Database connection pool created successfully"
    );

    health_check(&pool).await?;

    Ok(pool)
}

/// Create an in-memory pool with the songs table and `duplicated_songs` view.
///
/// [`DatabaseConfig::in_memory`] uses a single connection, so every query
/// sees the same in-memory database.
pub async fn create_test_pool() -> Result<Pool<Sqlite>> {
    let pool = create_pool(&DatabaseConfig::in_memory()).await?;

    for statement in TEST_SCHEMA {
        sqlx::query(statement).execute(&pool).await?;
    }

    debug!("Test schema created");
    Ok(pool)
}

/// Insert a song into the `songs` table, returning its row id (for testing)
pub async fn insert_test_song(pool: &Pool<Sqlite>, song: &Song) -> Result<i64> {
    let result = sqlx::query(
        "INSERT INTO songs (title, album, artist, albumartist, genre, composer, performer, \
         grouping, year, originalyear, disc, track, filetype, bitrate, samplerate, bitdepth, \
         rating, compilation_effective, unavailable, ctime) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&song.title)
    .bind(&song.album)
    .bind(&song.artist)
    .bind(&song.albumartist)
    .bind(&song.genre)
    .bind(&song.composer)
    .bind(&song.performer)
    .bind(&song.grouping)
    .bind(song.year)
    .bind(song.originalyear)
    .bind(song.disc)
    .bind(song.track)
    .bind(song.filetype.as_str())
    .bind(song.bitrate)
    .bind(song.samplerate)
    .bind(song.bitdepth)
    .bind(song.rating)
    .bind(song.compilation_effective)
    .bind(song.unavailable)
    .bind(song.ctime)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Perform a health check on the connection pool
async fn health_check(pool: &Pool<Sqlite>) -> Result<()> {
    debug!("Performing database health check");

    sqlx::query("SELECT 1").fetch_one(pool).await.map_err(|e| {
        warn!(error = %e, "Database health check failed");
        LibraryError::Database(e)
    })?;

    debug!("Database health check passed");
    Ok(())
}
