//! # Collection Library Module
//!
//! Owns the logic behind the collection view: what the user typed into the
//! search box, which rows of the collection tree stay visible, and which SQL
//! is sent to the song database.
//!
//! ## Overview
//!
//! This module provides:
//! - The [`Song`](models::Song) metadata record and its row mapping
//! - A filter mini-language (`artist:daft punk`) parsed by [`filter::FilterQuery`]
//! - The [`CollectionTree`](tree::CollectionTree) arena and its grouping scheme
//! - A tree filter ([`filter::CollectionFilter`]) deciding per-node visibility
//! - A single-use SQL builder ([`query::CollectionQuery`]) with positional binds
//! - [`CollectionBackend`](backend::CollectionBackend), tying queries, config and
//!   tree construction together

pub mod adapters;
pub mod backend;
pub mod config;
#[cfg(not(target_arch = "wasm32"))]
pub mod db;
pub mod error;
pub mod filter;
pub mod filter_options;
pub mod grouping;
pub mod models;
pub mod query;
pub mod search;
pub mod tree;

pub use backend::CollectionBackend;
pub use config::CollectionConfig;
pub use error::{LibraryError, Result};
pub use filter::{CollectionFilter, FilterQuery, FilterTag};
pub use filter_options::{CollectionFilterOptions, FilterMode};
pub use grouping::{GroupBy, Grouping};
pub use models::{FileType, Song};
pub use query::{CollectionQuery, CollectionQueryCursor, WhereValue};
pub use search::{parse_search_rating, SqlOperator};
pub use tree::{CollectionItem, CollectionTree, ItemType, NodeId};
