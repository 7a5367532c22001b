//! # Host Bridge Traits
//!
//! Capabilities the collection core needs from its host but does not own.
//!
//! ## Overview
//!
//! The collection core renders SQL and filters trees; it never opens a
//! database or reads the wall clock directly. Those capabilities are expressed
//! here as traits so that the desktop host can plug in SQLite while tests
//! substitute in-memory pools, mocks and fixed clocks.
//!
//! ## Traits
//!
//! - [`DatabaseAdapter`](database::DatabaseAdapter) - Prepared statements with
//!   positional `?` parameters returning ordered rows
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type. Platform
//! implementations should convert driver errors into it and keep the original
//! message, since it ends up in user-facing diagnostics.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` on native targets (see
//! [`PlatformSendSync`](platform::PlatformSendSync)).

pub mod database;
pub mod error;
pub mod platform;
pub mod time;

pub use error::BridgeError;

pub use database::{DatabaseAdapter, DatabaseConfig, QueryRow, QueryValue};
pub use time::{Clock, FixedClock, SystemClock};
