//! Database adapter implementations
//!
//! Concrete implementations of the `DatabaseAdapter` trait.

#[cfg(not(target_arch = "wasm32"))]
pub mod sqlite_native;

#[cfg(not(target_arch = "wasm32"))]
pub use sqlite_native::SqliteAdapter;
