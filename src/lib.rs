//! Workspace placeholder crate.
//!
//! Re-exports the collection crates behind features so host applications can
//! depend on `collection-workspace` without wiring each member individually.

#[cfg(feature = "library")]
pub use core_library;
#[cfg(feature = "runtime")]
pub use core_runtime;
