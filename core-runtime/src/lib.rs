//! # Core Runtime Module
//!
//! Runtime infrastructure shared by the collection crates:
//! - Logging and tracing bootstrap
//! - Runtime error type
//!
//! Library crates only emit `tracing` events; the host calls
//! [`logging::init_logging`] once at startup to decide where they go.

pub mod error;
pub mod logging;

pub use error::{Error, Result};
pub use logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
