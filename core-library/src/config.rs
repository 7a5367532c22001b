//! # Collection Configuration
//!
//! Settings shared by every query and tree the collection backend builds.

use crate::error::{LibraryError, Result};
use crate::grouping::{GroupBy, Grouping};
use serde::{Deserialize, Serialize};

/// Collection backend configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// Table holding the songs.
    ///
    /// Substituted for `%songs_table` in generated SQL, so it must be a plain
    /// identifier.
    ///
    /// Default: `songs`.
    #[serde(default = "default_songs_table")]
    pub songs_table: String,

    /// Container levels of the collection tree.
    ///
    /// Default: album artist / album.
    #[serde(default)]
    pub grouping: Grouping,

    /// Whether songs whose files went missing are still listed.
    ///
    /// Default: false.
    #[serde(default)]
    pub include_unavailable: bool,

    /// Row limit applied to every query the backend creates.
    ///
    /// Default: unlimited.
    #[serde(default)]
    pub default_limit: Option<u32>,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            songs_table: default_songs_table(),
            grouping: Grouping::default(),
            include_unavailable: false,
            default_limit: None,
        }
    }
}

impl CollectionConfig {
    /// Configuration for a different songs table, e.g. a device or search
    /// result table with the same layout.
    pub fn for_table(table: impl Into<String>) -> Self {
        Self {
            songs_table: table.into(),
            ..Default::default()
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if !is_identifier(&self.songs_table) {
            return Err(LibraryError::Config(format!(
                "songs_table must be a plain identifier, got {:?}",
                self.songs_table
            )));
        }

        if self.grouping.get(0) == GroupBy::None {
            return Err(LibraryError::Config(
                "grouping level 0 cannot be None".to_string(),
            ));
        }

        Ok(())
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

// ============================================================================
// Default Functions (for serde)
// ============================================================================

fn default_songs_table() -> String {
    "songs".to_string()
}
