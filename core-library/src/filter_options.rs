use serde::{Deserialize, Serialize};

/// Which songs a collection query is restricted to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    #[default]
    All,
    /// Songs sharing artist, album and title with another song
    Duplicates,
    /// Songs missing an artist, album or title
    Untagged,
}

/// Options applied when a collection query is created
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionFilterOptions {
    #[serde(default)]
    pub filter_mode: FilterMode,
    /// Only songs added within this many seconds
    #[serde(default)]
    pub max_age: Option<i64>,
    /// Text from the search box
    #[serde(default)]
    pub filter_text: String,
}

impl CollectionFilterOptions {
    pub fn with_mode(mut self, mode: FilterMode) -> Self {
        self.filter_mode = mode;
        self
    }

    pub fn with_max_age(mut self, seconds: i64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    pub fn with_filter_text(mut self, text: impl Into<String>) -> Self {
        self.filter_text = text.into();
        self
    }
}
