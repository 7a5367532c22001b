//! # Collection Filter
//!
//! The search box of the collection view accepts a small query language:
//! whitespace separated tokens, where `tag:value` tokens naming a known song
//! field are matched against that field and everything else is free text.
//!
//! - [`parser`] turns the raw text into a [`FilterQuery`]
//! - [`engine`] decides which nodes of a [`CollectionTree`](crate::tree::CollectionTree)
//!   stay visible for that query

pub mod engine;
pub mod parser;

pub use engine::CollectionFilter;
pub use parser::FilterQuery;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Song field that can be targeted with a `tag:value` token
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterTag {
    AlbumArtist,
    Artist,
    Album,
    Title,
    Genre,
    Composer,
    Performer,
    Grouping,
    FileType,
}

impl FilterTag {
    /// Every recognised tag
    pub const ALL: [FilterTag; 9] = [
        FilterTag::AlbumArtist,
        FilterTag::Artist,
        FilterTag::Album,
        FilterTag::Title,
        FilterTag::Genre,
        FilterTag::Composer,
        FilterTag::Performer,
        FilterTag::Grouping,
        FilterTag::FileType,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterTag::AlbumArtist => "albumartist",
            FilterTag::Artist => "artist",
            FilterTag::Album => "album",
            FilterTag::Title => "title",
            FilterTag::Genre => "genre",
            FilterTag::Composer => "composer",
            FilterTag::Performer => "performer",
            FilterTag::Grouping => "grouping",
            FilterTag::FileType => "filetype",
        }
    }

    /// Case-insensitive lookup by tag name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|tag| tag.as_str().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for FilterTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
