//! Grouping scheme of the collection tree

use crate::filter::FilterTag;
use serde::{Deserialize, Serialize};

/// Number of container levels a collection tree can have.
pub const GROUPING_LEVELS: usize = 3;

/// Key a container level groups songs by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    None,
    AlbumArtist,
    Artist,
    Album,
    AlbumDisc,
    YearAlbum,
    YearAlbumDisc,
    OriginalYearAlbum,
    OriginalYearAlbumDisc,
    Disc,
    Year,
    OriginalYear,
    Genre,
    Composer,
    Performer,
    Grouping,
    FileType,
    Format,
    Bitdepth,
    Samplerate,
    Bitrate,
}

impl GroupBy {
    /// Filter tag a container at this level is compared against.
    ///
    /// Levels without a corresponding tag never match a tag-qualified filter.
    pub const fn filter_tag(self) -> Option<FilterTag> {
        match self {
            GroupBy::AlbumArtist => Some(FilterTag::AlbumArtist),
            GroupBy::Artist => Some(FilterTag::Artist),
            GroupBy::Album
            | GroupBy::AlbumDisc
            | GroupBy::YearAlbum
            | GroupBy::YearAlbumDisc
            | GroupBy::OriginalYearAlbum
            | GroupBy::OriginalYearAlbumDisc => Some(FilterTag::Album),
            GroupBy::Genre => Some(FilterTag::Genre),
            GroupBy::Composer => Some(FilterTag::Composer),
            GroupBy::Performer => Some(FilterTag::Performer),
            GroupBy::Grouping => Some(FilterTag::Grouping),
            GroupBy::FileType => Some(FilterTag::FileType),
            GroupBy::Disc
            | GroupBy::Year
            | GroupBy::OriginalYear
            | GroupBy::Format
            | GroupBy::Bitdepth
            | GroupBy::Samplerate
            | GroupBy::Bitrate
            | GroupBy::None => None,
        }
    }
}

/// Group-by keys indexed by container level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Grouping([GroupBy; GROUPING_LEVELS]);

impl Grouping {
    pub const fn new(first: GroupBy, second: GroupBy, third: GroupBy) -> Self {
        Self([first, second, third])
    }

    /// Key for a container level; out-of-range levels are `None`.
    pub fn get(&self, level: usize) -> GroupBy {
        self.0.get(level).copied().unwrap_or(GroupBy::None)
    }

    /// Keys of the levels in use, stopping at the first `None`.
    pub fn levels(&self) -> impl Iterator<Item = GroupBy> + '_ {
        self.0.iter().copied().take_while(|g| *g != GroupBy::None)
    }
}

impl Default for Grouping {
    fn default() -> Self {
        Self::new(GroupBy::AlbumArtist, GroupBy::Album, GroupBy::None)
    }
}
