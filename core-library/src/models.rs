//! Domain models for the music collection
//!
//! This module contains the song metadata record shared by the query builder,
//! the collection tree and the tree filter, together with its database mapping.

use crate::grouping::GroupBy;
use bridge_traits::database::{QueryRow, QueryValue};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Text used for containers whose grouping key is empty.
pub const UNKNOWN_KEY: &str = "Unknown";

// =============================================================================
// File Types
// =============================================================================

/// Audio container/codec of a song file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    #[default]
    Unknown,
    Wav,
    Flac,
    WavPack,
    OggVorbis,
    OggOpus,
    Mpeg,
    Mp4,
    Asf,
    Aiff,
    Ape,
    Dsf,
}

impl FileType {
    /// Identifier stored in the `filetype` column
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Unknown => "unknown",
            FileType::Wav => "wav",
            FileType::Flac => "flac",
            FileType::WavPack => "wavpack",
            FileType::OggVorbis => "oggvorbis",
            FileType::OggOpus => "oggopus",
            FileType::Mpeg => "mpeg",
            FileType::Mp4 => "mp4",
            FileType::Asf => "asf",
            FileType::Aiff => "aiff",
            FileType::Ape => "ape",
            FileType::Dsf => "dsf",
        }
    }

    /// Human-readable label used for file type containers
    pub fn description(&self) -> &'static str {
        match self {
            FileType::Unknown => UNKNOWN_KEY,
            FileType::Wav => "Wav",
            FileType::Flac => "FLAC",
            FileType::WavPack => "WavPack",
            FileType::OggVorbis => "Ogg Vorbis",
            FileType::OggOpus => "Ogg Opus",
            FileType::Mpeg => "MP3",
            FileType::Mp4 => "MP4 AAC",
            FileType::Asf => "Windows Media audio",
            FileType::Aiff => "AIFF",
            FileType::Ape => "Monkey's Audio",
            FileType::Dsf => "DSF",
        }
    }
}

impl FromStr for FileType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let file_type = match s.trim().to_ascii_lowercase().as_str() {
            "unknown" | "" => FileType::Unknown,
            "wav" => FileType::Wav,
            "flac" => FileType::Flac,
            "wavpack" | "wv" => FileType::WavPack,
            "oggvorbis" | "ogg" => FileType::OggVorbis,
            "oggopus" | "opus" => FileType::OggOpus,
            "mpeg" | "mp3" => FileType::Mpeg,
            "mp4" | "m4a" => FileType::Mp4,
            "asf" | "wma" => FileType::Asf,
            "aiff" => FileType::Aiff,
            "ape" => FileType::Ape,
            "dsf" => FileType::Dsf,
            other => return Err(format!("Unknown file type: {}", other)),
        };
        Ok(file_type)
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

// =============================================================================
// Song
// =============================================================================

/// Song metadata as stored in the songs table
///
/// Numeric fields use `0` for "not set" and `rating` uses `-1.0` for "unrated",
/// matching the column defaults of the songs table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    /// Row identifier in the songs table
    pub id: i64,

    // Tags
    pub title: String,
    pub album: String,
    pub artist: String,
    /// Album artist as tagged; may be empty (see [`Song::effective_albumartist`])
    pub albumartist: String,
    pub genre: String,
    pub composer: String,
    pub performer: String,
    pub grouping: String,
    pub year: i32,
    pub originalyear: i32,
    pub disc: i32,
    pub track: i32,

    // Audio properties
    pub filetype: FileType,
    /// Bitrate in kbps
    pub bitrate: i32,
    /// Sample rate in Hz
    pub samplerate: i32,
    pub bitdepth: i32,

    // Collection state
    /// Rating in `0.0..=1.0`, `-1.0` when unrated
    pub rating: f64,
    pub compilation_effective: bool,
    pub unavailable: bool,
    /// Unix time the song was added to the collection
    pub ctime: i64,
}

impl Default for Song {
    fn default() -> Self {
        Self {
            id: 0,
            title: String::new(),
            album: String::new(),
            artist: String::new(),
            albumartist: String::new(),
            genre: String::new(),
            composer: String::new(),
            performer: String::new(),
            grouping: String::new(),
            year: 0,
            originalyear: 0,
            disc: 0,
            track: 0,
            filetype: FileType::Unknown,
            bitrate: 0,
            samplerate: 0,
            bitdepth: 0,
            rating: -1.0,
            compilation_effective: false,
            unavailable: false,
            ctime: 0,
        }
    }
}

impl Song {
    /// Column list matching [`Song::from_row`]. `%songs_table` is substituted
    /// by the query builder so the row id stays unambiguous under joins.
    pub const COLUMN_SPEC: &'static str = "%songs_table.ROWID AS id, title, album, artist, \
        albumartist, genre, composer, performer, grouping, year, originalyear, disc, track, \
        filetype, bitrate, samplerate, bitdepth, rating, compilation_effective, unavailable, ctime";

    /// Shorthand for the three tags most tests and callers care about
    pub fn new(artist: impl Into<String>, album: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            album: album.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    /// Album artist if tagged, otherwise the track artist
    pub fn effective_albumartist(&self) -> &str {
        if self.albumartist.is_empty() {
            &self.artist
        } else {
            &self.albumartist
        }
    }

    /// Effective original year, falling back to the release year
    pub fn effective_originalyear(&self) -> i32 {
        if self.originalyear > 0 {
            self.originalyear
        } else {
            self.year
        }
    }

    pub fn is_rated(&self) -> bool {
        self.rating >= 0.0
    }

    /// Text of the container this song falls under for a grouping level.
    ///
    /// Returns `None` for [`GroupBy::None`].
    pub fn container_key(&self, group_by: GroupBy) -> Option<String> {
        let key = match group_by {
            GroupBy::None => return None,
            GroupBy::AlbumArtist => or_unknown(self.effective_albumartist()),
            GroupBy::Artist => or_unknown(&self.artist),
            GroupBy::Album => or_unknown(&self.album),
            GroupBy::AlbumDisc => with_disc(or_unknown(&self.album), self.disc),
            GroupBy::YearAlbum => with_year(self.year, &self.album),
            GroupBy::YearAlbumDisc => with_disc(with_year(self.year, &self.album), self.disc),
            GroupBy::OriginalYearAlbum => with_year(self.effective_originalyear(), &self.album),
            GroupBy::OriginalYearAlbumDisc => with_disc(
                with_year(self.effective_originalyear(), &self.album),
                self.disc,
            ),
            GroupBy::Disc => positive_or_unknown(self.disc, |disc| format!("Disc {}", disc)),
            GroupBy::Year => positive_or_unknown(self.year, |year| year.to_string()),
            GroupBy::OriginalYear => {
                positive_or_unknown(self.effective_originalyear(), |year| year.to_string())
            }
            GroupBy::Genre => or_unknown(&self.genre),
            GroupBy::Composer => or_unknown(&self.composer),
            GroupBy::Performer => or_unknown(&self.performer),
            GroupBy::Grouping => or_unknown(&self.grouping),
            GroupBy::FileType => self.filetype.description().to_string(),
            GroupBy::Format => self.format_description(),
            GroupBy::Bitdepth => positive_or_unknown(self.bitdepth, |depth| format!("{} bit", depth)),
            GroupBy::Samplerate => positive_or_unknown(self.samplerate, |rate| format!("{} Hz", rate)),
            GroupBy::Bitrate => positive_or_unknown(self.bitrate, |rate| format!("{} kbps", rate)),
        };
        Some(key)
    }

    fn format_description(&self) -> String {
        let file_type = self.filetype.description();
        if self.bitdepth > 0 && self.samplerate > 0 {
            format!(
                "{} ({}/{:.1})",
                file_type,
                self.bitdepth,
                self.samplerate as f64 / 1000.0
            )
        } else {
            file_type.to_string()
        }
    }

    /// Build a song from a row selected with [`Song::COLUMN_SPEC`].
    ///
    /// Missing or null columns keep their default value.
    pub fn from_row(row: &QueryRow) -> Self {
        let text = |column: &str| {
            row.get(column)
                .and_then(QueryValue::as_string)
                .unwrap_or_default()
        };
        let int = |column: &str| row.get(column).and_then(QueryValue::as_i64).unwrap_or(0);
        // Tag numbers outside the i32 range are treated as unset
        let small_int = |column: &str| i32::try_from(int(column)).unwrap_or_default();

        Self {
            id: int("id"),
            title: text("title"),
            album: text("album"),
            artist: text("artist"),
            albumartist: text("albumartist"),
            genre: text("genre"),
            composer: text("composer"),
            performer: text("performer"),
            grouping: text("grouping"),
            year: small_int("year"),
            originalyear: small_int("originalyear"),
            disc: small_int("disc"),
            track: small_int("track"),
            filetype: text("filetype").parse().unwrap_or_default(),
            bitrate: small_int("bitrate"),
            samplerate: small_int("samplerate"),
            bitdepth: small_int("bitdepth"),
            rating: row
                .get("rating")
                .and_then(QueryValue::as_f64)
                .unwrap_or(-1.0),
            compilation_effective: int("compilation_effective") != 0,
            unavailable: int("unavailable") != 0,
            ctime: int("ctime"),
        }
    }
}

fn or_unknown(value: &str) -> String {
    if value.trim().is_empty() {
        UNKNOWN_KEY.to_string()
    } else {
        value.to_string()
    }
}

fn positive_or_unknown(value: i32, render: impl FnOnce(i32) -> String) -> String {
    if value > 0 {
        render(value)
    } else {
        UNKNOWN_KEY.to_string()
    }
}

fn with_year(year: i32, album: &str) -> String {
    let album = or_unknown(album);
    if year > 0 {
        format!("{} - {}", year, album)
    } else {
        album
    }
}

fn with_disc(text: String, disc: i32) -> String {
    if disc > 0 {
        format!("{} - (Disc {})", text, disc)
    } else {
        text
    }
}
