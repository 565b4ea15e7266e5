use std::fmt;

use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// Catalog identifier. The API sends ids as JSON numbers for some resources
/// and as strings for others, both forms are accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawId")]
pub struct CatalogId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(i64),
    Text(String),
}

impl From<RawId> for CatalogId {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Number(n) => CatalogId(n.to_string()),
            RawId::Text(s) => CatalogId(s.trim().to_string()),
        }
    }
}

impl CatalogId {
    pub fn new(id: impl Into<String>) -> Self {
        CatalogId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The API answers unknown albums with an empty record whose id is `0`.
    pub fn is_unset(&self) -> bool {
        self.0.is_empty() || self.0 == "0"
    }
}

impl fmt::Display for CatalogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Track {
    pub id: CatalogId,
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(rename = "albumTitle", default)]
    pub album: String,
    #[serde(rename = "albumCover", default)]
    pub cover: Option<String>,
    #[serde(rename = "releaseDate", default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub duration: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Album {
    pub id: CatalogId,
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub cover: Option<String>,
    #[serde(rename = "releaseDate", default)]
    pub release_date: Option<String>,
    #[serde(rename = "trackCount", default)]
    pub track_count: u32,
    #[serde(default)]
    pub tracks: Vec<Track>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Artist {
    pub id: CatalogId,
    pub name: String,
    #[serde(rename = "albumsCount", default)]
    pub albums_count: u32,
    #[serde(skip)]
    pub albums: Vec<Album>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlbumResponse {
    pub album: Album,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscographyResponse {
    pub artist: Artist,
    #[serde(default)]
    pub albums: Vec<Album>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResults {
    #[serde(default)]
    pub tracks: Vec<Track>,
    #[serde(default)]
    pub albums: Vec<Album>,
    #[serde(default)]
    pub artists: Vec<Artist>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamUrlResponse {
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub obtained_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Flac,
    Mp3,
}

impl Format {
    /// Quality selector understood by the stream endpoint.
    pub fn quality(&self) -> u8 {
        match self {
            Format::Flac => 27,
            Format::Mp3 => 5,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Format::Flac => "flac",
            Format::Mp3 => "mp3",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    Track,
    Album,
    Artist,
}

impl SearchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchKind::Track => "track",
            SearchKind::Album => "album",
            SearchKind::Artist => "artist",
        }
    }
}

impl fmt::Display for SearchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Tabled)]
pub struct SearchTableRow {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub details: String,
}
