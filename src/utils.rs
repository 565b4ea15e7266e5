use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};

use crate::types::{Album, Artist, Format, SearchKind, SearchResults, SearchTableRow, Track};

const FORBIDDEN_CHARS: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Makes a catalog name safe to use as a single path component.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if FORBIDDEN_CHARS.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();

    let trimmed = cleaned.trim().trim_end_matches('.').trim();
    if trimmed.is_empty() || trimmed == "." || trimmed == ".." {
        return "_".to_string();
    }

    trimmed.to_string()
}

/// File name of a track inside an album directory, e.g. `03 - Title.flac`.
pub fn album_track_file_name(position: usize, title: &str, format: Format) -> String {
    format!(
        "{position:02} - {title}.{ext}",
        position = position,
        title = sanitize_filename(title),
        ext = format.extension()
    )
}

pub fn single_track_file_name(title: &str, format: Format) -> String {
    format!("{}.{}", sanitize_filename(title), format.extension())
}

/// Sibling path attempt number `attempt` writes into before it is complete.
///
/// Each attempt gets its own file, so a retry never shares a path with a
/// previous attempt that is still winding down.
pub fn partial_path(destination: &Path, attempt: u64) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(format!(".{}.part", attempt));
    destination.with_file_name(name)
}

pub fn parse_format(s: &str) -> Result<Format, String> {
    match s.trim().to_lowercase().as_str() {
        "" | "flac" => Ok(Format::Flac),
        "mp3" => Ok(Format::Mp3),
        other => Err(format!(
            "Invalid audio format '{}', you must choose between mp3 or flac",
            other
        )),
    }
}

pub fn parse_search_kind(s: &str) -> Result<SearchKind, String> {
    match s.trim().to_lowercase().as_str() {
        "track" => Ok(SearchKind::Track),
        "album" => Ok(SearchKind::Album),
        "artist" => Ok(SearchKind::Artist),
        other => Err(format!(
            "Invalid search type '{}', you can search only by: track, album and artist",
            other
        )),
    }
}

/// Extracts the year of a release date in `YYYY`, `YYYY-MM` or `YYYY-MM-DD` form.
pub fn release_year(date: &str) -> Option<i32> {
    let date = date.trim();
    if let Ok(parsed) = NaiveDate::parse_from_str(date.get(..10).unwrap_or(date), "%Y-%m-%d") {
        return Some(parsed.year());
    }

    date.get(..4).and_then(|year| year.parse::<i32>().ok())
}

pub fn search_rows(results: &SearchResults, kind: SearchKind) -> Vec<SearchTableRow> {
    match kind {
        SearchKind::Track => results.tracks.iter().map(track_row).collect(),
        SearchKind::Album => results.albums.iter().map(album_row).collect(),
        SearchKind::Artist => results.artists.iter().map(artist_row).collect(),
    }
}

fn track_row(track: &Track) -> SearchTableRow {
    SearchTableRow {
        id: track.id.to_string(),
        title: track.title.clone(),
        artist: track.artist.clone(),
        details: track.album.clone(),
    }
}

fn album_row(album: &Album) -> SearchTableRow {
    SearchTableRow {
        id: album.id.to_string(),
        title: album.title.clone(),
        artist: album.artist.clone(),
        details: format!(
            "{} tracks, {}",
            album.track_count,
            album.release_date.as_deref().unwrap_or("unknown date")
        ),
    }
}

fn artist_row(artist: &Artist) -> SearchTableRow {
    SearchTableRow {
        id: artist.id.to_string(),
        title: String::new(),
        artist: artist.name.clone(),
        details: format!("{} albums", artist.albums_count),
    }
}
