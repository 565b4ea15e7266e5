use std::path::{Path, PathBuf};

use super::TrackJob;
use crate::{
    engine::{Batch, BatchError, ItemKey},
    management::album_track_path,
    types::{Album, Format, Track},
};

/// Items for every track of `album`, written into `album_dir`.
///
/// Tracks are numbered by their position in the album listing. A track id
/// the listing repeats gets its position appended to its key, so every entry
/// is downloaded.
pub fn album_batch(
    album: &Album,
    album_dir: &Path,
    format: Format,
) -> Result<Batch<TrackJob>, BatchError> {
    let mut batch = Batch::new();
    append_album(&mut batch, album, None, album_dir, format)?;
    Ok(batch)
}

pub fn single_track_batch(
    track: &Track,
    destination: PathBuf,
) -> Result<Batch<TrackJob>, BatchError> {
    let mut batch = Batch::new();
    batch.push(
        track.id.to_string(),
        track.title.clone(),
        destination,
        TrackJob::single(track.clone()),
    )?;
    Ok(batch)
}

/// One batch spanning all tracks of all given albums.
///
/// Keys are prefixed with the album id, since the same track can show up on
/// several releases of an artist. Alongside the batch, the album names with
/// the keys of their tracks are returned for grouped progress display.
pub fn artist_batch(
    albums: &[(Album, PathBuf)],
    artist_name: &str,
    format: Format,
) -> Result<(Batch<TrackJob>, Vec<(String, Vec<ItemKey>)>), BatchError> {
    let mut batch = Batch::new();
    let mut groups = Vec::with_capacity(albums.len());

    for (album, dir) in albums {
        let keys = append_album(&mut batch, album, Some(artist_name), dir, format)?;
        groups.push((album.title.clone(), keys));
    }

    Ok((batch, groups))
}

fn append_album(
    batch: &mut Batch<TrackJob>,
    album: &Album,
    fallback_artist: Option<&str>,
    album_dir: &Path,
    format: Format,
) -> Result<Vec<ItemKey>, BatchError> {
    let total = album.tracks.len() as u32;
    let mut keys = Vec::with_capacity(album.tracks.len());

    for (index, track) in album.tracks.iter().enumerate() {
        let number = index + 1;
        let key = match fallback_artist {
            Some(_) => ItemKey::from(format!("{}/{}", album.id, track.id)),
            None => ItemKey::from(track.id.to_string()),
        };
        let key = if batch.contains(&key) {
            ItemKey::from(format!("{}#{}", key, number))
        } else {
            key
        };

        let artist = [album.artist.as_str(), track.artist.as_str()]
            .into_iter()
            .chain(fallback_artist)
            .find(|name| !name.is_empty())
            .unwrap_or_default()
            .to_string();

        let job = TrackJob {
            track: track.clone(),
            album: album.title.clone(),
            artist,
            release_date: album
                .release_date
                .clone()
                .or_else(|| track.release_date.clone()),
            cover_url: album.cover.clone().or_else(|| track.cover.clone()),
            track_number: Some(number as u32),
            total_tracks: Some(total),
        };

        let destination = album_track_path(album_dir, number, &track.title, format);
        let item = batch.push(key, track.title.clone(), destination, job)?;
        keys.push(item.key().clone());
    }

    Ok(keys)
}
