use std::path::Path;

use id3::TagLike;
use metaflac::block::PictureType;
use thiserror::Error;

use crate::{types::Format, utils};

#[derive(Debug, Error)]
pub enum TagError {
    #[error("unable to write ID3 tags: {0}")]
    Id3(#[from] id3::Error),

    #[error("unable to write FLAC tags: {0}")]
    Flac(#[from] metaflac::Error),
}

/// Metadata embedded into a downloaded file.
#[derive(Debug, Clone, Default)]
pub struct TagBundle {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub date: Option<String>,
    pub track_number: Option<u32>,
    pub total_tracks: Option<u32>,
    pub cover: Option<Vec<u8>>,
}

/// Writes `bundle` into the file at `path`, replacing tags it already has.
///
/// Blocking; run it on a blocking thread from async code.
pub fn write_tags(path: &Path, format: Format, bundle: &TagBundle) -> Result<(), TagError> {
    match format {
        Format::Mp3 => write_id3(path, bundle),
        Format::Flac => write_vorbis(path, bundle),
    }
}

fn write_id3(path: &Path, bundle: &TagBundle) -> Result<(), TagError> {
    let mut tag = id3::Tag::new();

    tag.set_title(bundle.title.as_str());
    tag.set_artist(bundle.artist.as_str());
    tag.set_album(bundle.album.as_str());
    tag.set_album_artist(bundle.artist.as_str());

    if let Some(year) = bundle.date.as_deref().and_then(utils::release_year) {
        tag.set_year(year);
    }
    if let Some(track) = bundle.track_number {
        tag.set_track(track);
    }
    if let Some(total) = bundle.total_tracks {
        tag.set_total_tracks(total);
    }

    if let Some(data) = bundle.cover.as_ref().filter(|data| !data.is_empty()) {
        tag.add_frame(id3::frame::Picture {
            mime_type: cover_mime_type(data).to_string(),
            picture_type: id3::frame::PictureType::CoverFront,
            description: "Cover".to_string(),
            data: data.clone(),
        });
    }

    tag.write_to_path(path, id3::Version::Id3v24)?;
    Ok(())
}

fn write_vorbis(path: &Path, bundle: &TagBundle) -> Result<(), TagError> {
    let mut tag = metaflac::Tag::read_from_path(path)?;

    tag.set_vorbis("TITLE", vec![bundle.title.clone()]);
    tag.set_vorbis("ARTIST", vec![bundle.artist.clone()]);
    tag.set_vorbis("ALBUM", vec![bundle.album.clone()]);
    tag.set_vorbis("ALBUMARTIST", vec![bundle.artist.clone()]);

    if let Some(date) = &bundle.date {
        tag.set_vorbis("DATE", vec![date.clone()]);
    }
    if let Some(track) = bundle.track_number {
        tag.set_vorbis("TRACKNUMBER", vec![track.to_string()]);
    }
    if let Some(total) = bundle.total_tracks {
        tag.set_vorbis("TRACKTOTAL", vec![total.to_string()]);
    }

    if let Some(data) = bundle.cover.as_ref().filter(|data| !data.is_empty()) {
        tag.remove_picture_type(PictureType::CoverFront);
        tag.add_picture(cover_mime_type(data), PictureType::CoverFront, data.clone());
    }

    tag.save()?;
    Ok(())
}

/// Guesses the MIME type of cover art from its magic bytes.
pub fn cover_mime_type(data: &[u8]) -> &'static str {
    if data.starts_with(&[0x89, b'P', b'N', b'G']) {
        "image/png"
    } else if data.starts_with(b"RIFF") && data.get(8..12) == Some(b"WEBP") {
        "image/webp"
    } else {
        "image/jpeg"
    }
}
