use super::{ApiError, DabClient};
use crate::types::{
    Album, AlbumResponse, Artist, CatalogId, DiscographyResponse, SearchKind, SearchResults, Track,
};

/// Searches the catalog for tracks, albums or artists.
///
/// Only the list matching `kind` is filled in the returned results.
pub async fn search(
    client: &DabClient,
    query: &str,
    kind: SearchKind,
) -> Result<SearchResults, ApiError> {
    if query.trim().is_empty() {
        return Err(ApiError::NotFound("empty search query".to_string()));
    }

    client
        .get_json::<SearchResults>("api/search", &[("q", query), ("type", kind.as_str())])
        .await
}

/// Fetches an album including its track listing.
///
/// An unknown id is reported as [`ApiError::NotFound`], whether the API
/// answers with `404` or with an empty album record.
pub async fn get_album(client: &DabClient, album_id: &str) -> Result<Album, ApiError> {
    let response = client
        .get_json::<AlbumResponse>("api/album", &[("albumId", album_id)])
        .await
        .map_err(|e| not_found_as(e, || format!("album {}", album_id)))?;

    if response.album.id.is_unset() {
        return Err(ApiError::NotFound(format!("album {}", album_id)));
    }

    Ok(response.album)
}

/// Fetches the metadata of a single track.
///
/// The API has no track endpoint, so the track is looked up through search
/// by its id. An exact id match is preferred over the first hit.
pub async fn get_track(client: &DabClient, track_id: &str) -> Result<Track, ApiError> {
    if track_id.trim().parse::<u64>().is_err() {
        return Err(ApiError::NotFound(format!("track {}", track_id)));
    }

    let results = search(client, track_id, SearchKind::Track)
        .await
        .map_err(|e| not_found_as(e, || format!("track {}", track_id)))?;

    let wanted = CatalogId::new(track_id.trim());
    let mut tracks = results.tracks.into_iter();
    let first = tracks.next();
    match first {
        Some(track) if track.id == wanted => Ok(track),
        Some(track) => Ok(tracks.find(|t| t.id == wanted).unwrap_or(track)),
        None => Err(ApiError::NotFound(format!("track {}", track_id))),
    }
}

/// Fetches an artist together with the albums of their discography.
///
/// The albums come without track listings; use [`get_album`] for each of
/// them before downloading.
pub async fn get_discography(client: &DabClient, artist_id: &str) -> Result<Artist, ApiError> {
    let response = client
        .get_json::<DiscographyResponse>("api/discography", &[("artistId", artist_id)])
        .await
        .map_err(|e| not_found_as(e, || format!("artist {}", artist_id)))?;

    if response.artist.id.is_unset() && response.albums.is_empty() {
        return Err(ApiError::NotFound(format!("artist {}", artist_id)));
    }

    let mut artist = response.artist;
    artist.albums = response.albums;
    Ok(artist)
}

fn not_found_as(error: ApiError, what: impl FnOnce() -> String) -> ApiError {
    if error.is_not_found() {
        ApiError::NotFound(what())
    } else {
        error
    }
}
