use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::{
    config::{self, EngineConfig},
    dab::{DabClient, catalog},
    download::Downloader,
    engine::DownloadReport,
    error, info,
    management::Library,
    success,
    types::Format,
    warning,
};

pub async fn download_track(track_id: &str, format: Format, cancel: CancellationToken) {
    let client = Arc::new(super::session_client().await);

    let track = match catalog::get_track(&client, track_id).await {
        Ok(track) => track,
        Err(e) if e.is_not_found() => error!("Track {} not found", track_id),
        Err(e) => error!("Cannot load track {}. Err: {}", track_id, e),
    };

    info!("Starting download for track {} by {}", track.title, track.artist);
    let downloader = downloader(client, cancel.clone()).await;
    match downloader.track(&track, format).await {
        Ok(report) => summarize(report, &track.title, &cancel),
        Err(e) if e.is_already_downloaded() => {
            warning!("Track {} is already downloaded", track.title)
        }
        Err(e) => error!("Cannot download track {}. Err: {}", track.title, e),
    }
}

pub async fn download_album(album_id: &str, format: Format, cancel: CancellationToken) {
    let client = Arc::new(super::session_client().await);

    let album = match catalog::get_album(&client, album_id).await {
        Ok(album) => album,
        Err(e) if e.is_not_found() => error!("Album {} not found", album_id),
        Err(e) => error!("Cannot load album {}. Err: {}", album_id, e),
    };

    info!(
        "Starting download for album {} by {} ({} tracks)",
        album.title,
        album.artist,
        album.tracks.len()
    );
    let downloader = downloader(client, cancel.clone()).await;
    match downloader.album(&album, format).await {
        Ok(report) => summarize(report, &album.title, &cancel),
        Err(e) if e.is_already_downloaded() => {
            warning!("Album {} is already downloaded", album.title)
        }
        Err(e) => error!("Cannot download album {}. Err: {}", album.title, e),
    }
}

pub async fn download_artist(artist_id: &str, format: Format, cancel: CancellationToken) {
    let client = Arc::new(super::session_client().await);

    let artist = match catalog::get_discography(&client, artist_id).await {
        Ok(artist) => artist,
        Err(e) if e.is_not_found() => error!("Artist {} not found", artist_id),
        Err(e) => error!("Cannot load discography of artist {}. Err: {}", artist_id, e),
    };

    info!(
        "Starting download for artist {} ({} albums)",
        artist.name,
        artist.albums.len()
    );
    let downloader = downloader(client, cancel.clone()).await;
    match downloader.artist(&artist, format).await {
        Ok(download) => {
            for album in &download.skipped {
                warning!("Skipped album {}", album);
            }
            summarize(download.report, &artist.name, &cancel);
        }
        Err(e) => error!("Cannot download artist {}. Err: {}", artist.name, e),
    }
}

async fn downloader(client: Arc<DabClient>, cancel: CancellationToken) -> Downloader {
    let root = config::download_location();
    let library = match Library::open(&root).await {
        Ok(library) => library,
        Err(e) => error!("Cannot use download location {}. Err: {}", root.display(), e),
    };
    tracing::debug!(root = %library.root().display(), "download location");

    Downloader::new(client, library, EngineConfig::from_env()).with_cancellation(cancel)
}

fn summarize(report: DownloadReport, name: &str, cancel: &CancellationToken) {
    if cancel.is_cancelled() {
        warning!(
            "Download of {} cancelled after {} of {} tracks",
            name,
            report.succeeded(),
            report.total()
        );
        std::process::exit(130);
    }

    match report.into_result() {
        Ok(report) if report.total() == 0 => warning!("Nothing to download for {}", name),
        Ok(report) => success!("Downloaded {} ({} tracks)", name, report.total()),
        Err(failure) => error!("{}", failure),
    }
}
