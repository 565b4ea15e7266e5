use std::{path::PathBuf, sync::Arc};

use tokio_util::sync::CancellationToken;

use super::{TerminalProgress, TrackFetcher, TrackJob, batch};
use crate::{
    config::EngineConfig,
    dab::{DabClient, catalog},
    engine::{Batch, DownloadReport, NoopProgress, ProgressSink},
    error::DownloadError,
    management::{Library, LibraryError},
    types::{Album, Artist, Format, Track},
};

/// Result of an artist download.
#[derive(Debug)]
pub struct ArtistDownload {
    pub report: DownloadReport,
    /// Albums left out because their directory already existed.
    pub skipped: Vec<String>,
}

/// Entry point for track, album and artist downloads.
///
/// Each call lays out the destination directories, builds one batch and
/// runs it through the retry engine. Errors returned here are fatal for the
/// whole batch; item failures are part of the returned report.
pub struct Downloader {
    client: Arc<DabClient>,
    library: Library,
    engine: EngineConfig,
    cancel: CancellationToken,
    show_progress: bool,
}

impl Downloader {
    pub fn new(client: Arc<DabClient>, library: Library, engine: EngineConfig) -> Self {
        Self {
            client,
            library,
            engine,
            cancel: CancellationToken::new(),
            show_progress: true,
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Disables terminal progress bars.
    pub fn quiet(mut self) -> Self {
        self.show_progress = false;
        self
    }

    pub async fn track(&self, track: &Track, format: Format) -> Result<DownloadReport, DownloadError> {
        let destination = self
            .library
            .single_track_path(&track.artist, &track.title, format)
            .await?;
        let batch = batch::single_track_batch(track, destination)?;

        let sink = self.sink(TerminalProgress::per_item);
        Ok(self.run(batch, format, sink).await)
    }

    pub async fn album(&self, album: &Album, format: Format) -> Result<DownloadReport, DownloadError> {
        if album.tracks.is_empty() {
            return Err(DownloadError::EmptyAlbum(album.title.clone()));
        }

        // The batch is checked before the directory marks the album as downloaded
        let batch = batch::album_batch(
            album,
            &self.library.album_path(&album.artist, &album.title),
            format,
        )?;
        self.library
            .create_album_dir(&album.artist, &album.title)
            .await?;

        let sink = self.sink(TerminalProgress::per_item);
        Ok(self.run(batch, format, sink).await)
    }

    /// Downloads the whole discography of `artist` as a single batch.
    ///
    /// Album listings are looked up first; directories are only created once
    /// every lookup succeeded. Albums that were downloaded before are skipped
    /// instead of failing the artist.
    pub async fn artist(&self, artist: &Artist, format: Format) -> Result<ArtistDownload, DownloadError> {
        if artist.albums.is_empty() {
            return Err(DownloadError::EmptyArtist(artist.name.clone()));
        }

        let mut albums = Vec::with_capacity(artist.albums.len());
        for summary in &artist.albums {
            let mut album = catalog::get_album(&self.client, summary.id.as_str()).await?;
            if album.artist.is_empty() {
                album.artist = artist.name.clone();
            }
            albums.push(album);
        }

        let mut prepared: Vec<(Album, PathBuf)> = Vec::with_capacity(albums.len());
        let mut skipped = Vec::new();
        for album in albums {
            if album.tracks.is_empty() {
                tracing::warn!(album = %album.title, "album has no tracks, skipping");
                skipped.push(album.title);
                continue;
            }

            match self
                .library
                .create_album_dir(&album.artist, &album.title)
                .await
            {
                Ok(dir) => prepared.push((album, dir)),
                Err(LibraryError::AlreadyExists(path)) => {
                    tracing::warn!(path = %path.display(), "album already downloaded, skipping");
                    skipped.push(album.title);
                }
                Err(e) => return Err(e.into()),
            }
        }

        let (batch, groups) = batch::artist_batch(&prepared, &artist.name, format)?;
        let sink = self.sink(move || TerminalProgress::grouped(groups));
        let report = self.run(batch, format, sink).await;

        Ok(ArtistDownload { report, skipped })
    }

    fn sink<F>(&self, terminal: F) -> Arc<dyn ProgressSink>
    where
        F: FnOnce() -> TerminalProgress,
    {
        if self.show_progress {
            Arc::new(terminal())
        } else {
            Arc::new(NoopProgress)
        }
    }

    async fn run(
        &self,
        batch: Batch<TrackJob>,
        format: Format,
        sink: Arc<dyn ProgressSink>,
    ) -> DownloadReport {
        let fetcher = Arc::new(TrackFetcher::new(Arc::clone(&self.client), format));
        self.engine
            .coordinator(self.cancel.clone())
            .run(batch, fetcher, sink)
            .await
    }
}
