use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use async_trait::async_trait;
use reqwest::Url;
use tokio::{fs::File, io::AsyncWriteExt, sync::Mutex};

use super::tagging::{self, TagBundle};
use crate::{
    dab::{DabClient, stream},
    engine::{FetchError, FetchableItem, Fetcher, ItemProgress},
    types::{Format, Track},
    utils,
};

/// Payload of a track item: everything needed to tag the file.
#[derive(Debug, Clone)]
pub struct TrackJob {
    pub track: Track,
    pub album: String,
    pub artist: String,
    pub release_date: Option<String>,
    pub cover_url: Option<String>,
    pub track_number: Option<u32>,
    pub total_tracks: Option<u32>,
}

impl TrackJob {
    /// A standalone track, tagged with the album data the track itself carries.
    pub fn single(track: Track) -> Self {
        Self {
            album: track.album.clone(),
            artist: track.artist.clone(),
            release_date: track.release_date.clone(),
            cover_url: track.cover.clone(),
            track_number: None,
            total_tracks: None,
            track,
        }
    }

    fn tag_bundle(&self, cover: Option<Vec<u8>>) -> TagBundle {
        TagBundle {
            title: self.track.title.clone(),
            artist: self.artist.clone(),
            album: self.album.clone(),
            date: self.release_date.clone(),
            track_number: self.track_number,
            total_tracks: self.total_tracks,
            cover,
        }
    }
}

/// Downloads DAB tracks: resolve the stream URL, stream the bytes into a
/// `.part` file, tag it, then move it over the destination.
///
/// Every attempt writes its own `.part` file and removes it when it fails or
/// is dropped, so a destination file only ever exists complete and tagged.
pub struct TrackFetcher {
    client: Arc<DabClient>,
    format: Format,
    covers: Mutex<HashMap<String, Arc<Vec<u8>>>>,
    attempts: AtomicU64,
}

impl TrackFetcher {
    pub fn new(client: Arc<DabClient>, format: Format) -> Self {
        Self {
            client,
            format,
            covers: Mutex::new(HashMap::new()),
            attempts: AtomicU64::new(0),
        }
    }

    async fn transfer(
        &self,
        url: Url,
        partial: &Path,
        progress: &ItemProgress,
    ) -> Result<(), FetchError> {
        let mut response = self.client.http().get(url).send().await?.error_for_status()?;

        if let Some(total) = response.content_length().filter(|len| *len > 0) {
            progress.set_total(total);
        }

        let mut file = File::create(partial).await?;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            progress.advance(chunk.len() as u64);
        }
        file.flush().await?;
        file.sync_all().await?;

        Ok(())
    }

    async fn tag(&self, partial: &Arc<PartialFile>, job: &TrackJob) -> Result<(), FetchError> {
        let cover = match job.cover_url.as_deref().filter(|url| !url.is_empty()) {
            Some(url) => Some(self.cover(url).await?),
            None => None,
        };

        let bundle = job.tag_bundle(cover.map(|data| data.to_vec()));
        let partial = Arc::clone(partial);
        let format = self.format;

        // The job keeps the partial file alive even if this attempt is dropped
        tokio::task::spawn_blocking(move || tagging::write_tags(partial.path(), format, &bundle))
            .await
            .map_err(|e| FetchError::Tagging(e.to_string()))?
            .map_err(|e| FetchError::Tagging(e.to_string()))
    }

    async fn cover(&self, url: &str) -> Result<Arc<Vec<u8>>, FetchError> {
        if let Some(cached) = self.covers.lock().await.get(url) {
            return Ok(Arc::clone(cached));
        }

        let data = self
            .client
            .get_bytes(url)
            .await
            .map_err(|e| FetchError::Tagging(format!("can't download cover: {}", e)))?;
        let data = Arc::new(data);

        self.covers
            .lock()
            .await
            .insert(url.to_string(), Arc::clone(&data));
        Ok(data)
    }
}

#[async_trait]
impl Fetcher<TrackJob> for TrackFetcher {
    async fn fetch(
        &self,
        item: &FetchableItem<TrackJob>,
        progress: &ItemProgress,
    ) -> Result<(), FetchError> {
        let job = item.payload();
        let url = stream::resolve_stream_url(&self.client, &job.track.id, self.format)
            .await
            .map_err(|e| FetchError::Resolve(e.to_string()))?;

        let attempt = self.attempts.fetch_add(1, Ordering::Relaxed) + 1;
        let partial = Arc::new(PartialFile::new(utils::partial_path(
            item.destination(),
            attempt,
        )));

        self.transfer(url, partial.path(), progress).await?;
        self.tag(&partial, job).await?;
        tokio::fs::rename(partial.path(), item.destination()).await?;
        Ok(())
    }

    async fn probe_size(&self, item: &FetchableItem<TrackJob>) -> Option<u64> {
        let url = stream::resolve_stream_url(&self.client, &item.payload().track.id, self.format)
            .await
            .ok()?;
        stream::probe_size(&self.client, &url).await
    }
}

/// A `.part` file owned by one attempt.
///
/// The file is removed once the last handle goes away, whether the attempt
/// failed, timed out or was cancelled. After a successful rename there is
/// nothing left to remove.
#[derive(Debug)]
struct PartialFile {
    path: PathBuf,
}

impl PartialFile {
    fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "removed partial file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "can't remove partial file")
            }
        }
    }
}
