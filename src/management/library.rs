use std::{
    io,
    path::{Path, PathBuf},
};

use thiserror::Error;

use crate::{types::Format, utils};

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("download location {0} doesn't exist or is not a directory")]
    RootMissing(PathBuf),

    #[error("already downloaded: {0} exists")]
    AlreadyExists(PathBuf),

    #[error("can't create dir {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// On-disk layout of downloads below the configured root.
///
/// ```text
/// <root>/<Artist>/<Album>/<NN> - <Title>.<ext>   album and artist downloads
/// <root>/<Artist>/<Title>.<ext>                  single tracks
/// ```
///
/// Directories are created here, once, before a batch starts. An album
/// directory or track file that already exists means the item was
/// downloaded before and is never overwritten.
#[derive(Debug, Clone)]
pub struct Library {
    root: PathBuf,
}

impl Library {
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, LibraryError> {
        let root = root.into();
        match async_fs::metadata(&root).await {
            Ok(meta) if meta.is_dir() => Ok(Self { root }),
            _ => Err(LibraryError::RootMissing(root)),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn artist_path(&self, artist: &str) -> PathBuf {
        self.root.join(utils::sanitize_filename(artist))
    }

    pub fn album_path(&self, artist: &str, album: &str) -> PathBuf {
        self.artist_path(artist)
            .join(utils::sanitize_filename(album))
    }

    /// Creates the artist directory if needed and returns it.
    pub async fn ensure_artist_dir(&self, artist: &str) -> Result<PathBuf, LibraryError> {
        let path = self.artist_path(artist);
        async_fs::create_dir_all(&path)
            .await
            .map_err(|source| LibraryError::CreateDir {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }

    /// Creates a fresh album directory.
    ///
    /// Fails with [`LibraryError::AlreadyExists`] when the directory is
    /// already there.
    pub async fn create_album_dir(&self, artist: &str, album: &str) -> Result<PathBuf, LibraryError> {
        self.ensure_artist_dir(artist).await?;

        let path = self.album_path(artist, album);
        match async_fs::create_dir(&path).await {
            Ok(()) => Ok(path),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                Err(LibraryError::AlreadyExists(path))
            }
            Err(source) => Err(LibraryError::CreateDir { path, source }),
        }
    }

    /// Destination of a single track download, below its artist directory.
    pub async fn single_track_path(
        &self,
        artist: &str,
        title: &str,
        format: Format,
    ) -> Result<PathBuf, LibraryError> {
        let dir = self.ensure_artist_dir(artist).await?;
        let path = dir.join(utils::single_track_file_name(title, format));

        if async_fs::metadata(&path).await.is_ok() {
            return Err(LibraryError::AlreadyExists(path));
        }

        Ok(path)
    }
}

/// Destination of the track at `position` inside an album directory.
pub fn album_track_path(album_dir: &Path, position: usize, title: &str, format: Format) -> PathBuf {
    album_dir.join(utils::album_track_file_name(position, title, format))
}
