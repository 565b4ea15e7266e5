use thiserror::Error;

use crate::{dab::ApiError, engine::BatchError, management::LibraryError};

/// Errors that stop a download before its first pass.
///
/// Per-item failures never show up here; they end in the
/// [`DownloadReport`](crate::engine::DownloadReport).
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Library(#[from] LibraryError),

    #[error(transparent)]
    Batch(#[from] BatchError),

    #[error("album {0} has no tracks")]
    EmptyAlbum(String),

    #[error("artist {0} has no albums")]
    EmptyArtist(String),
}

impl DownloadError {
    pub fn is_already_downloaded(&self) -> bool {
        matches!(self, DownloadError::Library(LibraryError::AlreadyExists(_)))
    }
}
