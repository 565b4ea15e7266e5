mod library;
mod session;

pub use library::Library;
pub use library::LibraryError;
pub use library::album_track_path;
pub use session::SessionManager;
