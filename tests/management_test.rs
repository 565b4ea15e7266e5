use dabcli::management::{Library, LibraryError, SessionManager, album_track_path};
use dabcli::types::Format;
use std::path::Path;
use tempfile::TempDir;

#[tokio::test]
async fn test_open_requires_existing_root() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope");

    let err = Library::open(&missing).await.unwrap_err();
    assert!(matches!(err, LibraryError::RootMissing(ref path) if path == &missing));

    let library = Library::open(dir.path()).await.unwrap();
    assert_eq!(library.root(), dir.path());
}

#[tokio::test]
async fn test_open_rejects_file_root() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("file.txt");
    std::fs::write(&file, "x").unwrap();

    assert!(matches!(
        Library::open(&file).await,
        Err(LibraryError::RootMissing(_))
    ));
}

#[tokio::test]
async fn test_create_album_dir_once() {
    let dir = TempDir::new().unwrap();
    let library = Library::open(dir.path()).await.unwrap();

    let album_dir = library
        .create_album_dir("Miles Davis", "Kind of Blue")
        .await
        .unwrap();
    assert_eq!(album_dir, dir.path().join("Miles Davis").join("Kind of Blue"));
    assert!(album_dir.is_dir());

    // A second attempt means the album was downloaded before
    let err = library
        .create_album_dir("Miles Davis", "Kind of Blue")
        .await
        .unwrap_err();
    assert!(matches!(err, LibraryError::AlreadyExists(ref path) if path == &album_dir));
}

#[tokio::test]
async fn test_names_are_sanitized_in_layout() {
    let dir = TempDir::new().unwrap();
    let library = Library::open(dir.path()).await.unwrap();

    let album_dir = library.create_album_dir("AC/DC", "Live: 1991").await.unwrap();
    assert_eq!(album_dir, dir.path().join("AC_DC").join("Live_ 1991"));

    let track = album_track_path(&album_dir, 7, "Thunderstruck?", Format::Mp3);
    assert_eq!(track, album_dir.join("07 - Thunderstruck_.mp3"));
}

#[tokio::test]
async fn test_single_track_path() {
    let dir = TempDir::new().unwrap();
    let library = Library::open(dir.path()).await.unwrap();

    let path = library
        .single_track_path("Nina Simone", "Feeling Good", Format::Flac)
        .await
        .unwrap();
    assert_eq!(path, dir.path().join("Nina Simone").join("Feeling Good.flac"));
    assert!(path.parent().unwrap().is_dir());
    assert!(!path.exists());

    std::fs::write(&path, b"done").unwrap();
    let err = library
        .single_track_path("Nina Simone", "Feeling Good", Format::Flac)
        .await
        .unwrap_err();
    assert!(matches!(err, LibraryError::AlreadyExists(_)));

    // Another format is another file
    assert!(
        library
            .single_track_path("Nina Simone", "Feeling Good", Format::Mp3)
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn test_session_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cache").join("session.json");

    let session = SessionManager::new("abc123".to_string());
    session.persist_to(&path).await.unwrap();
    assert!(path.is_file());

    let loaded = SessionManager::load_from(&path).await.unwrap();
    assert_eq!(loaded.token(), "abc123");
    assert_eq!(
        loaded.current_session().obtained_at,
        session.current_session().obtained_at
    );
}

#[tokio::test]
async fn test_session_load_failures() {
    let dir = TempDir::new().unwrap();

    // Missing file
    assert!(
        SessionManager::load_from(&dir.path().join("missing.json"))
            .await
            .is_err()
    );

    // Empty token is not a session
    let empty = dir.path().join("empty.json");
    std::fs::write(&empty, r#"{"token": "", "obtained_at": 0}"#).unwrap();
    assert!(SessionManager::load_from(&empty).await.is_err());

    // Garbage
    let broken = dir.path().join("broken.json");
    std::fs::write(&broken, "not json").unwrap();
    assert!(SessionManager::load_from(Path::new(&broken)).await.is_err());
}
