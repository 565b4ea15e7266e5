use dabcli::config::EngineConfig;
use dabcli::dab::DabClient;
use dabcli::download::tagging::cover_mime_type;
use dabcli::download::{Downloader, TerminalProgress, batch};
use dabcli::engine::{DelayPolicy, FetchError, ItemKey, ProgressSink};
use dabcli::types::{Album, Artist, CatalogId, Format, Track};
use id3::TagLike;
use indicatif::ProgressDrawTarget;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// Helper function to create a test track
fn create_test_track(id: &str, title: &str) -> Track {
    Track {
        id: CatalogId::new(id),
        title: title.to_string(),
        artist: "Test Artist".to_string(),
        ..Default::default()
    }
}

// Helper function to create a test album with the given tracks
fn create_test_album(id: &str, title: &str, tracks: Vec<Track>) -> Album {
    Album {
        id: CatalogId::new(id),
        title: title.to_string(),
        artist: "Test Artist".to_string(),
        release_date: Some("2020-05-01".to_string()),
        track_count: tracks.len() as u32,
        tracks,
        ..Default::default()
    }
}

fn engine() -> EngineConfig {
    EngineConfig {
        max_concurrent: 2,
        max_passes: 3,
        delay: DelayPolicy::None,
        item_timeout: Duration::from_secs(10),
    }
}

async fn downloader(server: &MockServer, root: &Path) -> Downloader {
    downloader_with(server, root, engine()).await
}

async fn downloader_with(server: &MockServer, root: &Path, engine: EngineConfig) -> Downloader {
    let client = Arc::new(DabClient::new(&server.uri(), Duration::from_secs(5)).unwrap());
    let library = dabcli::management::Library::open(root).await.unwrap();
    Downloader::new(client, library, engine).quiet()
}

// Serves `api/stream` for a track, pointing at `/files/<id>`
async fn mount_stream(server: &MockServer, track_id: &str) {
    mount_stream_from(server, track_id, &server.uri()).await;
}

async fn mount_stream_from(server: &MockServer, track_id: &str, files: &str) {
    Mock::given(method("GET"))
        .and(path("/api/stream"))
        .and(query_param("trackId", track_id))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "url": format!("{}/files/{}", files, track_id)
        })))
        .mount(server)
        .await;
}

// How the raw file server answers one GET
#[derive(Clone)]
enum Reply {
    // Announces `declared` bytes, sends `body`, then hangs up
    Truncated(Vec<u8>, usize),
    // Announces `declared` bytes, sends `body`, then goes quiet
    Stalled(Vec<u8>, usize),
    Complete(Vec<u8>),
}

// Plain HTTP server for audio bodies that can break off mid-transfer.
//
// The n-th GET gets the n-th reply and the last reply repeats. HEAD requests
// are refused so sizes stay unknown.
async fn serve_files(replies: Vec<Reply>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    let replies = Arc::new(replies);
    let served = Arc::new(AtomicUsize::new(0));

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let replies = Arc::clone(&replies);
            let served = Arc::clone(&served);
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }

                if request.starts_with(b"HEAD") {
                    let _ = socket
                        .write_all(b"HTTP/1.1 405 Method Not Allowed\r\ncontent-length: 0\r\nconnection: close\r\n\r\n")
                        .await;
                    return;
                }

                let n = served.fetch_add(1, Ordering::SeqCst).min(replies.len() - 1);
                let (body, declared, stall) = match &replies[n] {
                    Reply::Truncated(body, declared) => (body, *declared, false),
                    Reply::Stalled(body, declared) => (body, *declared, true),
                    Reply::Complete(body) => (body, body.len(), false),
                };

                let head = format!(
                    "HTTP/1.1 200 OK\r\ncontent-type: application/octet-stream\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
                    declared
                );
                let _ = socket.write_all(head.as_bytes()).await;
                let _ = socket.write_all(body).await;
                let _ = socket.flush().await;
                if stall {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                }
            });
        }
    });

    format!("http://{}", address)
}

// Smallest FLAC stream metaflac accepts: marker, a lone STREAMINFO block
// (4096 samples per block, 44.1 kHz, stereo, 16 bit) and some frame bytes.
fn flac_fixture() -> Vec<u8> {
    let mut data = b"fLaC".to_vec();
    data.extend_from_slice(&[0x80, 0x00, 0x00, 0x22]);
    data.extend_from_slice(&[0x10, 0x00, 0x10, 0x00]);
    data.extend_from_slice(&[0x00; 6]);
    data.extend_from_slice(&[0x0a, 0xc4, 0x42, 0xf0, 0x00, 0x00, 0x00, 0x00]);
    data.extend_from_slice(&[0x00; 16]);
    data.extend_from_slice(&[0xff, 0xf8, 0x69, 0x08, 0x00, 0x00, 0x00, 0x00]);
    data
}

async fn mount_file(server: &MockServer, track_id: &str, body: &[u8]) {
    Mock::given(method("GET"))
        .and(path(format!("/files/{}", track_id)))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
        .mount(server)
        .await;
}

fn leftover_parts(dir: &Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .filter(|name| name.ends_with(".part"))
        .collect()
}

#[test]
fn test_album_batch_numbers_tracks() {
    let album = create_test_album(
        "10",
        "Album",
        vec![create_test_track("1", "First"), create_test_track("2", "Second")],
    );
    let dir = Path::new("/music/Test Artist/Album");

    let batch = batch::album_batch(&album, dir, Format::Flac).unwrap();
    let items: Vec<_> = batch.iter().collect();

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].key().as_str(), "1");
    assert_eq!(items[1].destination(), dir.join("02 - Second.flac"));
    assert_eq!(items[1].payload().track_number, Some(2));
    assert_eq!(items[1].payload().total_tracks, Some(2));
    assert_eq!(items[1].payload().album, "Album");
    assert_eq!(items[1].payload().release_date.as_deref(), Some("2020-05-01"));
}

#[test]
fn test_album_batch_keeps_repeated_track() {
    let album = create_test_album(
        "10",
        "Album",
        vec![create_test_track("1", "First"), create_test_track("1", "First again")],
    );
    let dir = Path::new("/tmp");

    let batch = batch::album_batch(&album, dir, Format::Mp3).unwrap();
    let keys: Vec<&str> = batch.iter().map(|item| item.key().as_str()).collect();

    assert_eq!(keys, vec!["1", "1#2"]);
    assert_eq!(batch.iter().nth(1).unwrap().destination(), dir.join("02 - First again.mp3"));
}

#[test]
fn test_artist_batch_prefixes_keys_with_album() {
    // Same track on two releases
    let first = create_test_album("1", "Original", vec![create_test_track("7", "Song")]);
    let second = create_test_album(
        "2",
        "Deluxe",
        vec![create_test_track("7", "Song"), create_test_track("8", "Bonus")],
    );
    let albums = vec![
        (first, Path::new("/m/A/Original").to_path_buf()),
        (second, Path::new("/m/A/Deluxe").to_path_buf()),
    ];

    let (batch, groups) = batch::artist_batch(&albums, "Test Artist", Format::Flac).unwrap();

    assert_eq!(batch.len(), 3);
    let keys: Vec<&str> = batch.iter().map(|item| item.key().as_str()).collect();
    assert_eq!(keys, vec!["1/7", "2/7", "2/8"]);

    assert_eq!(groups.len(), 2);
    assert_eq!(groups[1].0, "Deluxe");
    assert_eq!(groups[1].1, vec![ItemKey::from("2/7"), ItemKey::from("2/8")]);
}

#[tokio::test]
async fn test_album_download_writes_tagged_files() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();

    for id in ["1", "2"] {
        mount_stream(&server, id).await;
        mount_file(&server, id, b"not really audio, but bytes all the same").await;
    }

    let album = create_test_album(
        "10",
        "Blue Album",
        vec![create_test_track("1", "First"), create_test_track("2", "Second")],
    );

    let report = downloader(&server, root.path())
        .await
        .album(&album, Format::Mp3)
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.passes(), 1);

    let album_dir = root.path().join("Test Artist").join("Blue Album");
    let first = album_dir.join("01 - First.mp3");
    assert!(first.is_file());
    assert!(album_dir.join("02 - Second.mp3").is_file());
    assert!(leftover_parts(&album_dir).is_empty());

    let tag = id3::Tag::read_from_path(&first).unwrap();
    assert_eq!(tag.title(), Some("First"));
    assert_eq!(tag.album(), Some("Blue Album"));
    assert_eq!(tag.artist(), Some("Test Artist"));
    assert_eq!(tag.track(), Some(1));
    assert_eq!(tag.total_tracks(), Some(2));
}

#[tokio::test]
async fn test_failed_transfer_is_retried() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();

    mount_stream(&server, "5").await;
    Mock::given(method("GET"))
        .and(path("/files/5"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_file(&server, "5", b"second time lucky").await;

    let album = create_test_album("20", "Retry", vec![create_test_track("5", "Flaky")]);

    let report = downloader(&server, root.path())
        .await
        .album(&album, Format::Mp3)
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.passes(), 2);

    let album_dir = root.path().join("Test Artist").join("Retry");
    assert!(album_dir.join("01 - Flaky.mp3").is_file());
    assert!(leftover_parts(&album_dir).is_empty());
}

#[tokio::test]
async fn test_broken_transfer_is_replaced_by_retry() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();

    let files = serve_files(vec![
        Reply::Truncated(vec![b'a'; 40], 100),
        Reply::Complete(vec![b'b'; 100]),
    ])
    .await;
    mount_stream_from(&server, "5", &files).await;

    let album = create_test_album("21", "Broken Off", vec![create_test_track("5", "Flaky")]);

    let report = downloader(&server, root.path())
        .await
        .album(&album, Format::Mp3)
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.passes(), 2);

    let album_dir = root.path().join("Test Artist").join("Broken Off");
    assert!(leftover_parts(&album_dir).is_empty());

    // Tag first, then exactly the second attempt's audio
    let data = std::fs::read(album_dir.join("01 - Flaky.mp3")).unwrap();
    assert!(data.ends_with(&[b'b'; 100]));
    assert!(!data.windows(8).any(|w| w == [b'a'; 8]));
    let tag = id3::Tag::read_from_path(album_dir.join("01 - Flaky.mp3")).unwrap();
    assert_eq!(tag.title(), Some("Flaky"));
}

#[tokio::test]
async fn test_stalled_transfer_times_out_without_leftovers() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();

    let files = serve_files(vec![Reply::Stalled(vec![b'a'; 5000], 100_000)]).await;
    mount_stream_from(&server, "6", &files).await;

    let album = create_test_album("22", "Stuck", vec![create_test_track("6", "Slow")]);
    let engine = EngineConfig {
        max_passes: 2,
        item_timeout: Duration::from_millis(500),
        ..engine()
    };

    let report = downloader_with(&server, root.path(), engine)
        .await
        .album(&album, Format::Mp3)
        .await
        .unwrap();

    assert_eq!(report.passes(), 2);
    assert_eq!(report.failed().len(), 1);
    assert!(matches!(report.failed()[0].reason, FetchError::TimedOut(_)));

    let album_dir = root.path().join("Test Artist").join("Stuck");
    let entries: Vec<_> = std::fs::read_dir(&album_dir).unwrap().collect();
    assert!(entries.is_empty());
}

#[tokio::test]
async fn test_stalled_transfer_then_complete() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();

    let files = serve_files(vec![
        Reply::Stalled(vec![b'a'; 5000], 100_000),
        Reply::Complete(vec![b'b'; 300]),
    ])
    .await;
    mount_stream_from(&server, "7", &files).await;

    let album = create_test_album("23", "Patience", vec![create_test_track("7", "Late")]);
    let engine = EngineConfig {
        item_timeout: Duration::from_millis(500),
        ..engine()
    };

    let report = downloader_with(&server, root.path(), engine)
        .await
        .album(&album, Format::Mp3)
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.passes(), 2);

    let album_dir = root.path().join("Test Artist").join("Patience");
    assert!(leftover_parts(&album_dir).is_empty());
    let data = std::fs::read(album_dir.join("01 - Late.mp3")).unwrap();
    assert!(data.ends_with(&[b'b'; 300]));
    assert!(!data.windows(8).any(|w| w == [b'a'; 8]));
}

#[tokio::test]
async fn test_flac_download_writes_vorbis_comments() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();

    mount_stream(&server, "8").await;
    mount_file(&server, "8", &flac_fixture()).await;
    Mock::given(method("GET"))
        .and(path("/covers/60.png"))
        .respond_with(
            ResponseTemplate::new(200).set_body_bytes(vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a]),
        )
        .mount(&server)
        .await;

    let mut album = create_test_album("60", "Lossless", vec![create_test_track("8", "Clear")]);
    album.cover = Some(format!("{}/covers/60.png", server.uri()));

    let report = downloader(&server, root.path())
        .await
        .album(&album, Format::Flac)
        .await
        .unwrap();
    assert!(report.is_success());

    let album_dir = root.path().join("Test Artist").join("Lossless");
    let file = album_dir.join("01 - Clear.flac");
    assert!(leftover_parts(&album_dir).is_empty());

    let tag = metaflac::Tag::read_from_path(&file).unwrap();
    let comment = |key: &str| {
        tag.get_vorbis(key)
            .and_then(|mut values| values.next())
            .map(str::to_string)
    };
    assert_eq!(comment("TITLE").as_deref(), Some("Clear"));
    assert_eq!(comment("ALBUM").as_deref(), Some("Lossless"));
    assert_eq!(comment("ARTIST").as_deref(), Some("Test Artist"));
    assert_eq!(comment("TRACKNUMBER").as_deref(), Some("1"));
    assert_eq!(comment("TRACKTOTAL").as_deref(), Some("1"));

    let pictures: Vec<_> = tag.pictures().collect();
    assert_eq!(pictures.len(), 1);
    assert_eq!(pictures[0].mime_type, "image/png");

    // Audio frames survive tagging untouched
    let data = std::fs::read(&file).unwrap();
    assert!(data.ends_with(&[0xff, 0xf8, 0x69, 0x08, 0x00, 0x00, 0x00, 0x00]));
}

#[tokio::test]
async fn test_album_with_repeated_track_downloads_every_entry() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();

    mount_stream(&server, "1").await;
    mount_file(&server, "1", b"same recording twice").await;

    let album = create_test_album(
        "70",
        "Twice",
        vec![create_test_track("1", "Take"), create_test_track("1", "Take (Reprise)")],
    );

    let report = downloader(&server, root.path())
        .await
        .album(&album, Format::Mp3)
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.total(), 2);

    let album_dir = root.path().join("Test Artist").join("Twice");
    assert!(album_dir.join("01 - Take.mp3").is_file());
    assert!(album_dir.join("02 - Take (Reprise).mp3").is_file());
}

#[tokio::test]
async fn test_unresolvable_track_is_reported() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();

    mount_stream(&server, "1").await;
    mount_file(&server, "1", b"audio").await;
    Mock::given(method("GET"))
        .and(path("/api/stream"))
        .and(query_param("trackId", "2"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let album = create_test_album(
        "30",
        "Half",
        vec![create_test_track("1", "Fine"), create_test_track("2", "Gone")],
    );

    let report = downloader(&server, root.path())
        .await
        .album(&album, Format::Mp3)
        .await
        .unwrap();

    assert_eq!(report.passes(), 3);
    assert_eq!(report.failed().len(), 1);
    assert_eq!(report.failed()[0].name, "Gone");
    assert!(matches!(report.failed()[0].reason, FetchError::Resolve(_)));

    let album_dir = root.path().join("Test Artist").join("Half");
    assert!(album_dir.join("01 - Fine.mp3").is_file());
    assert!(!album_dir.join("02 - Gone.mp3").exists());
}

#[tokio::test]
async fn test_tagging_failure_removes_partial_file() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();

    mount_stream(&server, "3").await;
    mount_file(&server, "3", b"definitely not a flac stream").await;

    let album = create_test_album("40", "Broken", vec![create_test_track("3", "Noise")]);

    let report = downloader(&server, root.path())
        .await
        .album(&album, Format::Flac)
        .await
        .unwrap();

    assert_eq!(report.failed().len(), 1);
    assert!(matches!(report.failed()[0].reason, FetchError::Tagging(_)));

    let album_dir = root.path().join("Test Artist").join("Broken");
    let entries: Vec<_> = std::fs::read_dir(&album_dir).unwrap().collect();
    assert!(entries.is_empty());
}

#[tokio::test]
async fn test_existing_album_is_not_downloaded_again() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();
    std::fs::create_dir_all(root.path().join("Test Artist").join("Done")).unwrap();

    let album = create_test_album("50", "Done", vec![create_test_track("1", "Old")]);

    let err = downloader(&server, root.path())
        .await
        .album(&album, Format::Mp3)
        .await
        .unwrap_err();
    assert!(err.is_already_downloaded());

    // Nothing was requested
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_single_track_download() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();

    mount_stream(&server, "9").await;
    mount_file(&server, "9", b"single").await;

    let mut track = create_test_track("9", "Alone");
    track.album = "Singles".to_string();

    let report = downloader(&server, root.path())
        .await
        .track(&track, Format::Mp3)
        .await
        .unwrap();
    assert!(report.is_success());

    let file = root.path().join("Test Artist").join("Alone.mp3");
    let tag = id3::Tag::read_from_path(&file).unwrap();
    assert_eq!(tag.album(), Some("Singles"));
    assert_eq!(tag.track(), None);
}

#[tokio::test]
async fn test_artist_download_skips_existing_albums() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();
    std::fs::create_dir_all(root.path().join("Test Artist").join("Old Album")).unwrap();

    Mock::given(method("GET"))
        .and(path("/api/album"))
        .and(query_param("albumId", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "album": {
                "id": 1,
                "title": "Old Album",
                "artist": "Test Artist",
                "tracks": [{"id": 11, "title": "Old Song"}]
            }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/album"))
        .and(query_param("albumId", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "album": {
                "id": 2,
                "title": "New Album",
                "artist": "Test Artist",
                "tracks": [{"id": 21, "title": "New Song"}, {"id": 22, "title": "Newer Song"}]
            }
        })))
        .mount(&server)
        .await;
    for id in ["21", "22"] {
        mount_stream(&server, id).await;
        mount_file(&server, id, b"fresh").await;
    }

    let artist = Artist {
        id: CatalogId::new("100"),
        name: "Test Artist".to_string(),
        albums: vec![
            create_test_album("1", "Old Album", Vec::new()),
            create_test_album("2", "New Album", Vec::new()),
        ],
        ..Default::default()
    };

    let download = downloader(&server, root.path())
        .await
        .artist(&artist, Format::Mp3)
        .await
        .unwrap();

    assert_eq!(download.skipped, vec!["Old Album".to_string()]);
    assert!(download.report.is_success());
    assert_eq!(download.report.total(), 2);

    let new_dir = root.path().join("Test Artist").join("New Album");
    assert!(new_dir.join("01 - New Song.mp3").is_file());
    assert!(new_dir.join("02 - Newer Song.mp3").is_file());
}

#[tokio::test]
async fn test_artist_without_albums_is_an_error() {
    let server = MockServer::start().await;
    let root = TempDir::new().unwrap();

    let artist = Artist {
        id: CatalogId::new("1"),
        name: "Nobody".to_string(),
        ..Default::default()
    };

    let result = downloader(&server, root.path())
        .await
        .artist(&artist, Format::Flac)
        .await;
    assert!(result.is_err());
}

#[test]
fn test_terminal_progress_accepts_concurrent_events() {
    let progress = Arc::new(TerminalProgress::per_item_with_target(
        ProgressDrawTarget::hidden(),
    ));
    let key = ItemKey::from("1");

    progress.batch_started(1);
    progress.item_started(&key, "Song", Some(100));
    std::thread::scope(|scope| {
        for _ in 0..4 {
            let progress = Arc::clone(&progress);
            let key = key.clone();
            scope.spawn(move || progress.item_progress(&key, 50));
        }
    });
    progress.item_finished(&key, false);

    // A retry reuses the bar
    progress.pass_started(2, 3, 1);
    progress.item_started(&key, "Song", Some(100));
    progress.item_total(&key, 120);
    progress.item_progress(&key, 120);
    progress.item_finished(&key, true);
}

#[test]
fn test_grouped_progress_ignores_unknown_keys() {
    let progress = TerminalProgress::grouped_with_target(
        vec![("Album".to_string(), vec![ItemKey::from("a/1")])],
        ProgressDrawTarget::hidden(),
    );

    progress.batch_started(1);
    progress.item_started(&ItemKey::from("a/1"), "Song", None);
    progress.item_finished(&ItemKey::from("a/1"), true);
    progress.item_finished(&ItemKey::from("unknown"), true);
}

#[test]
fn test_cover_mime_type() {
    assert_eq!(cover_mime_type(&[0x89, b'P', b'N', b'G', 0x0d]), "image/png");
    assert_eq!(cover_mime_type(b"RIFF\0\0\0\0WEBPVP8 "), "image/webp");
    assert_eq!(cover_mime_type(&[0xff, 0xd8, 0xff]), "image/jpeg");
}
