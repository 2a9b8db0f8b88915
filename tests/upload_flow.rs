use detectify_upload::config::DEFAULT_MAX_BYTES;
use detectify_upload::presenter::Verdict;
use detectify_upload::{
    CandidateFile, ClientConfig, Dispatch, DragEvent, Label, Phase, RecordingSurface, UploadError,
    UploadSession, UploadTransport,
};
use serde_json::json;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::timeout;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn session_for(base: &str, max_bytes: u64) -> UploadSession<RecordingSurface> {
    let mut config = ClientConfig::new(base).expect("config");
    config.max_bytes = max_bytes;
    let transport = UploadTransport::new(&config).expect("transport");
    UploadSession::new(transport, config.max_bytes, RecordingSurface::default())
}

fn text_file(name: &str, marker: &str, len: usize) -> CandidateFile {
    let data: Vec<u8> = marker.bytes().cycle().take(len).collect();
    CandidateFile::from_bytes(name, data)
}

async fn mount_json(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn oversized_file_never_reaches_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut session = session_for(&server.uri(), DEFAULT_MAX_BYTES);
    let file = text_file("big.mp4", "x", 16).with_declared_len(DEFAULT_MAX_BYTES + 1);

    let result = session.on_file_chosen(file);
    assert!(matches!(result, Err(UploadError::FileTooLarge { .. })));
    assert_eq!(session.surface().status, "File too large.");
    assert!(session.current_attempt().is_none());
    assert!(!session.surface().progress_visible);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn real_upload_posts_file_field_and_renders_positive_banner() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(body_string_contains(r#"name="file""#))
        .and(body_string_contains(r#"filename="clip.mp4""#))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "label": "REAL",
            "confidence": 92
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = session_for(&server.uri(), DEFAULT_MAX_BYTES);
    let id = session
        .on_file_chosen(text_file("clip.mp4", "frame", 200 * 1024))
        .expect("accepted");
    assert_eq!(session.surface().status, "Uploading...");
    assert!(session.surface().progress_visible);

    let phase = session.settle().await;
    assert!(matches!(phase, Some(Phase::Succeeded(c)) if c.label == Label::Real));
    assert_eq!(session.current_attempt().map(|a| a.id()), Some(id));

    let surface = session.surface();
    assert_eq!(surface.status, "Done.");
    assert!(!surface.progress_visible);
    assert_eq!(surface.progress_percent, 0.0);
    let banner = surface.banner.as_ref().expect("banner");
    assert_eq!(banner.verdict, Verdict::Positive);
    assert_eq!(banner.to_string(), "🟢 REAL — 92%");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let content_type = requests[0]
        .headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(content_type.starts_with("multipart/form-data"));
}

#[tokio::test]
async fn progress_is_monotonic_and_ends_full() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        json!({ "success": true, "label": "REAL", "confidence": 99.5 }),
    )
    .await;

    let mut session = session_for(&server.uri(), DEFAULT_MAX_BYTES);
    session
        .on_file_chosen(text_file("long.mov", "abc", 300 * 1024))
        .expect("accepted");
    session.settle().await;

    let history = &session.surface().progress_history;
    assert!(history.len() > 2, "expected several ticks, got {history:?}");
    assert!(history.iter().all(|p| (0.0..=100.0).contains(p)));
    assert!(history.windows(2).all(|w| w[0] <= w[1]), "{history:?}");
    assert_eq!(history.last().copied(), Some(100.0));
}

#[tokio::test]
async fn deepfake_upload_renders_negative_banner() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        json!({ "success": true, "label": "DEEPFAKE", "confidence": 77 }),
    )
    .await;

    let mut session = session_for(&server.uri(), DEFAULT_MAX_BYTES);
    session
        .on_file_chosen(text_file("face.jpg", "px", 1024))
        .expect("accepted");
    session.settle().await;

    let banner = session.surface().banner.as_ref().expect("banner");
    assert_eq!(banner.verdict, Verdict::Negative);
    assert!(banner.to_string().contains("77%"));
    assert_eq!(session.surface().status, "Done.");
}

#[tokio::test]
async fn server_error_message_is_shown() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({ "success": false, "error": "bad format" })),
        )
        .mount(&server)
        .await;

    let mut session = session_for(&server.uri(), DEFAULT_MAX_BYTES);
    session
        .on_file_chosen(text_file("notes.txt", "hello", 64))
        .expect("accepted");
    let phase = session.settle().await;

    assert!(matches!(phase, Some(Phase::Failed(UploadError::Protocol { .. }))));
    assert_eq!(session.surface().status, "Error: bad format");
    assert!(session.surface().banner.is_none());
}

#[tokio::test]
async fn unparseable_body_is_unknown_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let mut session = session_for(&server.uri(), DEFAULT_MAX_BYTES);
    session
        .on_file_chosen(text_file("a.png", "z", 32))
        .expect("accepted");
    session.settle().await;

    assert_eq!(session.surface().status, "Error: Unknown error");
    assert!(!session.surface().progress_visible);
}

#[tokio::test]
async fn dropped_connection_is_upload_failed() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            drop(socket);
        }
    });

    let mut session = session_for(&format!("http://{addr}"), DEFAULT_MAX_BYTES);
    session
        .on_file_chosen(text_file("clip.mp4", "q", 4096))
        .expect("accepted");
    let phase = session.settle().await;

    assert!(matches!(phase, Some(Phase::Failed(UploadError::Network(_)))));
    let surface = session.surface();
    assert_eq!(surface.status, "Upload failed.");
    assert!(!surface.progress_visible);
    assert_eq!(surface.progress_percent, 0.0);
}

#[tokio::test]
async fn declared_length_mismatch_fails_without_sending() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "label": "REAL",
            "confidence": 99
        })))
        .expect(0)
        .mount(&server)
        .await;

    let mut session = session_for(&server.uri(), DEFAULT_MAX_BYTES);
    session
        .on_file_chosen(text_file("clip.mp4", "q", 4096).with_declared_len(10))
        .expect("accepted");
    let phase = session.settle().await;

    assert!(matches!(phase, Some(Phase::Failed(UploadError::Network(_)))));
    let surface = session.surface();
    assert_eq!(surface.status, "Upload failed.");
    assert!(!surface.progress_visible);
    assert!(surface.banner.is_none());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn uploads_file_from_disk() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(body_string_contains(r#"filename="sample.gif""#))
        .and(body_string_contains("GIF89a-on-disk"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "label": "DEEPFAKE",
            "confidence": 64.2
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file_path = dir.path().join("sample.gif");
    std::fs::write(&file_path, "GIF89a-on-disk".repeat(100)).unwrap();

    let mut session = session_for(&server.uri(), DEFAULT_MAX_BYTES);
    let file = CandidateFile::from_path(&file_path).unwrap();
    assert_eq!(file.mime(), Some("image/gif"));
    session.on_file_chosen(file).expect("accepted");
    session.settle().await;

    assert_eq!(session.surface().status, "Done.");
    assert_eq!(
        session.surface().banner.as_ref().map(|b| b.to_string()),
        Some("🔴 DEEPFAKE — 64.2%".to_string())
    );
}

#[tokio::test]
async fn drag_and_drop_starts_an_attempt() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        json!({ "success": true, "label": "REAL", "confidence": 80 }),
    )
    .await;

    let mut session = session_for(&server.uri(), DEFAULT_MAX_BYTES);
    assert!(session.on_drag(DragEvent::Enter).is_none());
    assert!(session.surface().drag_active);
    assert!(session.on_drag(DragEvent::Over).is_none());
    assert!(session.surface().drag_active);

    let dropped = session.on_drag(DragEvent::Drop(Some(text_file("v.mkv", "d", 512))));
    assert!(matches!(dropped, Some(Ok(_))));
    assert!(!session.surface().drag_active);

    session.settle().await;
    assert_eq!(session.surface().status, "Done.");
}

#[tokio::test]
async fn oversized_drop_clears_indicator_and_rejects() {
    let server = MockServer::start().await;
    let mut session = session_for(&server.uri(), 10);

    session.on_drag(DragEvent::Over);
    let dropped = session.on_drag(DragEvent::Drop(Some(text_file("v.mkv", "d", 11))));

    assert!(matches!(dropped, Some(Err(UploadError::FileTooLarge { .. }))));
    assert!(!session.surface().drag_active);
    assert_eq!(session.surface().status, "File too large.");
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn superseded_attempt_does_not_touch_latest_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(body_string_contains("first-upload"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "success": true, "label": "REAL", "confidence": 10 }))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(body_string_contains("second-upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "label": "DEEPFAKE",
            "confidence": 90
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = session_for(&server.uri(), DEFAULT_MAX_BYTES);
    let first = session
        .on_file_chosen(text_file("one.mp4", "first-upload", 2048))
        .expect("accepted");
    let second = session
        .on_file_chosen(text_file("two.mp4", "second-upload", 2048))
        .expect("accepted");
    assert_ne!(first, second);

    session.settle().await;
    assert_eq!(session.current_attempt().map(|a| a.id()), Some(second));
    assert_eq!(session.surface().status, "Done.");

    // Let the slow first upload finish and drain whatever it sends.
    let mut stale = 0;
    while let Ok(Some(dispatch)) = timeout(Duration::from_secs(2), session.pump()).await {
        assert_eq!(dispatch, Dispatch::Stale(first));
        stale += 1;
    }
    assert!(stale > 0, "first attempt never reported back");

    let surface = session.surface();
    assert_eq!(surface.status, "Done.");
    let banner = surface.banner.as_ref().expect("banner");
    assert_eq!(banner.label, Label::Deepfake);
    assert_eq!(banner.to_string(), "🔴 DEEPFAKE — 90%");
    assert_eq!(
        surface
            .status_history
            .iter()
            .filter(|s| s.as_str() == "Done.")
            .count(),
        1
    );
}

#[tokio::test]
async fn ping_reaches_health_check() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ping"))
        .respond_with(ResponseTemplate::new(200).set_body_string("pong"))
        .expect(1)
        .mount(&server)
        .await;

    let config = ClientConfig::new(&server.uri()).unwrap();
    let transport = UploadTransport::new(&config).unwrap();
    assert_eq!(transport.ping().await.unwrap(), "pong");
}

#[tokio::test]
async fn ping_fails_on_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ping"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let config = ClientConfig::new(&server.uri()).unwrap();
    let transport = UploadTransport::new(&config).unwrap();
    assert!(transport.ping().await.is_err());
}
