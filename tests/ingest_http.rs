use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use guide_log::log_store::LogStore;
use guide_log::{
    console_args, server, BatcherConfig, Console, HttpTransport, LogBatcher, TransportConfig,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tower::ServiceExt;

struct Fixture {
    _dir: TempDir,
    log_file: PathBuf,
    app: Router,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let log_file = dir.path().join("logs").join("logs.txt");
    let store = Arc::new(LogStore::new(log_file.clone()));
    Fixture {
        _dir: dir,
        log_file,
        app: server::router(store, None),
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes().to_vec();
    (status, body)
}

async fn post_log(app: &Router, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/api/log")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let (status, bytes) = send(app, request).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn get(app: &Router, uri: &str) -> (StatusCode, String) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let (status, bytes) = send(app, request).await;
    (status, String::from_utf8(bytes).unwrap())
}

#[tokio::test]
async fn single_message_is_appended_as_log_line() {
    let fx = fixture();

    let (status, body) = post_log(&fx.app, r#"{"message":"hello"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true}));

    let content = std::fs::read_to_string(&fx.log_file).unwrap();
    assert!(content.starts_with('['), "{content}");
    assert!(content.ends_with("] LOG: hello\n"), "{content}");
    assert_eq!(content.lines().count(), 1);
}

#[tokio::test]
async fn batch_is_appended_in_order() {
    let fx = fixture();
    let payload = json!({
        "logs": [
            {"level": "warn", "message": "A", "timestamp": "2024-01-01T00:00:00.000Z"},
            {"level": "error", "message": "B", "timestamp": "2024-01-01T00:00:01.000Z"},
            {"level": "log", "message": "C", "timestamp": "2024-01-01T00:00:02.000Z"},
        ]
    });

    let (status, _) = post_log(&fx.app, &payload.to_string()).await;
    assert_eq!(status, StatusCode::OK);

    let content = std::fs::read_to_string(&fx.log_file).unwrap();
    assert_eq!(
        content,
        "[2024-01-01T00:00:00.000Z] WARN: A\n\
         [2024-01-01T00:00:01.000Z] ERROR: B\n\
         [2024-01-01T00:00:02.000Z] LOG: C\n"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_batches_are_not_interleaved() {
    const REQUESTS: usize = 8;
    const LINES: usize = 5;
    let fx = fixture();

    let mut tasks = Vec::new();
    for i in 0..REQUESTS {
        let app = fx.app.clone();
        tasks.push(tokio::spawn(async move {
            let logs: Vec<Value> = (0..LINES)
                .map(|j| {
                    json!({"level": "info", "message": format!("req{i}-{j}"), "timestamp": "ts"})
                })
                .collect();
            let (status, _) = post_log(&app, &json!({ "logs": logs }).to_string()).await;
            assert_eq!(status, StatusCode::OK);
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let content = std::fs::read_to_string(&fx.log_file).unwrap();
    let messages: Vec<&str> = content
        .lines()
        .map(|line| line.strip_prefix("[ts] INFO: ").unwrap())
        .collect();
    assert_eq!(messages.len(), REQUESTS * LINES);

    // Each request's lines form one run, in the order they were sent.
    let mut seen = HashSet::new();
    for run in messages.chunks(LINES) {
        let (request, _) = run[0].split_once('-').unwrap();
        let expected: Vec<String> = (0..LINES).map(|j| format!("{request}-{j}")).collect();
        assert_eq!(run, expected.as_slice(), "{content}");
        assert!(seen.insert(request), "{request} written twice");
    }
    assert_eq!(seen.len(), REQUESTS);
}

#[tokio::test]
async fn missing_message_is_rejected_and_file_untouched() {
    let fx = fixture();

    let (status, body) = post_log(&fx.app, "{}").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Missing message"}));
    assert!(!fx.log_file.exists());
}

#[tokio::test]
async fn malformed_json_is_rejected() {
    let fx = fixture();

    let (status, body) = post_log(&fx.app, "{oops").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Invalid JSON"}));
}

#[tokio::test]
async fn unwritable_log_file_is_a_server_error() {
    let dir = tempfile::tempdir().unwrap();
    // The log path is an existing directory, so appending fails.
    let store = Arc::new(LogStore::new(dir.path()));
    let app = server::router(store, None);

    let (status, body) = post_log(&app, r#"{"message":"x"}"#).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Internal server error"}));
}

#[tokio::test]
async fn logs_page_without_file_shows_placeholder() {
    let fx = fixture();

    let (status, page) = get(&fx.app, "/logs").await;
    assert_eq!(status, StatusCode::OK);
    assert!(page.contains("No logs yet."));
    assert!(!page.contains("<pre>"));
}

#[tokio::test]
async fn logs_page_escapes_content() {
    let fx = fixture();
    post_log(&fx.app, r#"{"message":"<img src=x>","timestamp":"ts"}"#).await;

    let (status, page) = get(&fx.app, "/logs").await;
    assert_eq!(status, StatusCode::OK);
    assert!(page.contains("[ts] LOG: &lt;img src=x&gt;"), "{page}");
    assert!(!page.contains("<img"));
}

#[tokio::test]
async fn raw_download_missing_file_is_not_found() {
    let fx = fixture();

    let (status, _) = get(&fx.app, "/api/logs/raw").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn raw_download_returns_attachment() {
    let fx = fixture();
    post_log(&fx.app, r#"{"message":"raw","timestamp":"ts","level":"info"}"#).await;

    let request = Request::builder().uri("/api/logs/raw").body(Body::empty()).unwrap();
    let response = fx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap().to_string();
    assert!(disposition.contains("logs.txt"), "{disposition}");

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"[ts] INFO: raw\n");
}

#[tokio::test]
async fn health_reports_ok() {
    let fx = fixture();

    let (status, body) = get(&fx.app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_str::<Value>(&body).unwrap(), json!({"status": "ok"}));
}

#[tokio::test]
async fn unknown_path_without_static_dir_is_not_found() {
    let fx = fixture();

    let (status, _) = get(&fx.app, "/index.html").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn static_dir_serves_unmatched_paths() {
    let dir = tempfile::tempdir().unwrap();
    let dist = dir.path().join("dist");
    std::fs::create_dir_all(&dist).unwrap();
    std::fs::write(dist.join("index.html"), "<h1>guides</h1>").unwrap();

    let store = Arc::new(LogStore::new(dir.path().join("logs.txt")));
    let app = server::router(store, Some(dist.as_path()));

    let (status, body) = get(&app, "/index.html").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "<h1>guides</h1>");

    // API routes still win over the static fallback.
    let (status, _) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn console_batches_reach_the_log_file() {
    let fx = fixture();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = fx.app.clone();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let transport = HttpTransport::new(TransportConfig {
        endpoint: format!("http://{addr}/api/log"),
        enabled: true,
    });
    let batcher = LogBatcher::new(BatcherConfig::default(), Arc::new(transport));
    let console = Console::new(batcher.clone());

    console.warn(console_args!("A"));
    console.error(console_args!("B", 2));
    console.log(console_args!("C", json!({"k": "v"})));
    batcher.shutdown(Duration::from_secs(5)).await;

    let content = std::fs::read_to_string(&fx.log_file).unwrap();
    let tails: Vec<&str> = content
        .lines()
        .map(|line| line.split_once("] ").map(|(_, rest)| rest).unwrap())
        .collect();
    assert_eq!(tails, ["WARN: A", "ERROR: B 2", r#"LOG: C {"k":"v"}"#]);
}
