//! End-to-end tests: real capture loop, mock classifier, HTTP over loopback

use api::{serve, AppState};
use camera_capture::TestPatternSource;
use emotion::FerPlusClassifier;
use monitor::{
    CaptureHandle, CaptureLoop, CaptureSettings, EmotionSource, MonitorConfig, MonitoringSession,
    Preview,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

struct TestServer {
    base: String,
    capture: CaptureHandle,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    async fn start() -> Self {
        let session = MonitoringSession::default().into_shared();
        let preview = Preview::new();
        let capture = CaptureLoop::new(
            TestPatternSource::new(64, 48),
            EmotionSource::new(FerPlusClassifier::mock()),
            session.clone(),
            preview.clone(),
            CaptureSettings {
                fps: 50,
                max_consecutive_errors: 3,
            },
        );
        let (capture_handle, _task) = capture.spawn();

        let state = AppState::new(session, preview, MonitorConfig::default())
            .with_classifier("ferplus (mock)", true)
            .with_capture(capture_handle.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let (tx, rx) = oneshot::channel::<()>();
        tokio::spawn(serve(listener, Arc::new(state), async {
            rx.await.ok();
        }));

        Self {
            base,
            capture: capture_handle,
            shutdown: Some(tx),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.capture.stop();
        if let Some(tx) = self.shutdown.take() {
            tx.send(()).ok();
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_result_before_any_session_is_not_found() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    let response = client.get(server.url("/api/monitor/result")).send().await.unwrap();
    assert_eq!(response.status(), 404);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "No emotion data available");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_session_runs_to_completion() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    let response = client
        .post(server.url("/api/monitor/start"))
        .json(&serde_json::json!({ "duration": 0.4 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "Started monitoring for 0.4 seconds");
    assert!(body["data"]["session_id"].is_string());

    let status: serde_json::Value = client
        .get(server.url("/api/monitor/status"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["data"]["state"], "monitoring");

    tokio::time::sleep(Duration::from_millis(900)).await;

    let status: serde_json::Value = client
        .get(server.url("/api/monitor/status"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["data"]["state"], "idle");
    let samples = status["data"]["samples"].as_u64().unwrap();
    assert!(samples > 0 && samples <= 10);

    // Mock classifier leans neutral (0.72), above the 0.7 follow-up threshold
    let response = client.get(server.url("/api/monitor/result")).send().await.unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"]["emotion"]["emotion"], "neutral");
    assert_eq!(body["data"]["needs_followup"], true);
    let score = body["data"]["emotion"]["score"].as_f64().unwrap();
    assert!((score - 0.72).abs() < 1e-3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_bad_start_requests() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    let response = client
        .post(server.url("/api/monitor/start"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let response = client
        .post(server.url("/api/monitor/start"))
        .json(&serde_json::json!({ "duration": -5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "error");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_preview_frame_and_cors() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let response = client
        .get(server.url("/api/monitor/frame"))
        .header("origin", "http://localhost:3000")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["content-type"], "image/jpeg");
    assert!(response.headers().contains_key("access-control-allow-origin"));
    let bytes = response.bytes().await.unwrap();
    assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_start_fails_once_capture_stopped() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();
    server.capture.stop();

    let response = client
        .post(server.url("/api/monitor/start"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 500);

    let health: serde_json::Value = client
        .get(server.url("/api/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "degraded");
    assert_eq!(health["components"]["classifier"]["status"], "mock");
}
