//! Emotion Monitor API Server
//!
//! HTTP surface of the emotion monitor: start a monitoring window, read back
//! the verdict, inspect the session and the live preview.

use anyhow::Context;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use monitor::{CaptureHandle, MonitorConfig, Preview, SessionPhase, SharedSession};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

pub mod error;
pub mod routes;
pub mod settings;

pub use error::{ApiError, Envelope};
pub use settings::{LogFormat, LoggingConfig, Settings};

/// Application state shared across handlers
pub struct AppState {
    /// The process-wide monitoring session
    pub session: SharedSession,
    /// Latest annotated frame
    pub preview: Preview,
    /// Duration defaults, follow-up thresholds and preview quality
    pub monitor: MonitorConfig,
    /// Name of the active emotion classifier
    pub classifier: String,
    /// Classifier runs without a model and returns fixed scores
    pub classifier_mock: bool,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: Instant,
    /// Capture loop control; `None` when no loop feeds the session
    pub capture: Option<CaptureHandle>,
    /// Prometheus exporter, when metrics are enabled
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new application state
    pub fn new(session: SharedSession, preview: Preview, monitor: MonitorConfig) -> Self {
        Self {
            session,
            preview,
            monitor,
            classifier: "none".to_string(),
            classifier_mock: false,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: Instant::now(),
            capture: None,
            metrics: None,
        }
    }

    pub fn with_classifier(mut self, name: impl Into<String>, mock: bool) -> Self {
        self.classifier = name.into();
        self.classifier_mock = mock;
        self
    }

    pub fn with_capture(mut self, handle: CaptureHandle) -> Self {
        self.capture = Some(handle);
        self
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// False only when a capture loop was attached and has since exited
    pub fn capture_running(&self) -> bool {
        self.capture.as_ref().map_or(true, CaptureHandle::is_running)
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub components: ComponentStatus,
    pub session: SessionPhase,
}

/// Component status
#[derive(Debug, Serialize)]
pub struct ComponentStatus {
    pub capture: ComponentHealth,
    pub classifier: ComponentHealth,
}

/// Individual component health
#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/monitor/start", post(routes::monitor::start))
        .route("/api/monitor/result", get(routes::monitor::result))
        .route("/api/monitor/status", get(routes::monitor::status))
        .route("/api/monitor/frame", get(routes::monitor::frame))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let capture_running = state.capture_running();
    let session = state.session.lock().await.phase();

    let capture = match &state.capture {
        Some(_) if capture_running => ComponentHealth {
            status: "ok".to_string(),
            detail: None,
        },
        Some(_) => ComponentHealth {
            status: "stopped".to_string(),
            detail: Some("capture loop exited".to_string()),
        },
        None => ComponentHealth {
            status: "detached".to_string(),
            detail: None,
        },
    };

    Json(HealthResponse {
        status: if capture_running { "healthy" } else { "degraded" }.to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        components: ComponentStatus {
            capture,
            classifier: ComponentHealth {
                status: if state.classifier_mock { "mock" } else { "ok" }.to_string(),
                detail: Some(state.classifier.clone()),
            },
        },
        session,
    })
}

/// Prometheus text exposition
async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(Envelope::error("Metrics are disabled")),
        )
            .into_response(),
    }
}

/// Initialize logging
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let level: Level = config
        .level
        .parse()
        .with_context(|| format!("Invalid log level {:?}", config.level))?;

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    match config.format {
        LogFormat::Pretty => tracing::subscriber::set_global_default(builder.finish()),
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish()),
    }
    .context("Failed to set tracing subscriber")
}

/// Install the global Prometheus recorder
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    metrics::describe_counter!(
        "emotion_monitor_sessions_started_total",
        "Monitoring windows opened"
    );
    metrics::describe_counter!(
        "emotion_monitor_sessions_expired_total",
        "Monitoring windows closed by elapsed duration"
    );
    metrics::describe_counter!("emotion_monitor_samples_total", "Samples appended to the buffer");
    metrics::describe_counter!(
        "emotion_monitor_frames_skipped_total",
        "Frames without a usable face while monitoring"
    );
    metrics::describe_counter!("emotion_monitor_frames_total", "Frames read by the capture loop");
    metrics::describe_gauge!("emotion_monitor_buffer_len", "Samples currently buffered");

    Ok(handle)
}

/// Serve on an already bound listener until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, state: Arc<AppState>, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!("Starting API server on {}", listener.local_addr()?);
    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("API server failed")
}

/// Run the server
pub async fn run_server<F>(addr: &str, state: Arc<AppState>, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    serve(listener, state, shutdown).await
}
