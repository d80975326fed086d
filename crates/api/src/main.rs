//! Emotion Monitor - Main Entry Point

use anyhow::Context;
use api::{init_logging, init_metrics, run_server, AppState, Settings};
use camera_capture::open_source;
use emotion::{EmotionClassifier, FerPlusClassifier};
use monitor::{CaptureLoop, CaptureSettings, EmotionSource, MonitoringSession, Preview};
use std::sync::Arc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("Failed to load settings")?;
    init_logging(&settings.logging)?;

    info!("=== Emotion Monitor v{} ===", env!("CARGO_PKG_VERSION"));

    let metrics = if settings.metrics.enabled {
        Some(init_metrics()?)
    } else {
        None
    };

    // The device is held by the capture loop until it exits
    let source = open_source(&settings.camera).context("Failed to open frame source")?;
    let classifier =
        FerPlusClassifier::new(&settings.classifier).context("Failed to load emotion classifier")?;
    let classifier_name = classifier.name().to_string();
    let classifier_mock = classifier.is_mock();

    let session = MonitoringSession::new(settings.monitor.buffer_capacity)
        .context("Invalid monitor configuration")?
        .into_shared();
    let preview = Preview::new();

    let capture = CaptureLoop::new(
        source,
        EmotionSource::new(classifier),
        session.clone(),
        preview.clone(),
        CaptureSettings::from_config(&settings.camera, &settings.monitor),
    );
    let (capture_handle, capture_task) = capture.spawn();

    let mut state = AppState::new(session, preview, settings.monitor.clone())
        .with_classifier(classifier_name, classifier_mock)
        .with_capture(capture_handle.clone());
    if let Some(handle) = metrics {
        state = state.with_metrics(handle);
    }

    let served = run_server(&settings.server.addr, Arc::new(state), shutdown_signal()).await;

    capture_handle.stop();
    match capture_task.await {
        Ok(Ok(summary)) => info!(
            "Capture loop finished after {} frames ({} samples)",
            summary.frames, summary.samples
        ),
        Ok(Err(e)) => error!("Capture loop failed: {}", e),
        Err(e) => error!("Capture task panicked: {}", e),
    }

    info!("Shutdown complete");
    served
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
