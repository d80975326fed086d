//! Capture loop driver

use crate::{MonitorConfig, MonitorError, Overlay, Preview, SampleSource, SharedSession, TickOutcome};
use camera_capture::{CameraConfig, FrameSource};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Capture loop pacing and fault tolerance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureSettings {
    /// Target frames per second (0 = as fast as the source delivers)
    pub fps: u32,
    /// Consecutive read failures tolerated before aborting
    pub max_consecutive_errors: u32,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            fps: 15,
            max_consecutive_errors: 30,
        }
    }
}

impl CaptureSettings {
    pub fn from_config(camera: &CameraConfig, monitor: &MonitorConfig) -> Self {
        Self {
            fps: camera.fps,
            max_consecutive_errors: monitor.max_consecutive_errors.max(1),
        }
    }

    fn frame_interval(&self) -> Duration {
        if self.fps == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(1.0 / self.fps as f64)
        }
    }
}

/// Counters reported when the loop exits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureSummary {
    pub frames: u64,
    pub samples: u64,
    pub skipped: u64,
    pub read_errors: u64,
}

/// Stops a running capture loop
#[derive(Debug, Clone)]
pub struct CaptureHandle {
    running: Arc<AtomicBool>,
}

impl CaptureHandle {
    /// Ask the loop to exit after the current frame
    pub fn stop(&self) {
        if self.running.swap(false, Ordering::AcqRel) {
            info!("Stopping capture loop");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

/// Runs the loop exit path, including when the loop unwinds from a panic
struct ExitGuard {
    running: Arc<AtomicBool>,
    session: SharedSession,
    preview: Preview,
}

impl Drop for ExitGuard {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
        if std::thread::panicking() {
            error!("Capture loop panicked");
        }
        self.session.blocking_lock().stop();
        self.preview.clear();
    }
}

/// Reads frames, feeds them to the session and publishes the preview.
///
/// Owns the frame source for its whole life; the device is released when the loop returns.
pub struct CaptureLoop<F, S> {
    source: F,
    sampler: S,
    session: SharedSession,
    preview: Preview,
    settings: CaptureSettings,
    running: Arc<AtomicBool>,
}

impl<F, S> CaptureLoop<F, S>
where
    F: FrameSource + 'static,
    S: SampleSource + 'static,
{
    pub fn new(
        source: F,
        sampler: S,
        session: SharedSession,
        preview: Preview,
        settings: CaptureSettings,
    ) -> Self {
        Self {
            source,
            sampler,
            session,
            preview,
            settings,
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn handle(&self) -> CaptureHandle {
        CaptureHandle {
            running: self.running.clone(),
        }
    }

    /// Run on a blocking worker thread
    pub fn spawn(self) -> (CaptureHandle, JoinHandle<Result<CaptureSummary, MonitorError>>) {
        let handle = self.handle();
        let join = tokio::task::spawn_blocking(move || self.run());
        (handle, join)
    }

    /// Run the loop on the current thread until stopped, end of stream, or
    /// too many consecutive read failures.
    ///
    /// Must not be called from inside an async context.
    pub fn run(self) -> Result<CaptureSummary, MonitorError> {
        let CaptureLoop {
            mut source,
            mut sampler,
            session,
            preview,
            settings,
            running,
        } = self;

        let guard = ExitGuard {
            running,
            session,
            preview,
        };
        let ExitGuard {
            running,
            session,
            preview,
        } = &guard;

        info!("Capture loop started on {}", source.describe());
        let interval = settings.frame_interval();
        let mut summary = CaptureSummary::default();
        let mut consecutive_errors = 0u32;

        let result = loop {
            if !running.load(Ordering::Acquire) {
                break Ok(());
            }
            let started = Instant::now();

            match source.read() {
                Ok(Some(frame)) => {
                    consecutive_errors = 0;
                    summary.frames += 1;
                    metrics::counter!("emotion_monitor_frames_total").increment(1);

                    let overlay = {
                        let mut session = session.blocking_lock();
                        match session.tick(&frame, &mut sampler) {
                            TickOutcome::Recorded { .. } => summary.samples += 1,
                            TickOutcome::Skipped { .. } => summary.skipped += 1,
                            TickOutcome::Idle => {}
                        }
                        let monitoring = session.is_monitoring();
                        Overlay {
                            monitoring,
                            latest: session.latest_sample().copied().filter(|_| monitoring),
                        }
                    };
                    preview.publish(&frame, &overlay);
                }
                Ok(None) => {
                    info!("Frame source ended");
                    break Ok(());
                }
                Err(e) => {
                    consecutive_errors += 1;
                    summary.read_errors += 1;
                    warn!(
                        "Frame read failed ({}/{}): {}",
                        consecutive_errors, settings.max_consecutive_errors, e
                    );
                    if consecutive_errors >= settings.max_consecutive_errors {
                        error!("Capture aborted: too many consecutive read failures");
                        break Err(MonitorError::CaptureAborted {
                            errors: consecutive_errors,
                            last: e.to_string(),
                        });
                    }
                }
            }

            if let Some(rest) = interval.checked_sub(started.elapsed()) {
                std::thread::sleep(rest);
            }
        };

        drop(guard);
        drop(source);
        info!(
            "Capture loop exited: {} frames, {} samples, {} skipped, {} read errors",
            summary.frames, summary.samples, summary.skipped, summary.read_errors
        );

        result.map(|()| summary)
    }
}
