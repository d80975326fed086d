//! Emotion Monitoring Session
//!
//! The stateful core of the emotion monitor:
//! - Bounded monitoring windows started on request and expired by the capture loop
//! - Rolling buffer of per-frame emotion samples
//! - Dominant-emotion verdict and the confusion follow-up heuristic
//! - Capture loop driver and preview surface

pub mod capture;
pub mod config;
pub mod duration;
pub mod followup;
pub mod preview;
pub mod session;
pub mod source;
pub mod verdict;

pub use capture::{CaptureHandle, CaptureLoop, CaptureSettings, CaptureSummary};
pub use config::MonitorConfig;
pub use duration::SessionDuration;
pub use followup::{needs_followup, FollowUpThresholds};
pub use preview::{Overlay, Preview};
pub use session::{MonitoringSession, SessionPhase, SessionStatus, SharedSession, TickOutcome};
pub use source::{EmotionSource, SampleSource};
pub use verdict::{Sample, Verdict};

use camera_capture::CameraError;
use emotion::EmotionError;
use ring_buffer::RingBufferError;
use thiserror::Error;

/// Monitoring error types
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Invalid session duration {value}: expected a finite number of seconds in (0, {max}]")]
    InvalidDuration { value: f64, max: f64 },

    #[error("Invalid monitor configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid buffer configuration: {0}")]
    Buffer(#[from] RingBufferError),

    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),

    #[error("Classifier error: {0}")]
    Classifier(#[from] EmotionError),

    #[error("Capture aborted after {errors} consecutive read failures: {last}")]
    CaptureAborted { errors: u32, last: String },

    #[error("Preview encoding failed: {0}")]
    Preview(#[from] image::ImageError),
}
