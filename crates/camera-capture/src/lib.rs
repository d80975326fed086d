//! Camera Capture Library for the Emotion Monitor
//!
//! Provides the frame type and the frame sources the capture loop reads from:
//! - Synthetic test pattern (no hardware required)
//! - Replay of a directory of still images
//! - Local webcam (behind the `webcam` feature)

pub mod frame;
pub mod pattern;
pub mod replay;
#[cfg(feature = "webcam")]
pub mod webcam;

pub use frame::VideoFrame;
pub use pattern::TestPatternSource;
pub use replay::ReplaySource;

use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

/// Camera error types
#[derive(Error, Debug)]
pub enum CameraError {
    #[error("Failed to open camera: {0}")]
    Open(String),

    #[error("Invalid format: {0}")]
    Format(String),

    #[error("Streaming error: {0}")]
    Stream(String),

    #[error("Capture timeout")]
    Timeout,

    #[error("Frame decode failed: {0}")]
    Decode(#[from] image::ImageError),
}

/// A source of video frames.
///
/// `Ok(None)` signals end of stream; errors are per-read and the caller
/// decides whether to keep reading.
pub trait FrameSource: Send {
    /// Read the next frame
    fn read(&mut self) -> Result<Option<VideoFrame>, CameraError>;

    /// Human readable description for logs
    fn describe(&self) -> String;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn read(&mut self) -> Result<Option<VideoFrame>, CameraError> {
        (**self).read()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Which frame source to open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Synthetic moving test pattern
    Pattern,
    /// Still images replayed from a directory
    Replay,
    /// Local webcam
    Webcam,
}

/// Camera configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Source to open
    pub source: SourceKind,
    /// Webcam device index
    pub device_index: u32,
    /// Directory of images for replay
    pub replay_dir: PathBuf,
    /// Restart replay from the first image when exhausted
    pub replay_loop: bool,
    /// Capture width
    pub width: u32,
    /// Capture height
    pub height: u32,
    /// Target FPS (0 = unpaced)
    pub fps: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            source: SourceKind::Pattern,
            device_index: 0,
            replay_dir: PathBuf::from("frames"),
            replay_loop: true,
            width: 640,
            height: 480,
            fps: 15,
        }
    }
}

impl CameraConfig {
    /// Create webcam config for the given device index
    pub fn webcam(device_index: u32) -> Self {
        Self {
            source: SourceKind::Webcam,
            device_index,
            ..Default::default()
        }
    }

    /// Create replay config for a directory of images
    pub fn replay(dir: impl Into<PathBuf>) -> Self {
        Self {
            source: SourceKind::Replay,
            replay_dir: dir.into(),
            ..Default::default()
        }
    }
}

/// Open the configured frame source.
///
/// Fails when the device or directory cannot be opened; callers treat this
/// as fatal at startup.
pub fn open_source(config: &CameraConfig) -> Result<Box<dyn FrameSource>, CameraError> {
    let source: Box<dyn FrameSource> = match config.source {
        SourceKind::Pattern => Box::new(TestPatternSource::new(config.width, config.height)),
        SourceKind::Replay => Box::new(ReplaySource::open(&config.replay_dir, config.replay_loop)?),
        SourceKind::Webcam => open_webcam(config)?,
    };
    info!("Opened frame source: {}", source.describe());
    Ok(source)
}

#[cfg(feature = "webcam")]
fn open_webcam(config: &CameraConfig) -> Result<Box<dyn FrameSource>, CameraError> {
    Ok(Box::new(webcam::WebcamSource::open(config)?))
}

#[cfg(not(feature = "webcam"))]
fn open_webcam(config: &CameraConfig) -> Result<Box<dyn FrameSource>, CameraError> {
    Err(CameraError::Open(format!(
        "device {} requested but this build has no webcam support (enable the `webcam` feature)",
        config.device_index
    )))
}
