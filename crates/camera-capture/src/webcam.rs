//! Local webcam source backed by nokhwa

use crate::{CameraConfig, CameraError, FrameSource, VideoFrame};
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
};
use nokhwa::Camera;
use std::time::Instant;
use tracing::{error, info};

/// Streams RGB frames from a local capture device.
///
/// The device is released when the source is dropped.
pub struct WebcamSource {
    camera: Camera,
    device_index: u32,
    sequence: u32,
    opened_at: Instant,
}

impl WebcamSource {
    /// Open the device and start streaming
    pub fn open(config: &CameraConfig) -> Result<Self, CameraError> {
        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(
            CameraFormat::new(
                Resolution::new(config.width, config.height),
                FrameFormat::MJPEG,
                config.fps.max(1),
            ),
        ));

        let mut camera = Camera::new(CameraIndex::Index(config.device_index), requested)
            .map_err(|e| {
                error!("Failed to open camera {}: {}", config.device_index, e);
                CameraError::Open(format!("device {}: {}", config.device_index, e))
            })?;

        camera
            .open_stream()
            .map_err(|e| CameraError::Stream(e.to_string()))?;

        info!(
            "Webcam {} streaming at {}x{}",
            config.device_index,
            camera.resolution().width(),
            camera.resolution().height()
        );

        Ok(Self {
            camera,
            device_index: config.device_index,
            sequence: 0,
            opened_at: Instant::now(),
        })
    }
}

impl FrameSource for WebcamSource {
    fn read(&mut self) -> Result<Option<VideoFrame>, CameraError> {
        let buffer = self
            .camera
            .frame()
            .map_err(|e| CameraError::Stream(e.to_string()))?;
        let decoded = buffer
            .decode_image::<RgbFormat>()
            .map_err(|e| CameraError::Format(e.to_string()))?;

        let (width, height) = (decoded.width(), decoded.height());
        let frame = VideoFrame::new(
            decoded.into_raw(),
            width,
            height,
            self.opened_at.elapsed().as_nanos() as u64,
            self.sequence,
        );
        self.sequence = self.sequence.wrapping_add(1);
        Ok(Some(frame))
    }

    fn describe(&self) -> String {
        format!("webcam {}", self.device_index)
    }
}

impl Drop for WebcamSource {
    fn drop(&mut self) {
        if let Err(e) = self.camera.stop_stream() {
            error!("Error stopping camera stream: {}", e);
        }
        info!("Webcam {} released", self.device_index);
    }
}

// SAFETY: the source is moved into the capture thread once and only ever
// used from that thread.
unsafe impl Send for WebcamSource {}
