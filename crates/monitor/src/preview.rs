//! Preview surface: latest annotated frame

use crate::{MonitorError, Sample};
use camera_capture::VideoFrame;
use emotion::Emotion;
use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;
use std::sync::{Arc, PoisonError, RwLock};

const BORDER: u32 = 4;
const BAR_HEIGHT: u32 = 12;
const MONITORING: Rgb<u8> = Rgb([0, 200, 0]);
const READY: Rgb<u8> = Rgb([128, 128, 128]);

/// What to draw over a frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Overlay {
    pub monitoring: bool,
    /// Latest sample of the open window
    pub latest: Option<Sample>,
}

fn emotion_color(emotion: Emotion) -> Rgb<u8> {
    match emotion {
        Emotion::Angry => Rgb([220, 40, 40]),
        Emotion::Disgust => Rgb([120, 160, 40]),
        Emotion::Fear => Rgb([150, 60, 200]),
        Emotion::Happy => Rgb([250, 200, 0]),
        Emotion::Neutral => Rgb([200, 200, 200]),
        Emotion::Sad => Rgb([40, 90, 220]),
        Emotion::Surprise => Rgb([250, 120, 0]),
    }
}

/// Draw the status border and the emotion bar in place
pub fn render_overlay(image: &mut RgbImage, overlay: &Overlay) {
    let (width, height) = image.dimensions();
    let color = if overlay.monitoring { MONITORING } else { READY };

    for inset in 0..BORDER.min(width / 2).min(height / 2) {
        let rect = Rect::at(inset as i32, inset as i32)
            .of_size(width - 2 * inset, height - 2 * inset);
        draw_hollow_rect_mut(image, rect, color);
    }

    if let (true, Some(sample)) = (overlay.monitoring, overlay.latest) {
        let bar_width = ((width as f32) * sample.score).round() as u32;
        if bar_width > 0 && height > BAR_HEIGHT {
            let rect = Rect::at(0, (height - BAR_HEIGHT) as i32).of_size(bar_width, BAR_HEIGHT);
            draw_filled_rect_mut(image, rect, emotion_color(sample.emotion));
        }
    }
}

#[derive(Debug, Clone)]
struct PreviewFrame {
    image: RgbImage,
    sequence: u32,
}

/// Latest annotated frame, written by the capture loop and read by the API
#[derive(Debug, Clone, Default)]
pub struct Preview {
    latest: Arc<RwLock<Option<PreviewFrame>>>,
}

impl Preview {
    pub fn new() -> Self {
        Self::default()
    }

    /// Annotate and store `frame`; malformed frames are ignored
    pub fn publish(&self, frame: &VideoFrame, overlay: &Overlay) {
        let Some(mut image) = frame.to_rgb_image() else {
            return;
        };
        render_overlay(&mut image, overlay);

        let mut latest = self.latest.write().unwrap_or_else(PoisonError::into_inner);
        *latest = Some(PreviewFrame {
            image,
            sequence: frame.sequence,
        });
    }

    /// Drop the stored frame
    pub fn clear(&self) {
        let mut latest = self.latest.write().unwrap_or_else(PoisonError::into_inner);
        *latest = None;
    }

    /// Sequence number of the stored frame
    pub fn sequence(&self) -> Option<u32> {
        let latest = self.latest.read().unwrap_or_else(PoisonError::into_inner);
        latest.as_ref().map(|f| f.sequence)
    }

    /// JPEG-encode the stored frame
    pub fn latest_jpeg(&self, quality: u8) -> Result<Option<Vec<u8>>, MonitorError> {
        let image = {
            let latest = self.latest.read().unwrap_or_else(PoisonError::into_inner);
            match latest.as_ref() {
                Some(frame) => frame.image.clone(),
                None => return Ok(None),
            }
        };

        let mut bytes = Vec::new();
        JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100)).encode_image(&image)?;
        Ok(Some(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray_frame(width: u32, height: u32) -> VideoFrame {
        VideoFrame::new(vec![50; (width * height * 3) as usize], width, height, 0, 7)
    }

    #[test]
    fn test_overlay_colors() {
        let mut image = RgbImage::from_pixel(40, 30, Rgb([0, 0, 0]));
        render_overlay(
            &mut image,
            &Overlay {
                monitoring: true,
                latest: Some(Sample::new(Emotion::Sad, 0.5)),
            },
        );

        assert_eq!(*image.get_pixel(0, 0), MONITORING);
        assert_eq!(*image.get_pixel(20, 15), Rgb([0, 0, 0]));
        assert_eq!(*image.get_pixel(10, 25), emotion_color(Emotion::Sad));
        assert_eq!(*image.get_pixel(30, 25), Rgb([0, 0, 0]));

        let mut idle = RgbImage::from_pixel(40, 30, Rgb([0, 0, 0]));
        render_overlay(&mut idle, &Overlay::default());
        assert_eq!(*idle.get_pixel(39, 29), READY);
    }

    #[test]
    fn test_tiny_frames_do_not_panic() {
        let mut image = RgbImage::from_pixel(1, 1, Rgb([0, 0, 0]));
        render_overlay(
            &mut image,
            &Overlay {
                monitoring: true,
                latest: Some(Sample::new(Emotion::Happy, 1.0)),
            },
        );
    }

    #[test]
    fn test_publish_encode_clear() {
        let preview = Preview::new();
        assert!(preview.latest_jpeg(80).unwrap().is_none());

        preview.publish(&gray_frame(32, 24), &Overlay::default());
        assert_eq!(preview.sequence(), Some(7));

        let jpeg = preview.latest_jpeg(80).unwrap().unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);

        preview.clear();
        assert_eq!(preview.sequence(), None);
    }

    #[test]
    fn test_malformed_frame_ignored() {
        let preview = Preview::new();
        preview.publish(&VideoFrame::new(vec![1, 2], 4, 4, 0, 0), &Overlay::default());
        assert_eq!(preview.sequence(), None);
    }
}
