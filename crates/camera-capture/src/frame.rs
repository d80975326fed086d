//! Video frame types and processing

use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage};

/// Decoded RGB video frame
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// RGB pixel data (width * height * 3)
    pub data: Vec<u8>,
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Capture timestamp (nanoseconds since the source was opened)
    pub timestamp_ns: u64,
    /// Frame sequence number
    pub sequence: u32,
}

impl VideoFrame {
    /// Create a new video frame from raw RGB data
    pub fn new(data: Vec<u8>, width: u32, height: u32, timestamp_ns: u64, sequence: u32) -> Self {
        Self {
            data,
            width,
            height,
            timestamp_ns,
            sequence,
        }
    }

    /// Wrap a decoded RGB image
    pub fn from_rgb_image(image: RgbImage, timestamp_ns: u64, sequence: u32) -> Self {
        let (width, height) = image.dimensions();
        Self::new(image.into_raw(), width, height, timestamp_ns, sequence)
    }

    /// Copy into an `image` buffer; `None` if the data length does not match the dimensions
    pub fn to_rgb_image(&self) -> Option<RgbImage> {
        RgbImage::from_raw(self.width, self.height, self.data.clone())
    }

    /// Check that the pixel buffer matches the frame dimensions
    pub fn is_well_formed(&self) -> bool {
        self.data.len() == (self.width as usize) * (self.height as usize) * 3
    }

    /// Convert to grayscale luma; empty for malformed frames
    pub fn to_grayscale(&self) -> Vec<u8> {
        match self.to_rgb_image() {
            Some(image) => DynamicImage::ImageRgb8(image).to_luma8().into_raw(),
            None => Vec::new(),
        }
    }

    /// Standard deviation of the grayscale intensity.
    ///
    /// Blank or covered lenses produce values close to zero.
    pub fn contrast(&self) -> f32 {
        let gray = self.to_grayscale();
        if gray.is_empty() {
            return 0.0;
        }
        let n = gray.len() as f32;
        let mean = gray.iter().map(|&v| v as f32).sum::<f32>() / n;
        let variance = gray
            .iter()
            .map(|&v| {
                let d = v as f32 - mean;
                d * d
            })
            .sum::<f32>()
            / n;
        variance.sqrt()
    }

    /// Crop a region of the frame
    pub fn crop(&self, x: u32, y: u32, w: u32, h: u32) -> Option<VideoFrame> {
        if !self.is_well_formed() || w == 0 || h == 0 || x + w > self.width || y + h > self.height {
            return None;
        }

        let mut cropped = Vec::with_capacity((w * h * 3) as usize);
        for row in y..(y + h) {
            let start = ((row * self.width + x) * 3) as usize;
            let end = start + (w * 3) as usize;
            cropped.extend_from_slice(self.data.get(start..end)?);
        }

        Some(VideoFrame {
            data: cropped,
            width: w,
            height: h,
            timestamp_ns: self.timestamp_ns,
            sequence: self.sequence,
        })
    }

    /// Largest centered square crop
    pub fn center_square(&self) -> Option<VideoFrame> {
        let side = self.width.min(self.height);
        let x = (self.width - side) / 2;
        let y = (self.height - side) / 2;
        self.crop(x, y, side, side)
    }

    /// Resize frame (nearest neighbour); `None` for malformed frames or zero target size
    pub fn resize(&self, new_width: u32, new_height: u32) -> Option<VideoFrame> {
        if new_width == 0 || new_height == 0 {
            return None;
        }
        let image = self.to_rgb_image()?;
        let resized = imageops::resize(&image, new_width, new_height, FilterType::Nearest);
        Some(VideoFrame::from_rgb_image(resized, self.timestamp_ns, self.sequence))
    }
}
