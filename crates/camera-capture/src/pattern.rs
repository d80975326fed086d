//! Synthetic test pattern source

use crate::{CameraError, FrameSource, VideoFrame};
use std::time::Instant;

/// Generates a diagonal gradient with a moving vertical bar.
///
/// Never runs out of frames unless a limit is set.
pub struct TestPatternSource {
    width: u32,
    height: u32,
    sequence: u32,
    limit: Option<u32>,
    opened_at: Instant,
}

impl TestPatternSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            sequence: 0,
            limit: None,
            opened_at: Instant::now(),
        }
    }

    /// Stop after `frames` frames
    pub fn with_limit(mut self, frames: u32) -> Self {
        self.limit = Some(frames);
        self
    }

    fn render(&self) -> Vec<u8> {
        let bar_width = (self.width / 8).max(1);
        let bar_x = (self.sequence.wrapping_mul(4)) % self.width;
        let mut data = Vec::with_capacity((self.width * self.height * 3) as usize);

        for y in 0..self.height {
            for x in 0..self.width {
                if x >= bar_x && x < bar_x + bar_width {
                    data.extend_from_slice(&[240, 240, 240]);
                } else {
                    let r = (x * 255 / self.width) as u8;
                    let g = (y * 255 / self.height) as u8;
                    data.extend_from_slice(&[r, g, 96]);
                }
            }
        }
        data
    }
}

impl FrameSource for TestPatternSource {
    fn read(&mut self) -> Result<Option<VideoFrame>, CameraError> {
        if self.limit.is_some_and(|limit| self.sequence >= limit) {
            return Ok(None);
        }

        let frame = VideoFrame::new(
            self.render(),
            self.width,
            self.height,
            self.opened_at.elapsed().as_nanos() as u64,
            self.sequence,
        );
        self.sequence = self.sequence.wrapping_add(1);
        Ok(Some(frame))
    }

    fn describe(&self) -> String {
        format!("test pattern {}x{}", self.width, self.height)
    }
}
