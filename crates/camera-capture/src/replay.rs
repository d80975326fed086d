//! Replay of still images from a directory

use crate::{CameraError, FrameSource, VideoFrame};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::debug;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

/// Reads image files in lexicographic path order, one per frame
pub struct ReplaySource {
    dir: PathBuf,
    files: Vec<PathBuf>,
    cursor: usize,
    looping: bool,
    sequence: u32,
    opened_at: Instant,
}

impl ReplaySource {
    /// Scan `dir` for images; fails if it is unreadable or holds none
    pub fn open(dir: &Path, looping: bool) -> Result<Self, CameraError> {
        let entries = std::fs::read_dir(dir)
            .map_err(|e| CameraError::Open(format!("{}: {}", dir.display(), e)))?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| is_image(path))
            .collect();
        files.sort();

        if files.is_empty() {
            return Err(CameraError::Open(format!(
                "{}: no images found",
                dir.display()
            )));
        }

        debug!("Replay source found {} images in {}", files.len(), dir.display());

        Ok(Self {
            dir: dir.to_path_buf(),
            files,
            cursor: 0,
            looping,
            sequence: 0,
            opened_at: Instant::now(),
        })
    }

    /// Number of images in the replay set
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

impl FrameSource for ReplaySource {
    fn read(&mut self) -> Result<Option<VideoFrame>, CameraError> {
        if self.cursor >= self.files.len() {
            if !self.looping {
                return Ok(None);
            }
            self.cursor = 0;
        }

        let path = &self.files[self.cursor];
        self.cursor += 1;

        let image = image::open(path)?.to_rgb8();
        let frame = VideoFrame::from_rgb_image(
            image,
            self.opened_at.elapsed().as_nanos() as u64,
            self.sequence,
        );
        self.sequence = self.sequence.wrapping_add(1);
        Ok(Some(frame))
    }

    fn describe(&self) -> String {
        format!("replay of {} ({} images)", self.dir.display(), self.files.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "emotion-monitor-replay-{}-{}",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_image(dir: &Path, name: &str, shade: u8) {
        let img = RgbImage::from_pixel(4, 3, Rgb([shade, shade, shade]));
        img.save(dir.join(name)).unwrap();
    }

    #[test]
    fn test_replays_in_order_then_ends() {
        let dir = temp_dir("order");
        write_image(&dir, "b.png", 200);
        write_image(&dir, "a.png", 10);
        std::fs::write(dir.join("notes.txt"), b"ignored").unwrap();

        let mut source = ReplaySource::open(&dir, false).unwrap();
        assert_eq!(source.len(), 2);

        let first = source.read().unwrap().unwrap();
        assert_eq!(first.to_rgb_image().unwrap().get_pixel(0, 0).0, [10, 10, 10]);
        let second = source.read().unwrap().unwrap();
        assert_eq!(second.to_rgb_image().unwrap().get_pixel(0, 0).0, [200, 200, 200]);
        assert_eq!(second.sequence, 1);
        assert!(source.read().unwrap().is_none());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_looping_wraps_around() {
        let dir = temp_dir("loop");
        write_image(&dir, "only.png", 50);

        let mut source = ReplaySource::open(&dir, true).unwrap();
        for _ in 0..3 {
            assert!(source.read().unwrap().is_some());
        }

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_empty_dir_rejected() {
        let dir = temp_dir("empty");
        assert!(matches!(ReplaySource::open(&dir, true), Err(CameraError::Open(_))));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
