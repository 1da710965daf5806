use image::{ImageBuffer, Rgb, RgbImage};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{FrameError, Result};

/// A decoded raster frame
///
/// Thin wrapper around a 3-channel RGB buffer. Frames are owned by whichever
/// stage is currently working on them and are never persisted.
#[derive(Clone, Debug)]
pub struct Frame {
    buffer: RgbImage,
}

impl Frame {
    /// Create a new frame from an RGB image buffer
    pub fn new(buffer: RgbImage) -> Self {
        Self { buffer }
    }

    /// Create a new frame with the given dimensions filled with the specified color
    pub fn new_filled(width: u32, height: u32, color: [u8; 3]) -> Self {
        Self {
            buffer: ImageBuffer::from_pixel(width, height, Rgb(color)),
        }
    }

    /// Decode an image file into a frame
    ///
    /// Any decoding or I/O failure is reported as [`FrameError::FrameLoad`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let image = image::open(path).map_err(|e| FrameError::FrameLoad {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let rgb_image = match image {
            image::DynamicImage::ImageRgb8(img) => img,
            _ => image.to_rgb8(),
        };

        Ok(Self::new(rgb_image))
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    /// Get a pixel at the given coordinates (returns RGB array)
    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 3] {
        self.buffer.get_pixel(x, y).0
    }

    /// Get the underlying image buffer
    pub fn as_image(&self) -> &RgbImage {
        &self.buffer
    }

    /// Raw interleaved RGB bytes, row-major
    pub fn as_rgb_bytes(&self) -> &[u8] {
        self.buffer.as_raw()
    }

    /// Save the frame, format chosen from the file extension
    pub fn save<P: AsRef<Path>>(&self, path: P) -> std::result::Result<(), image::ImageError> {
        self.buffer.save(path)
    }
}

/// Letterbox settings applied to every frame of one video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FitConfig {
    pub target_width: u32,
    pub target_height: u32,

    /// Color of the padding bars
    pub fill_color: [u8; 3],
}

impl FitConfig {
    /// Black letterboxing into the given canvas
    pub fn new(target_width: u32, target_height: u32) -> Self {
        Self {
            target_width,
            target_height,
            fill_color: [0, 0, 0],
        }
    }

    pub fn with_fill_color(mut self, fill_color: [u8; 3]) -> Self {
        self.fill_color = fill_color;
        self
    }
}

impl Default for FitConfig {
    fn default() -> Self {
        let (width, height) = VideoParams::default().resolution;
        Self::new(width, height)
    }
}

/// Video encoding parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoParams {
    /// Output frame rate
    pub fps: u32,

    /// Output resolution (width, height)
    pub resolution: (u32, u32),

    /// FFmpeg video codec to use for output
    pub codec: String,

    /// Quality setting (0-100, higher is better)
    pub quality: u8,
}

impl Default for VideoParams {
    fn default() -> Self {
        Self {
            fps: 30,
            resolution: (1920, 1080),
            codec: "libx264".to_string(),
            quality: 85,
        }
    }
}

/// One slideshow encoding job
///
/// Built once by the pipeline and consumed by
/// [`VideoSynthesizer::synthesize`](crate::video::VideoSynthesizer::synthesize).
#[derive(Debug, Clone)]
pub struct VideoJob {
    /// Frame images in playback order
    pub frames: Vec<PathBuf>,

    pub output_path: PathBuf,

    pub fps: u32,

    /// Seconds each frame stays on screen
    pub hold_seconds: f64,
}

impl VideoJob {
    pub fn new<P: Into<PathBuf>>(frames: Vec<PathBuf>, output_path: P, fps: u32, hold_seconds: f64) -> Self {
        Self {
            frames,
            output_path: output_path.into(),
            fps,
            hold_seconds,
        }
    }

    /// Number of identical frames written per source image
    ///
    /// Never less than one, so every page shows up in the output.
    pub fn frames_per_image(&self) -> u64 {
        let count = (self.fps as f64 * self.hold_seconds).round();
        if count.is_finite() && count >= 1.0 {
            count as u64
        } else {
            1
        }
    }

    /// Total number of frames the encoded video will contain
    pub fn total_frames(&self) -> u64 {
        self.frames.len() as u64 * self.frames_per_image()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_per_image_rounds() {
        let job = VideoJob::new(vec![], "out.mp4", 30, 2.0);
        assert_eq!(job.frames_per_image(), 60);

        let job = VideoJob::new(vec![], "out.mp4", 24, 0.52);
        assert_eq!(job.frames_per_image(), 12); // 12.48

        let job = VideoJob::new(vec![], "out.mp4", 30, 0.001);
        assert_eq!(job.frames_per_image(), 1);
    }

    #[test]
    fn test_total_frames() {
        let frames = vec![PathBuf::from("a.png"), PathBuf::from("b.png"), PathBuf::from("c.png")];
        let job = VideoJob::new(frames, "out.mp4", 30, 2.0);
        assert_eq!(job.total_frames(), 180);
    }

    #[test]
    fn test_load_missing_file_is_frame_load_error() {
        let result = Frame::load("definitely/not/here.png");
        assert!(matches!(
            result,
            Err(crate::error::SlideshowError::Frame(FrameError::FrameLoad { .. }))
        ));
    }

    #[test]
    fn test_filled_frame() {
        let frame = Frame::new_filled(4, 2, [10, 20, 30]);
        assert_eq!((frame.width(), frame.height()), (4, 2));
        assert_eq!(frame.get_pixel(3, 1), [10, 20, 30]);
        assert_eq!(frame.as_rgb_bytes().len(), 4 * 2 * 3);
    }
}
