//! Letterboxing of arbitrary frames into a fixed canvas.

use image::imageops::{self, FilterType};
use image::{ImageBuffer, Rgb};
use tracing::debug;

use crate::error::{FrameError, Result};
use crate::video::types::{FitConfig, Frame};

/// Resize and padding decisions for one frame
///
/// Padding values are clamped at zero. When the scaled frame overflows the
/// canvas along the non-driving axis the overflow is centre-cropped instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FitGeometry {
    pub scaled_width: u32,
    pub scaled_height: u32,
    pub top: u32,
    pub bottom: u32,
    pub left: u32,
    pub right: u32,
}

impl FitGeometry {
    /// Compute the geometry for a `width x height` source
    ///
    /// Landscape sources (`width > height`) are scaled to the target width,
    /// everything else to the target height. The target box's own aspect
    /// ratio is not consulted.
    pub fn compute(width: u32, height: u32, config: &FitConfig) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(FrameError::InvalidFrame {
                reason: format!("frame has zero dimension ({}x{})", width, height),
            }
            .into());
        }
        if config.target_width == 0 || config.target_height == 0 {
            return Err(FrameError::InvalidFrame {
                reason: format!(
                    "target canvas has zero dimension ({}x{})",
                    config.target_width, config.target_height
                ),
            }
            .into());
        }

        let aspect_ratio = width as f64 / height as f64;
        let (target_width, target_height) = (config.target_width, config.target_height);

        let (scaled_width, scaled_height) = if width > height {
            (target_width, (target_width as f64 / aspect_ratio).round() as u32)
        } else {
            ((target_height as f64 * aspect_ratio).round() as u32, target_height)
        };
        let scaled_width = scaled_width.max(1);
        let scaled_height = scaled_height.max(1);

        let top = target_height.saturating_sub(scaled_height) / 2;
        let bottom = target_height.saturating_sub(scaled_height + top);
        let left = target_width.saturating_sub(scaled_width) / 2;
        let right = target_width.saturating_sub(scaled_width + left);

        Ok(Self {
            scaled_width,
            scaled_height,
            top,
            bottom,
            left,
            right,
        })
    }

    /// Offset of the scaled frame's top-left corner on the canvas
    ///
    /// Negative along an axis the scaled frame overflows.
    pub fn placement(&self, config: &FitConfig) -> (i64, i64) {
        let x = centered_offset(config.target_width, self.scaled_width);
        let y = centered_offset(config.target_height, self.scaled_height);
        (x, y)
    }
}

fn centered_offset(target: u32, scaled: u32) -> i64 {
    if scaled <= target {
        ((target - scaled) / 2) as i64
    } else {
        -(((scaled - target) / 2) as i64)
    }
}

/// Letterboxes frames to a fixed canvas
#[derive(Debug, Clone, Copy)]
pub struct FrameFitter {
    config: FitConfig,
    filter: FilterType,
}

impl FrameFitter {
    /// Fitter using bilinear resampling
    pub fn new(config: FitConfig) -> Self {
        Self {
            config,
            filter: FilterType::Triangle,
        }
    }

    pub fn config(&self) -> &FitConfig {
        &self.config
    }

    /// Resize `frame` preserving its aspect ratio and pad it to the canvas
    ///
    /// The result is always exactly `target_width x target_height`.
    pub fn fit(&self, frame: &Frame) -> Result<Frame> {
        let geometry = FitGeometry::compute(frame.width(), frame.height(), &self.config)?;

        debug!(
            "Fitting {}x{} -> {}x{} (pad t{} b{} l{} r{})",
            frame.width(),
            frame.height(),
            geometry.scaled_width,
            geometry.scaled_height,
            geometry.top,
            geometry.bottom,
            geometry.left,
            geometry.right
        );

        let resized = if geometry.scaled_width == frame.width() && geometry.scaled_height == frame.height() {
            frame.as_image().clone()
        } else {
            imageops::resize(frame.as_image(), geometry.scaled_width, geometry.scaled_height, self.filter)
        };

        let mut canvas = ImageBuffer::from_pixel(
            self.config.target_width,
            self.config.target_height,
            Rgb(self.config.fill_color),
        );
        let (x, y) = geometry.placement(&self.config);
        imageops::replace(&mut canvas, &resized, x, y);

        Ok(Frame::new(canvas))
    }
}

/// Convenience wrapper for a one-off fit
pub fn fit(frame: &Frame, config: FitConfig) -> Result<Frame> {
    FrameFitter::new(config).fit(frame)
}
