use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

use tracing::{debug, info, warn};

use crate::error::{Result, VideoError};
use crate::video::fitter::FrameFitter;
use crate::video::types::{Frame, VideoJob, VideoParams};

/// Summary of a finished encode
#[derive(Debug, Clone)]
pub struct EncodedVideo {
    pub path: PathBuf,
    pub duration: f64,
    pub frame_count: u64,

    /// Zero when nothing was written
    pub file_size: u64,
}

/// Builds a constant-frame-rate slideshow by piping raw RGB frames into ffmpeg
///
/// Each source image is loaded, letterboxed by the [`FrameFitter`] and written
/// `round(fps * hold_seconds)` times in a row. There is no per-frame duration
/// metadata; the hold is made of repeated identical frames.
pub struct VideoSynthesizer {
    fitter: FrameFitter,
    codec: String,
    quality: u8,
}

impl VideoSynthesizer {
    pub fn new(fitter: FrameFitter) -> Self {
        let defaults = VideoParams::default();
        Self {
            fitter,
            codec: defaults.codec,
            quality: defaults.quality,
        }
    }

    pub fn with_codec<S: Into<String>>(mut self, codec: S, quality: u8) -> Self {
        self.codec = codec.into();
        self.quality = quality;
        self
    }

    pub fn check_ffmpeg_available() -> bool {
        Command::new("ffmpeg")
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    /// Encode `job` to `job.output_path`
    ///
    /// Blocks until ffmpeg has flushed and closed the container. Any frame
    /// that fails to load or fit aborts the whole job; the encoder is still
    /// closed so no half-written process is left behind.
    ///
    /// An empty frame list spawns no encoder and writes no file.
    pub fn synthesize(&self, job: VideoJob) -> Result<EncodedVideo> {
        self.validate(&job)?;

        let frames_per_image = job.frames_per_image();
        info!(
            "Synthesizing {} images x {} frames at {} fps -> {:?}",
            job.frames.len(),
            frames_per_image,
            job.fps,
            job.output_path
        );

        if job.frames.is_empty() {
            warn!("No frames to encode, skipping video output");
            return Ok(EncodedVideo {
                path: job.output_path,
                duration: 0.0,
                frame_count: 0,
                file_size: 0,
            });
        }

        if !Self::check_ffmpeg_available() {
            return Err(VideoError::EncoderUnavailable {
                reason: "FFmpeg not found. Please install FFmpeg.".to_string(),
            }
            .into());
        }

        let config = *self.fitter.config();
        let mut stream = EncoderStream::open(
            &job.output_path,
            config.target_width,
            config.target_height,
            job.fps,
            &self.codec,
            quality_to_crf(self.quality),
        )?;

        for (index, path) in job.frames.iter().enumerate() {
            debug!("Frame {}/{}: {}", index + 1, job.frames.len(), path.display());

            let frame = Frame::load(path)?;
            let fitted = self.fitter.fit(&frame)?;

            for _ in 0..frames_per_image {
                stream.write_frame(&fitted)?;
            }
        }

        let frame_count = stream.finish()?;
        let file_size = std::fs::metadata(&job.output_path)?.len();

        info!(
            "Video written: {} frames, {:.1}s, {:.1} KB",
            frame_count,
            frame_count as f64 / job.fps as f64,
            file_size as f64 / 1024.0
        );

        Ok(EncodedVideo {
            duration: frame_count as f64 / job.fps as f64,
            path: job.output_path,
            frame_count,
            file_size,
        })
    }

    fn validate(&self, job: &VideoJob) -> Result<()> {
        if job.fps == 0 {
            return Err(VideoError::InvalidParameters {
                details: "fps must be positive".to_string(),
            }
            .into());
        }

        if !job.hold_seconds.is_finite() || job.hold_seconds <= 0.0 {
            return Err(VideoError::InvalidParameters {
                details: format!("hold duration must be positive, got {}", job.hold_seconds),
            }
            .into());
        }

        let config = self.fitter.config();
        if config.target_width == 0
            || config.target_height == 0
            || config.target_width % 2 != 0
            || config.target_height % 2 != 0
        {
            // yuv420p output needs even dimensions
            return Err(VideoError::InvalidParameters {
                details: format!(
                    "canvas must be non-zero and even, got {}x{}",
                    config.target_width, config.target_height
                ),
            }
            .into());
        }

        Ok(())
    }
}

fn quality_to_crf(quality: u8) -> u8 {
    (51 - ((quality.min(100) as f32 / 100.0) * 51.0) as u8).clamp(0, 51)
}

/// A running ffmpeg process reading raw RGB24 frames on stdin
///
/// Dropping the stream closes stdin and waits for ffmpeg, so the container
/// is finalized on every exit path.
struct EncoderStream {
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    width: u32,
    height: u32,
    frames_written: u64,
}

impl EncoderStream {
    fn open(output_path: &Path, width: u32, height: u32, fps: u32, codec: &str, crf: u8) -> Result<Self> {
        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .args([
                "-y",
                "-loglevel", "error",
                "-f", "rawvideo",
                "-pix_fmt", "rgb24",
                "-s", &format!("{}x{}", width, height),
                "-r", &fps.to_string(),
                "-i", "pipe:0",
                "-an",
                "-c:v", codec,
                "-pix_fmt", "yuv420p",
                "-crf", &crf.to_string(),
                "-movflags", "+faststart",
            ])
            .arg(output_path);

        let mut child = cmd.spawn().map_err(|e| VideoError::EncoderUnavailable {
            reason: format!("Failed to spawn FFmpeg process: {}", e),
        })?;

        let stdin = child.stdin.take().ok_or_else(|| VideoError::EncodingFailed {
            reason: "Failed to open FFmpeg stdin".to_string(),
        })?;

        debug!("Spawned ffmpeg ({} {}x{} @ {} fps, crf {})", codec, width, height, fps, crf);

        Ok(Self {
            child: Some(child),
            stdin: Some(stdin),
            width,
            height,
            frames_written: 0,
        })
    }

    fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        if frame.width() != self.width || frame.height() != self.height {
            return Err(VideoError::FrameSizeMismatch {
                got_width: frame.width(),
                got_height: frame.height(),
                width: self.width,
                height: self.height,
            }
            .into());
        }

        let stdin = self.stdin.as_mut().ok_or_else(|| VideoError::EncodingFailed {
            reason: "Encoder is already finalized".to_string(),
        })?;

        if let Err(e) = stdin.write_all(frame.as_rgb_bytes()) {
            // ffmpeg usually went away on its own; its stderr says why
            return Err(self.abort(format!("Failed to write frame to FFmpeg: {}", e)).into());
        }

        self.frames_written += 1;
        Ok(())
    }

    /// Close stdin and wait for ffmpeg to flush the container
    fn finish(mut self) -> Result<u64> {
        drop(self.stdin.take());

        let child = self.child.take().ok_or_else(|| VideoError::EncodingFailed {
            reason: "Encoder is already finalized".to_string(),
        })?;

        let output = child.wait_with_output().map_err(|e| VideoError::EncodingFailed {
            reason: format!("FFmpeg execution failed: {}", e),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VideoError::EncodingFailed {
                reason: format!("FFmpeg failed: {}", stderr.trim()),
            }
            .into());
        }

        Ok(self.frames_written)
    }

    /// Reap ffmpeg after a failed write and describe the failure with its stderr
    fn abort(&mut self, context: String) -> VideoError {
        drop(self.stdin.take());

        let Some(child) = self.child.take() else {
            return VideoError::EncodingFailed { reason: context };
        };

        let reason = match child.wait_with_output() {
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                let stderr = stderr.trim();
                if stderr.is_empty() {
                    format!("{} ({})", context, output.status)
                } else {
                    format!("{}; FFmpeg said: {}", context, stderr)
                }
            }
            Err(e) => format!("{}; FFmpeg execution failed: {}", context, e),
        };

        VideoError::EncodingFailed { reason }
    }
}

impl Drop for EncoderStream {
    fn drop(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.wait() {
                warn!("Failed to wait for FFmpeg to exit: {}", e);
            }
        }
    }
}
