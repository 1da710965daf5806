use std::path::Path;
use std::process::{Command, Stdio};

use serde::Deserialize;
use tracing::debug;

use crate::error::{Result, VideoError};

/// What ffprobe reports about the first video stream of a container
#[derive(Debug, Clone, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub codec: String,

    /// Frames actually decoded from the stream (not the header estimate)
    pub frame_count: u64,
}

#[derive(Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
    codec_name: Option<String>,
    r_frame_rate: Option<String>,
    nb_read_frames: Option<String>,
}

pub fn check_ffprobe_available() -> bool {
    Command::new("ffprobe")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Decode the whole video stream and count its frames
pub fn probe_video<P: AsRef<Path>>(path: P) -> Result<VideoMetadata> {
    let path = path.as_ref();
    let path_str = path.display().to_string();

    if !check_ffprobe_available() {
        return Err(VideoError::ProbeFailed {
            path: path_str,
            reason: "ffprobe not found. Please install FFmpeg.".to_string(),
        }
        .into());
    }

    let output = Command::new("ffprobe")
        .args([
            "-v", "error",
            "-count_frames",
            "-select_streams", "v:0",
            "-show_entries", "stream=width,height,codec_name,r_frame_rate,nb_read_frames",
            "-of", "json",
        ])
        .arg(path)
        .output()
        .map_err(|e| VideoError::ProbeFailed {
            path: path_str.clone(),
            reason: format!("ffprobe execution failed: {}", e),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(VideoError::ProbeFailed {
            path: path_str,
            reason: stderr.trim().to_string(),
        }
        .into());
    }

    let metadata = parse_probe_output(&output.stdout).map_err(|reason| VideoError::ProbeFailed {
        path: path_str.clone(),
        reason,
    })?;

    debug!(
        "Probed {}: {}x{} @ {:.2}fps, {} frames ({})",
        path_str, metadata.width, metadata.height, metadata.fps, metadata.frame_count, metadata.codec
    );

    Ok(metadata)
}

fn parse_probe_output(json: &[u8]) -> std::result::Result<VideoMetadata, String> {
    let parsed: ProbeOutput =
        serde_json::from_slice(json).map_err(|e| format!("invalid ffprobe output: {}", e))?;

    let stream = parsed
        .streams
        .into_iter()
        .next()
        .ok_or_else(|| "no video stream".to_string())?;

    let frame_count = stream
        .nb_read_frames
        .as_deref()
        .unwrap_or("0")
        .parse()
        .map_err(|_| "unreadable frame count".to_string())?;

    Ok(VideoMetadata {
        width: stream.width.unwrap_or(0),
        height: stream.height.unwrap_or(0),
        fps: stream.r_frame_rate.as_deref().and_then(parse_rational).unwrap_or(0.0),
        codec: stream.codec_name.unwrap_or_else(|| "unknown".to_string()),
        frame_count,
    })
}

/// Parse ffprobe's "30/1" style rates
fn parse_rational(rate: &str) -> Option<f64> {
    match rate.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            (den != 0.0).then(|| num / den)
        }
        None => rate.trim().parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_probe_output() {
        let json = br#"{
            "programs": [],
            "streams": [
                {
                    "codec_name": "h264",
                    "width": 1920,
                    "height": 1080,
                    "r_frame_rate": "30/1",
                    "nb_read_frames": "180"
                }
            ]
        }"#;

        let metadata = parse_probe_output(json).unwrap();
        assert_eq!(metadata.frame_count, 180);
        assert_eq!((metadata.width, metadata.height), (1920, 1080));
        assert_eq!(metadata.fps, 30.0);
        assert_eq!(metadata.codec, "h264");
    }

    #[test]
    fn test_parse_probe_output_without_streams() {
        assert!(parse_probe_output(br#"{"streams": []}"#).is_err());
        assert!(parse_probe_output(b"not json").is_err());
    }

    #[test]
    fn test_parse_rational() {
        assert_eq!(parse_rational("30000/1001").map(|r| (r * 100.0).round()), Some(2997.0));
        assert_eq!(parse_rational("25"), Some(25.0));
        assert_eq!(parse_rational("1/0"), None);
    }
}
