use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ConfigError, Result},
    pipeline::duration::DEFAULT_DURATION,
    render::pdftoppm::DEFAULT_DPI,
    video::{FitConfig, VideoParams},
};

/// Main configuration for a slideshow run
///
/// Built once at the program boundary and handed to the
/// [`PipelineEngine`](crate::pipeline::PipelineEngine); nothing downstream
/// reads the environment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Input/output locations
    pub paths: PathsConfig,

    /// Video output settings
    pub video: VideoConfig,

    /// Page rasterization settings
    pub render: RenderConfig,

    /// What kind of input to look for
    pub input: InputConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content)
            .map_err(|_| ConfigError::ParseFailed { path: path.display().to_string() })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string()
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.paths.validate()?;
        self.video.validate()?;
        self.render.validate()?;
        Ok(())
    }

    /// Letterbox settings derived from the video section
    pub fn fit_config(&self) -> FitConfig {
        let (width, height) = self.video.params.resolution;
        FitConfig::new(width, height).with_fill_color(self.video.fill_color)
    }
}

/// Input/output locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding the input document and the variables file
    pub input_dir: PathBuf,

    /// Directory receiving the finished video
    pub output_dir: PathBuf,

    /// File name of the finished video inside `output_dir`
    pub output_file_name: String,

    /// JSON file in `input_dir` carrying the `duration` variable
    pub variables_file: String,

    /// Keep `output_dir/temp` after the run (debugging aid)
    pub keep_temp: bool,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("batches/standard/input"),
            output_dir: PathBuf::from("batches/standard/output"),
            output_file_name: "output_video.mp4".to_string(),
            variables_file: "variables.dictionary".to_string(),
            keep_temp: false,
        }
    }
}

impl PathsConfig {
    fn validate(&self) -> Result<()> {
        if self.output_file_name.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "paths.output_file_name".to_string(),
                value: self.output_file_name.clone()
            }.into());
        }

        Ok(())
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(&self.output_file_name)
    }

    pub fn temp_dir(&self) -> PathBuf {
        self.output_dir.join("temp")
    }

    pub fn variables_path(&self) -> PathBuf {
        self.input_dir.join(&self.variables_file)
    }
}

/// Video output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Encoding parameters (fps, resolution, codec, quality)
    pub params: VideoParams,

    /// Letterbox bar color
    pub fill_color: [u8; 3],

    /// Seconds per page when the input variable is unusable
    pub default_duration: f64,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            params: VideoParams::default(),
            fill_color: [0, 0, 0],
            default_duration: DEFAULT_DURATION,
        }
    }
}

impl VideoConfig {
    fn validate(&self) -> Result<()> {
        if self.params.fps == 0 {
            return Err(ConfigError::InvalidValue {
                key: "video.params.fps".to_string(),
                value: self.params.fps.to_string()
            }.into());
        }

        let (width, height) = self.params.resolution;
        if width == 0 || height == 0 || width % 2 != 0 || height % 2 != 0 {
            // yuv420p needs even dimensions
            return Err(ConfigError::InvalidValue {
                key: "video.params.resolution".to_string(),
                value: format!("{}x{}", width, height)
            }.into());
        }

        if self.params.quality > 100 {
            return Err(ConfigError::InvalidValue {
                key: "video.params.quality".to_string(),
                value: self.params.quality.to_string()
            }.into());
        }

        if !self.default_duration.is_finite() || self.default_duration <= 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "video.default_duration".to_string(),
                value: self.default_duration.to_string()
            }.into());
        }

        Ok(())
    }
}

/// Page rasterization configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Raster resolution in dots per inch
    pub dpi: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self { dpi: DEFAULT_DPI }
    }
}

impl RenderConfig {
    fn validate(&self) -> Result<()> {
        if self.dpi == 0 {
            return Err(ConfigError::InvalidValue {
                key: "render.dpi".to_string(),
                value: self.dpi.to_string()
            }.into());
        }

        Ok(())
    }
}

/// Kind of document the pipeline consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputSource {
    /// One PDF, rasterized page by page
    #[default]
    Pdf,
    /// One zip archive of ready-made page images
    Archive,
}

impl InputSource {
    /// File extension searched for in the input directory
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Archive => "zip",
        }
    }
}

/// Input selection configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub source: InputSource,

    /// Also bundle the rendered page images into `output_dir/pages.zip`
    pub archive_pages: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.video.params.fps, 30);
        assert_eq!(config.video.params.resolution, (1920, 1080));
        assert_eq!(config.video.default_duration, 5.0);
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test_config.toml");

        let mut original_config = Config::default();
        original_config.input.source = InputSource::Archive;
        original_config.video.fill_color = [255, 255, 255];

        original_config.save_to_file(&file_path).unwrap();
        let loaded_config = Config::from_file(&file_path).unwrap();

        assert_eq!(loaded_config.input.source, InputSource::Archive);
        assert_eq!(loaded_config.video.fill_color, [255, 255, 255]);
        assert_eq!(loaded_config.video.params.fps, original_config.video.params.fps);
        assert_eq!(loaded_config.paths.output_path(), original_config.paths.output_path());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("partial.toml");
        std::fs::write(&file_path, "[render]\ndpi = 150\n").unwrap();

        let config = Config::from_file(&file_path).unwrap();
        assert_eq!(config.render.dpi, 150);
        assert_eq!(config.paths.output_file_name, "output_video.mp4");
        assert_eq!(config.input.source, InputSource::Pdf);
    }

    #[test]
    fn test_odd_resolution_is_invalid() {
        let mut config = Config::default();
        config.video.params.resolution = (1921, 1080);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_default_duration() {
        let mut config = Config::default();
        config.video.default_duration = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_fit_config_follows_video_section() {
        let mut config = Config::default();
        config.video.params.resolution = (1280, 720);
        config.video.fill_color = [10, 20, 30];

        let fit = config.fit_config();
        assert_eq!((fit.target_width, fit.target_height), (1280, 720));
        assert_eq!(fit.fill_color, [10, 20, 30]);
    }

    #[test]
    fn test_missing_file() {
        assert!(Config::from_file("does/not/exist.toml").is_err());
    }
}
