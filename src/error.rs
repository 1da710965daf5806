use thiserror::Error;

/// Main error type for the pdf-slideshow library
#[derive(Error, Debug)]
pub enum SlideshowError {
    #[error("Input error: {0}")]
    Input(#[from] InputError),

    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),

    #[error("Video processing error: {0}")]
    Video(#[from] VideoError),

    #[error("Page rendering error: {0}")]
    Render(#[from] RenderError),

    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Generic error: {0}")]
    Generic(String),
}

/// Errors about the job's inputs
#[derive(Error, Debug)]
pub enum InputError {
    #[error("No .{extension} file found in input directory: {dir}")]
    NoInputFile { dir: String, extension: String },

    #[error("Expected exactly one .{extension} file in {dir}, found: {}", .candidates.join(", "))]
    AmbiguousInput {
        dir: String,
        extension: String,
        candidates: Vec<String>,
    },

    #[error("Invalid duration value: {value}")]
    DurationParse { value: String },

    #[error("Failed to read input variables: {path} - {reason}")]
    VariablesUnreadable { path: String, reason: String },
}

/// Errors raised while loading or fitting a single frame
#[derive(Error, Debug)]
pub enum FrameError {
    #[error("Invalid frame: {reason}")]
    InvalidFrame { reason: String },

    #[error("Failed to load frame: {path} - {reason}")]
    FrameLoad { path: String, reason: String },
}

/// Video-specific errors
#[derive(Error, Debug)]
pub enum VideoError {
    #[error("Video encoder unavailable: {reason}")]
    EncoderUnavailable { reason: String },

    #[error("Video encoding failed: {reason}")]
    EncodingFailed { reason: String },

    #[error("Frame size mismatch: got {got_width}x{got_height}, expected {width}x{height}")]
    FrameSizeMismatch {
        got_width: u32,
        got_height: u32,
        width: u32,
        height: u32,
    },

    #[error("Failed to probe video: {path} - {reason}")]
    ProbeFailed { path: String, reason: String },

    #[error("Output verification failed: {path}")]
    VerificationFailed { path: String },

    #[error("Invalid video parameters: {details}")]
    InvalidParameters { details: String },
}

/// Errors from the external page renderer
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Page renderer unavailable: {reason}")]
    RendererUnavailable { reason: String },

    #[error("Failed to determine page count of {path}: {reason}")]
    PageCountFailed { path: String, reason: String },

    #[error("Failed to render page {page}: {reason}")]
    RenderFailed { page: usize, reason: String },
}

/// Archive extraction/creation errors
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Failed to read archive: {path} - {reason}")]
    ReadFailed { path: String, reason: String },

    #[error("Failed to write archive: {path} - {reason}")]
    WriteFailed { path: String, reason: String },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}")]
    ParseFailed { path: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Convenience type alias for Results using SlideshowError
pub type Result<T> = std::result::Result<T, SlideshowError>;

impl SlideshowError {
    /// Create a generic error with a custom message
    pub fn generic<S: Into<String>>(message: S) -> Self {
        Self::Generic(message.into())
    }

    /// Check if this error is recoverable (can be retried)
    pub fn is_recoverable(&self) -> bool {
        match self {
            // IO errors might be temporary
            Self::Io(_) => true,
            Self::Frame(FrameError::FrameLoad { .. }) => true,
            Self::Input(InputError::DurationParse { .. }) => true,
            // Most other errors are permanent
            _ => false,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Input(InputError::NoInputFile { dir, extension }) => {
                format!("No .{} file was found in '{}'. Place exactly one input file there and try again.", extension, dir)
            }
            Self::Input(InputError::AmbiguousInput { dir, extension, candidates }) => {
                format!("'{}' holds {} .{} files ({}). Remove all but one.", dir, candidates.len(), extension, candidates.join(", "))
            }
            Self::Frame(FrameError::FrameLoad { path, .. }) => {
                format!("Could not load page image '{}'. Please check the file exists and is a supported format.", path)
            }
            Self::Video(VideoError::EncoderUnavailable { .. }) => {
                "FFmpeg was not found. Install it (macOS: brew install ffmpeg, Ubuntu: sudo apt install ffmpeg).".to_string()
            }
            Self::Render(RenderError::RendererUnavailable { .. }) => {
                "pdftoppm/pdfinfo were not found. Install poppler-utils (macOS: brew install poppler, Ubuntu: sudo apt install poppler-utils).".to_string()
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_names_the_directory() {
        let err: SlideshowError = InputError::NoInputFile {
            dir: "in".to_string(),
            extension: "pdf".to_string(),
        }
        .into();

        assert!(err.user_message().contains("'in'"));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_ambiguous_input_lists_candidates() {
        let err = InputError::AmbiguousInput {
            dir: "in".to_string(),
            extension: "pdf".to_string(),
            candidates: vec!["a.pdf".to_string(), "b.pdf".to_string()],
        };
        assert!(err.to_string().contains("a.pdf, b.pdf"));
    }
}
