//! # Video Module
//!
//! Frame ordering, letterboxing and slideshow encoding.

pub mod fitter;
pub mod probe;
pub mod sequence;
pub mod synthesizer;
pub mod types;

pub use fitter::{fit, FitGeometry, FrameFitter};
pub use probe::{probe_video, VideoMetadata};
pub use sequence::{natural_key, natural_sort, FrameSequence, NaturalKey, IMAGE_EXTENSIONS};
pub use synthesizer::{EncodedVideo, VideoSynthesizer};
pub use types::{FitConfig, Frame, VideoJob, VideoParams};
