//! # pdf-slideshow
//!
//! Turn a PDF into a slideshow video: every page is rasterized, letterboxed
//! into a fixed frame and held on screen for a configurable duration.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf_slideshow::{config::Config, pipeline::PipelineEngine};
//!
//! # fn main() -> pdf_slideshow::Result<()> {
//! let mut config = Config::default();
//! config.paths.input_dir = "deck/".into();
//! config.paths.output_dir = "out/".into();
//!
//! let report = PipelineEngine::new(config)
//!     .with_duration_override("3")
//!     .run()?;
//! println!("{} pages -> {:?}", report.pages, report.output_path);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`video`] - natural ordering, letterboxing and encoding
//! - [`render`] - the page renderer boundary (`pdftoppm` by default)
//! - [`archive`] - zip extraction and creation
//! - [`pipeline`] - the orchestrating state machine
//! - [`config`] - configuration management
//!
//! ## Letterboxing a single frame
//!
//! ```rust
//! use pdf_slideshow::video::{fit, FitConfig, Frame};
//!
//! let page = Frame::new_filled(595, 842, [255, 255, 255]);
//! let fitted = fit(&page, FitConfig::new(1920, 1080)).unwrap();
//! assert_eq!((fitted.width(), fitted.height()), (1920, 1080));
//! ```
//!
//! Encoding shells out to `ffmpeg`; rendering to `pdftoppm`/`pdfinfo`.

pub mod archive;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod render;
pub mod video;

// Re-export commonly used types for convenience
pub use crate::{
    config::Config,
    error::{Result, SlideshowError},
    pipeline::{PipelineEngine, PipelineReport, PipelineState},
    render::PageRenderer,
};
