//! # Pipeline
//!
//! Wires page discovery, natural ordering, letterboxing and encoding into a
//! single run with a success/failure/cleanup contract.

pub mod duration;
pub mod engine;
pub mod workspace;

pub use duration::{parse_duration, try_parse_duration, DEFAULT_DURATION};
pub use engine::{locate_input, PipelineEngine, PipelineReport, PipelineState};
pub use workspace::TempWorkspace;
