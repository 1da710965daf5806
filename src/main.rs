use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};

use pdf_slideshow::{
    config::{Config, InputSource},
    pipeline::PipelineEngine,
    SlideshowError,
};

#[derive(Parser)]
#[command(
    name = "pdf-slideshow",
    version,
    about = "Turn a PDF into a slideshow video",
    long_about = "pdf-slideshow renders every page of a PDF, letterboxes it into a fixed 1920x1080 frame and writes an MP4 where each page stays on screen for the requested duration."
)]
struct Cli {
    /// Directory containing exactly one PDF and the variables file
    #[arg(short, long, env = "CROSSCOMPUTE_INPUT_FOLDER")]
    input: Option<PathBuf>,

    /// Directory receiving the output video
    #[arg(short, long, env = "CROSSCOMPUTE_OUTPUT_FOLDER")]
    output: Option<PathBuf>,

    /// Seconds per page (overrides the variables file; bad values fall back to 5)
    #[arg(short, long)]
    duration: Option<String>,

    /// Read page images from a zip archive instead of rendering a PDF
    #[arg(long)]
    archive: bool,

    /// Also zip the rendered page images next to the video
    #[arg(long)]
    archive_pages: bool,

    /// Keep the temporary folder after the run
    #[arg(long)]
    keep_temp: bool,

    /// Configuration file (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .init();

    info!("Starting pdf-slideshow v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config = match &cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(config_path)?
        }
        None => {
            info!("Using default configuration");
            Config::default()
        }
    };

    if let Some(input) = cli.input {
        config.paths.input_dir = input;
    }
    if let Some(output) = cli.output {
        config.paths.output_dir = output;
    }
    if cli.archive {
        config.input.source = InputSource::Archive;
    }
    config.input.archive_pages |= cli.archive_pages;
    config.paths.keep_temp |= cli.keep_temp;

    let mut engine = PipelineEngine::new(config);
    if let Some(duration) = cli.duration {
        engine = engine.with_duration_override(duration);
    }

    // The pipeline is strictly sequential and blocks on external tools
    let outcome = tokio::task::spawn_blocking(move || engine.run()).await?;

    match outcome {
        Ok(report) => {
            info!(
                "Done: {} pages, {} frames, {:.1} MB -> {:?}",
                report.pages,
                report.frames_written,
                report.file_size as f64 / 1024.0 / 1024.0,
                report.output_path
            );
            Ok(())
        }
        Err(e) => Err(failure(e)),
    }
}

/// Error returned from `main`; the engine has already logged the details
fn failure(e: SlideshowError) -> anyhow::Error {
    anyhow::anyhow!(e.user_message())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdf_slideshow::error::InputError;

    #[test]
    fn test_failure_carries_user_message_once() {
        let e = SlideshowError::from(InputError::NoInputFile {
            dir: "in".to_string(),
            extension: "pdf".to_string(),
        });
        let expected = e.user_message();

        let rendered = format!("{:#}", failure(e));
        assert_eq!(rendered, expected);
    }

    #[test]
    fn test_cli_reads_duration_as_raw_text() {
        let cli = Cli::try_parse_from(["pdf-slideshow", "--duration", "abc", "--archive"]).unwrap();
        assert_eq!(cli.duration.as_deref(), Some("abc"));
        assert!(cli.archive);
    }
}
