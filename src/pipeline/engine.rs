use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::{
    archive,
    config::{Config, InputSource},
    error::{InputError, Result, VideoError},
    pipeline::duration::{parse_or, read_duration_variable},
    pipeline::workspace::TempWorkspace,
    render::{PageRenderer, PdftoppmRenderer},
    video::{FrameFitter, FrameSequence, VideoJob, VideoSynthesizer, IMAGE_EXTENSIONS},
};

/// The renderer only ever writes PNG pages
const RENDERED_PAGE_EXTENSIONS: &[&str] = &["png"];

/// Progress of one pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Init,
    PagesDiscovered,
    FramesOrdered,
    VideoWritten,
    Finalized,
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::PagesDiscovered => "pages-discovered",
            Self::FramesOrdered => "frames-ordered",
            Self::VideoWritten => "video-written",
            Self::Finalized => "finalized",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Outcome of a successful run
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub state: PipelineState,

    /// The PDF (or archive) the pages came from
    pub source: PathBuf,

    pub pages: usize,
    pub hold_seconds: f64,
    pub frames_written: u64,

    /// Promoted video location
    pub output_path: PathBuf,
    pub file_size: u64,
}

/// Orchestrates the PDF-to-slideshow pipeline
///
/// The run goes through these states:
/// 1. Init - locate the single input document
/// 2. PagesDiscovered - pages rasterized (or extracted) into the temp folder
/// 3. FramesOrdered - page images naturally sorted
/// 4. VideoWritten - slideshow encoded into the temp folder
/// 5. Finalized - video verified, promoted to the output folder, temp removed
///
/// Any error moves the run to `Failed`; nothing is promoted in that case.
pub struct PipelineEngine {
    config: Config,
    renderer: Box<dyn PageRenderer>,
    duration_override: Option<String>,
    state: PipelineState,
}

impl PipelineEngine {
    /// Engine rendering pages with `pdftoppm` at the configured DPI
    pub fn new(config: Config) -> Self {
        let renderer = Box::new(PdftoppmRenderer::new(config.render.dpi));
        Self::with_renderer(config, renderer)
    }

    pub fn with_renderer(config: Config, renderer: Box<dyn PageRenderer>) -> Self {
        Self {
            config,
            renderer,
            duration_override: None,
            state: PipelineState::Init,
        }
    }

    /// Use `raw` as the duration input instead of the variables file
    pub fn with_duration_override<S: Into<String>>(mut self, raw: S) -> Self {
        self.duration_override = Some(raw.into());
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Run the whole pipeline, blocking until the video is promoted or the run fails
    pub fn run(&mut self) -> Result<PipelineReport> {
        self.state = PipelineState::Init;
        info!("🎬 Starting slideshow pipeline");
        info!("   Input: {:?}", self.config.paths.input_dir);
        info!("   Output: {:?}", self.config.paths.output_path());

        match self.execute() {
            Ok(report) => {
                info!("🎉 Slideshow complete! Output saved to: {:?}", report.output_path);
                Ok(report)
            }
            Err(e) => {
                error!("Pipeline failed in state {}: {}", self.state, e);
                self.transition(PipelineState::Failed);
                Err(e)
            }
        }
    }

    fn transition(&mut self, next: PipelineState) {
        debug!("State {} -> {}", self.state, next);
        self.state = next;
    }

    fn execute(&mut self) -> Result<PipelineReport> {
        self.config.validate()?;
        let paths = self.config.paths.clone();
        let source_kind = self.config.input.source;

        std::fs::create_dir_all(&paths.output_dir)?;
        let hold_seconds = self.resolve_duration();

        // Init -> PagesDiscovered
        let source = locate_input(&paths.input_dir, source_kind.extension())?;
        info!("📄 Input file found: {:?}", source);

        let mut workspace = TempWorkspace::create(paths.temp_dir(), paths.keep_temp)?;
        let (frames_dir, extensions) = self.discover_pages(source_kind, &source, &workspace)?;
        self.transition(PipelineState::PagesDiscovered);

        // PagesDiscovered -> FramesOrdered
        let frames = FrameSequence::from_directory(&frames_dir, extensions)?;
        let pages = frames.len();
        self.transition(PipelineState::FramesOrdered);

        if self.config.input.archive_pages {
            archive::create_zip(&frames_dir, paths.output_dir.join("pages.zip"))?;
        }

        // FramesOrdered -> VideoWritten
        let params = &self.config.video.params;
        info!(
            "🎞️  Encoding {} pages at {} fps, {:.2}s each, {}x{}",
            pages, params.fps, hold_seconds, params.resolution.0, params.resolution.1
        );
        let synthesizer = VideoSynthesizer::new(FrameFitter::new(self.config.fit_config()))
            .with_codec(params.codec.clone(), params.quality);
        let job = VideoJob::new(frames.into_paths(), workspace.video_path(), params.fps, hold_seconds);
        let encoded = synthesizer.synthesize(job)?;
        self.transition(PipelineState::VideoWritten);

        // VideoWritten -> Finalized
        let temp_video = workspace.video_path();
        let file_size = verify_video(&temp_video)?;
        info!("   Video file created successfully: {:?}", temp_video);

        let output_path = paths.output_path();
        promote(&temp_video, &output_path)?;
        info!("   Video moved to output folder: {:?}", output_path);

        workspace.cleanup();
        self.transition(PipelineState::Finalized);

        Ok(PipelineReport {
            state: self.state,
            source,
            pages,
            hold_seconds,
            frames_written: encoded.frame_count,
            output_path,
            file_size,
        })
    }

    /// Hold duration from the override or the variables file, never failing
    fn resolve_duration(&self) -> f64 {
        let fallback = self.config.video.default_duration;

        let seconds = match &self.duration_override {
            Some(raw) => parse_or(raw, fallback),
            None => {
                let path = self.config.paths.variables_path();
                read_duration_variable(&path, fallback).unwrap_or_else(|e| {
                    warn!("{}, using default of {}s", e, fallback);
                    fallback
                })
            }
        };

        info!("⏱️  Page duration: {}s", seconds);
        seconds
    }

    /// Produce page images in the workspace; returns their folder and extensions
    fn discover_pages(
        &self,
        source_kind: InputSource,
        source: &Path,
        workspace: &TempWorkspace,
    ) -> Result<(PathBuf, &'static [&'static str])> {
        let images_dir = workspace.images_dir();

        match source_kind {
            InputSource::Pdf => {
                let rendered = self.renderer.render_all(source, &images_dir)?;
                info!("   Rendered {} pages into {:?}", rendered.len(), images_dir);
                Ok((images_dir, RENDERED_PAGE_EXTENSIONS))
            }
            InputSource::Archive => {
                let folder = archive::extract(source, &images_dir)?.ok_or_else(|| InputError::NoInputFile {
                    dir: source.display().to_string(),
                    extension: IMAGE_EXTENSIONS.join("/"),
                })?;
                Ok((folder, IMAGE_EXTENSIONS))
            }
        }
    }
}

/// The single file with `extension` directly inside `dir`
///
/// Matching is case-insensitive. No match is [`InputError::NoInputFile`],
/// more than one is [`InputError::AmbiguousInput`].
pub fn locate_input(dir: &Path, extension: &str) -> Result<PathBuf> {
    let no_input = || InputError::NoInputFile {
        dir: dir.display().to_string(),
        extension: extension.to_string(),
    };

    if !dir.is_dir() {
        return Err(no_input().into());
    }

    let mut candidates: Vec<PathBuf> = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && crate::video::sequence::has_extension(&path, &[extension]) {
            candidates.push(path);
        }
    }
    crate::video::natural_sort(&mut candidates);

    match candidates.len() {
        0 => Err(no_input().into()),
        1 => Ok(candidates.remove(0)),
        _ => Err(InputError::AmbiguousInput {
            dir: dir.display().to_string(),
            extension: extension.to_string(),
            candidates: candidates
                .iter()
                .map(|p| p.file_name().unwrap_or_default().to_string_lossy().into_owned())
                .collect(),
        }
        .into()),
    }
}

/// Size of the encoded video; it must exist and be non-empty
fn verify_video(path: &Path) -> Result<u64> {
    match std::fs::metadata(path) {
        Ok(metadata) if metadata.is_file() && metadata.len() > 0 => Ok(metadata.len()),
        _ => {
            warn!("Video creation failed or video file is empty: {:?}", path);
            Err(VideoError::VerificationFailed {
                path: path.display().to_string(),
            }
            .into())
        }
    }
}

/// Move `from` to `to`, copying when a rename across filesystems is refused
fn promote(from: &Path, to: &Path) -> Result<()> {
    if std::fs::rename(from, to).is_ok() {
        return Ok(());
    }

    std::fs::copy(from, to)?;
    if let Err(e) = std::fs::remove_file(from) {
        warn!("Failed to remove {:?} after copying: {}", from, e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SlideshowError;
    use crate::render::page_file_name;
    use crate::video::{probe_video, Frame};
    use tempfile::tempdir;

    /// Writes solid-color pages of alternating orientation
    struct FakeRenderer {
        pages: usize,
    }

    impl PageRenderer for FakeRenderer {
        fn name(&self) -> &str {
            "fake"
        }

        fn page_count(&self, _document: &Path) -> Result<usize> {
            Ok(self.pages)
        }

        fn render_page(&self, _document: &Path, page: usize, out_dir: &Path) -> Result<PathBuf> {
            let (w, h) = if page % 2 == 0 { (60, 80) } else { (80, 60) };
            let path = out_dir.join(page_file_name(page));
            Frame::new_filled(w, h, [(page * 20) as u8, 0, 0])
                .save(&path)
                .map_err(|e| SlideshowError::generic(e.to_string()))?;
            Ok(path)
        }
    }

    fn test_config(root: &Path) -> Config {
        let mut config = Config::default();
        config.paths.input_dir = root.join("input");
        config.paths.output_dir = root.join("output");
        config.video.params.resolution = (320, 180);
        std::fs::create_dir_all(&config.paths.input_dir).unwrap();
        config
    }

    #[test]
    fn test_empty_input_directory_fails() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        let output_path = config.paths.output_path();

        let mut engine = PipelineEngine::with_renderer(config, Box::new(FakeRenderer { pages: 1 }));
        let result = engine.run();

        assert!(matches!(
            result,
            Err(SlideshowError::Input(InputError::NoInputFile { .. }))
        ));
        assert_eq!(engine.state(), PipelineState::Failed);
        assert!(!output_path.exists());
    }

    #[test]
    fn test_missing_input_directory_is_no_input_file() {
        let result = locate_input(Path::new("no/such/dir"), "pdf");
        assert!(matches!(
            result,
            Err(SlideshowError::Input(InputError::NoInputFile { .. }))
        ));
    }

    #[test]
    fn test_locate_input() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"").unwrap();
        std::fs::write(dir.path().join("Deck.PDF"), b"").unwrap();

        let found = locate_input(dir.path(), "pdf").unwrap();
        assert_eq!(found, dir.path().join("Deck.PDF"));

        std::fs::write(dir.path().join("other.pdf"), b"").unwrap();
        match locate_input(dir.path(), "pdf") {
            Err(SlideshowError::Input(InputError::AmbiguousInput { candidates, .. })) => {
                assert_eq!(candidates, vec!["Deck.PDF".to_string(), "other.pdf".to_string()]);
            }
            other => panic!("expected AmbiguousInput, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_pages_fails_verification() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        std::fs::write(config.paths.input_dir.join("doc.pdf"), b"").unwrap();
        let output_path = config.paths.output_path();
        let temp_dir = config.paths.temp_dir();

        let mut engine = PipelineEngine::with_renderer(config, Box::new(FakeRenderer { pages: 0 }));
        let result = engine.run();

        assert!(matches!(
            result,
            Err(SlideshowError::Video(VideoError::VerificationFailed { .. }))
        ));
        assert_eq!(engine.state(), PipelineState::Failed);
        assert!(!output_path.exists());
        assert!(!temp_dir.exists());
    }

    #[test]
    fn test_leftover_pages_are_not_reused() {
        let dir = tempdir().unwrap();
        let mut config = test_config(dir.path());
        config.input.archive_pages = true;
        std::fs::write(config.paths.input_dir.join("deck.pdf"), b"").unwrap();

        let stale_images = config.paths.temp_dir().join("extracted_images");
        std::fs::create_dir_all(&stale_images).unwrap();
        Frame::new_filled(8, 8, [255, 255, 255])
            .save(stale_images.join("page_9.png"))
            .unwrap();

        // The page archive is written before encoding, so the outcome of the
        // encode does not matter here.
        let mut engine = PipelineEngine::with_renderer(config.clone(), Box::new(FakeRenderer { pages: 3 }));
        let _ = engine.run();

        let file = std::fs::File::open(config.paths.output_dir.join("pages.zip")).unwrap();
        let archive = zip::ZipArchive::new(file).unwrap();
        let mut names: Vec<_> = archive.file_names().map(str::to_string).collect();
        names.sort();
        assert_eq!(names, vec!["page_1.png", "page_2.png", "page_3.png"]);
    }

    #[test]
    fn test_duration_resolution() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        std::fs::write(config.paths.variables_path(), r#"{"duration": "3"}"#).unwrap();

        let engine = PipelineEngine::with_renderer(config.clone(), Box::new(FakeRenderer { pages: 0 }));
        assert_eq!(engine.resolve_duration(), 3.0);

        let engine = PipelineEngine::with_renderer(config.clone(), Box::new(FakeRenderer { pages: 0 }))
            .with_duration_override("abc");
        assert_eq!(engine.resolve_duration(), 5.0);

        std::fs::remove_file(config.paths.variables_path()).unwrap();
        let engine = PipelineEngine::with_renderer(config, Box::new(FakeRenderer { pages: 0 }));
        assert_eq!(engine.resolve_duration(), 5.0);
    }

    #[test]
    #[ignore = "requires ffmpeg"]
    fn test_end_to_end_with_fake_renderer() {
        let dir = tempdir().unwrap();
        let mut config = test_config(dir.path());
        config.input.archive_pages = true;
        std::fs::write(config.paths.input_dir.join("deck.pdf"), b"").unwrap();
        std::fs::write(config.paths.variables_path(), r#"{"duration": 2}"#).unwrap();

        let mut engine = PipelineEngine::with_renderer(config.clone(), Box::new(FakeRenderer { pages: 3 }));
        let report = engine.run().unwrap();

        assert_eq!(report.state, PipelineState::Finalized);
        assert_eq!(report.pages, 3);
        assert_eq!(report.frames_written, 180);
        assert!(report.file_size > 0);
        assert_eq!(report.output_path, config.paths.output_path());
        assert!(!config.paths.temp_dir().exists());
        assert!(config.paths.output_dir.join("pages.zip").exists());

        let metadata = probe_video(&report.output_path).unwrap();
        assert_eq!(metadata.frame_count, 180);
        assert_eq!((metadata.width, metadata.height), (320, 180));
    }

    #[test]
    #[ignore = "requires ffmpeg"]
    fn test_end_to_end_from_archive() {
        let dir = tempdir().unwrap();
        let mut config = test_config(dir.path());
        config.input.source = InputSource::Archive;

        let slides = dir.path().join("slides");
        std::fs::create_dir_all(&slides).unwrap();
        for name in ["slide10.jpg", "slide2.png", "slide1.png"] {
            Frame::new_filled(40, 30, [0, 0, 0]).save(slides.join(name)).unwrap();
        }
        archive::create_zip(&slides, config.paths.input_dir.join("slides.zip")).unwrap();

        let mut engine = PipelineEngine::with_renderer(config, Box::new(FakeRenderer { pages: 0 }))
            .with_duration_override("1");
        let report = engine.run().unwrap();

        assert_eq!(report.pages, 3);
        assert_eq!(report.frames_written, 90);
    }

    #[test]
    #[ignore = "requires ffmpeg and poppler"]
    fn test_end_to_end_with_pdftoppm() {
        let dir = tempdir().unwrap();
        let mut config = test_config(dir.path());
        config.video.params.resolution = (1920, 1080);
        std::fs::write(
            config.paths.input_dir.join("deck.pdf"),
            crate::render::fixtures::blank_pdf(3, 595, 842),
        )
        .unwrap();
        std::fs::write(config.paths.variables_path(), r#"{"duration": "2"}"#).unwrap();

        let mut engine = PipelineEngine::new(config);
        let report = engine.run().unwrap();

        let metadata = probe_video(&report.output_path).unwrap();
        assert_eq!(metadata.frame_count, 180);
        assert_eq!((metadata.width, metadata.height), (1920, 1080));
        assert!(report.file_size > 0);
    }
}
