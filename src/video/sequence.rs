use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::Result;

/// Extensions the pipeline treats as raster frames
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// One segment of a [`NaturalKey`]
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum KeySegment {
    /// Lowercased run of non-digit characters (possibly empty)
    Text(String),
    /// Maximal run of ASCII digits, compared by numeric value
    Number(Digits),
}

/// A digit run of arbitrary length
///
/// Compared numerically without parsing, so page numbers never overflow.
#[derive(Debug, Clone)]
pub struct Digits(String);

impl Digits {
    fn significant(&self) -> &str {
        let trimmed = self.0.trim_start_matches('0');
        if trimmed.is_empty() {
            "0"
        } else {
            trimmed
        }
    }
}

impl PartialEq for Digits {
    fn eq(&self, other: &Self) -> bool {
        self.significant() == other.significant()
    }
}

impl Eq for Digits {}

impl PartialOrd for Digits {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Digits {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a, b) = (self.significant(), other.significant());
        a.len().cmp(&b.len()).then_with(|| a.cmp(b))
    }
}

/// Sort key that orders "page_2" before "page_10"
///
/// The key alternates text and number segments and always starts and ends
/// with a (possibly empty) text segment, so segments at the same position
/// are always of the same kind.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct NaturalKey(Vec<KeySegment>);

impl NaturalKey {
    pub fn new(s: &str) -> Self {
        let mut segments = Vec::new();
        let mut text = String::new();
        let mut chars = s.chars().peekable();

        while let Some(c) = chars.next() {
            if c.is_ascii_digit() {
                let mut digits = String::from(c);
                while let Some(&next) = chars.peek() {
                    if !next.is_ascii_digit() {
                        break;
                    }
                    digits.push(next);
                    chars.next();
                }
                segments.push(KeySegment::Text(std::mem::take(&mut text).to_lowercase()));
                segments.push(KeySegment::Number(Digits(digits)));
            } else {
                text.push(c);
            }
        }
        segments.push(KeySegment::Text(text.to_lowercase()));

        Self(segments)
    }

    pub fn segments(&self) -> &[KeySegment] {
        &self.0
    }
}

/// Natural sort key of a path's full string form
pub fn natural_key<P: AsRef<Path>>(path: P) -> NaturalKey {
    NaturalKey::new(&path.as_ref().to_string_lossy())
}

/// Sort paths in natural order, in place
pub fn natural_sort(paths: &mut [PathBuf]) {
    paths.sort_by_cached_key(|path| natural_key(path));
}

/// Ordered sequence of frame image paths
#[derive(Debug, Clone, Default)]
pub struct FrameSequence {
    frames: Vec<PathBuf>,
}

impl FrameSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a frame, keeping the sequence in natural order
    pub fn add_frame<P: Into<PathBuf>>(&mut self, path: P) {
        self.frames.push(path.into());
        natural_sort(&mut self.frames);
    }

    /// Collect every image file directly inside `directory`, naturally sorted
    ///
    /// Hidden files and subdirectories are ignored. Only files whose extension
    /// (case-insensitive) is in `extensions` are kept.
    pub fn from_directory<P: AsRef<Path>>(directory: P, extensions: &[&str]) -> Result<Self> {
        let directory = directory.as_ref();
        let mut frames = Vec::new();

        for entry in std::fs::read_dir(directory)? {
            let path = entry?.path();
            if path.is_file() && !is_hidden_file(&path) && has_extension(&path, extensions) {
                frames.push(path);
            }
        }

        natural_sort(&mut frames);

        info!("Found {} frame images in {}", frames.len(), directory.display());
        for (i, frame) in frames.iter().enumerate() {
            debug!("   {:03} - {}", i + 1, frame.display());
        }

        Ok(Self { frames })
    }

    pub fn frames(&self) -> &[PathBuf] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.frames.iter()
    }

    pub fn into_paths(self) -> Vec<PathBuf> {
        self.frames
    }
}

impl FromIterator<PathBuf> for FrameSequence {
    fn from_iter<I: IntoIterator<Item = PathBuf>>(iter: I) -> Self {
        let mut frames: Vec<PathBuf> = iter.into_iter().collect();
        natural_sort(&mut frames);
        Self { frames }
    }
}

/// Case-insensitive extension check
pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

fn is_hidden_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}
