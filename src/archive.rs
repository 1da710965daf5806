//! # Archive Service
//!
//! Zip extraction and creation for image bundles.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{ArchiveError, Result};
use crate::video::sequence::{has_extension, IMAGE_EXTENSIONS};

/// Extract `zip_path` into `dest_dir` and locate the folder holding its images
///
/// Returns `None` when the archive contains no `.png`/`.jpg`/`.jpeg` files.
pub fn extract<P: AsRef<Path>, Q: AsRef<Path>>(zip_path: P, dest_dir: Q) -> Result<Option<PathBuf>> {
    let zip_path = zip_path.as_ref();
    let dest_dir = dest_dir.as_ref();
    info!("Extracting images from {:?} to {:?}", zip_path, dest_dir);

    let read_failed = |reason: String| ArchiveError::ReadFailed {
        path: zip_path.display().to_string(),
        reason,
    };

    let file = File::open(zip_path).map_err(|e| read_failed(e.to_string()))?;
    let mut archive = ZipArchive::new(BufReader::new(file)).map_err(|e| read_failed(e.to_string()))?;

    std::fs::create_dir_all(dest_dir)?;
    archive.extract(dest_dir).map_err(|e| read_failed(e.to_string()))?;
    debug!("Extracted {} entries", archive.len());

    find_folder_with_images(dest_dir)
}

/// First directory under `root` (top-down, name order) that directly contains an image
pub fn find_folder_with_images<P: AsRef<Path>>(root: P) -> Result<Option<PathBuf>> {
    let root = root.as_ref();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| ArchiveError::ReadFailed {
            path: root.display().to_string(),
            reason: e.to_string(),
        })?;

        if entry.file_type().is_dir() && contains_images(entry.path())? {
            info!("Images found in folder: {}", entry.path().display());
            return Ok(Some(entry.into_path()));
        }
    }

    info!("No folder with images found under {}", root.display());
    Ok(None)
}

fn contains_images(dir: &Path) -> Result<bool> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && has_extension(&path, IMAGE_EXTENSIONS) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Zip every file below `src_dir` into `zip_path`, keeping relative paths
pub fn create_zip<P: AsRef<Path>, Q: AsRef<Path>>(src_dir: P, zip_path: Q) -> Result<()> {
    let src_dir = src_dir.as_ref();
    let zip_path = zip_path.as_ref();

    let write_failed = |reason: String| ArchiveError::WriteFailed {
        path: zip_path.display().to_string(),
        reason,
    };

    let file = File::create(zip_path)?;
    let mut writer = ZipWriter::new(file);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut count = 0usize;

    for entry in WalkDir::new(src_dir).sort_by_file_name() {
        let entry = entry.map_err(|e| write_failed(e.to_string()))?;
        let path = entry.path();
        if !entry.file_type().is_file() || path == zip_path {
            continue;
        }

        let relative = path
            .strip_prefix(src_dir)
            .map_err(|e| write_failed(e.to_string()))?;
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        writer
            .start_file(name, options)
            .map_err(|e| write_failed(e.to_string()))?;
        let mut source = File::open(path)?;
        std::io::copy(&mut source, &mut writer)?;
        count += 1;
    }

    writer.finish().map_err(|e| write_failed(e.to_string()))?;
    info!("Archived {} files from {:?} into {:?}", count, src_dir, zip_path);
    Ok(())
}
