use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::error::Result;

const IMAGES_DIR: &str = "extracted_images";
const TEMP_VIDEO: &str = "temp_output_video.mp4";

/// Scratch directory for one pipeline run
///
/// Holds the rendered page images and the not-yet-promoted video. Removed
/// when dropped unless `keep` is set; removal failures are only logged.
#[derive(Debug)]
pub struct TempWorkspace {
    root: PathBuf,
    keep: bool,
    cleaned: bool,
}

impl TempWorkspace {
    /// Create `root` and its image directory, starting from an empty tree
    ///
    /// Leftovers of an earlier run (kept or interrupted) are removed first so
    /// they never end up among this run's pages.
    pub fn create<P: Into<PathBuf>>(root: P, keep: bool) -> Result<Self> {
        let root = root.into();
        if root.exists() {
            warn!("Removing stale temporary folder: {}", root.display());
            std::fs::remove_dir_all(&root)?;
        }
        std::fs::create_dir_all(root.join(IMAGES_DIR))?;
        debug!("Temporary workspace: {}", root.display());

        Ok(Self {
            root,
            keep,
            cleaned: false,
        })
    }

    /// Where page images are rendered or extracted to
    pub fn images_dir(&self) -> PathBuf {
        self.root.join(IMAGES_DIR)
    }

    /// Where the video is encoded before promotion
    pub fn video_path(&self) -> PathBuf {
        self.root.join(TEMP_VIDEO)
    }

    /// Remove the workspace now. Never fails.
    pub fn cleanup(&mut self) {
        if self.cleaned {
            return;
        }
        self.cleaned = true;

        if self.keep {
            info!("Keeping temporary files in {}", self.root.display());
            return;
        }

        match std::fs::remove_dir_all(&self.root) {
            Ok(()) => info!("Deleted temporary folder: {}", self.root.display()),
            Err(e) => warn!("Failed to remove temporary folder {}: {}", self.root.display(), e),
        }
    }
}

impl Drop for TempWorkspace {
    fn drop(&mut self) {
        self.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_layout_and_cleanup_on_drop() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("temp");

        {
            let workspace = TempWorkspace::create(&root, false).unwrap();
            assert!(workspace.images_dir().is_dir());
            assert_eq!(workspace.video_path(), root.join("temp_output_video.mp4"));
            std::fs::write(workspace.images_dir().join("page_1.png"), b"").unwrap();
        }

        assert!(!root.exists());
    }

    #[test]
    fn test_keep_leaves_files() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("temp");

        let mut workspace = TempWorkspace::create(&root, true).unwrap();
        workspace.cleanup();
        drop(workspace);

        assert!(root.join("extracted_images").is_dir());
    }

    #[test]
    fn test_create_discards_stale_files() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("temp");
        let stale_images = root.join("extracted_images");
        std::fs::create_dir_all(&stale_images).unwrap();
        std::fs::write(stale_images.join("page_9.png"), b"old").unwrap();
        std::fs::write(root.join("temp_output_video.mp4"), b"old").unwrap();

        let workspace = TempWorkspace::create(&root, false).unwrap();

        assert!(workspace.images_dir().is_dir());
        assert_eq!(std::fs::read_dir(workspace.images_dir()).unwrap().count(), 0);
        assert!(!workspace.video_path().exists());
    }

    #[test]
    fn test_cleanup_of_vanished_root_does_not_panic() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("temp");

        let mut workspace = TempWorkspace::create(&root, false).unwrap();
        std::fs::remove_dir_all(&root).unwrap();
        workspace.cleanup();
    }
}
