use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::{RenderError, Result};
use crate::render::{page_file_name, PageRenderer};

/// Default raster resolution, one pixel per PDF point
pub const DEFAULT_DPI: u32 = 72;

/// Renders pages with poppler's `pdftoppm`, counting them with `pdfinfo`
#[derive(Debug, Clone)]
pub struct PdftoppmRenderer {
    dpi: u32,
}

impl PdftoppmRenderer {
    pub fn new(dpi: u32) -> Self {
        Self { dpi }
    }

    pub fn check_available() -> bool {
        ["pdftoppm", "pdfinfo"].iter().all(|tool| {
            Command::new(tool)
                .arg("-v")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .map(|status| status.success())
                .unwrap_or(false)
        })
    }
}

impl Default for PdftoppmRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_DPI)
    }
}

impl PageRenderer for PdftoppmRenderer {
    fn name(&self) -> &str {
        "pdftoppm"
    }

    fn page_count(&self, document: &Path) -> Result<usize> {
        if !Self::check_available() {
            return Err(RenderError::RendererUnavailable {
                reason: "pdftoppm/pdfinfo not found on PATH".to_string(),
            }
            .into());
        }

        let output = Command::new("pdfinfo")
            .arg(document)
            .output()
            .map_err(|e| RenderError::RendererUnavailable {
                reason: format!("failed to invoke pdfinfo; is poppler-utils installed? ({})", e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RenderError::PageCountFailed {
                path: document.display().to_string(),
                reason: stderr.trim().to_string(),
            }
            .into());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_page_count(&stdout).ok_or_else(|| {
            RenderError::PageCountFailed {
                path: document.display().to_string(),
                reason: "no 'Pages:' line in pdfinfo output".to_string(),
            }
            .into()
        })
    }

    fn render_page(&self, document: &Path, page: usize, out_dir: &Path) -> Result<PathBuf> {
        let image_path = out_dir.join(page_file_name(page));
        // -singlefile writes exactly `<prefix>.png`
        let prefix = image_path.with_extension("");

        let output = Command::new("pdftoppm")
            .arg("-png")
            .arg("-singlefile")
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg("-f")
            .arg(page.to_string())
            .arg("-l")
            .arg(page.to_string())
            .arg(document)
            .arg(&prefix)
            .output()
            .map_err(|e| RenderError::RendererUnavailable {
                reason: format!("failed to invoke pdftoppm; is poppler-utils installed? ({})", e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RenderError::RenderFailed {
                page,
                reason: format!("pdftoppm exited with {}: {}", output.status, stderr.trim()),
            }
            .into());
        }

        if !image_path.exists() {
            return Err(RenderError::RenderFailed {
                page,
                reason: format!("expected rendered image not found: {}", image_path.display()),
            }
            .into());
        }

        debug!("Rendered page {} -> {}", page, image_path.display());
        Ok(image_path)
    }
}

fn parse_page_count(pdfinfo_output: &str) -> Option<usize> {
    pdfinfo_output
        .lines()
        .find_map(|line| line.strip_prefix("Pages:"))
        .and_then(|count| count.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::fixtures::blank_pdf;
    use crate::video::Frame;
    use tempfile::tempdir;

    #[test]
    fn test_parse_page_count() {
        let output = "Producer:       test\nPages:          12\nEncrypted:      no\n";
        assert_eq!(parse_page_count(output), Some(12));
        assert_eq!(parse_page_count("Title: x\n"), None);
    }

    #[test]
    #[ignore = "requires poppler"]
    fn test_renders_every_page() {
        let dir = tempdir().unwrap();
        let pdf = dir.path().join("doc.pdf");
        std::fs::write(&pdf, blank_pdf(3, 200, 100)).unwrap();

        let renderer = PdftoppmRenderer::default();
        assert_eq!(renderer.page_count(&pdf).unwrap(), 3);

        let out_dir = dir.path().join("pages");
        let paths = renderer.render_all(&pdf, &out_dir).unwrap();
        assert_eq!(paths.len(), 3);
        assert_eq!(paths[1], out_dir.join("page_2.png"));

        // 200x100 points at 72 dpi
        let frame = Frame::load(&paths[0]).unwrap();
        assert_eq!((frame.width(), frame.height()), (200, 100));
    }

    #[test]
    #[ignore = "requires poppler"]
    fn test_page_count_of_garbage_fails() {
        let dir = tempdir().unwrap();
        let bogus = dir.path().join("bogus.pdf");
        std::fs::write(&bogus, b"not a pdf").unwrap();

        assert!(PdftoppmRenderer::default().page_count(&bogus).is_err());
    }
}
