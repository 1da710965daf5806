//! # Page Rendering
//!
//! Rasterizing PDF pages is delegated to an external renderer. The pipeline
//! only depends on the [`PageRenderer`] trait; [`PdftoppmRenderer`] is the
//! stock implementation backed by poppler-utils.

pub mod pdftoppm;

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::Result;

pub use pdftoppm::PdftoppmRenderer;

/// File name a rendered page is written to (1-indexed)
pub fn page_file_name(page: usize) -> String {
    format!("page_{}.png", page)
}

/// Turns document pages into raster image files
pub trait PageRenderer: Send + Sync {
    /// Returns the name of this renderer, for logging
    fn name(&self) -> &str;

    /// Number of pages in `document`
    fn page_count(&self, document: &Path) -> Result<usize>;

    /// Render page `page` (1-indexed) of `document` to `out_dir/page_<page>.png`
    ///
    /// Returns the path of the written image.
    fn render_page(&self, document: &Path, page: usize, out_dir: &Path) -> Result<PathBuf>;

    /// Render every page of `document` into `out_dir`, in page order
    fn render_all(&self, document: &Path, out_dir: &Path) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(out_dir)?;

        let pages = self.page_count(document)?;
        info!("Rendering {} pages of {:?} with {}", pages, document, self.name());

        (1..=pages)
            .map(|page| self.render_page(document, page, out_dir))
            .collect()
    }
}
