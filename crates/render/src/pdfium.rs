//! pdfium-backed rasterizer and fragment extractor

use crate::transform::baseline_extent;
use crate::{PageRasterizer, RenderError};
use blackline_core::{FragmentSource, TextFragment};
use image::RgbaImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};

/// Directories searched for the pdfium shared library, most specific first.
pub fn pdfium_search_paths(configured: Option<&Path>) -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Some(dir) = configured {
        paths.push(dir.to_path_buf());
    }
    if let Ok(dir) = std::env::var("BLACKLINE_PDFIUM_DIR") {
        paths.push(PathBuf::from(dir));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            paths.push(exe_dir.join("libs"));
            paths.push(exe_dir.to_path_buf());

            #[cfg(target_os = "macos")]
            {
                if let Some(contents_dir) = exe_dir.parent() {
                    paths.push(contents_dir.join("Resources").join("libs"));
                }
            }
        }
    }

    // AppImage bundles
    #[cfg(target_os = "linux")]
    {
        if let Ok(appdir) = std::env::var("APPDIR") {
            paths.push(PathBuf::from(appdir).join("usr").join("lib"));
        }
    }

    paths.push(PathBuf::from("libs"));
    paths.push(PathBuf::from("./"));
    paths
}

/// Bind pdfium from the search paths, falling back to the system library.
pub fn bind_pdfium(configured: Option<&Path>) -> Result<Pdfium, RenderError> {
    for path in pdfium_search_paths(configured) {
        let lib_path = Pdfium::pdfium_platform_library_name_at_path(&path);
        log::debug!("[Render] trying pdfium at {:?}", lib_path);

        if let Ok(bindings) = Pdfium::bind_to_library(&lib_path) {
            log::info!("[Render] pdfium loaded from {:?}", path);
            return Ok(Pdfium::new(bindings));
        }
    }

    log::debug!("[Render] trying system pdfium");
    Pdfium::bind_to_system_library()
        .map(Pdfium::new)
        .map_err(|e| RenderError::Bind(e.to_string()))
}

/// pdfium handle used for both rasterization and text extraction.
pub struct PdfiumBackend {
    pdfium: Pdfium,
}

impl PdfiumBackend {
    pub fn bind(configured: Option<&Path>) -> Result<Self, RenderError> {
        Ok(Self {
            pdfium: bind_pdfium(configured)?,
        })
    }
}

fn page_index(page_number: u32) -> Result<u16, RenderError> {
    page_number
        .checked_sub(1)
        .and_then(|i| u16::try_from(i).ok())
        .ok_or(RenderError::Page(page_number))
}

impl PageRasterizer for PdfiumBackend {
    fn rasterize(&self, pdf: &[u8], page_number: u32, scale: f32) -> Result<RgbaImage, RenderError> {
        let index = page_index(page_number)?;
        let document = self
            .pdfium
            .load_pdf_from_byte_slice(pdf, None)
            .map_err(|e| RenderError::Load(e.to_string()))?;

        let page = document
            .pages()
            .get(index)
            .map_err(|_| RenderError::Page(page_number))?;

        let page_width = page.width().value;
        let page_height = page.height().value;
        let target_width = (page_width * scale).round() as i32;
        let target_height = (page_height * scale).round() as i32;

        log::info!(
            "[Render] page {}: {}x{} pt -> {}x{} px (scale {})",
            page_number,
            page_width,
            page_height,
            target_width,
            target_height,
            scale
        );

        if target_width <= 0 || target_height <= 0 {
            return Err(RenderError::EmptyBitmap(page_number));
        }

        let render_config = PdfRenderConfig::new()
            .set_target_width(target_width)
            .set_target_height(target_height);

        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| RenderError::Render {
                page: page_number,
                reason: e.to_string(),
            })?;

        let image: RgbaImage = bitmap
            .as_image()
            .as_rgba8()
            .ok_or(RenderError::Conversion(page_number))?
            .clone();

        if image.width() == 0 || image.height() == 0 {
            return Err(RenderError::EmptyBitmap(page_number));
        }
        Ok(image)
    }
}

/// Origin y of the segment's first visible character.
fn segment_baseline(segment: &PdfPageTextSegment) -> Option<f64> {
    let chars = segment.chars().ok()?;
    let first = chars
        .iter()
        .find(|c| c.unicode_char().is_some_and(|ch| !ch.is_whitespace()))?;
    first.origin_y().ok().map(|y| y.value as f64)
}

impl FragmentSource for PdfiumBackend {
    fn extract(&self, pdf: &[u8]) -> blackline_core::Result<Vec<TextFragment>> {
        let document = self
            .pdfium
            .load_pdf_from_byte_slice(pdf, None)
            .map_err(|e| RenderError::Load(e.to_string()))?;

        let mut fragments = Vec::new();
        for (index, page) in document.pages().iter().enumerate() {
            let page_number = index as u32 + 1;
            let text = page.text().map_err(|e| RenderError::Text {
                page: page_number,
                reason: e.to_string(),
            })?;

            let before = fragments.len();
            for segment in text.segments().iter() {
                let content = segment.text();
                if content.trim().is_empty() {
                    continue;
                }
                let bounds = segment.bounds();
                let left = bounds.left().value as f64;
                let bottom = bounds.bottom().value as f64;
                let right = bounds.right().value as f64;
                let top = bounds.top().value as f64;
                let (baseline, height) = baseline_extent(bottom, top, segment_baseline(&segment));

                fragments.push(TextFragment::new(
                    content,
                    page_number,
                    left,
                    baseline,
                    right - left,
                    height,
                ));
            }
            log::debug!(
                "[Extract] page {}: {} fragments",
                page_number,
                fragments.len() - before
            );
        }

        log::info!("[Extract] {} fragments extracted", fragments.len());
        Ok(fragments)
    }
}
