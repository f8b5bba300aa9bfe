//! Page rendering capability.
//!
//! Rasterization and text extraction are provided by pdfium. The rest of the
//! workspace only sees the [`PageRasterizer`] and
//! [`blackline_core::FragmentSource`] traits.

mod pdfium;
pub mod transform;

pub use crate::pdfium::{bind_pdfium, pdfium_search_paths, PdfiumBackend};
pub use transform::{
    baseline_extent, overlay_rect, to_pixel_rect, unrotate_image, PixelRect, DEFAULT_DESCENT_RATIO,
};

use image::RgbaImage;

/// Default supersampling factor relative to 72 DPI page units.
pub const DEFAULT_RENDER_SCALE: f32 = 2.0;

/// Upper bound on the rendering scale; keeps bitmaps of large pages in memory.
pub const MAX_RENDER_SCALE: f32 = 6.0;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("pdfium library unavailable: {0}")]
    Bind(String),
    #[error("failed to load document for rendering: {0}")]
    Load(String),
    #[error("page {0} not found")]
    Page(u32),
    #[error("failed to render page {page}: {reason}")]
    Render { page: u32, reason: String },
    #[error("page {0} rendered to an empty bitmap")]
    EmptyBitmap(u32),
    #[error("failed to convert page {0} bitmap")]
    Conversion(u32),
    #[error("failed to read text of page {page}: {reason}")]
    Text { page: u32, reason: String },
}

impl From<RenderError> for blackline_core::CoreError {
    fn from(err: RenderError) -> Self {
        blackline_core::CoreError::Extraction(err.to_string())
    }
}

/// Renders one page of a document to a pixel buffer.
pub trait PageRasterizer {
    /// `page_number` starts at 1. `scale` multiplies the page's point size.
    fn rasterize(&self, pdf: &[u8], page_number: u32, scale: f32) -> Result<RgbaImage, RenderError>;
}

/// Rendering settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderConfig {
    pub scale: f32,
}

impl RenderConfig {
    /// Build a config, clamping the scale into `1.0..=MAX_RENDER_SCALE`.
    pub fn with_scale(scale: f32) -> Self {
        let scale = if scale.is_finite() {
            scale.clamp(1.0, MAX_RENDER_SCALE)
        } else {
            DEFAULT_RENDER_SCALE
        };
        Self { scale }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            scale: DEFAULT_RENDER_SCALE,
        }
    }
}
