//! Redaction compositor: rasterize, burn, replace.

use crate::arena::PageArena;
use crate::image::burn_rects;
use crate::PdfError;
use blackline_core::{RedactionRegion, Rect};
use blackline_render::{overlay_rect, to_pixel_rect, unrotate_image, PageRasterizer, RenderError};
use image::DynamicImage;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositeOptions {
    /// Supersampling factor passed to the rasterizer.
    pub scale: f32,
    /// Page-space padding added on every side of a region.
    pub padding: f64,
    /// Fraction of the region height the overlay is pushed below the baseline.
    pub descent_ratio: f64,
}

impl Default for CompositeOptions {
    fn default() -> Self {
        Self {
            scale: blackline_render::DEFAULT_RENDER_SCALE,
            padding: 1.0,
            descent_ratio: blackline_render::DEFAULT_DESCENT_RATIO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageFailure {
    pub page: u32,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct CompositeOutcome {
    pub bytes: Vec<u8>,
    /// Pages whose content was replaced, ascending.
    pub redacted_pages: Vec<u32>,
    /// Pages left untouched because redaction failed on them.
    pub failed_pages: Vec<PageFailure>,
    /// Ids of regions skipped for degenerate geometry.
    pub skipped_regions: Vec<String>,
    /// Regions actually painted on a replaced page.
    pub applied_regions: usize,
}

impl CompositeOutcome {
    /// True when every requested page and region was redacted.
    pub fn is_complete(&self) -> bool {
        self.failed_pages.is_empty() && self.skipped_regions.is_empty()
    }
}

/// Redact `regions` in the document.
///
/// Each referenced page is rasterized from `pdf`, the overlays are burned into
/// the bitmap, and the page is replaced by the image with the overlays drawn
/// again as vector rectangles. Per-page failures leave that page untouched
/// and are reported in the outcome; only load and save failures are fatal.
pub fn composite(
    pdf: &[u8],
    regions: &[RedactionRegion],
    rasterizer: &dyn PageRasterizer,
    options: &CompositeOptions,
) -> Result<CompositeOutcome, PdfError> {
    let mut arena = PageArena::load(pdf)?;
    let mut outcome = CompositeOutcome::default();

    if regions.is_empty() {
        log::info!("[Compositor] no regions, document re-serialized unchanged");
        outcome.bytes = arena.save()?;
        return Ok(outcome);
    }

    let mut by_page: BTreeMap<u32, Vec<&RedactionRegion>> = BTreeMap::new();
    for region in regions {
        by_page.entry(region.page).or_default().push(region);
    }

    log::info!(
        "[Compositor] {} regions on {} pages",
        regions.len(),
        by_page.len()
    );

    for (page, page_regions) in by_page {
        if let Err(e) = arena.page_id(page) {
            log::warn!("[Compositor] page {} skipped: {}", page, e);
            outcome.failed_pages.push(PageFailure {
                page,
                reason: e.to_string(),
            });
            continue;
        }

        let mut overlays = Vec::with_capacity(page_regions.len());
        for region in page_regions {
            if !region.rect().is_valid() {
                log::warn!(
                    "[Compositor] region {} on page {} has degenerate geometry, skipped",
                    region.id,
                    page
                );
                outcome.skipped_regions.push(region.id.clone());
                continue;
            }
            overlays.push(overlay_rect(&region.rect(), options.padding, options.descent_ratio));
        }

        if overlays.is_empty() {
            log::warn!("[Compositor] page {} has no drawable regions", page);
            continue;
        }

        match redact_page(&mut arena, pdf, page, &overlays, rasterizer, options) {
            Ok(()) => {
                outcome.redacted_pages.push(page);
                outcome.applied_regions += overlays.len();
            }
            Err(e) => {
                log::warn!("[Compositor] page {} left unredacted: {}", page, e);
                outcome.failed_pages.push(PageFailure {
                    page,
                    reason: e.to_string(),
                });
            }
        }
    }

    outcome.bytes = arena.save()?;

    log::info!(
        "[Compositor] redacted pages {:?}, failed {}, skipped regions {}",
        outcome.redacted_pages,
        outcome.failed_pages.len(),
        outcome.skipped_regions.len()
    );
    Ok(outcome)
}

fn redact_page(
    arena: &mut PageArena,
    pdf: &[u8],
    page: u32,
    overlays: &[Rect],
    rasterizer: &dyn PageRasterizer,
    options: &CompositeOptions,
) -> Result<(), PdfError> {
    let page_box = arena.page_box(page)?;
    let rendered = rasterizer.rasterize(pdf, page, options.scale)?;
    let mut bitmap = unrotate_image(rendered, page_box.rotation);

    let (width, height) = bitmap.dimensions();
    if width == 0 || height == 0 {
        return Err(RenderError::EmptyBitmap(page).into());
    }

    let pixel_rects: Vec<_> = overlays
        .iter()
        .filter_map(|rect| to_pixel_rect(rect, &page_box, width, height))
        .collect();
    burn_rects(&mut bitmap, &pixel_rects);

    let rgb = DynamicImage::ImageRgba8(bitmap).to_rgb8();
    arena.replace_page(page, &rgb, overlays)
}
