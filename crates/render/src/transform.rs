//! Page-space to pixel-space conversion.
//!
//! Page space has its origin at the bottom-left of the page box with y growing
//! upward; bitmaps have their origin at the top-left with y growing downward.
//! All conversions between the two go through this module.

use blackline_core::geometry::normalize_rotation;
use blackline_core::{PageBox, Rect};
use image::{imageops, RgbaImage};

/// Integer rectangle in bitmap pixels, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Share of a region's height that lies below its baseline by default.
pub const DEFAULT_DESCENT_RATIO: f64 = 0.25;

/// Baseline and line height for a fragment whose glyphs span `bottom..top`.
///
/// `baseline` is clamped into the glyph box and falls back to `bottom`. The
/// height is grown until an overlay at [`DEFAULT_DESCENT_RATIO`] reaches both
/// the glyph top above the baseline and the glyph bottom below it.
pub fn baseline_extent(bottom: f64, top: f64, baseline: Option<f64>) -> (f64, f64) {
    let y = baseline
        .filter(|b| b.is_finite())
        .map_or(bottom, |b| b.clamp(bottom, top.max(bottom)));
    let ascent = top - y;
    let descent = y - bottom;
    let height = (top - bottom)
        .max(ascent / (1.0 - DEFAULT_DESCENT_RATIO))
        .max(descent / DEFAULT_DESCENT_RATIO);
    (y, height)
}

/// The page-space rectangle actually painted over a region.
///
/// Region `y` is a baseline, so the box is pushed down by `descent_ratio` of
/// the height to cover descenders, then padded on every side.
pub fn overlay_rect(region: &Rect, padding: f64, descent_ratio: f64) -> Rect {
    let descent = region.height * descent_ratio;
    Rect::new(region.x, region.y - descent, region.width, region.height).expand(padding)
}

/// Convert a page-space rectangle into pixels of a bitmap that covers
/// `page` exactly (unrotated).
///
/// Partially covered pixels are included. The result is clamped to the bitmap;
/// `None` when nothing of the rectangle lands on it.
pub fn to_pixel_rect(rect: &Rect, page: &PageBox, bitmap_width: u32, bitmap_height: u32) -> Option<PixelRect> {
    if !rect.is_valid() || page.width() <= 0.0 || page.height() <= 0.0 {
        return None;
    }
    if bitmap_width == 0 || bitmap_height == 0 {
        return None;
    }

    let bw = bitmap_width as f64;
    let bh = bitmap_height as f64;
    let sx = bw / page.width();
    let sy = bh / page.height();

    let left = ((rect.x - page.llx) * sx).clamp(0.0, bw);
    let right = ((rect.right() - page.llx) * sx).clamp(0.0, bw);
    let top = ((page.ury - rect.top()) * sy).clamp(0.0, bh);
    let bottom = ((page.ury - rect.y) * sy).clamp(0.0, bh);

    let x0 = left.floor() as u32;
    let x1 = right.ceil() as u32;
    let y0 = top.floor() as u32;
    let y1 = bottom.ceil() as u32;

    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some(PixelRect {
        x: x0,
        y: y0,
        width: x1 - x0,
        height: y1 - y0,
    })
}

/// Undo the page's display rotation on a rendered bitmap so that it lines up
/// with unrotated page space.
pub fn unrotate_image(image: RgbaImage, rotation: i32) -> RgbaImage {
    match normalize_rotation(rotation) {
        90 => imageops::rotate270(&image),
        180 => imageops::rotate180(&image),
        270 => imageops::rotate90(&image),
        _ => image,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn letter() -> PageBox {
        PageBox::new(0.0, 0.0, 612.0, 792.0)
    }

    #[test]
    fn test_overlay_rect_applies_padding_and_descent() {
        let r = overlay_rect(&Rect::new(10.0, 700.0, 150.0, 12.0), 1.0, 0.25);
        assert!((r.x - 9.0).abs() < 1e-9);
        assert!((r.y - 696.0).abs() < 1e-9);
        assert!((r.width - 152.0).abs() < 1e-9);
        assert!((r.height - 14.0).abs() < 1e-9);
    }

    fn assert_covers(overlay: &Rect, bottom: f64, top: f64) {
        assert!(overlay.y <= bottom + 1e-9, "overlay bottom {} above glyph bottom {}", overlay.y, bottom);
        assert!(overlay.top() >= top - 1e-9, "overlay top {} below glyph top {}", overlay.top(), top);
    }

    #[test]
    fn test_baseline_extent_overlay_covers_glyph_box() {
        let (bottom, top) = (700.0, 712.0);
        for baseline in [None, Some(700.0), Some(702.5), Some(706.0), Some(712.0), Some(650.0), Some(f64::NAN)] {
            let (y, height) = baseline_extent(bottom, top, baseline);
            assert!(y >= bottom && y <= top);
            for padding in [0.0, 1.0] {
                let overlay = overlay_rect(&Rect::new(10.0, y, 150.0, height), padding, DEFAULT_DESCENT_RATIO);
                assert_covers(&overlay, bottom, top);
            }
        }
    }

    #[test]
    fn test_baseline_extent_keeps_box_height_for_typical_text() {
        // 12pt glyph box with the baseline 3pt above its bottom
        let (y, height) = baseline_extent(700.0, 712.0, Some(703.0));
        assert!((y - 703.0).abs() < 1e-9);
        assert!((height - 12.0).abs() < 1e-9);

        // no descent: the box grows so the shifted overlay still reaches the top
        let (y, height) = baseline_extent(700.0, 712.0, None);
        assert!((y - 700.0).abs() < 1e-9);
        assert!((height - 16.0).abs() < 1e-9);
    }

    #[test]
    fn test_to_pixel_rect_flips_y_axis() {
        let page = letter();
        let px = to_pixel_rect(&Rect::new(10.0, 700.0, 150.0, 12.0), &page, 1224, 1584).unwrap();
        // scale 2: top edge at 792 - 712 = 80pt -> 160px
        assert_eq!(px, PixelRect { x: 20, y: 160, width: 300, height: 24 });
    }

    #[test]
    fn test_to_pixel_rect_bottom_left_corner() {
        let px = to_pixel_rect(&Rect::new(0.0, 0.0, 10.0, 10.0), &letter(), 612, 792).unwrap();
        assert_eq!(px, PixelRect { x: 0, y: 782, width: 10, height: 10 });
    }

    #[test]
    fn test_to_pixel_rect_honours_box_origin() {
        let page = PageBox::new(100.0, 200.0, 200.0, 300.0);
        let px = to_pixel_rect(&Rect::new(150.0, 250.0, 10.0, 10.0), &page, 100, 100).unwrap();
        assert_eq!(px, PixelRect { x: 50, y: 40, width: 10, height: 10 });
    }

    #[test]
    fn test_to_pixel_rect_rounds_outward() {
        let px = to_pixel_rect(&Rect::new(0.5, 0.5, 1.0, 1.0), &letter(), 612, 792).unwrap();
        assert_eq!(px, PixelRect { x: 0, y: 790, width: 2, height: 2 });
    }

    #[test]
    fn test_to_pixel_rect_clamps_and_rejects() {
        let page = letter();
        let px = to_pixel_rect(&Rect::new(-20.0, 780.0, 40.0, 40.0), &page, 612, 792).unwrap();
        assert_eq!(px, PixelRect { x: 0, y: 0, width: 20, height: 12 });

        assert!(to_pixel_rect(&Rect::new(700.0, 10.0, 10.0, 10.0), &page, 612, 792).is_none());
        assert!(to_pixel_rect(&Rect::new(10.0, 10.0, 0.0, 10.0), &page, 612, 792).is_none());
        assert!(to_pixel_rect(&Rect::new(f64::NAN, 10.0, 5.0, 10.0), &page, 612, 792).is_none());
        assert!(to_pixel_rect(&Rect::new(10.0, 10.0, 5.0, 10.0), &page, 0, 792).is_none());
    }

    #[test]
    fn test_unrotate_image() {
        let mut image = RgbaImage::from_pixel(4, 2, Rgba([255, 255, 255, 255]));
        image.put_pixel(0, 0, Rgba([0, 0, 0, 255]));

        let same = unrotate_image(image.clone(), 0);
        assert_eq!(same.dimensions(), (4, 2));

        // Displayed 90deg clockwise: turning it back counter-clockwise moves the
        // top-left pixel to the bottom-left.
        let back = unrotate_image(image.clone(), 90);
        assert_eq!(back.dimensions(), (2, 4));
        assert_eq!(back.get_pixel(0, 3), &Rgba([0, 0, 0, 255]));

        let half = unrotate_image(image, 180);
        assert_eq!(half.dimensions(), (4, 2));
        assert_eq!(half.get_pixel(3, 1), &Rgba([0, 0, 0, 255]));
    }
}
