//! Page-space geometry shared by the locator and the compositor.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in page space (origin bottom-left, y grows upward).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn top(&self) -> f64 {
        self.y + self.height
    }

    /// A rectangle is drawable when every coordinate is finite and it has a
    /// positive area.
    pub fn is_valid(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0
    }

    /// Grow the rectangle by `padding` on every side.
    pub fn expand(&self, padding: f64) -> Self {
        Self {
            x: self.x - padding,
            y: self.y - padding,
            width: self.width + padding * 2.0,
            height: self.height + padding * 2.0,
        }
    }
}

/// Visible page box plus the page's display rotation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageBox {
    pub llx: f64,
    pub lly: f64,
    pub urx: f64,
    pub ury: f64,
    /// Clockwise display rotation in degrees: 0, 90, 180 or 270
    pub rotation: i32,
}

impl PageBox {
    pub fn new(llx: f64, lly: f64, urx: f64, ury: f64) -> Self {
        Self {
            llx,
            lly,
            urx,
            ury,
            rotation: 0,
        }
    }

    pub fn with_rotation(mut self, rotation: i32) -> Self {
        self.rotation = normalize_rotation(rotation);
        self
    }

    pub fn width(&self) -> f64 {
        self.urx - self.llx
    }

    pub fn height(&self) -> f64 {
        self.ury - self.lly
    }
}

/// Map any multiple of 90 onto 0..360. Other values are treated as 0.
pub fn normalize_rotation(rotation: i32) -> i32 {
    let r = rotation.rem_euclid(360);
    if r % 90 == 0 {
        r
    } else {
        0
    }
}
