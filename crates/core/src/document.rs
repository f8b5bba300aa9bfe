//! Extracted document text
//!
//! Fragments are the geometry-bearing half of the input: every piece of text
//! the extractor found, with the page-space box it was drawn in.

use crate::Result;
use serde::{Deserialize, Serialize};

/// Separator inserted between adjacent fragments when the full text is built.
pub const FRAGMENT_SEPARATOR: char = ' ';

/// A run of extracted text with its position on the page.
///
/// Coordinates are page-space units with the origin at the bottom-left of the
/// page; `y` is the text baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextFragment {
    pub text: String,
    /// Page number, starting at 1
    pub page: u32,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl TextFragment {
    pub fn new(text: impl Into<String>, page: u32, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            text: text.into(),
            page,
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge of the fragment
    pub fn right(&self) -> f64 {
        self.x + self.width
    }
}

/// Source of positioned text fragments.
///
/// Implementations return fragments in reading order. An empty result means
/// the document has no extractable text (for example a scanned image).
pub trait FragmentSource {
    fn extract(&self, pdf: &[u8]) -> Result<Vec<TextFragment>>;
}

/// Join fragment texts into the document's full text.
///
/// Exactly one separator goes between adjacent fragments and none after the
/// last one. This is the string the classifier sees and the locator searches.
pub fn full_text(fragments: &[TextFragment]) -> String {
    let capacity = fragments.iter().map(|f| f.text.len() + 1).sum();
    let mut text = String::with_capacity(capacity);
    for (i, fragment) in fragments.iter().enumerate() {
        if i > 0 {
            text.push(FRAGMENT_SEPARATOR);
        }
        text.push_str(&fragment.text);
    }
    text
}

/// Number of distinct pages the fragments come from.
pub fn page_count(fragments: &[TextFragment]) -> usize {
    let mut pages: Vec<u32> = fragments.iter().map(|f| f.page).collect();
    pages.sort_unstable();
    pages.dedup();
    pages.len()
}
