//! Core model and span location for Blackline.
//!
//! Nothing in this crate touches a PDF: it works on extracted fragments and
//! classifier spans and produces positioned redaction regions.

pub mod classify;
pub mod document;
pub mod geometry;
pub mod locator;
pub mod region;

pub use classify::{
    normalize_category, parse_classifier_output, SensitiveSpan, SpanClassifier, StaticClassifier,
};
pub use document::{full_text, page_count, FragmentSource, TextFragment};
pub use geometry::{PageBox, Rect};
pub use locator::{locate, locate_with, LocatorOptions, OwnershipIndex};
pub use region::{dedup_regions, pages_of, summarize_by_category, RedactionRegion};

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("no text could be extracted from this document; it may be an image-only PDF")]
    Unextractable,
    #[error("text extraction failed: {0}")]
    Extraction(String),
    #[error("classification failed: {0}")]
    Classifier(String),
    #[error("invalid search pattern: {0}")]
    InvalidPattern(String),
}
