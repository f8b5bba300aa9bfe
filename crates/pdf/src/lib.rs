//! Redaction compositor over lopdf documents.

mod arena;
mod compositor;
mod image;
mod metadata;
mod overlay;
mod utils;

#[cfg(test)]
mod fixtures;

pub use arena::PageArena;
pub use compositor::{composite, CompositeOptions, CompositeOutcome, PageFailure};
pub use metadata::{stamp_redaction_metadata, BRAND};
pub use utils::count_text_operators;

use blackline_render::RenderError;

#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    #[error("could not read document: {0}")]
    Load(String),
    #[error("could not produce redacted document: {0}")]
    Save(String),
    #[error("page {page} does not exist (document has {page_count} pages)")]
    PageNotFound { page: u32, page_count: u32 },
    #[error("malformed document structure: {0}")]
    Structure(String),
    #[error(transparent)]
    Render(#[from] RenderError),
}
