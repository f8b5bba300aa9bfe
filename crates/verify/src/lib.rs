//! Post-redaction verification checks.

use blackline_pdf::{count_text_operators, PageArena};
use serde::{Deserialize, Serialize};

/// Tolerance when comparing box coordinates written as reals.
const BOX_EPSILON: f64 = 0.01;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOptions {
    /// Fail redacted pages that still show text.
    pub text_search: bool,
    /// Fail redacted pages that still carry annotations.
    pub annotations: bool,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self {
            text_search: true,
            annotations: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerifyResult {
    pub ok: bool,
    pub warnings: Vec<String>,
}

fn same_box(a: Option<[f64; 4]>, b: Option<[f64; 4]>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < BOX_EPSILON),
        (None, None) => true,
        _ => false,
    }
}

/// Compare a redacted document against its original.
///
/// Checks that the page count and every MediaBox survived, and that each of
/// `redacted_pages` no longer carries text-showing operators or annotations.
pub fn verify_output(
    original: &[u8],
    redacted: &[u8],
    redacted_pages: &[u32],
    options: &VerifyOptions,
) -> VerifyResult {
    let mut warnings = Vec::new();

    let (original, redacted) = match (PageArena::load(original), PageArena::load(redacted)) {
        (Ok(o), Ok(r)) => (o, r),
        (Err(e), _) => {
            return VerifyResult {
                ok: false,
                warnings: vec![format!("original: {}", e)],
            }
        }
        (_, Err(e)) => {
            return VerifyResult {
                ok: false,
                warnings: vec![format!("redacted: {}", e)],
            }
        }
    };

    if original.page_count() != redacted.page_count() {
        warnings.push(format!(
            "page count changed from {} to {}",
            original.page_count(),
            redacted.page_count()
        ));
    }

    for page in 1..=original.page_count().min(redacted.page_count()) {
        let before = original.media_box(page).ok().flatten();
        let after = redacted.media_box(page).ok().flatten();
        if !same_box(before, after) {
            warnings.push(format!(
                "page {} MediaBox changed from {:?} to {:?}",
                page, before, after
            ));
        }
    }

    for &page in redacted_pages {
        if options.text_search {
            match redacted.page_content(page) {
                Ok(content) => {
                    let text_ops = count_text_operators(&content);
                    if text_ops > 0 {
                        warnings.push(format!(
                            "page {} still has {} text operators",
                            page, text_ops
                        ));
                    }
                }
                Err(e) => warnings.push(format!("page {}: {}", page, e)),
            }
        }
        if options.annotations && redacted.has_annotations(page).unwrap_or(false) {
            warnings.push(format!("page {} still has annotations", page));
        }
    }

    for warning in &warnings {
        log::warn!("[Verify] {}", warning);
    }
    if warnings.is_empty() {
        log::info!(
            "[Verify] {} pages checked, {} redacted pages clean",
            redacted.page_count(),
            redacted_pages.len()
        );
    }

    VerifyResult {
        ok: warnings.is_empty(),
        warnings,
    }
}
