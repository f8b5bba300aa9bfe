//! Located redaction regions

use crate::geometry::Rect;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// One visual line of a matched sensitive span, positioned on its page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedactionRegion {
    pub id: String,
    pub category: String,
    pub literal: String,
    /// Page number, starting at 1
    pub page: u32,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl RedactionRegion {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// Positional identity: page plus rectangle at two-decimal precision.
    ///
    /// Category and literal are not part of the key.
    pub fn position_key(&self) -> String {
        format!(
            "{}-{:.2}-{:.2}-{:.2}-{:.2}",
            self.page, self.x, self.y, self.width, self.height
        )
    }
}

/// Collapse regions that share a position key, keeping the first one seen.
pub fn dedup_regions(regions: Vec<RedactionRegion>) -> Vec<RedactionRegion> {
    let mut seen: HashSet<String> = HashSet::with_capacity(regions.len());
    regions
        .into_iter()
        .filter(|r| seen.insert(r.position_key()))
        .collect()
}

/// Count regions per category, ordered by category name.
pub fn summarize_by_category(regions: &[RedactionRegion]) -> BTreeMap<String, usize> {
    let mut summary = BTreeMap::new();
    for region in regions {
        *summary.entry(region.category.clone()).or_insert(0) += 1;
    }
    summary
}

/// Distinct page numbers referenced by the regions, ascending.
pub fn pages_of(regions: &[RedactionRegion]) -> Vec<u32> {
    let mut pages: Vec<u32> = regions.iter().map(|r| r.page).collect();
    pages.sort_unstable();
    pages.dedup();
    pages
}
