//! Span locator
//!
//! Reconciles positioned-but-unlabelled fragments with labelled-but-unpositioned
//! spans. The fragments are joined into one full text, every byte of which is
//! traced back to the fragment that produced it. Each unique literal is then
//! searched with a whitespace-tolerant pattern, and the fragments under every
//! occurrence are turned into one rectangle per visual line.

use crate::classify::SensitiveSpan;
use crate::document::{TextFragment, FRAGMENT_SEPARATOR};
use crate::region::{dedup_regions, RedactionRegion};
use crate::{CoreError, Result};
use regex::Regex;
use std::collections::HashSet;
use std::ops::Range;

/// Tunables for the locator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocatorOptions {
    /// Fragments whose `y / line_precision` round to the same integer (on the
    /// same page) are treated as one visual line.
    pub line_precision: f64,
}

impl Default for LocatorOptions {
    fn default() -> Self {
        Self { line_precision: 1.0 }
    }
}

/// Maps every byte of the full text to the index of the fragment that
/// produced it. Separator bytes map to `None`.
#[derive(Debug, Clone)]
pub struct OwnershipIndex {
    owners: Vec<Option<usize>>,
}

impl OwnershipIndex {
    /// Build the full text and its ownership index in one pass.
    pub fn build(fragments: &[TextFragment]) -> (String, Self) {
        let capacity = fragments.iter().map(|f| f.text.len() + 1).sum();
        let mut text = String::with_capacity(capacity);
        let mut owners = Vec::with_capacity(capacity);

        for (i, fragment) in fragments.iter().enumerate() {
            if i > 0 {
                text.push(FRAGMENT_SEPARATOR);
                owners.extend(std::iter::repeat(None).take(FRAGMENT_SEPARATOR.len_utf8()));
            }
            text.push_str(&fragment.text);
            owners.extend(std::iter::repeat(Some(i)).take(fragment.text.len()));
        }

        (text, Self { owners })
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    pub fn owner_at(&self, offset: usize) -> Option<usize> {
        self.owners.get(offset).copied().flatten()
    }

    /// Distinct owning fragments over a byte range, in order of first
    /// appearance. Separator positions are skipped.
    pub fn owners_in(&self, range: Range<usize>) -> Vec<usize> {
        let end = range.end.min(self.owners.len());
        let start = range.start.min(end);
        let mut seen = HashSet::new();
        self.owners[start..end]
            .iter()
            .flatten()
            .copied()
            .filter(|idx| seen.insert(*idx))
            .collect()
    }
}

/// Deduplicate spans by trimmed literal.
///
/// The first span for each literal wins and keeps its category. Spans whose
/// literal is empty after trimming are dropped. Returned literals are trimmed.
pub fn unique_spans(spans: &[SensitiveSpan]) -> Vec<SensitiveSpan> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut unique = Vec::new();
    for span in spans {
        let literal = span.literal.trim();
        if literal.is_empty() || !seen.insert(literal) {
            continue;
        }
        unique.push(SensitiveSpan::new(span.category.clone(), literal));
    }
    unique
}

/// Build the search pattern for a literal.
///
/// Every character is matched verbatim except runs of whitespace, which match
/// any run of one or more whitespace characters in the text.
pub fn build_pattern(literal: &str) -> Result<Regex> {
    let pattern = literal
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+");
    if pattern.is_empty() {
        return Err(CoreError::InvalidPattern("empty literal".to_string()));
    }
    Regex::new(&pattern).map_err(|e| CoreError::InvalidPattern(e.to_string()))
}

/// Locate every occurrence of every span with default options.
pub fn locate(fragments: &[TextFragment], spans: &[SensitiveSpan]) -> Vec<RedactionRegion> {
    locate_with(fragments, spans, &LocatorOptions::default())
}

/// Locate every occurrence of every span.
///
/// Literals that do not occur produce nothing. Regions at the same page and
/// rectangle are collapsed, first one wins.
pub fn locate_with(
    fragments: &[TextFragment],
    spans: &[SensitiveSpan],
    options: &LocatorOptions,
) -> Vec<RedactionRegion> {
    let (text, index) = OwnershipIndex::build(fragments);
    let unique = unique_spans(spans);
    log::debug!(
        "[Locator] {} fragments, {} bytes of text, {} unique literals of {}",
        fragments.len(),
        text.len(),
        unique.len(),
        spans.len()
    );

    let mut regions = Vec::new();
    let mut next_id = 0usize;

    for span in &unique {
        let pattern = match build_pattern(&span.literal) {
            Ok(p) => p,
            Err(e) => {
                log::warn!("[Locator] skipping literal of category {}: {}", span.category, e);
                continue;
            }
        };

        let mut occurrences = 0usize;
        for m in pattern.find_iter(&text) {
            let owners = index.owners_in(m.range());
            if owners.is_empty() {
                continue;
            }
            occurrences += 1;

            for line in group_lines(fragments, &owners, options) {
                if let Some(region) = line_region(&line, span, next_id) {
                    next_id += 1;
                    regions.push(region);
                }
            }
        }

        if occurrences == 0 {
            log::debug!("[Locator] no occurrence for a literal of category {}", span.category);
        }
    }

    let found = regions.len();
    let regions = dedup_regions(regions);
    log::info!(
        "[Locator] {} regions located ({} before positional dedup)",
        regions.len(),
        found
    );
    regions
}

/// Partition contributing fragments into visual lines keyed by page and
/// rounded baseline. Lines keep the order in which they were first seen.
fn group_lines<'a>(
    fragments: &'a [TextFragment],
    owners: &[usize],
    options: &LocatorOptions,
) -> Vec<Vec<&'a TextFragment>> {
    let precision = if options.line_precision > 0.0 {
        options.line_precision
    } else {
        1.0
    };

    let mut keys: Vec<(u32, i64)> = Vec::new();
    let mut lines: Vec<Vec<&TextFragment>> = Vec::new();

    for fragment in owners.iter().filter_map(|&i| fragments.get(i)) {
        let key = (fragment.page, (fragment.y / precision).round() as i64);
        match keys.iter().position(|k| *k == key) {
            Some(pos) => lines[pos].push(fragment),
            None => {
                keys.push(key);
                lines.push(vec![fragment]);
            }
        }
    }
    lines
}

/// Rectangle for one line: leftmost fragment's x and baseline, rightmost
/// fragment's right edge, tallest fragment's height.
fn line_region(line: &[&TextFragment], span: &SensitiveSpan, id: usize) -> Option<RedactionRegion> {
    let mut line = line.to_vec();
    line.sort_by(|a, b| a.x.total_cmp(&b.x));

    let first = line.first()?;
    let last = line.last()?;
    let height = line.iter().map(|f| f.height).fold(first.height, f64::max);

    Some(RedactionRegion {
        id: format!("region-{}", id),
        category: span.category.clone(),
        literal: span.literal.clone(),
        page: first.page,
        x: first.x,
        y: first.y,
        width: last.right() - first.x,
        height,
    })
}
