//! Sensitive span classification
//!
//! The classifier is the semantics-bearing half of the input: it reads the
//! full document text and names what is sensitive, without saying where.

use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A sensitive string and its category. Carries no position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensitiveSpan {
    pub category: String,
    pub literal: String,
}

impl SensitiveSpan {
    pub fn new(category: impl Into<String>, literal: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            literal: literal.into(),
        }
    }
}

/// Classifier over the full document text.
///
/// Results are best effort: duplicates, overlapping substrings and literals
/// whose whitespace differs from the source text are all expected.
pub trait SpanClassifier {
    fn classify(&self, text: &str) -> Result<Vec<SensitiveSpan>>;
}

/// Classifier that always answers with the same spans.
#[derive(Debug, Clone, Default)]
pub struct StaticClassifier {
    spans: Vec<SensitiveSpan>,
}

impl StaticClassifier {
    pub fn new(spans: Vec<SensitiveSpan>) -> Self {
        Self { spans }
    }

    /// Load spans from classifier-style JSON (`[{"type": .., "text": ..}]`).
    pub fn from_json(raw: &str) -> Self {
        Self::new(parse_classifier_output(raw))
    }
}

impl SpanClassifier for StaticClassifier {
    fn classify(&self, _text: &str) -> Result<Vec<SensitiveSpan>> {
        Ok(self.spans.clone())
    }
}

/// Map classifier labels onto the categories shown to users.
pub fn normalize_category(category: &str) -> String {
    match category {
        "PERSON" => "Name".to_string(),
        "GPE" | "LOC" => "Location".to_string(),
        other => other.to_string(),
    }
}

/// Parse a classifier response body into spans.
///
/// Anything other than a JSON array is treated as "nothing found". Array
/// entries missing `type` or `text` are dropped.
pub fn parse_classifier_output(raw: &str) -> Vec<SensitiveSpan> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Vec::new();
    }

    let value: Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            log::warn!("[Classifier] unparsable output, treating as empty: {}", e);
            return Vec::new();
        }
    };

    let items = match value {
        Value::Array(items) => items,
        other => {
            log::warn!(
                "[Classifier] expected an array, got {}; treating as empty",
                json_kind(&other)
            );
            return Vec::new();
        }
    };

    let total = items.len();
    let spans: Vec<SensitiveSpan> = items
        .iter()
        .filter_map(|item| {
            let category = item.get("type")?.as_str()?;
            let literal = item.get("text")?.as_str()?;
            Some(SensitiveSpan::new(normalize_category(category), literal))
        })
        .collect();

    if spans.len() < total {
        log::warn!(
            "[Classifier] dropped {} malformed entries of {}",
            total - spans.len(),
            total
        );
    }
    spans
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
