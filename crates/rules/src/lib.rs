//! Rule-based span classifier
//!
//! An offline stand-in for the remote classifier: regular expressions,
//! dictionaries and a few built-in heuristics run over the full document text.
//! Every match becomes a [`SensitiveSpan`] whose category is the rule name.

mod heuristics;

use blackline_core::{Result, SensitiveSpan, SpanClassifier};
use regex::Regex;
use serde::{Deserialize, Serialize};

pub use heuristics::HeuristicType;

/// How a rule matches text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum RuleType {
    /// Regular expression
    Regex(String),
    /// Literal keywords
    Dictionary(Vec<String>),
    /// Built-in pattern family
    Heuristic(HeuristicType),
}

/// One detection rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub id: String,
    /// Category reported for matches
    pub name: String,
    pub enabled: bool,
    /// Built-in rules cannot be removed from a rule file
    #[serde(default)]
    pub is_system: bool,
    pub rule_type: RuleType,
}

/// A single rule hit in the text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleMatch {
    pub rule_id: String,
    pub rule_name: String,
    pub matched_text: String,
    /// Byte offsets
    pub start: usize,
    pub end: usize,
}

/// A collection of rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleSet {
    pub rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// The system rules, one per heuristic family.
    pub fn builtin() -> Self {
        let rules = HeuristicType::ALL
            .iter()
            .map(|h| Rule {
                id: format!("system-{}", h.id()),
                name: h.category().to_string(),
                enabled: true,
                is_system: true,
                rule_type: RuleType::Heuristic(*h),
            })
            .collect();
        Self { rules }
    }

    /// Parse a rule file (JSON array of rules).
    pub fn from_json(raw: &str) -> std::result::Result<Self, serde_json::Error> {
        let rules: Vec<Rule> = serde_json::from_str(raw)?;
        Ok(Self { rules })
    }

    pub fn add(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    pub fn enabled_rules(&self) -> Vec<&Rule> {
        self.rules.iter().filter(|r| r.enabled).collect()
    }

    /// Run every enabled rule over the text, sorted by start offset.
    pub fn match_text(&self, text: &str) -> Vec<RuleMatch> {
        let mut matches = Vec::new();

        for rule in self.enabled_rules() {
            let hits: Vec<(usize, usize)> = match &rule.rule_type {
                RuleType::Regex(pattern) => match Regex::new(pattern) {
                    Ok(re) => re.find_iter(text).map(|m| (m.start(), m.end())).collect(),
                    Err(e) => {
                        log::warn!("[Classifier] rule {} has an invalid pattern: {}", rule.id, e);
                        continue;
                    }
                },
                RuleType::Dictionary(words) => words
                    .iter()
                    .filter(|w| !w.is_empty())
                    .flat_map(|w| text.match_indices(w.as_str()).map(|(s, m)| (s, s + m.len())))
                    .collect(),
                RuleType::Heuristic(h) => h.find(text),
            };

            for (start, end) in hits {
                if !has_digit_boundaries(text, start, end) {
                    continue;
                }
                matches.push(RuleMatch {
                    rule_id: rule.id.clone(),
                    rule_name: rule.name.clone(),
                    matched_text: text[start..end].to_string(),
                    start,
                    end,
                });
            }
        }

        matches.sort_by_key(|m| m.start);
        matches
    }
}

impl SpanClassifier for RuleSet {
    fn classify(&self, text: &str) -> Result<Vec<SensitiveSpan>> {
        if text.trim().is_empty() {
            log::warn!("[Classifier] empty text, nothing to classify");
            return Ok(Vec::new());
        }
        let spans: Vec<SensitiveSpan> = self
            .match_text(text)
            .into_iter()
            .map(|m| SensitiveSpan::new(m.rule_name, m.matched_text))
            .collect();
        log::info!("[Classifier] {} spans from {} enabled rules", spans.len(), self.enabled_rules().len());
        Ok(spans)
    }
}

/// Reject matches that are a slice of a longer number.
fn has_digit_boundaries(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    let starts_digit = text[start..end].chars().next().is_some_and(|c| c.is_ascii_digit());
    let ends_digit = text[start..end].chars().next_back().is_some_and(|c| c.is_ascii_digit());

    !(starts_digit && before.is_some_and(|c| c.is_ascii_digit())
        || ends_digit && after.is_some_and(|c| c.is_ascii_digit()))
}
