//! Built-in pattern families

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeuristicType {
    Email,
    Phone,
    Date,
    IdNumber,
    CreditCard,
}

impl HeuristicType {
    pub const ALL: [HeuristicType; 5] = [
        HeuristicType::Email,
        HeuristicType::Phone,
        HeuristicType::Date,
        HeuristicType::IdNumber,
        HeuristicType::CreditCard,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            HeuristicType::Email => "email",
            HeuristicType::Phone => "phone",
            HeuristicType::Date => "date",
            HeuristicType::IdNumber => "id-number",
            HeuristicType::CreditCard => "credit-card",
        }
    }

    /// Category reported for matches
    pub fn category(&self) -> &'static str {
        match self {
            HeuristicType::Email => "Email",
            HeuristicType::Phone => "Phone",
            HeuristicType::Date => "Date",
            HeuristicType::IdNumber => "ID",
            HeuristicType::CreditCard => "Card",
        }
    }

    fn patterns(&self) -> &'static [&'static str] {
        match self {
            HeuristicType::Email => &[r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}"],
            HeuristicType::Phone => &[r"(?:\+\d{1,3}[ -]?)?\(?\d{3,5}\)?[ -]?\d{3,5}(?:[ -]?\d{3,5})?"],
            HeuristicType::Date => &[
                r"\b\d{4}-\d{2}-\d{2}\b",
                r"\b\d{1,2}[/.-]\d{1,2}[/.-]\d{2,4}\b",
            ],
            HeuristicType::IdNumber => &[
                // GSTIN
                r"\b\d{2}[A-Z]{5}\d{4}[A-Z][1-9A-Z]Z[0-9A-Z]\b",
                // PAN
                r"\b[A-Z]{5}\d{4}[A-Z]\b",
                // SSN
                r"\b\d{3}-\d{2}-\d{4}\b",
            ],
            HeuristicType::CreditCard => &[r"\b(?:\d{4}[ -]?){3}\d{4}\b"],
        }
    }

    fn compiled(&self) -> &'static [Regex] {
        static EMAIL: OnceLock<Vec<Regex>> = OnceLock::new();
        static PHONE: OnceLock<Vec<Regex>> = OnceLock::new();
        static DATE: OnceLock<Vec<Regex>> = OnceLock::new();
        static ID_NUMBER: OnceLock<Vec<Regex>> = OnceLock::new();
        static CREDIT_CARD: OnceLock<Vec<Regex>> = OnceLock::new();

        let cell = match self {
            HeuristicType::Email => &EMAIL,
            HeuristicType::Phone => &PHONE,
            HeuristicType::Date => &DATE,
            HeuristicType::IdNumber => &ID_NUMBER,
            HeuristicType::CreditCard => &CREDIT_CARD,
        };
        cell.get_or_init(|| compile_patterns(self.patterns()))
    }

    /// Byte ranges of all matches, overlapping hits from sibling patterns
    /// removed (the earlier pattern wins).
    pub fn find(&self, text: &str) -> Vec<(usize, usize)> {
        let mut hits: Vec<(usize, usize)> = Vec::new();
        for re in self.compiled() {
            for m in re.find_iter(text) {
                let overlaps = hits.iter().any(|&(s, e)| m.start() < e && s < m.end());
                if !overlaps {
                    hits.push((m.start(), m.end()));
                }
            }
        }
        hits.sort_unstable();
        hits
    }
}

fn compile_patterns(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|p| match Regex::new(p) {
            Ok(re) => Some(re),
            Err(e) => {
                log::warn!("[Classifier] built-in pattern failed to compile: {}", e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn found<'a>(h: HeuristicType, text: &'a str) -> Vec<&'a str> {
        h.find(text).into_iter().map(|(s, e)| &text[s..e]).collect()
    }

    #[test]
    fn test_match_email() {
        assert_eq!(found(HeuristicType::Email, "to: a.b+c@mail.example.org."), vec!["a.b+c@mail.example.org"]);
    }

    #[test]
    fn test_match_phone() {
        assert_eq!(found(HeuristicType::Phone, "call 555-123-4567 now"), vec!["555-123-4567"]);
        assert!(found(HeuristicType::Phone, "on 2024-01-01").is_empty());
    }

    #[test]
    fn test_match_date() {
        assert_eq!(found(HeuristicType::Date, "due 2024-03-15 or 15/03/2024"), vec!["2024-03-15", "15/03/2024"]);
    }

    #[test]
    fn test_match_id_number_prefers_gstin() {
        assert_eq!(found(HeuristicType::IdNumber, "GSTIN 07ABCDE1234F1Z5"), vec!["07ABCDE1234F1Z5"]);
        assert_eq!(found(HeuristicType::IdNumber, "PAN CELPB6777G"), vec!["CELPB6777G"]);
    }

    #[test]
    fn test_match_credit_card() {
        assert_eq!(found(HeuristicType::CreditCard, "card 4111 1111 1111 1111."), vec!["4111 1111 1111 1111"]);
    }
}
