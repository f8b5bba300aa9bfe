use blackline_core::{summarize_by_category, RedactionRegion};
use blackline_pdf::{CompositeOutcome, PageFailure};
use blackline_verify::VerifyResult;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// What a redaction run found and actually did.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedactionReport {
    pub input: String,
    pub output: Option<String>,
    pub fragments: usize,
    pub spans: usize,
    pub regions_found: usize,
    pub regions_applied: usize,
    pub pages_redacted: Vec<u32>,
    pub failed_pages: Vec<PageFailure>,
    pub skipped_regions: Vec<String>,
    pub categories: BTreeMap<String, usize>,
    pub verification: Option<VerifyResult>,
    pub success: bool,
}

impl RedactionReport {
    pub fn new(input: &Path, fragments: usize, spans: usize, regions: &[RedactionRegion]) -> Self {
        Self {
            input: input.display().to_string(),
            fragments,
            spans,
            regions_found: regions.len(),
            categories: summarize_by_category(regions),
            ..Self::default()
        }
    }

    pub fn record_outcome(&mut self, outcome: &CompositeOutcome, output: &Path) {
        self.output = Some(output.display().to_string());
        self.regions_applied = outcome.applied_regions;
        self.pages_redacted = outcome.redacted_pages.clone();
        self.failed_pages = outcome.failed_pages.clone();
        self.skipped_regions = outcome.skipped_regions.clone();
        self.update_success();
    }

    pub fn record_verification(&mut self, result: VerifyResult) {
        self.verification = Some(result);
        self.update_success();
    }

    fn update_success(&mut self) {
        self.success = self.failed_pages.is_empty()
            && self.skipped_regions.is_empty()
            && self.verification.as_ref().map_or(true, |v| v.ok);
    }

    /// Human-readable warnings for every partial degradation.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings: Vec<String> = self
            .failed_pages
            .iter()
            .map(|f| format!("page {} was not redacted: {}", f.page, f.reason))
            .collect();
        if !self.skipped_regions.is_empty() {
            warnings.push(format!(
                "{} regions skipped for invalid geometry: {}",
                self.skipped_regions.len(),
                self.skipped_regions.join(", ")
            ));
        }
        if let Some(verification) = &self.verification {
            warnings.extend(verification.warnings.iter().map(|w| format!("verification: {}", w)));
        }
        warnings
    }

    pub fn log_summary(&self) {
        log::info!(
            "[Pipeline] {} fragments, {} spans, {} regions found, {} applied on pages {:?}",
            self.fragments,
            self.spans,
            self.regions_found,
            self.regions_applied,
            self.pages_redacted
        );
        for (category, count) in &self.categories {
            log::info!("[Pipeline]   {}: {}", category, count);
        }
        for warning in self.warnings() {
            log::warn!("[Pipeline] {}", warning);
        }
    }

    pub fn write(&self, path: &Path) -> anyhow::Result<()> {
        let raw = serde_json::to_string_pretty(self)?;
        fs::write(path, raw)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn region(category: &str) -> RedactionRegion {
        RedactionRegion {
            id: "region-1".to_string(),
            category: category.to_string(),
            literal: "x".to_string(),
            page: 1,
            x: 0.0,
            y: 0.0,
            width: 1.0,
            height: 1.0,
        }
    }

    #[test]
    fn test_report_success_tracks_degradations() {
        let regions = vec![region("Name"), region("Name"), region("Email")];
        let mut report = RedactionReport::new(&PathBuf::from("in.pdf"), 10, 3, &regions);
        assert_eq!(report.categories["Name"], 2);
        assert_eq!(report.categories["Email"], 1);

        let mut outcome = CompositeOutcome {
            redacted_pages: vec![1],
            applied_regions: 3,
            ..CompositeOutcome::default()
        };
        report.record_outcome(&outcome, &PathBuf::from("out.pdf"));
        assert!(report.success);
        assert!(report.warnings().is_empty());

        outcome.failed_pages.push(PageFailure {
            page: 2,
            reason: "render failed".to_string(),
        });
        report.record_outcome(&outcome, &PathBuf::from("out.pdf"));
        assert!(!report.success);
        assert_eq!(report.warnings(), vec!["page 2 was not redacted: render failed"]);
    }

    #[test]
    fn test_failed_verification_is_not_success() {
        let mut report = RedactionReport::new(&PathBuf::from("in.pdf"), 1, 0, &[]);
        report.record_outcome(&CompositeOutcome::default(), &PathBuf::from("out.pdf"));
        assert!(report.success);

        report.record_verification(VerifyResult {
            ok: false,
            warnings: vec!["page 1 still has 2 text operators".to_string()],
        });
        assert!(!report.success);
        assert_eq!(report.warnings().len(), 1);
    }

    #[test]
    fn test_report_json_is_camel_case() {
        let report = RedactionReport::new(&PathBuf::from("in.pdf"), 1, 1, &[region("PAN")]);
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["regionsFound"], 1);
        assert_eq!(value["categories"]["PAN"], 1);
        assert!(value["pagesRedacted"].as_array().unwrap().is_empty());
    }
}
