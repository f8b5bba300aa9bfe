//! Extract, classify, locate, composite.

use crate::config::{AppConfig, ClassifierConfig, ClassifierKind};
use crate::gemini::GeminiClassifier;
use blackline_core::{
    full_text, locate_with, page_count, summarize_by_category, CoreError, FragmentSource, LocatorOptions,
    RedactionRegion, SensitiveSpan, SpanClassifier, StaticClassifier, TextFragment,
};
use blackline_pdf::{composite, CompositeOptions, CompositeOutcome, PageArena, PdfError};
use blackline_render::{PageRasterizer, PdfiumBackend, RenderConfig};
use blackline_rules::RuleSet;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_LOG_FULL_TEXT: &str = "BLACKLINE_LOG_FULL_TEXT";
const PREVIEW_CHARS: usize = 200;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("could not read document {path}: {reason}")]
    Read { path: String, reason: String },
    #[error("no text could be extracted from {0}; it may be an image-only PDF")]
    Unextractable(String),
    #[error("invalid input file {path}: {reason}")]
    Input { path: String, reason: String },
    #[error("classification failed: {0}")]
    Classify(String),
    #[error("rendering engine unavailable: {0}")]
    Backend(String),
    #[error("could not produce redacted document: {0}")]
    Produce(String),
}

fn full_text_logging() -> bool {
    std::env::var(ENV_LOG_FULL_TEXT)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

fn preview(text: &str, max_chars: usize) -> String {
    let mut out: String = text.chars().take(max_chars).collect();
    if text.chars().nth(max_chars).is_some() {
        out.push_str("...");
    }
    out
}

/// Document text as it may be logged.
pub fn text_preview(text: &str) -> String {
    if full_text_logging() {
        text.to_string()
    } else {
        preview(text, PREVIEW_CHARS)
    }
}

pub fn read_document(path: &Path) -> Result<Vec<u8>, AppError> {
    fs::read(path).map_err(|e| AppError::Read {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    let input_error = |reason: String| AppError::Input {
        path: path.display().to_string(),
        reason,
    };
    let raw = fs::read_to_string(path).map_err(|e| input_error(e.to_string()))?;
    serde_json::from_str(&raw).map_err(|e| input_error(e.to_string()))
}

/// Pdfium bound on first use only.
pub struct LazyBackend {
    dir: Option<PathBuf>,
    backend: Option<PdfiumBackend>,
}

impl LazyBackend {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            dir: config.render.pdfium_dir.clone(),
            backend: None,
        }
    }

    pub fn get(&mut self) -> Result<&PdfiumBackend, AppError> {
        if self.backend.is_none() {
            let backend = PdfiumBackend::bind(self.dir.as_deref())
                .map_err(|e| AppError::Backend(e.to_string()))?;
            self.backend = Some(backend);
        }
        self.backend
            .as_ref()
            .ok_or_else(|| AppError::Backend("pdfium not bound".to_string()))
    }
}

/// Extract fragments, failing distinctly when the document has no text.
pub fn extract_fragments(path: &Path, pdf: &[u8], source: &dyn FragmentSource) -> Result<Vec<TextFragment>, AppError> {
    let fragments = source.extract(pdf).map_err(|e| match e {
        CoreError::Unextractable => AppError::Unextractable(path.display().to_string()),
        other => AppError::Read {
            path: path.display().to_string(),
            reason: other.to_string(),
        },
    })?;
    require_text(path, fragments)
}

fn require_text(path: &Path, fragments: Vec<TextFragment>) -> Result<Vec<TextFragment>, AppError> {
    if fragments.is_empty() {
        return Err(AppError::Unextractable(path.display().to_string()));
    }
    Ok(fragments)
}

/// Choose the classifier. A spans file always wins over the configured kind.
pub fn build_classifier(config: &ClassifierConfig, spans_file: Option<&Path>) -> Result<Box<dyn SpanClassifier>, AppError> {
    let read_spans = |path: &Path| -> Result<Box<dyn SpanClassifier>, AppError> {
        let raw = fs::read_to_string(path).map_err(|e| AppError::Input {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(Box::new(StaticClassifier::from_json(&raw)))
    };

    if let Some(path) = spans_file {
        return read_spans(path);
    }

    match config.kind {
        ClassifierKind::Gemini => {
            let classifier = GeminiClassifier::from_env(config).map_err(|e| AppError::Classify(e.to_string()))?;
            Ok(Box::new(classifier))
        }
        ClassifierKind::Rules => match &config.rules_path {
            Some(path) => {
                let raw = fs::read_to_string(path).map_err(|e| AppError::Input {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })?;
                let rules = RuleSet::from_json(&raw).map_err(|e| AppError::Input {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })?;
                Ok(Box::new(rules))
            }
            None => Ok(Box::new(RuleSet::builtin())),
        },
        ClassifierKind::File => match &config.spans_path {
            Some(path) => read_spans(path),
            None => Err(AppError::Input {
                path: "<none>".to_string(),
                reason: "classifier kind `file` needs a spans file".to_string(),
            }),
        },
    }
}

/// Output of the locate half of the pipeline.
#[derive(Debug, Clone)]
pub struct Detection {
    pub fragments: usize,
    pub spans: Vec<SensitiveSpan>,
    pub regions: Vec<RedactionRegion>,
}

pub fn detect(
    fragments: &[TextFragment],
    classifier: &dyn SpanClassifier,
    options: &LocatorOptions,
) -> Result<Detection, AppError> {
    let text = full_text(fragments);
    log::info!(
        "[Pipeline] {} fragments on {} pages, {} chars of text: {}",
        fragments.len(),
        page_count(fragments),
        text.chars().count(),
        text_preview(&text)
    );

    let spans = classifier
        .classify(&text)
        .map_err(|e| AppError::Classify(e.to_string()))?;
    let regions = locate_with(fragments, &spans, options);

    log::info!("[Pipeline] {} spans -> {} regions", spans.len(), regions.len());
    for (category, count) in summarize_by_category(&regions) {
        log::info!("[Pipeline]   {}: {}", category, count);
    }

    Ok(Detection {
        fragments: fragments.len(),
        spans,
        regions,
    })
}

pub fn locator_options(config: &AppConfig) -> LocatorOptions {
    LocatorOptions {
        line_precision: config.overlay.line_precision,
    }
}

pub fn composite_options(config: &AppConfig) -> CompositeOptions {
    CompositeOptions {
        scale: RenderConfig::with_scale(config.render.scale).scale,
        padding: config.overlay.padding,
        descent_ratio: config.overlay.descent_ratio,
    }
}

fn pdf_error(path: &Path, err: PdfError) -> AppError {
    match err {
        PdfError::Load(reason) => AppError::Read {
            path: path.display().to_string(),
            reason,
        },
        other => AppError::Produce(other.to_string()),
    }
}

/// Re-serialize a document that has nothing to redact.
pub fn passthrough(path: &Path, pdf: &[u8]) -> Result<CompositeOutcome, AppError> {
    let bytes = PageArena::load(pdf)
        .and_then(PageArena::save)
        .map_err(|e| pdf_error(path, e))?;
    Ok(CompositeOutcome {
        bytes,
        ..CompositeOutcome::default()
    })
}

pub fn redact(
    path: &Path,
    pdf: &[u8],
    regions: &[RedactionRegion],
    rasterizer: &dyn PageRasterizer,
    options: &CompositeOptions,
) -> Result<CompositeOutcome, AppError> {
    composite(pdf, regions, rasterizer, options).map_err(|e| pdf_error(path, e))
}

/// `<prefix><file name>` next to the input.
pub fn output_path(input: &Path, prefix: &str) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "document.pdf".to_string());
    input.with_file_name(format!("{}{}", prefix, name))
}

pub fn write_output(path: &Path, bytes: &[u8]) -> Result<(), AppError> {
    fs::write(path, bytes).map_err(|e| AppError::Produce(format!("{}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use blackline_render::RenderError;
    use image::{Rgba, RgbaImage};

    struct FixedSource(Vec<TextFragment>);

    impl FragmentSource for FixedSource {
        fn extract(&self, _pdf: &[u8]) -> blackline_core::Result<Vec<TextFragment>> {
            Ok(self.0.clone())
        }
    }

    struct FailingClassifier;

    impl SpanClassifier for FailingClassifier {
        fn classify(&self, _text: &str) -> blackline_core::Result<Vec<SensitiveSpan>> {
            Err(CoreError::Classifier("HTTP 500".to_string()))
        }
    }

    struct WhitePage;

    impl PageRasterizer for WhitePage {
        fn rasterize(&self, _pdf: &[u8], _page: u32, _scale: f32) -> Result<RgbaImage, RenderError> {
            Ok(RgbaImage::from_pixel(612, 792, Rgba([255, 255, 255, 255])))
        }
    }

    fn invoice_fragments() -> Vec<TextFragment> {
        vec![TextFragment::new("John Smith, 12 Main St", 1, 10.0, 700.0, 150.0, 12.0)]
    }

    #[test]
    fn test_preview_truncates() {
        let text = "a".repeat(250);
        let p = preview(&text, 200);
        assert_eq!(p.chars().count(), 203);
        assert!(p.ends_with("..."));
        assert_eq!(preview("short", 200), "short");
    }

    #[test]
    fn test_output_path_uses_prefix() {
        assert_eq!(
            output_path(Path::new("/tmp/docs/invoice.pdf"), "redacted-"),
            PathBuf::from("/tmp/docs/redacted-invoice.pdf")
        );
    }

    #[test]
    fn test_no_fragments_is_unextractable() {
        let err = extract_fragments(Path::new("scan.pdf"), b"", &FixedSource(vec![])).unwrap_err();
        assert!(matches!(err, AppError::Unextractable(_)));
        assert!(err.to_string().contains("image-only"));
    }

    #[test]
    fn test_detect_end_to_end() {
        let fragments = extract_fragments(Path::new("a.pdf"), b"", &FixedSource(invoice_fragments())).unwrap();
        let classifier = StaticClassifier::new(vec![SensitiveSpan::new("Name", "John Smith")]);

        let detection = detect(&fragments, &classifier, &LocatorOptions::default()).unwrap();

        assert_eq!(detection.fragments, 1);
        assert_eq!(detection.regions.len(), 1);
        let region = &detection.regions[0];
        assert_eq!(region.page, 1);
        assert_eq!(region.x, 10.0);
        assert_eq!(region.y, 700.0);
        assert_eq!(region.height, 12.0);
    }

    #[test]
    fn test_classifier_failure_is_fatal() {
        let err = detect(&invoice_fragments(), &FailingClassifier, &LocatorOptions::default()).unwrap_err();
        assert!(matches!(err, AppError::Classify(_)));
    }

    #[test]
    fn test_rules_classifier_is_default_for_rules_kind() {
        let config = ClassifierConfig {
            kind: ClassifierKind::Rules,
            ..ClassifierConfig::default()
        };
        let classifier = build_classifier(&config, None).unwrap();
        let spans = classifier.classify("write to jane@example.com").unwrap();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].literal, "jane@example.com");
    }

    #[test]
    fn test_spans_file_overrides_kind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spans.json");
        fs::write(&path, r#"[{"type": "PERSON", "text": "John Smith"}]"#).unwrap();

        let classifier = build_classifier(&ClassifierConfig::default(), Some(&path)).unwrap();
        let spans = classifier.classify("anything").unwrap();
        assert_eq!(spans, vec![SensitiveSpan::new("Name", "John Smith")]);
    }

    #[test]
    fn test_file_kind_without_path_is_an_error() {
        let config = ClassifierConfig {
            kind: ClassifierKind::File,
            ..ClassifierConfig::default()
        };
        assert!(matches!(build_classifier(&config, None), Err(AppError::Input { .. })));
    }

    #[test]
    fn test_unreadable_pdf_maps_to_read_error() {
        let err = redact(
            Path::new("broken.pdf"),
            b"not a pdf",
            &[],
            &WhitePage,
            &CompositeOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Read { .. }));
        assert!(matches!(passthrough(Path::new("broken.pdf"), b"junk"), Err(AppError::Read { .. })));
    }

    #[test]
    fn test_composite_options_clamp_scale() {
        let mut config = AppConfig::default();
        config.render.scale = 40.0;
        config.overlay.padding = 2.0;
        let options = composite_options(&config);
        assert_eq!(options.scale, blackline_render::MAX_RENDER_SCALE);
        assert_eq!(options.padding, 2.0);
    }
}
