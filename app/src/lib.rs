//! Blackline: locate classifier-identified sensitive text in a PDF and
//! destroy it by rasterizing the affected pages.

pub mod cli;
pub mod config;
pub mod gemini;
pub mod pipeline;
pub mod report;

use crate::cli::{Cli, Command, DetectArgs, RedactArgs, SourceArgs, VerifyArgs};
use crate::config::{load_config, AppConfig};
use crate::pipeline::{
    build_classifier, composite_options, detect, extract_fragments, locator_options, output_path,
    passthrough, read_document, read_json, redact, write_output, LazyBackend,
};
use crate::report::RedactionReport;
use blackline_core::{RedactionRegion, TextFragment};
use blackline_verify::{verify_output, VerifyOptions};
use std::fs;
use std::path::Path;
use std::process::ExitCode;

/// Run one CLI invocation.
pub fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Detect(args) => {
            apply_source_overrides(&mut config, &args.source);
            run_detect(&args, &config)
        }
        Command::Redact(args) => {
            apply_source_overrides(&mut config, &args.source);
            if let Some(scale) = args.scale {
                config.render.scale = scale;
            }
            if let Some(padding) = args.padding {
                config.overlay.padding = padding;
            }
            if args.no_verify {
                config.verify = false;
            }
            run_redact(&args, &config)
        }
        Command::Verify(args) => run_verify(&args),
    }
}

fn apply_source_overrides(config: &mut AppConfig, source: &SourceArgs) {
    if let Some(kind) = source.classifier {
        config.classifier.kind = kind;
    }
    if let Some(rules) = &source.rules {
        config.classifier.rules_path = Some(rules.clone());
    }
}

/// Fragments from a JSON file or from pdfium.
fn load_fragments(
    path: &Path,
    pdf: &[u8],
    source: &SourceArgs,
    backend: &mut LazyBackend,
) -> anyhow::Result<Vec<TextFragment>> {
    match &source.fragments {
        Some(file) => {
            let fragments: Vec<TextFragment> = read_json(file)?;
            if fragments.is_empty() {
                return Err(pipeline::AppError::Unextractable(file.display().to_string()).into());
            }
            Ok(fragments)
        }
        None => Ok(extract_fragments(path, pdf, backend.get()?)?),
    }
}

fn run_detect(args: &DetectArgs, config: &AppConfig) -> anyhow::Result<ExitCode> {
    let pdf = read_document(&args.pdf)?;
    let mut backend = LazyBackend::new(config);

    let fragments = load_fragments(&args.pdf, &pdf, &args.source, &mut backend)?;
    let classifier = build_classifier(&config.classifier, args.source.spans.as_deref())?;
    let detection = detect(&fragments, classifier.as_ref(), &locator_options(config))?;

    let raw = serde_json::to_string_pretty(&detection.regions)?;
    match &args.output {
        Some(path) => {
            fs::write(path, raw)?;
            log::info!("[Pipeline] regions written to {}", path.display());
        }
        None => println!("{}", raw),
    }
    Ok(ExitCode::SUCCESS)
}

fn run_redact(args: &RedactArgs, config: &AppConfig) -> anyhow::Result<ExitCode> {
    let pdf = read_document(&args.pdf)?;
    let mut backend = LazyBackend::new(config);

    let (fragment_count, span_count, regions) = match &args.regions {
        Some(path) => {
            let regions: Vec<RedactionRegion> = read_json(path)?;
            log::info!("[Pipeline] {} regions read from {}", regions.len(), path.display());
            (0, 0, regions)
        }
        None => {
            let fragments = load_fragments(&args.pdf, &pdf, &args.source, &mut backend)?;
            let classifier = build_classifier(&config.classifier, args.source.spans.as_deref())?;
            let detection = detect(&fragments, classifier.as_ref(), &locator_options(config))?;
            (detection.fragments, detection.spans.len(), detection.regions)
        }
    };

    let mut report = RedactionReport::new(&args.pdf, fragment_count, span_count, &regions);

    let outcome = if regions.is_empty() {
        log::info!("[Pipeline] nothing to redact in {}", args.pdf.display());
        passthrough(&args.pdf, &pdf)?
    } else {
        redact(
            &args.pdf,
            &pdf,
            &regions,
            backend.get()?,
            &composite_options(config),
        )?
    };

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| output_path(&args.pdf, &config.output.prefix));
    write_output(&output, &outcome.bytes)?;
    report.record_outcome(&outcome, &output);

    if config.verify {
        let result = verify_output(&pdf, &outcome.bytes, &outcome.redacted_pages, &VerifyOptions::default());
        report.record_verification(result);
    }

    report.log_summary();
    if let Some(path) = &args.report {
        report.write(path)?;
        log::info!("[Pipeline] report written to {}", path.display());
    }

    if !report.success {
        log::warn!("[Pipeline] completed with warnings, output may be incompletely redacted");
    }
    println!("{}", output.display());
    Ok(ExitCode::SUCCESS)
}

fn run_verify(args: &VerifyArgs) -> anyhow::Result<ExitCode> {
    let original = read_document(&args.original)?;
    let redacted = read_document(&args.redacted)?;

    let result = verify_output(&original, &redacted, &args.pages, &VerifyOptions::default());
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(if result.ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
