use crate::config::ClassifierKind;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "blackline")]
#[command(version, about = "Find sensitive text in PDFs and redact it irreversibly")]
pub struct Cli {
    /// Configuration file (JSON)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Locate sensitive text and print the regions as JSON
    Detect(DetectArgs),
    /// Locate and redact, writing a new PDF
    Redact(RedactArgs),
    /// Check a redacted PDF against its original
    Verify(VerifyArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Pre-extracted fragments (JSON) instead of extracting with pdfium
    #[arg(long)]
    pub fragments: Option<PathBuf>,

    /// Classifier spans (JSON `[{"type", "text"}]`) instead of calling a classifier
    #[arg(long)]
    pub spans: Option<PathBuf>,

    /// Classifier to use
    #[arg(long, value_enum)]
    pub classifier: Option<ClassifierKind>,

    /// Rule set (JSON) for the rules classifier
    #[arg(long)]
    pub rules: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct DetectArgs {
    pub pdf: PathBuf,

    #[command(flatten)]
    pub source: SourceArgs,

    /// Write regions here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct RedactArgs {
    pub pdf: PathBuf,

    /// Output PDF; defaults to the configured prefix beside the input
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Regions (JSON) to redact, skipping extraction and classification
    #[arg(long)]
    pub regions: Option<PathBuf>,

    #[command(flatten)]
    pub source: SourceArgs,

    /// Write a JSON report of the run
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Rendering scale relative to 72 DPI
    #[arg(long)]
    pub scale: Option<f32>,

    /// Overlay padding in page units
    #[arg(long)]
    pub padding: Option<f64>,

    /// Skip output verification
    #[arg(long)]
    pub no_verify: bool,
}

#[derive(Args, Debug)]
pub struct VerifyArgs {
    pub original: PathBuf,
    pub redacted: PathBuf,

    /// Pages that were redacted, e.g. 2,5
    #[arg(long, value_delimiter = ',')]
    pub pages: Vec<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_redact() {
        let cli = Cli::try_parse_from([
            "blackline",
            "--verbose",
            "redact",
            "invoice.pdf",
            "-o",
            "out.pdf",
            "--spans",
            "spans.json",
            "--classifier",
            "rules",
            "--no-verify",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Command::Redact(args) => {
                assert_eq!(args.pdf, PathBuf::from("invoice.pdf"));
                assert_eq!(args.output, Some(PathBuf::from("out.pdf")));
                assert_eq!(args.source.spans, Some(PathBuf::from("spans.json")));
                assert_eq!(args.source.classifier, Some(ClassifierKind::Rules));
                assert!(args.no_verify);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_verify_pages() {
        let cli = Cli::try_parse_from(["blackline", "verify", "a.pdf", "b.pdf", "--pages", "2,5"]).unwrap();
        match cli.command {
            Command::Verify(args) => assert_eq!(args.pages, vec![2, 5]),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let cli = Cli::try_parse_from(["blackline", "detect", "a.pdf", "--config", "c.json"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("c.json")));
    }
}
