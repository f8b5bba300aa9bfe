use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierKind {
    /// Remote Gemini model
    #[default]
    Gemini,
    /// Offline regex / dictionary / heuristic rules
    Rules,
    /// Fixed spans read from a JSON file
    File,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default, rename_all = "camelCase")]
pub struct ClassifierConfig {
    pub kind: ClassifierKind,
    pub model: String,
    pub endpoint: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub timeout_secs: u64,
    /// Rule set for `kind = rules`; built-in heuristics when absent.
    pub rules_path: Option<PathBuf>,
    /// Span list for `kind = file`.
    pub spans_path: Option<PathBuf>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            kind: ClassifierKind::Gemini,
            model: "gemini-2.5-flash".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            timeout_secs: 120,
            rules_path: None,
            spans_path: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderSettings {
    pub scale: f32,
    pub pdfium_dir: Option<PathBuf>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            scale: blackline_render::DEFAULT_RENDER_SCALE,
            pdfium_dir: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default, rename_all = "camelCase")]
pub struct OverlaySettings {
    pub padding: f64,
    pub descent_ratio: f64,
    /// Line grouping precision for the locator, in page units.
    pub line_precision: f64,
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            padding: 1.0,
            descent_ratio: blackline_render::DEFAULT_DESCENT_RATIO,
            line_precision: 1.0,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default, rename_all = "camelCase")]
pub struct OutputSettings {
    pub prefix: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            prefix: "redacted-".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    pub classifier: ClassifierConfig,
    pub render: RenderSettings,
    pub overlay: OverlaySettings,
    pub output: OutputSettings,
    /// Check the produced document before reporting success.
    pub verify: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            classifier: ClassifierConfig::default(),
            render: RenderSettings::default(),
            overlay: OverlaySettings::default(),
            output: OutputSettings::default(),
            verify: true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid value {value:?} for {name}")]
    InvalidEnv { name: String, value: String },
}

pub const ENV_RENDER_SCALE: &str = "BLACKLINE_RENDER_SCALE";
pub const ENV_PDFIUM_DIR: &str = "BLACKLINE_PDFIUM_DIR";

impl AppConfig {
    /// Apply `BLACKLINE_*` overrides read through `lookup`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_RENDER_SCALE) {
            self.render.scale = value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                name: ENV_RENDER_SCALE.to_string(),
                value: value.clone(),
            })?;
        }
        if let Some(value) = lookup(ENV_PDFIUM_DIR) {
            if !value.trim().is_empty() {
                self.render.pdfium_dir = Some(PathBuf::from(value));
            }
        }
        Ok(())
    }
}

/// Load configuration from `path`, falling back to defaults when the file is
/// absent, then apply environment overrides.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut config = match path {
        Some(path) if path.exists() => {
            let raw = fs::read_to_string(path)?;
            let config: AppConfig = serde_json::from_str(&raw)?;
            log::info!("[Pipeline] config loaded from {}", path.display());
            config
        }
        Some(path) => {
            log::warn!("[Pipeline] config {} not found, using defaults", path.display());
            AppConfig::default()
        }
        None => AppConfig::default(),
    };
    config.apply_env_overrides(|name| std::env::var(name).ok())?;
    Ok(config)
}

pub fn save_config(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)?;
        }
    }
    let raw = serde_json::to_string_pretty(config)?;
    fs::write(path, raw)?;
    Ok(())
}
