//! Analyzer configuration

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

/// How the loader builds the inference object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InferenceMode {
    /// Build the configured backend, falling back to random scores on failure
    #[default]
    Auto,
    /// Always use normalized random scores
    Fallback,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub labels_path: PathBuf,
    pub backend: String,
    pub model_path: Option<PathBuf>,
    pub mode: InferenceMode,
    pub seed: Option<u64>,
    pub load_timeout_ms: u64,
    pub predict_timeout_ms: u64,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        Ok(config)
    }

    pub fn default_path() -> &'static str {
        "ancestor.toml"
    }

    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }

    pub fn predict_timeout(&self) -> Duration {
        Duration::from_millis(self.predict_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            labels_path: PathBuf::from("public/model_info_improved.json"),
            backend: "cpu".to_string(),
            model_path: None,
            mode: InferenceMode::Auto,
            seed: None,
            load_timeout_ms: 10_000,
            predict_timeout_ms: 30_000,
        }
    }
}
