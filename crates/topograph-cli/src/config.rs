//! topograph.toml configuration parser.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use topograph_provider::EngineOptions;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopographConfig {
    /// Provider label for metrics and logs.
    pub provider: Option<String>,
    #[serde(default)]
    pub normalize: bool,
    pub output: Option<OutputConfig>,
    pub collector: Option<CollectorConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub plugin: Option<String>,
    pub block_sizes: Option<Vec<usize>>,
    pub block_split: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectorConfig {
    pub timeout_secs: Option<u64>,
}

impl TopographConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: TopographConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load `path` when given, otherwise fall back to defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn provider_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.provider.as_deref().unwrap_or(fallback)
    }

    pub fn engine_options(&self) -> EngineOptions {
        let output = self.output.clone().unwrap_or_default();
        EngineOptions {
            normalize: self.normalize,
            timeout: self
                .collector
                .as_ref()
                .and_then(|c| c.timeout_secs)
                .map(Duration::from_secs),
            plugin: output.plugin,
            block_sizes: output.block_sizes,
            block_split: output.block_split.unwrap_or(false),
        }
    }
}
