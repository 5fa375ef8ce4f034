//! Configuration loading and management

mod settings;
mod step;
mod timeout;

pub use settings::{DriverSettings, FeatureGates};
pub use step::{StepConfig, StepSpec, units};
pub use timeout::parse_timeout_millis;

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Engine-wide configuration shared read-only by all chains
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Timeout applied to steps that do not declare one
    #[serde(default = "default_timeout")]
    pub default_timeout: String,

    /// Feature gates
    #[serde(default)]
    pub features: FeatureGates,

    /// Async driver settings
    #[serde(default)]
    pub driver: DriverSettings,
}

fn default_timeout() -> String {
    "10m".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_timeout: default_timeout(),
            features: FeatureGates::default(),
            driver: DriverSettings::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Parse configuration from TOML text, validating the default timeout
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(content)?;
        parse_timeout_millis(&config.default_timeout)?;
        Ok(config)
    }

    /// Create a config with sensible defaults
    pub fn with_defaults() -> Self {
        Self::default()
    }

    pub fn with_features(mut self, features: FeatureGates) -> Self {
        self.features = features;
        self
    }
}
