//! Engine settings types

use serde::{Deserialize, Serialize};

/// Feature gates that alter how fetch instructions are built
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureGates {
    /// Fetch git files through the provider API when the connector allows it
    #[serde(default)]
    pub optimized_git_fetch: bool,

    /// Ask the agent to use the newest chartmuseum binary for S3/GCS repos
    #[serde(default)]
    pub use_latest_chartmuseum_version: bool,

    /// Disable the per-connector helm repository cache
    /// When true, repo names are scoped to the plan execution instead
    #[serde(default)]
    pub disable_helm_repo_cache: bool,
}

/// Settings for the async chain driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverSettings {
    /// Retries for a call whose delegate could not be reached
    #[serde(default = "default_max_transport_retries")]
    pub max_transport_retries: u32,

    /// Base backoff between transport retries, multiplied by the attempt number
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            max_transport_retries: default_max_transport_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

fn default_max_transport_retries() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    500
}
