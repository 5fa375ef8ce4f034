//! Parameters serialized into remote calls

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::response::FetchedFile;
use crate::domain::HelmVersion;
use crate::source::{ChartFetchConfig, FetchInstruction, GitFetchConfig};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitFetchParams {
    pub account_id: String,
    pub fetch_files_configs: Vec<GitFetchConfig>,
    /// First fetch of the chain opens the "Fetch Files" log stream
    pub open_log_stream: bool,
    /// Last fetch of the chain closes it
    pub close_log_stream: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HelmValuesFetchParams {
    pub account_id: String,
    pub chart: ChartFetchConfig,
    /// Values files to read from the pulled chart, keyed by the identifier
    /// they are reported under
    pub values_paths: BTreeMap<String, Vec<String>>,
    pub timeout_millis: u64,
    pub open_log_stream: bool,
    pub close_log_stream: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HelmDeployParams {
    pub account_id: String,
    pub release_name: String,
    pub namespace: String,
    pub cluster_ref: String,
    pub manifest: FetchInstruction,
    pub helm_version: HelmVersion,
    /// Values in merge order; later entries override earlier keys
    pub values_yaml_list: Vec<String>,
    pub skip_dry_run: bool,
    pub ignore_release_hist_failed_status: bool,
    pub skip_steady_state_check: bool,
    pub timeout_millis: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HelmRollbackParams {
    pub account_id: String,
    pub release_name: String,
    pub namespace: String,
    pub cluster_ref: String,
    /// Release revision to roll back to
    pub rollback_version: u32,
    pub helm_version: HelmVersion,
    pub manifest_files: Vec<FetchedFile>,
    pub skip_dry_run: bool,
    pub timeout_millis: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerlessTarget {
    pub region: String,
    pub stage: String,
    pub connector_ref: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerlessPrepareRollbackParams {
    pub account_id: String,
    pub target: ServerlessTarget,
    pub manifest_path: String,
    pub manifest_content: String,
    pub timeout_millis: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerlessDeployParams {
    pub account_id: String,
    pub target: ServerlessTarget,
    pub manifest_path: String,
    pub manifest_content: String,
    pub command_options: Option<String>,
    pub prepare_rollback_data: Option<String>,
    pub timeout_millis: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerlessRollbackParams {
    pub account_id: String,
    pub target: ServerlessTarget,
    pub manifest_path: String,
    pub manifest_content: String,
    /// Marker captured before the deploy being rolled back
    pub previous_version_marker: Option<String>,
    pub first_deployment: bool,
    pub timeout_millis: u64,
}
