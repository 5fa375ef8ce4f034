//! Helm chart repository fetch instructions

use serde::{Deserialize, Serialize};

use crate::config::FeatureGates;
use crate::domain::{
    Connector, ConnectorConfig, ExecutionContext, HelmVersion, ManifestOutcome, StoreConfig,
};
use crate::error::{ChainError, Result};

/// Default values file shipped inside every chart
pub const CHART_VALUES_FILE: &str = "values.yaml";

/// Store-specific part of a chart repository fetch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChartRepoStore {
    S3 {
        bucket_name: String,
        region: String,
        folder_path: Option<String>,
        use_latest_chartmuseum_version: bool,
    },
    Gcs {
        bucket_name: String,
        folder_path: Option<String>,
        use_latest_chartmuseum_version: bool,
    },
    Http {
        repo_url: String,
    },
    Oci {
        repo_url: String,
        base_path: Option<String>,
    },
}

/// Everything the agent needs to pull a chart from a chart repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartFetchConfig {
    pub identifier: String,
    pub connector_id: String,
    pub chart_name: String,
    pub chart_version: Option<String>,
    pub helm_version: HelmVersion,
    /// Local helm repository alias
    pub repo_name: String,
    pub store: ChartRepoStore,
}

pub(crate) fn build_chart_fetch(
    manifest: &ManifestOutcome,
    connector: &Connector,
    ctx: &ExecutionContext,
    features: &FeatureGates,
) -> Result<ChartFetchConfig> {
    let chart_name = manifest
        .chart_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| {
            ChainError::config(format!(
                "Chart name is mandatory for manifest [{}]",
                manifest.identifier
            ))
        })?;

    let store = match (&manifest.store, &connector.config) {
        (
            StoreConfig::S3 {
                bucket_name,
                region,
                folder_path,
                ..
            },
            ConnectorConfig::Aws { .. },
        ) => ChartRepoStore::S3 {
            bucket_name: bucket_name.clone(),
            region: region.clone(),
            folder_path: folder_path.clone(),
            use_latest_chartmuseum_version: features.use_latest_chartmuseum_version,
        },
        (
            StoreConfig::Gcs {
                bucket_name,
                folder_path,
                ..
            },
            ConnectorConfig::Gcp { .. },
        ) => ChartRepoStore::Gcs {
            bucket_name: bucket_name.clone(),
            folder_path: folder_path.clone(),
            use_latest_chartmuseum_version: features.use_latest_chartmuseum_version,
        },
        (StoreConfig::Http { .. }, ConnectorConfig::HttpHelm { url }) => {
            ChartRepoStore::Http { repo_url: url.clone() }
        }
        (StoreConfig::Oci { base_path, .. }, ConnectorConfig::OciHelm { url }) => ChartRepoStore::Oci {
            repo_url: url.clone(),
            base_path: base_path.clone(),
        },
        (store, _) => {
            return Err(ChainError::config(format!(
                "Unsupported Store Config type: [{}]",
                store.type_name()
            )));
        }
    };

    Ok(ChartFetchConfig {
        identifier: manifest.identifier.clone(),
        connector_id: connector.identifier.clone(),
        chart_name: chart_name.to_string(),
        chart_version: manifest.chart_version.clone(),
        helm_version: manifest.helm_version,
        repo_name: repo_name(manifest.helm_version, connector, ctx, features),
        store,
    })
}

/// Helm v3 repos are cached per connector unless the cache is disabled
pub fn repo_name(
    helm_version: HelmVersion,
    connector: &Connector,
    ctx: &ExecutionContext,
    features: &FeatureGates,
) -> String {
    if helm_version == HelmVersion::V3 && !features.disable_helm_repo_cache {
        connector.identifier.clone()
    } else {
        ctx.plan_execution_id.clone()
    }
}
