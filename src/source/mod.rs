//! Source resolution: manifest stores into agent-ready fetch instructions
//!
//! The resolver is a pure function of the store description, the decrypted
//! connector and the execution context. It checks that the connector fits
//! the store, builds the repository locator and picks the authentication
//! payload. It never talks to the store itself.

mod chart;
mod git;
mod validate;

pub use chart::{CHART_VALUES_FILE, ChartFetchConfig, ChartRepoStore, repo_name};
pub use git::{
    AuthPayload, GitFetchConfig, is_optimized_fetch, join_path, normalize_paths, repo_url,
};
pub use validate::validate_connector;

use serde::{Deserialize, Serialize};

use crate::config::FeatureGates;
use crate::domain::{
    Connector, ExecutionContext, GitStore, ManifestOutcome, ManifestType, StoreConfig, StoreKind,
};
use crate::error::{ChainError, Result};

/// Instruction telling the agent where to pull a manifest from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum FetchInstruction {
    Git(GitFetchConfig),
    Chart(ChartFetchConfig),
}

impl FetchInstruction {
    pub fn identifier(&self) -> &str {
        match self {
            FetchInstruction::Git(config) => &config.identifier,
            FetchInstruction::Chart(config) => &config.identifier,
        }
    }

    pub fn as_git(&self) -> Option<&GitFetchConfig> {
        match self {
            FetchInstruction::Git(config) => Some(config),
            FetchInstruction::Chart(_) => None,
        }
    }
}

/// Turns manifest stores into fetch instructions
#[derive(Debug, Clone, Copy)]
pub struct SourceResolver<'a> {
    features: &'a FeatureGates,
}

impl<'a> SourceResolver<'a> {
    pub fn new(features: &'a FeatureGates) -> Self {
        Self { features }
    }

    /// Resolves the manifest's own store.
    ///
    /// Chart manifests in git fetch their chart folder; other git manifests
    /// fetch their declared paths. Chart repository stores are only valid for
    /// chart manifests.
    pub fn resolve(
        &self,
        manifest: &ManifestOutcome,
        connector: &Connector,
        ctx: &ExecutionContext,
    ) -> Result<FetchInstruction> {
        validate_connector(&manifest.store, connector, &describe(manifest))?;

        match (&manifest.store, manifest.store.kind()) {
            (StoreConfig::Git(store), _) => {
                let paths = manifest_paths(manifest, store);
                git::build_git_fetch(
                    &manifest.identifier,
                    manifest.manifest_type,
                    store,
                    connector,
                    paths,
                    false,
                    self.features,
                )
                .map(FetchInstruction::Git)
            }
            (_, StoreKind::ObjectStore | StoreKind::HttpRepo)
                if manifest.manifest_type == ManifestType::HelmChart =>
            {
                chart::build_chart_fetch(manifest, connector, ctx, self.features)
                    .map(FetchInstruction::Chart)
            }
            (store, _) => Err(ChainError::config(format!(
                "Unsupported Store Config type: [{}]",
                store.type_name()
            ))),
        }
    }

    /// Resolves explicit paths against a git store, e.g. values overlays or
    /// files inherited from the chart's repository.
    pub fn resolve_git_paths(
        &self,
        identifier: &str,
        manifest_type: ManifestType,
        store: &GitStore,
        connector: &Connector,
        paths: &[String],
        succeed_if_file_not_found: bool,
    ) -> Result<GitFetchConfig> {
        let store_config = StoreConfig::Git(store.clone());
        validate_connector(
            &store_config,
            connector,
            &format!("{} manifest [{}]", manifest_type, identifier),
        )?;
        git::build_git_fetch(
            identifier,
            manifest_type,
            store,
            connector,
            paths.to_vec(),
            succeed_if_file_not_found,
            self.features,
        )
    }
}

/// Paths fetched for a git manifest: the chart folder for charts, the
/// declared path list otherwise.
pub fn manifest_paths(manifest: &ManifestOutcome, store: &GitStore) -> Vec<String> {
    match manifest.manifest_type {
        ManifestType::HelmChart => store
            .folder_path
            .as_deref()
            .map(|folder| vec![folder.trim().to_string()])
            .unwrap_or_default(),
        _ => normalize_paths(&store.paths),
    }
}

/// Location of a chart's default values file relative to `root`.
///
/// Sub-charts keep their values under `charts/<name>`.
pub fn chart_values_file(manifest: &ManifestOutcome, root: &str) -> String {
    match manifest.sub_chart_name.as_deref().map(str::trim) {
        Some(sub) if !sub.is_empty() => {
            join_path(&[root, &format!("charts/{}", sub), CHART_VALUES_FILE])
        }
        _ => join_path(&[root, CHART_VALUES_FILE]),
    }
}

fn describe(manifest: &ManifestOutcome) -> String {
    format!("{} manifest [{}]", manifest.manifest_type, manifest.identifier)
}
