//! Git-family fetch instructions

use serde::{Deserialize, Serialize};

use crate::config::FeatureGates;
use crate::domain::{
    ConnectionType, Connector, FetchType, GitProvider, GitStore, ManifestType, ScmAuth,
    ScmConnector,
};
use crate::error::{ChainError, Result};

/// Authentication handed to the agent alongside a git fetch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuthPayload {
    /// Clone through the SCM protocol
    Scm { auth: ScmAuth },
    /// Read files through the provider's REST API
    ApiAccess { provider: GitProvider, auth: ScmAuth },
}

/// Everything the agent needs to fetch files from one git repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitFetchConfig {
    /// Key under which the agent reports fetched files
    pub identifier: String,
    pub manifest_type: ManifestType,
    pub succeed_if_file_not_found: bool,
    pub connector_id: String,
    pub connector_name: String,
    pub provider: GitProvider,
    pub repo_url: String,
    pub fetch_type: FetchType,
    pub branch: Option<String>,
    pub commit_id: Option<String>,
    pub paths: Vec<String>,
    pub optimized_files_fetch: bool,
    pub auth: AuthPayload,
}

/// Builds a git fetch config for explicit paths.
pub(crate) fn build_git_fetch(
    identifier: &str,
    manifest_type: ManifestType,
    store: &GitStore,
    connector: &Connector,
    paths: Vec<String>,
    succeed_if_file_not_found: bool,
    features: &FeatureGates,
) -> Result<GitFetchConfig> {
    let Some((provider, scm)) = connector.config.scm() else {
        return Err(ChainError::config(format!(
            "Connector [{}] of type {} cannot be used for git fetch",
            connector.identifier,
            connector.config.type_name()
        )));
    };

    let (branch, commit_id) = match store.fetch_type {
        FetchType::Branch => (Some(required(&store.branch, "Branch", identifier)?), None),
        FetchType::Commit => (None, Some(required(&store.commit_id, "Commit id", identifier)?)),
    };

    let paths = normalize_paths(&paths);
    if paths.is_empty() {
        return Err(ChainError::config(format!(
            "File paths are mandatory for manifest [{}]",
            identifier
        )));
    }

    let optimized = is_optimized_fetch(provider, scm, features);
    let auth = if optimized {
        AuthPayload::ApiAccess {
            provider,
            auth: scm.auth.clone(),
        }
    } else {
        AuthPayload::Scm {
            auth: scm.auth.clone(),
        }
    };

    Ok(GitFetchConfig {
        identifier: identifier.to_string(),
        manifest_type,
        succeed_if_file_not_found,
        connector_id: connector.identifier.clone(),
        connector_name: connector.name.clone(),
        provider,
        repo_url: repo_url(provider, scm, store.repo_name.as_deref())?,
        fetch_type: store.fetch_type,
        branch,
        commit_id,
        paths,
        optimized_files_fetch: optimized,
        auth,
    })
}

/// Fully-qualified repository URL for a connector and declared repo name.
///
/// Repo-scoped connectors already point at the repository. Account and
/// project connectors are joined with the repo name after trimming the
/// trailing slash of the URL and the leading slash of the name.
pub fn repo_url(provider: GitProvider, scm: &ScmConnector, repo_name: Option<&str>) -> Result<String> {
    if scm.connection_type == ConnectionType::Repo {
        return Ok(scm.url.clone());
    }

    let repo = repo_name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ChainError::config("Repo name cannot be empty for Account level git connector"))?;

    let base = scm.url.trim_end_matches('/');
    let repo = repo.trim_start_matches('/');
    let separator = if provider == GitProvider::AzureRepo
        && scm.connection_type == ConnectionType::Project
        && base.starts_with("http")
    {
        "/_git/"
    } else {
        "/"
    };

    Ok(format!("{}{}{}", base, separator, repo))
}

/// API fetch needs the gate, a hosted provider and API-capable credentials
pub fn is_optimized_fetch(provider: GitProvider, scm: &ScmConnector, features: &FeatureGates) -> bool {
    features.optimized_git_fetch
        && provider != GitProvider::Git
        && scm.auth.supports_api_access()
}

/// Trims each path and drops blanks, keeping order
pub fn normalize_paths(paths: &[String]) -> Vec<String> {
    paths
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Joins path segments with a single `/`, ignoring blank segments
pub fn join_path(segments: &[&str]) -> String {
    let parts: Vec<&str> = segments
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let s = s.trim().trim_end_matches('/');
            if i == 0 { s } else { s.trim_start_matches('/') }
        })
        .filter(|s| !s.is_empty())
        .collect();
    parts.join("/")
}

fn required(value: &Option<String>, field: &str, identifier: &str) -> Result<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            ChainError::config(format!("{} is mandatory for manifest [{}]", field, identifier))
        })
}
