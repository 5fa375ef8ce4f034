use serde::{Deserialize, Serialize};

use super::GitProvider;

/// Scope of a git connector's URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionType {
    /// URL points at an organization; repo name comes from the store
    Account,
    /// URL points at a single repository
    Repo,
    /// Azure project URL; repo name comes from the store
    Project,
}

/// Authentication configured on an SCM connector.
///
/// Secrets are references only; decryption happens on the agent side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScmAuth {
    Token { username: Option<String>, token_ref: String },
    App { app_id: String, installation_id: String, private_key_ref: String },
    Ssh { key_ref: String },
    UsernamePassword { username: String, password_ref: String },
}

impl ScmAuth {
    /// Token and app credentials can call the provider's file API directly
    pub fn supports_api_access(&self) -> bool {
        matches!(self, ScmAuth::Token { .. } | ScmAuth::App { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScmConnector {
    pub url: String,
    pub connection_type: ConnectionType,
    pub auth: ScmAuth,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConnectorConfig {
    Git(ScmConnector),
    Github(ScmConnector),
    Gitlab(ScmConnector),
    Bitbucket(ScmConnector),
    AzureRepo(ScmConnector),
    HttpHelm { url: String },
    OciHelm { url: String },
    Aws {
        #[serde(default)]
        region: Option<String>,
    },
    Gcp {
        #[serde(default)]
        project: Option<String>,
    },
}

impl ConnectorConfig {
    pub fn type_name(&self) -> &'static str {
        match self {
            ConnectorConfig::Git(_) => "Git",
            ConnectorConfig::Github(_) => "Github",
            ConnectorConfig::Gitlab(_) => "GitLab",
            ConnectorConfig::Bitbucket(_) => "Bitbucket",
            ConnectorConfig::AzureRepo(_) => "AzureRepo",
            ConnectorConfig::HttpHelm { .. } => "HttpHelmRepo",
            ConnectorConfig::OciHelm { .. } => "OciHelmRepo",
            ConnectorConfig::Aws { .. } => "Aws",
            ConnectorConfig::Gcp { .. } => "Gcp",
        }
    }

    /// Returns the SCM flavour and settings for git-compatible connectors
    pub fn scm(&self) -> Option<(GitProvider, &ScmConnector)> {
        match self {
            ConnectorConfig::Git(scm) => Some((GitProvider::Git, scm)),
            ConnectorConfig::Github(scm) => Some((GitProvider::Github, scm)),
            ConnectorConfig::Gitlab(scm) => Some((GitProvider::Gitlab, scm)),
            ConnectorConfig::Bitbucket(scm) => Some((GitProvider::Bitbucket, scm)),
            ConnectorConfig::AzureRepo(scm) => Some((GitProvider::AzureRepo, scm)),
            _ => None,
        }
    }
}

/// A decrypted connector as returned by the connector provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connector {
    pub identifier: String,
    pub name: String,
    pub config: ConnectorConfig,
}

impl Connector {
    pub fn new(identifier: impl Into<String>, config: ConnectorConfig) -> Self {
        let identifier = identifier.into();
        Self {
            name: identifier.clone(),
            identifier,
            config,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}
