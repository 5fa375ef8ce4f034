//! Connector and store compatibility checks

use crate::domain::{Connector, ConnectorConfig, GitProvider, StoreConfig};
use crate::error::{ChainError, Result};

/// Ensures the connector's concrete type matches the declared store.
///
/// `context` names the place the store was declared and is echoed in the
/// error, e.g. `"Helm Deploy step manifest [chart]"`.
pub fn validate_connector(store: &StoreConfig, connector: &Connector, context: &str) -> Result<()> {
    let (compatible, expected) = match store {
        StoreConfig::Git(git) => {
            let actual = connector.config.scm().map(|(provider, _)| provider);
            (actual == Some(git.provider), expected_git_connector(git.provider))
        }
        StoreConfig::S3 { .. } => (
            matches!(connector.config, ConnectorConfig::Aws { .. }),
            "Amazon Web Services",
        ),
        StoreConfig::Gcs { .. } => (
            matches!(connector.config, ConnectorConfig::Gcp { .. }),
            "Google cloud",
        ),
        StoreConfig::Http { .. } => (
            matches!(connector.config, ConnectorConfig::HttpHelm { .. }),
            "Http Helm",
        ),
        StoreConfig::Oci { .. } => (
            matches!(connector.config, ConnectorConfig::OciHelm { .. }),
            "Oci Helm",
        ),
        StoreConfig::Inline { .. } | StoreConfig::InheritFromManifest { .. } => return Ok(()),
    };

    if compatible {
        Ok(())
    } else {
        Err(ChainError::config(format!(
            "Invalid connector selected in {}. Select {} connector",
            context, expected
        )))
    }
}

fn expected_git_connector(provider: GitProvider) -> &'static str {
    match provider {
        GitProvider::Git => "Git",
        GitProvider::Github => "Github",
        GitProvider::Gitlab => "GitLab",
        GitProvider::Bitbucket => "Bitbucket",
        GitProvider::AzureRepo => "Azure Repo",
    }
}
