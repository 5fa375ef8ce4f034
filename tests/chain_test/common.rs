//! Shared fixtures for chain tests

use serde::de::DeserializeOwned;
use taskchain::chain::{ChainController, RemoteCallRequest, Technology};
use taskchain::config::EngineConfig;
use taskchain::store::{InMemoryConnectors, InMemoryOutcomeStore};
use taskchain::{
    ConnectionType, Connector, ConnectorConfig, ExecutionContext, GitProvider, GitStore,
    ManifestOutcome, ManifestType, ScmAuth, ScmConnector, StoreConfig, TargetInfra, UnitProgress,
    UnitStatus,
};

pub const STAGE_KEY: &str = "pipeline.stages.prod";

/// Installs a test subscriber once; honours RUST_LOG
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub struct Harness {
    pub config: EngineConfig,
    pub connectors: InMemoryConnectors,
    pub outcomes: InMemoryOutcomeStore,
}

impl Harness {
    pub fn new() -> Self {
        init_tracing();
        Self {
            config: EngineConfig::with_defaults(),
            connectors: default_connectors(),
            outcomes: InMemoryOutcomeStore::new(),
        }
    }

    pub fn controller(&self, technology: Technology) -> ChainController<'_> {
        ChainController::new(technology, &self.config, &self.connectors, &self.outcomes)
    }

    pub fn helm(&self) -> ChainController<'_> {
        self.controller(Technology::NativeHelm)
    }

    pub fn serverless(&self) -> ChainController<'_> {
        self.controller(Technology::Serverless)
    }
}

pub fn default_connectors() -> InMemoryConnectors {
    InMemoryConnectors::new()
        .with_connector(Connector::new(
            "gh",
            ConnectorConfig::Github(ScmConnector {
                url: "https://github.com/acme/".to_string(),
                connection_type: ConnectionType::Account,
                auth: ScmAuth::Token {
                    username: Some("bot".to_string()),
                    token_ref: "account.gh_token".to_string(),
                },
            }),
        ))
        .with_connector(Connector::new(
            "git",
            ConnectorConfig::Git(ScmConnector {
                url: "git@git.acme.io:infra/values.git".to_string(),
                connection_type: ConnectionType::Repo,
                auth: ScmAuth::Ssh {
                    key_ref: "account.ssh".to_string(),
                },
            }),
        ))
        .with_connector(Connector::new(
            "repo",
            ConnectorConfig::HttpHelm {
                url: "https://charts.acme.io".to_string(),
            },
        ))
        .with_connector(Connector::new("aws", ConnectorConfig::Aws { region: None }))
}

pub fn git_chart() -> ManifestOutcome {
    ManifestOutcome::new(
        "chart",
        ManifestType::HelmChart,
        StoreConfig::Git(
            GitStore::new(GitProvider::Github, "gh")
                .with_repo_name("charts")
                .with_folder_path("charts/web"),
        ),
    )
}

pub fn repo_chart() -> ManifestOutcome {
    ManifestOutcome::new(
        "chart",
        ManifestType::HelmChart,
        StoreConfig::Http {
            connector_ref: "repo".to_string(),
        },
    )
    .with_chart("web", Some("1.4.2"))
}

pub fn git_values(identifier: &str, path: &str) -> ManifestOutcome {
    ManifestOutcome::new(
        identifier,
        ManifestType::Values,
        StoreConfig::Git(GitStore::new(GitProvider::Git, "git").with_paths([path])),
    )
}

pub fn inline_values(identifier: &str, content: &str) -> ManifestOutcome {
    ManifestOutcome::new(
        identifier,
        ManifestType::Values,
        StoreConfig::Inline {
            content: content.to_string(),
        },
    )
}

pub fn serverless_manifest() -> ManifestOutcome {
    ManifestOutcome::new(
        "lambda",
        ManifestType::ServerlessAwsLambda,
        StoreConfig::Git(
            GitStore::new(GitProvider::Github, "gh")
                .with_repo_name("functions")
                .with_paths(["serverless.yaml"]),
        ),
    )
}

pub fn k8s_infra() -> TargetInfra {
    TargetInfra::Kubernetes {
        cluster_ref: "prod-cluster".to_string(),
        namespace: "web".to_string(),
        release_name: "web".to_string(),
    }
}

pub fn serverless_infra() -> TargetInfra {
    TargetInfra::Serverless {
        region: "us-east-1".to_string(),
        stage: "prod".to_string(),
        connector_ref: "aws".to_string(),
    }
}

pub fn helm_ctx(manifests: Vec<ManifestOutcome>) -> ExecutionContext {
    let mut ctx = ExecutionContext::new("acct", "plan-42", STAGE_KEY).with_infrastructure(k8s_infra());
    ctx.manifests = manifests;
    ctx
}

pub fn serverless_ctx(manifests: Vec<ManifestOutcome>) -> ExecutionContext {
    let mut ctx =
        ExecutionContext::new("acct", "plan-42", STAGE_KEY).with_infrastructure(serverless_infra());
    ctx.manifests = manifests;
    ctx
}

/// Decodes the parameters of a remote call
pub fn params<T: DeserializeOwned>(call: &RemoteCallRequest) -> T {
    serde_json::from_value(call.params.clone()).expect("params should decode")
}

pub fn units(entries: &[(&str, UnitStatus)]) -> Vec<UnitProgress> {
    entries
        .iter()
        .map(|(name, status)| UnitProgress::new(*name, *status))
        .collect()
}
