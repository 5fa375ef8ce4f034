use serde::{Deserialize, Serialize};

/// Kind of manifest declared on a service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ManifestType {
    HelmChart,
    ServerlessAwsLambda,
    Values,
}

impl ManifestType {
    pub fn as_marker(&self) -> &'static str {
        match self {
            ManifestType::HelmChart => "HelmChart",
            ManifestType::ServerlessAwsLambda => "ServerlessAwsLambda",
            ManifestType::Values => "Values",
        }
    }
}

impl std::fmt::Display for ManifestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_marker())
    }
}

/// SCM flavour of a git store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GitProvider {
    Git,
    Github,
    Gitlab,
    Bitbucket,
    AzureRepo,
}

impl GitProvider {
    pub fn as_marker(&self) -> &'static str {
        match self {
            GitProvider::Git => "Git",
            GitProvider::Github => "Github",
            GitProvider::Gitlab => "GitLab",
            GitProvider::Bitbucket => "Bitbucket",
            GitProvider::AzureRepo => "AzureRepo",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchType {
    #[default]
    Branch,
    Commit,
}

/// Git-family store locator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitStore {
    pub provider: GitProvider,
    pub connector_ref: String,
    /// Required when the connector is account or project scoped
    #[serde(default)]
    pub repo_name: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub commit_id: Option<String>,
    #[serde(default)]
    pub fetch_type: FetchType,
    #[serde(default)]
    pub paths: Vec<String>,
    /// Chart folder for HelmChart manifests
    #[serde(default)]
    pub folder_path: Option<String>,
}

impl GitStore {
    pub fn new(provider: GitProvider, connector_ref: impl Into<String>) -> Self {
        Self {
            provider,
            connector_ref: connector_ref.into(),
            repo_name: None,
            branch: Some("main".to_string()),
            commit_id: None,
            fetch_type: FetchType::Branch,
            paths: Vec::new(),
            folder_path: None,
        }
    }

    pub fn with_repo_name(mut self, repo_name: impl Into<String>) -> Self {
        self.repo_name = Some(repo_name.into());
        self
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.fetch_type = FetchType::Branch;
        self.branch = Some(branch.into());
        self
    }

    pub fn with_commit(mut self, commit_id: impl Into<String>) -> Self {
        self.fetch_type = FetchType::Commit;
        self.commit_id = Some(commit_id.into());
        self
    }

    pub fn with_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.paths = paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_folder_path(mut self, folder_path: impl Into<String>) -> Self {
        self.folder_path = Some(folder_path.into());
        self
    }
}

/// Where a manifest's files live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreConfig {
    Git(GitStore),
    S3 {
        connector_ref: String,
        bucket_name: String,
        region: String,
        #[serde(default)]
        folder_path: Option<String>,
    },
    Gcs {
        connector_ref: String,
        bucket_name: String,
        #[serde(default)]
        folder_path: Option<String>,
    },
    Http {
        connector_ref: String,
    },
    Oci {
        connector_ref: String,
        #[serde(default)]
        base_path: Option<String>,
    },
    Inline {
        content: String,
    },
    /// Values read from the store of the manifest they override
    InheritFromManifest {
        paths: Vec<String>,
    },
}

/// Coarse classification used to pick a fetch strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    GitFamily,
    ObjectStore,
    HttpRepo,
    Inline,
    InheritFromManifest,
}

impl StoreConfig {
    pub fn kind(&self) -> StoreKind {
        match self {
            StoreConfig::Git(_) => StoreKind::GitFamily,
            StoreConfig::S3 { .. } | StoreConfig::Gcs { .. } => StoreKind::ObjectStore,
            StoreConfig::Http { .. } | StoreConfig::Oci { .. } => StoreKind::HttpRepo,
            StoreConfig::Inline { .. } => StoreKind::Inline,
            StoreConfig::InheritFromManifest { .. } => StoreKind::InheritFromManifest,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            StoreConfig::Git(store) => store.provider.as_marker(),
            StoreConfig::S3 { .. } => "S3",
            StoreConfig::Gcs { .. } => "Gcs",
            StoreConfig::Http { .. } => "Http",
            StoreConfig::Oci { .. } => "OciHelmChart",
            StoreConfig::Inline { .. } => "InlineStore",
            StoreConfig::InheritFromManifest { .. } => "InheritFromManifest",
        }
    }

    pub fn connector_ref(&self) -> Option<&str> {
        match self {
            StoreConfig::Git(store) => Some(&store.connector_ref),
            StoreConfig::S3 { connector_ref, .. }
            | StoreConfig::Gcs { connector_ref, .. }
            | StoreConfig::Http { connector_ref }
            | StoreConfig::Oci { connector_ref, .. } => Some(connector_ref),
            StoreConfig::Inline { .. } | StoreConfig::InheritFromManifest { .. } => None,
        }
    }

    /// Whether content must be pulled by the agent before use
    pub fn is_remote(&self) -> bool {
        !matches!(self.kind(), StoreKind::Inline)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HelmVersion {
    V2,
    #[default]
    V3,
}

/// A resolved manifest as handed over by the service definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestOutcome {
    pub identifier: String,
    #[serde(rename = "type")]
    pub manifest_type: ManifestType,
    pub store: StoreConfig,
    /// Position among values overlays; lower merges first
    #[serde(default)]
    pub order: Option<u32>,
    #[serde(default)]
    pub chart_name: Option<String>,
    #[serde(default)]
    pub chart_version: Option<String>,
    #[serde(default)]
    pub helm_version: HelmVersion,
    /// Extra values files inside the chart, merged after its values.yaml
    #[serde(default)]
    pub values_paths: Vec<String>,
    #[serde(default)]
    pub sub_chart_name: Option<String>,
}

impl ManifestOutcome {
    pub fn new(identifier: impl Into<String>, manifest_type: ManifestType, store: StoreConfig) -> Self {
        Self {
            identifier: identifier.into(),
            manifest_type,
            store,
            order: None,
            chart_name: None,
            chart_version: None,
            helm_version: HelmVersion::V3,
            values_paths: Vec::new(),
            sub_chart_name: None,
        }
    }

    pub fn with_order(mut self, order: u32) -> Self {
        self.order = Some(order);
        self
    }

    pub fn with_chart(mut self, name: impl Into<String>, version: Option<&str>) -> Self {
        self.chart_name = Some(name.into());
        self.chart_version = version.map(str::to_string);
        self
    }

    pub fn with_helm_version(mut self, helm_version: HelmVersion) -> Self {
        self.helm_version = helm_version;
        self
    }

    pub fn with_values_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.values_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_sub_chart(mut self, sub_chart: impl Into<String>) -> Self {
        self.sub_chart_name = Some(sub_chart.into());
        self
    }

    pub fn is_values(&self) -> bool {
        self.manifest_type == ManifestType::Values
    }
}
