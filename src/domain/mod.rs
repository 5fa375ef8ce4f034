//! Core domain types consumed by the chain

mod connector;
mod context;
mod infra;
mod manifest;
mod outcome;
mod progress;

pub use connector::{ConnectionType, Connector, ConnectorConfig, ScmAuth, ScmConnector};
pub use context::ExecutionContext;
pub use infra::TargetInfra;
pub use manifest::{
    FetchType, GitProvider, GitStore, HelmVersion, ManifestOutcome, ManifestType, StoreConfig,
    StoreKind,
};
pub use outcome::{DeployOutcome, ReleaseInfo};
pub use progress::{UnitProgress, UnitStatus, complete_unit_progress};
