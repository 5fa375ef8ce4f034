use std::collections::HashMap;

use crate::domain::{Connector, ExecutionContext};
use crate::error::{ChainError, Result};

/// Supplies decrypted connectors by reference
pub trait ConnectorProvider: Send + Sync {
    /// Look up a connector by its reference (e.g. `account.github`)
    fn connector(&self, ctx: &ExecutionContext, connector_ref: &str) -> Result<Connector>;
}

/// Fixed set of connectors keyed by reference
#[derive(Debug, Clone, Default)]
pub struct InMemoryConnectors {
    connectors: HashMap<String, Connector>,
}

impl InMemoryConnectors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connector under its identifier
    pub fn with_connector(mut self, connector: Connector) -> Self {
        self.connectors.insert(connector.identifier.clone(), connector);
        self
    }

    pub fn insert(&mut self, connector_ref: impl Into<String>, connector: Connector) {
        self.connectors.insert(connector_ref.into(), connector);
    }
}

impl ConnectorProvider for InMemoryConnectors {
    fn connector(&self, _ctx: &ExecutionContext, connector_ref: &str) -> Result<Connector> {
        self.connectors
            .get(connector_ref.trim())
            .cloned()
            .ok_or_else(|| {
                ChainError::config(format!(
                    "Connector not found for identifier: [{}]",
                    connector_ref
                ))
            })
    }
}
