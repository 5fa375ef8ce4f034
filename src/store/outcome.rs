use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::domain::DeployOutcome;

/// Key under which a step's outcome is recorded within a stage
pub fn outcome_key(stage_key: &str, step_ref: &str, outcome_name: &str) -> String {
    format!("{}.{}.{}", stage_key, step_ref, outcome_name)
}

/// Persistence for deploy outcomes shared between a deploy and its rollback
pub trait OutcomeStore: Send + Sync {
    fn save(&self, key: &str, outcome: DeployOutcome);

    fn load(&self, key: &str) -> Option<DeployOutcome>;
}

/// Process-local outcome store
#[derive(Debug, Clone, Default)]
pub struct InMemoryOutcomeStore {
    outcomes: Arc<RwLock<HashMap<String, DeployOutcome>>>,
}

impl InMemoryOutcomeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.outcomes.read().map(|map| map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl OutcomeStore for InMemoryOutcomeStore {
    fn save(&self, key: &str, outcome: DeployOutcome) {
        match self.outcomes.write() {
            Ok(mut map) => {
                map.insert(key.to_string(), outcome);
            }
            Err(_) => tracing::warn!(key, "Outcome store lock poisoned, outcome not saved"),
        }
    }

    fn load(&self, key: &str) -> Option<DeployOutcome> {
        self.outcomes.read().ok()?.get(key).cloned()
    }
}
