//! Outcome persistence and connector lookup seams

mod connectors;
mod outcome;

pub use connectors::{ConnectorProvider, InMemoryConnectors};
pub use outcome::{InMemoryOutcomeStore, OutcomeStore, outcome_key};
