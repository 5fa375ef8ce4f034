//! Error taxonomy for chain execution

/// Errors raised while starting, advancing or finalizing a chain.
///
/// Remote operation failures are not errors: they become failure contexts and
/// surface through [`crate::chain::ChainController::finalize`]. Only faults that
/// stop the chain from being built, or that the caller must retry, are returned
/// as `Err`.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    /// Invalid step or manifest setup, detected before any remote call.
    #[error("{0}")]
    Configuration(String),

    /// The remote agent could not be reached. Callers own the retry decision.
    #[error("Delegate infrastructure failure: {0}")]
    Infrastructure(String),

    /// Agent response that cannot be interpreted.
    #[error("Invalid agent response: {0}")]
    InvalidResponse(String),

    #[error("Failed to serialize task parameters: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ChainError {
    pub fn config(message: impl Into<String>) -> Self {
        ChainError::Configuration(message.into())
    }

    /// Whether the error must be propagated instead of ending the chain.
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, ChainError::Infrastructure(_))
    }
}

pub type Result<T> = std::result::Result<T, ChainError>;
