//! Error types for the engine and the remote-service boundary.

use thiserror::Error;

/// Result type alias using [`EngineError`].
pub type EngineResult<T> = Result<T, EngineError>;

/// Result type alias using [`ServiceError`].
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Failure of a single remote-service call.
///
/// A transport failure covers the whole call; operations already applied by
/// earlier calls in the same run stay applied.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The call itself failed: network, timeout, or service outage.
    #[error("transport failure: {0}")]
    Transport(String),

    /// Credential or token acquisition failure.
    #[error("authentication failure: {0}")]
    Auth(String),

    /// The service returned an error payload.
    #[error("service error {code}: {message}")]
    Api { code: String, message: String },

    /// The response could not be interpreted.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Errors surfaced by engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The operation was superseded or explicitly cancelled.
    #[error("cancelled")]
    Cancelled,

    /// No entities are selected.
    #[error("select at least one entity")]
    NoEntitiesSelected,

    /// No roles are selected.
    #[error("select at least one role")]
    NoRolesSelected,

    /// Every template column is `NoChange`; there is nothing to submit.
    #[error("no changes selected")]
    NoChangesSelected,

    /// A selected entity has no cached privilege index.
    #[error("privileges not loaded for entity: {logical_name}")]
    PrivilegesNotLoaded { logical_name: String },

    /// A remote call failed.
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl EngineError {
    /// True for precondition violations: the caller must correct its input
    /// before retrying, and no remote call was made.
    #[must_use]
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            EngineError::NoEntitiesSelected
                | EngineError::NoRolesSelected
                | EngineError::NoChangesSelected
                | EngineError::PrivilegesNotLoaded { .. }
        )
    }

    /// True when the operation was cancelled rather than failed.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, EngineError::Cancelled)
    }
}
