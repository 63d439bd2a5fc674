use shared_types::{ActionId, ActionIdError};
use thiserror::Error;

/// Why a dispatch was dropped. Neither case touches the snapshot or
/// publishes anything.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("Unknown action: {0}")]
    UnknownAction(ActionId),

    #[error("Validation failed for action {0}")]
    ValidationFailed(ActionId),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Invalid action id: {0}")]
    InvalidId(#[from] ActionIdError),
}
