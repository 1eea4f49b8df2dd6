//! Registry domain errors
//!
//! Every variant carries the identifying fields an operator needs to find
//! the record again (id, name), never just a bare failure.

use core_kernel::{GuardianId, PortError, ResidentId};
use thiserror::Error;

/// Errors that can occur in the registry domain
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Resident with the given id was not found
    #[error("Resident not found: {0}")]
    ResidentNotFound(ResidentId),

    /// Guardian with the given id was not found
    #[error("Guardian not found: {0}")]
    GuardianNotFound(GuardianId),

    /// Guardian is still referenced by residents and cannot be removed
    #[error("Guardian {guardian_id} ({name}) is still responsible for {residents} resident(s); deactivate it instead")]
    GuardianInUse {
        guardian_id: GuardianId,
        name: String,
        residents: usize,
    },

    /// A new resident needs a guardian and none could be resolved
    #[error("Resident '{resident_name}' cannot be created without a guardian")]
    GuardianRequired { resident_name: String },

    /// Guardian lacks the document number required to act as payer
    #[error("Guardian {guardian_id} ({name}) has no document number and cannot be the payer of record")]
    MissingPayerDocument { guardian_id: GuardianId, name: String },

    /// Input failed validation
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Storage port failure
    #[error(transparent)]
    Port(#[from] PortError),
}

impl RegistryError {
    /// Creates a Validation error from a list of messages
    pub fn validation_failed(errors: Vec<String>) -> Self {
        RegistryError::Validation(errors.join("; "))
    }

    /// True for the not-found variants
    pub fn is_not_found(&self) -> bool {
        match self {
            RegistryError::ResidentNotFound(_) | RegistryError::GuardianNotFound(_) => true,
            RegistryError::Port(port) => port.is_not_found(),
            _ => false,
        }
    }
}

impl From<validator::ValidationErrors> for RegistryError {
    fn from(errors: validator::ValidationErrors) -> Self {
        RegistryError::Validation(errors.to_string())
    }
}
