//! Group domain errors

use core_kernel::{MoneyError, PortError};
use thiserror::Error;

/// Errors that can occur in the group domain
///
/// Validation failures never leave a group partially updated: every
/// operation checks its input before touching balances or the entry log.
#[derive(Debug, Error)]
pub enum GroupError {
    /// Malformed input: empty names, unknown members, bad amounts
    #[error("Validation error: {0}")]
    Validation(String),

    /// The referenced group does not exist
    #[error("Group not found: {0}")]
    NotFound(String),

    /// Concurrent writers kept winning until the retry budget ran out
    #[error("Concurrent update conflict: {0}")]
    Conflict(String),

    /// Any other storage failure
    #[error("Storage error: {0}")]
    Port(PortError),
}

impl GroupError {
    pub fn validation(message: impl Into<String>) -> Self {
        GroupError::Validation(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, GroupError::Validation(_))
    }
}

impl From<MoneyError> for GroupError {
    fn from(err: MoneyError) -> Self {
        GroupError::Validation(err.to_string())
    }
}

impl From<PortError> for GroupError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound { entity_type, id } => {
                GroupError::NotFound(format!("{} {}", entity_type, id))
            }
            PortError::Conflict { message } => GroupError::Conflict(message),
            PortError::Validation { message } => GroupError::Validation(message),
            other => GroupError::Port(other),
        }
    }
}
