//! Recipe error types

use thiserror::Error;

use crate::domain::DomainError;

/// Errors that can occur during recipe operations
///
/// Step-level failures are not represented here; the executor contains them
/// as structured outcomes. These are the faults that cross the store and
/// service boundaries.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RecipeError {
    #[error("Recipe not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl RecipeError {
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound(id.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence(message.into())
    }
}

impl From<DomainError> for RecipeError {
    fn from(error: DomainError) -> Self {
        match error {
            DomainError::NotFound { message } => Self::NotFound(message),
            DomainError::Validation { message } => Self::Validation(message),
            other => Self::Persistence(other.to_string()),
        }
    }
}
