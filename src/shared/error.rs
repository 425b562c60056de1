//! Shared error types
//!
//! Errors raised while validating the request types in [`crate::shared`].
//! The backend converts them into `400 Bad Request` responses.

use thiserror::Error;

/// Errors produced by shared data types
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SharedError {
    /// A field failed validation
    #[error("Validation error in field '{field}': {message}")]
    ValidationError {
        /// Name of the offending field
        field: String,
        /// What is wrong with it
        message: String,
    },
}

impl SharedError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Name of the field that failed validation
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::ValidationError { field, .. } => Some(field),
        }
    }
}
