/**
 * Backend Error Types
 *
 * This module defines the error type returned by every HTTP handler.
 *
 * # Error Categories
 *
 * ## Handler Errors
 *
 * Request-level failures with an explicit status code: missing or invalid
 * tokens, insufficient role, unknown resources, duplicates.
 *
 * ## Domain Errors
 *
 * Order placement and cancellation failures (`OrderError`) and validation
 * failures of shared request types (`SharedError`).
 *
 * ## Infrastructure Errors
 *
 * Database errors and a missing database. Their details are logged and never
 * sent to the client.
 */

use axum::http::StatusCode;
use thiserror::Error;

use crate::backend::orders::OrderError;
use crate::shared::SharedError;

/// Backend-specific error types
///
/// ```rust,ignore
/// use brewmarket::backend::error::BackendError;
///
/// let err = BackendError::not_found("Order not found");
/// let err = BackendError::forbidden("Suppliers only");
/// ```
#[derive(Debug, Error)]
pub enum BackendError {
    /// Handler error with an explicit status code
    #[error("Handler error: {message}")]
    HandlerError {
        /// HTTP status code for this error
        status: StatusCode,
        /// Human-readable error message
        message: String,
    },

    /// No database pool is configured
    #[error("Database not configured")]
    DatabaseUnavailable,

    /// Query or connection failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Order placement or cancellation failure
    #[error(transparent)]
    Order(#[from] OrderError),

    /// Validation error from the shared request types
    #[error(transparent)]
    SharedError(#[from] SharedError),
}

impl BackendError {
    /// Create a new handler error with a status code
    pub fn handler(status: StatusCode, message: impl Into<String>) -> Self {
        Self::HandlerError {
            status,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::handler(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::handler(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::handler(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::handler(StatusCode::CONFLICT, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::handler(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Get the HTTP status code for this error
    ///
    /// # Status Code Mapping
    ///
    /// - `HandlerError` - Uses the status code from the error
    /// - `DatabaseUnavailable` - 503 Service Unavailable
    /// - `Database` - 500 Internal Server Error
    /// - `Order` - 409 for stock and state conflicts, 404 / 403 for lookups
    /// - `SharedError` - 400 Bad Request
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::HandlerError { status, .. } => *status,
            Self::DatabaseUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Order(err) => match err {
                OrderError::ItemUnavailable { .. }
                | OrderError::InsufficientStock { .. }
                | OrderError::NotCancellable { .. }
                | OrderError::InvalidTransition { .. } => StatusCode::CONFLICT,
                OrderError::Invalid(_) => StatusCode::BAD_REQUEST,
                OrderError::NotFound(_) => StatusCode::NOT_FOUND,
                OrderError::NotSupplierOrder(_) => StatusCode::FORBIDDEN,
                OrderError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::SharedError(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Get the error message sent to the client
    ///
    /// Database details stay in the logs.
    pub fn message(&self) -> String {
        match self {
            Self::HandlerError { message, .. } => message.clone(),
            Self::DatabaseUnavailable => "Database not configured".to_string(),
            Self::Database(_) | Self::Order(OrderError::Database(_)) => {
                "Internal server error".to_string()
            }
            Self::Order(err) => err.to_string(),
            Self::SharedError(err) => err.to_string(),
        }
    }
}
