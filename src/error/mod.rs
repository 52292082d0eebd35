//! Error handling module.
//!
//! This module provides unified error handling with proper HTTP status code mapping
//! and standardized API error responses.

pub mod codes;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

pub use codes::ErrorCode;

use crate::domain::LimitReason;

/// Application-level error type.
///
/// Every variant is scoped to a single request; none of them is fatal to the
/// process.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Invalid campaign configuration (series count, algorithm or format settings).
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Generation bound is not positive.
    #[error("Invalid bound: {0}")]
    InvalidBound(u64),

    /// Requested quantity is zero or too large.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    /// Not enough free values remain in the number space.
    #[error("Capacity exhausted: requested {requested}, {available} available")]
    CapacityExhausted {
        /// Quantity that was requested.
        requested: u64,
        /// Free values left in range.
        available: u64,
    },

    /// Participant is not registered.
    #[error("Participant not found: {0}")]
    ParticipantNotFound(String),

    /// Participant is already registered.
    #[error("Participant already exists: {0}")]
    ParticipantExists(String),

    /// An issuance limit denied the request.
    #[error("Limit exceeded: {0}")]
    LimitExceeded(LimitReason),

    /// Duplicate numbers kept colliding with concurrent allocations.
    #[error("Storage conflict after {0} attempts")]
    StorageConflict(u32),

    /// Authentication failed.
    #[error("Authentication failed")]
    Unauthorized,

    /// Invalid request parameters.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Storage backend error.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get the error code for this error.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::InvalidConfiguration(_) | Self::InvalidBound(_) => ErrorCode::INVALID_CONFIG,
            Self::CapacityExhausted { .. } => ErrorCode::CAPACITY_EXHAUSTED,
            Self::InvalidQuantity(_) => ErrorCode::INVALID_QUANTITY,
            Self::ParticipantNotFound(_) => ErrorCode::PARTICIPANT_NOT_FOUND,
            Self::ParticipantExists(_) => ErrorCode::PARTICIPANT_EXISTS,
            Self::LimitExceeded(_) => ErrorCode::LIMIT_EXCEEDED,
            Self::StorageConflict(_) => ErrorCode::STORAGE_CONFLICT,
            Self::Unauthorized => ErrorCode::UNAUTHORIZED,
            Self::BadRequest(_) => ErrorCode::BAD_REQUEST,
            Self::Storage(_) => ErrorCode::STORAGE_ERROR,
            Self::Internal(_) => ErrorCode::INTERNAL_ERROR,
        }
    }

    /// Get the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::ParticipantNotFound(_) => StatusCode::NOT_FOUND,
            Self::ParticipantExists(_) | Self::StorageConflict(_) => StatusCode::CONFLICT,
            Self::InvalidConfiguration(_)
            | Self::InvalidBound(_)
            | Self::InvalidQuantity(_)
            | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::LimitExceeded(_) => StatusCode::TOO_MANY_REQUESTS,
            Self::CapacityExhausted { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Storage(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code().as_i32();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(
                error_code = code,
                status = %status,
                message = %message,
                "Request failed"
            );
        } else {
            tracing::warn!(
                error_code = code,
                status = %status,
                message = %message,
                "Request rejected"
            );
        }

        let body = Json(json!({
            "code": code,
            "message": message,
            "data": null
        }));

        (status, body).into_response()
    }
}

/// Storage-specific error type.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Connection error.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Query execution error.
    #[error("Query failed: {0}")]
    Query(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A uniqueness constraint rejected the write.
    #[error("Uniqueness conflict: {0}")]
    Conflict(String),

    /// Lock acquisition failed.
    #[error("Failed to acquire lock: {0}")]
    LockFailed(String),

    /// File I/O error.
    #[error("File I/O error: {0}")]
    FileIO(String),

    /// Backend not available.
    #[error("Storage backend unavailable")]
    Unavailable,
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::FileIO(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Self::Conflict(db.message().to_string())
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => Self::Unavailable,
            sqlx::Error::Io(e) => Self::Connection(e.to_string()),
            other => Self::Query(other.to_string()),
        }
    }
}

/// Result type alias using `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type alias using `StorageError`.
pub type StorageResult<T> = std::result::Result<T, StorageError>;
