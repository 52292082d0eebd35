//! Error code constants.
//!
//! Error codes are organized by category:
//! - 1xxx: Configuration errors
//! - 2xxx: Authentication/Authorization errors
//! - 3xxx: Validation errors
//! - 4xxx: Resource errors
//! - 5xxx: Internal/System errors

/// Error code type with semantic categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode(i32);

impl ErrorCode {
    // ===== Configuration Errors (1xxx) =====

    /// Invalid campaign configuration or generation bound.
    pub const INVALID_CONFIG: Self = Self(1001);

    /// Number space exhausted for the configured series.
    pub const CAPACITY_EXHAUSTED: Self = Self(1002);

    // ===== Authentication/Authorization Errors (2xxx) =====

    /// Authentication required.
    pub const UNAUTHORIZED: Self = Self(2001);

    // ===== Validation Errors (3xxx) =====

    /// Bad request / invalid parameters.
    pub const BAD_REQUEST: Self = Self(3001);

    /// Requested quantity is zero or above the per-request cap.
    pub const INVALID_QUANTITY: Self = Self(3002);

    // ===== Resource Errors (4xxx) =====

    /// Participant not found.
    pub const PARTICIPANT_NOT_FOUND: Self = Self(4001);

    /// Participant already registered.
    pub const PARTICIPANT_EXISTS: Self = Self(4002);

    /// Issuance limit exceeded.
    pub const LIMIT_EXCEEDED: Self = Self(4003);

    /// Duplicate number persisted concurrently; retries exhausted.
    pub const STORAGE_CONFLICT: Self = Self(4004);

    // ===== Internal/System Errors (5xxx) =====

    /// Storage backend error.
    pub const STORAGE_ERROR: Self = Self(5001);

    /// Internal server error.
    pub const INTERNAL_ERROR: Self = Self(5002);

    /// Service unavailable.
    pub const SERVICE_UNAVAILABLE: Self = Self(5003);

    /// Get the error code as an i32.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// Get the category of this error code.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self.0 {
            1000..=1999 => ErrorCategory::Configuration,
            2000..=2999 => ErrorCategory::Authentication,
            3000..=3999 => ErrorCategory::Validation,
            4000..=4999 => ErrorCategory::Resource,
            5000..=5999 => ErrorCategory::Internal,
            _ => ErrorCategory::Unknown,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<ErrorCode> for i32 {
    fn from(code: ErrorCode) -> Self {
        code.0
    }
}

/// Error category based on error code range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Configuration-related errors (1xxx).
    Configuration,
    /// Authentication/authorization errors (2xxx).
    Authentication,
    /// Validation errors (3xxx).
    Validation,
    /// Resource errors (4xxx).
    Resource,
    /// Internal/system errors (5xxx).
    Internal,
    /// Unknown category.
    Unknown,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration => write!(f, "configuration"),
            Self::Authentication => write!(f, "authentication"),
            Self::Validation => write!(f, "validation"),
            Self::Resource => write!(f, "resource"),
            Self::Internal => write!(f, "internal"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}
