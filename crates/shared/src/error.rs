//! Application-wide error types.
//!
//! Every repository error in the workspace flattens into [`AppError`], which is
//! the form a transport layer maps onto status codes.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// A row the caller explicitly required does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The operation would break a reference held by other rows.
    #[error("Referential integrity violation: {0}")]
    ReferentialIntegrity(String),

    /// A row lock could not be taken, or a concurrent writer won the race.
    #[error("Lock conflict: {0}")]
    LockConflict(String),

    /// A programming error such as a missing transaction handle.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Transport-agnostic class of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`AppError::NotFound`].
    NotFound,
    /// See [`AppError::Validation`].
    Validation,
    /// See [`AppError::ReferentialIntegrity`].
    ReferentialIntegrity,
    /// See [`AppError::LockConflict`].
    LockConflict,
    /// See [`AppError::InvalidState`].
    InvalidState,
    /// See [`AppError::Database`].
    Database,
    /// See [`AppError::Internal`].
    Internal,
}

impl ErrorKind {
    /// Returns the HTTP status code for this class.
    #[must_use]
    pub const fn status_code(self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::Validation => 400,
            Self::ReferentialIntegrity | Self::LockConflict => 409,
            Self::InvalidState | Self::Database | Self::Internal => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::Validation => "VALIDATION_ERROR",
            Self::ReferentialIntegrity => "REFERENTIAL_INTEGRITY",
            Self::LockConflict => "LOCK_CONFLICT",
            Self::InvalidState => "INVALID_STATE",
            Self::Database => "DATABASE_ERROR",
            Self::Internal => "INTERNAL_ERROR",
        }
    }

    /// Returns true if retrying the whole unit of work may succeed.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::LockConflict)
    }
}

impl AppError {
    /// Builds an error of the given class.
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        match kind {
            ErrorKind::NotFound => Self::NotFound(message),
            ErrorKind::Validation => Self::Validation(message),
            ErrorKind::ReferentialIntegrity => Self::ReferentialIntegrity(message),
            ErrorKind::LockConflict => Self::LockConflict(message),
            ErrorKind::InvalidState => Self::InvalidState(message),
            ErrorKind::Database => Self::Database(message),
            ErrorKind::Internal => Self::Internal(message),
        }
    }

    /// Returns the class of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Validation(_) => ErrorKind::Validation,
            Self::ReferentialIntegrity(_) => ErrorKind::ReferentialIntegrity,
            Self::LockConflict(_) => ErrorKind::LockConflict,
            Self::InvalidState(_) => ErrorKind::InvalidState,
            Self::Database(_) => ErrorKind::Database,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        self.kind().status_code()
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        self.kind().error_code()
    }

    /// Returns true if retrying the whole unit of work may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(AppError::NotFound(String::new()), 404, "NOT_FOUND")]
    #[case(AppError::Validation(String::new()), 400, "VALIDATION_ERROR")]
    #[case(AppError::ReferentialIntegrity(String::new()), 409, "REFERENTIAL_INTEGRITY")]
    #[case(AppError::LockConflict(String::new()), 409, "LOCK_CONFLICT")]
    #[case(AppError::InvalidState(String::new()), 500, "INVALID_STATE")]
    #[case(AppError::Database(String::new()), 500, "DATABASE_ERROR")]
    #[case(AppError::Internal(String::new()), 500, "INTERNAL_ERROR")]
    fn test_status_and_code(#[case] err: AppError, #[case] status: u16, #[case] code: &str) {
        assert_eq!(err.status_code(), status);
        assert_eq!(err.error_code(), code);
    }

    #[test]
    fn test_only_lock_conflict_is_retryable() {
        assert!(AppError::LockConflict("scope".into()).is_retryable());
        assert!(!AppError::Database("boom".into()).is_retryable());
        assert!(!AppError::ReferentialIntegrity("entries".into()).is_retryable());
    }

    #[test]
    fn test_new_round_trips_kind() {
        let err = AppError::new(ErrorKind::ReferentialIntegrity, "entries exist");
        assert_eq!(err.kind(), ErrorKind::ReferentialIntegrity);
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.to_string(), "Referential integrity violation: entries exist");
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            AppError::ReferentialIntegrity("msg".into()).to_string(),
            "Referential integrity violation: msg"
        );
        assert_eq!(
            AppError::InvalidState("msg".into()).to_string(),
            "Invalid state: msg"
        );
        assert_eq!(
            AppError::LockConflict("msg".into()).to_string(),
            "Lock conflict: msg"
        );
    }
}
