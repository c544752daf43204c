//! Errors returned by the shift services.

use crate::db::repository::RepositoryError;

pub type ShiftResult<T> = Result<T, ShiftError>;

#[derive(Debug, thiserror::Error)]
pub enum ShiftError {
    /// Input or state rejected by a shift rule.
    #[error("{0}")]
    Validation(String),

    /// The user's stored membership is not the one the caller expected.
    #[error("User's membership is '{actual}', not '{expected}'")]
    MembershipMismatch { actual: String, expected: String },

    /// A transfer between groups of two courses.
    #[error("Course groups have different course_key: {from} and {to}")]
    CourseMismatch { from: String, to: String },

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ShiftError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Whether the error was caused by the request rather than by storage.
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::Validation(_)
            | Self::MembershipMismatch { .. }
            | Self::CourseMismatch { .. }
            | Self::NotFound(_) => true,
            Self::Repository(e) => matches!(
                e,
                RepositoryError::NotFound { .. } | RepositoryError::ValidationError { .. }
            ),
        }
    }
}
