//! HTTP error handling and response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::db::repository::RepositoryError;
use crate::services::ShiftError;

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Error raised by a shift service
    Shift(ShiftError),
}

fn repository_response(e: &RepositoryError) -> (StatusCode, ApiError) {
    let msg = e.to_string();
    match e {
        RepositoryError::NotFound { .. } => (StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", msg)),
        RepositoryError::ValidationError { .. } => {
            (StatusCode::CONFLICT, ApiError::new("CONFLICT", msg))
        }
        RepositoryError::ConnectionError { .. } => (
            StatusCode::SERVICE_UNAVAILABLE,
            ApiError::new("UNAVAILABLE", msg),
        ),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::new("REPOSITORY_ERROR", msg),
        ),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::Shift(e) => match &e {
                ShiftError::Validation(_) | ShiftError::CourseMismatch { .. } => (
                    StatusCode::BAD_REQUEST,
                    ApiError::new("VALIDATION_ERROR", e.to_string()),
                ),
                ShiftError::MembershipMismatch { actual, .. } => (
                    StatusCode::CONFLICT,
                    ApiError::new("MEMBERSHIP_MISMATCH", e.to_string())
                        .with_details(format!("actual={}", actual)),
                ),
                ShiftError::NotFound(msg) => {
                    (StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", msg.clone()))
                }
                ShiftError::Repository(inner) => repository_response(inner),
            },
        };

        (status, Json(error)).into_response()
    }
}

impl From<ShiftError> for AppError {
    fn from(err: ShiftError) -> Self {
        AppError::Shift(err)
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        AppError::Shift(ShiftError::Repository(err))
    }
}
