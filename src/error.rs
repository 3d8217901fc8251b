//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Failures raised by an account store implementation.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Query, connection or constraint failure reported by PostgreSQL.
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    /// Write rejected because it would violate a uniqueness rule.
    #[error("conflict: {0}")]
    Conflict(String),
}

/// Application-wide error type.
///
/// Every handler and middleware returns `Result<_, AppError>`; the
/// `IntoResponse` impl below is the only place a failure becomes an HTTP
/// response.
///
/// # Error Categories
///
/// - **Validation**: malformed input, unsupported method, bad transfer amount
/// - **Authorization**: missing, invalid, expired or foreign credentials
/// - **Not found**: no matching account or route
/// - **Storage**: any failure from the account store
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Request body, path or method is invalid.
    ///
    /// Returns HTTP 400 Bad Request with the contained message.
    #[error("{0}")]
    Validation(String),

    /// Credential is missing, invalid, expired, or names another account.
    ///
    /// Returns HTTP 403 Forbidden. The message never says which check failed.
    #[error("permission denied")]
    PermissionDenied,

    /// No account matches the requested id or number.
    ///
    /// Returns HTTP 404 Not Found.
    #[error("account not found")]
    AccountNotFound,

    /// No route is registered for the request path.
    #[error("no route for {method} {path}")]
    RouteNotFound { method: String, path: String },

    /// The account store failed.
    ///
    /// Returns HTTP 500; details are logged, never sent to the client.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Signing a credential failed.
    #[error("Credential error: {0}")]
    Credential(#[from] jsonwebtoken::errors::Error),

    /// The named store operation is deliberately not supported.
    #[error("{0} is not implemented")]
    Unimplemented(&'static str),
}

impl AppError {
    /// Shorthand for building a [`AppError::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    /// HTTP status this error is reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::PermissionDenied => StatusCode::FORBIDDEN,
            AppError::AccountNotFound | AppError::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Storage(_) | AppError::Credential(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Unimplemented(_) => StatusCode::NOT_IMPLEMENTED,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Storage(StorageError::Database(err))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(format!("invalid request body: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(format!("invalid path parameter: {}", rejection.body_text()))
    }
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// All errors return JSON in this format:
/// ```json
/// { "error": "Human-readable error message" }
/// ```
///
/// # Status Code Mapping
///
/// - `Validation` → 400 Bad Request
/// - `PermissionDenied` → 403 Forbidden
/// - `AccountNotFound`, `RouteNotFound` → 404 Not Found
/// - `Storage`, `Credential` → 500 Internal Server Error (hides details from client)
/// - `Unimplemented` → 501 Not Implemented
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = match &self {
            AppError::Storage(err) => {
                tracing::error!(error = %err, "account store failure");
                "An internal error occurred".to_string()
            }
            AppError::Credential(err) => {
                tracing::error!(error = %err, "failed to sign credential");
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
