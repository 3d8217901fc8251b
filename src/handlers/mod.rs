//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body, URL params, etc.)
//! 2. Calls the account store
//! 3. Returns `Result<_, AppError>`; failures are rendered by `AppError`

use axum::http::{Method, Uri};

use crate::error::AppError;

/// Account management endpoints
pub mod accounts;
/// Service health endpoint
pub mod health;
/// Balance transfer endpoint
pub mod transfers;

/// Fallback for a known path requested with a method it does not serve.
pub async fn unsupported_method(method: Method, uri: Uri) -> AppError {
    AppError::validation(format!(
        "method {method} is not supported by {}",
        uri.path()
    ))
}

/// Fallback for paths with no registered route.
pub async fn route_not_found(method: Method, uri: Uri) -> AppError {
    AppError::RouteNotFound {
        method: method.to_string(),
        path: uri.path().to_string(),
    }
}
