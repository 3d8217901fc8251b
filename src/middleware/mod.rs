//! HTTP middleware components.
//!
//! Middleware run before route handlers and may short-circuit a request by
//! returning an `AppError`.

/// Account ownership check for credential-protected routes
pub mod auth;
