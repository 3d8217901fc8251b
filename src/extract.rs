//! Request extractors whose rejections are `AppError`s.
//!
//! Axum's own `Json` and `Path` reject with plain-text bodies. These wrappers
//! reuse them but report failures as [`AppError::Validation`], so malformed
//! input gets the same `{"error": ...}` envelope as every other failure.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::AppError;

/// JSON request body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Typed path parameters.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);
