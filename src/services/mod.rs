//! Business logic services.
//!
//! Services hold logic that is independent of HTTP handlers.

pub mod token_service;
