//! Data models representing database entities and request bodies.

/// Account entity and account request/response types
pub mod account;
/// Transfer request body
pub mod transfer;
