//! Credential-based authorization middleware.
//!
//! This middleware guards `/account/{id}` routes. It:
//! 1. Extracts the credential from the `x-jwt-token` header
//! 2. Verifies its signature, algorithm and expiry
//! 3. Checks that the account addressed by `{id}` is the one the credential names
//! 4. Rejects everything else with HTTP 403
//!
//! [`require_credential_for`] applies the same credential rules to debiting
//! transfers.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};

use crate::{app::AppState, error::AppError, extract::AppPath, models::account::Account};

/// Header carrying the credential. Header lookups are case-insensitive.
pub const TOKEN_HEADER: &str = "x-jwt-token";

/// The account a request was authorized for.
///
/// Inserted into request extensions once every check has passed.
#[derive(Debug, Clone)]
pub struct AuthenticatedAccount(pub Account);

/// Ownership check for routes with an `{id}` path parameter.
///
/// # Flow
///
/// 1. Parse `{id}` (400 if it is not an integer)
/// 2. Read the credential from `x-jwt-token`, or `Authorization: Bearer <token>`
/// 3. Verify it; any failure → 403
/// 4. Look up the account addressed by `{id}`; its number must match the credential's → else 403
/// 5. Insert [`AuthenticatedAccount`] and call the next handler
///
/// When `{id}` does not exist the answer is 404 only if the credential's own
/// account is gone too, i.e. the caller is addressing the account it just
/// deleted. Any other missing `{id}` is the same 403 as a foreign one.
pub async fn require_account_owner(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = credential_from_headers(request.headers()).ok_or(AppError::PermissionDenied)?;

    let claims = state.tokens.verify(token)?;

    let target = match state.store.get_account_by_id(id).await {
        Ok(account) => account,
        Err(AppError::AccountNotFound) => {
            // 404 only when the credential's own account is the one that is gone
            state
                .store
                .get_account_by_number(claims.account_number)
                .await?;
            return Err(AppError::PermissionDenied);
        }
        Err(err) => return Err(err),
    };

    if target.number != claims.account_number {
        tracing::debug!(account_id = id, "credential names a different account");
        return Err(AppError::PermissionDenied);
    }

    request
        .extensions_mut()
        .insert(AuthenticatedAccount(target));

    Ok(next.run(request).await)
}

/// Require a valid credential for `account_number` outside the `{id}` routes.
///
/// Used for transfers that debit an account: only that account's owner may
/// move money out of it.
pub fn require_credential_for(
    state: &AppState,
    headers: &HeaderMap,
    account_number: i64,
) -> Result<(), AppError> {
    let token = credential_from_headers(headers).ok_or(AppError::PermissionDenied)?;
    let claims = state.tokens.verify(token)?;

    if claims.account_number != account_number {
        tracing::debug!(account_number, "credential does not own the debited account");
        return Err(AppError::PermissionDenied);
    }

    Ok(())
}

fn credential_from_headers(headers: &HeaderMap) -> Option<&str> {
    if let Some(value) = headers.get(TOKEN_HEADER) {
        return value.to_str().ok().filter(|token| !token.is_empty());
    }

    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn token_header_name_is_case_insensitive() {
        let mut headers = HeaderMap::new();
        headers.insert("X-JWT-Token", HeaderValue::from_static("abc"));

        assert_eq!(credential_from_headers(&headers), Some("abc"));
    }

    #[test]
    fn bearer_authorization_is_a_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));

        assert_eq!(credential_from_headers(&headers), Some("abc"));
    }

    #[test]
    fn missing_or_empty_credentials_yield_nothing() {
        let mut headers = HeaderMap::new();
        assert_eq!(credential_from_headers(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(credential_from_headers(&headers), None);

        headers.insert(TOKEN_HEADER, HeaderValue::from_static(""));
        assert_eq!(credential_from_headers(&headers), None);
    }
}
