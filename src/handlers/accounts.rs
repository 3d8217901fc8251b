//! Account management HTTP handlers.
//!
//! This module implements the account-related API endpoints:
//! - GET /account - List all accounts
//! - POST /account - Create new account
//! - GET /account/{id} - Get account by ID (credential required)
//! - DELETE /account/{id} - Delete account by ID (credential required)

use axum::{Extension, Json, extract::State, response::IntoResponse};

use crate::{
    app::AppState,
    error::AppError,
    extract::{AppJson, AppPath},
    middleware::auth::{AuthenticatedAccount, TOKEN_HEADER},
    models::account::{Account, CreateAccountRequest, DeleteAccountResponse},
};

/// List all accounts.
///
/// # Response
///
/// - **Success (200 OK)**: array of accounts (may be empty)
/// - **Error (500)**: Storage error
pub async fn list_accounts(State(state): State<AppState>) -> Result<Json<Vec<Account>>, AppError> {
    let accounts = state.store.get_accounts().await?;

    Ok(Json(accounts))
}

/// Create a new account.
///
/// # Request Body
///
/// ```json
/// { "firstName": "Ada", "lastName": "Lovelace" }
/// ```
///
/// # Response
///
/// - **Success (200 OK)**: the created account, with a credential for it in
///   the `x-jwt-token` response header
/// - **Error (400)**: Missing, blank or overlong names; malformed JSON
/// - **Error (500)**: Storage error
///
/// ```json
/// {
///   "id": 1,
///   "firstName": "Ada",
///   "lastName": "Lovelace",
///   "number": 482913,
///   "balance": 0,
///   "createdAt": "2025-12-20T10:00:00Z"
/// }
/// ```
pub async fn create_account(
    State(state): State<AppState>,
    AppJson(request): AppJson<CreateAccountRequest>,
) -> Result<impl IntoResponse, AppError> {
    let new_account = request.into_new_account()?;
    let account = state.store.create_account(new_account).await?;

    let token = state.tokens.issue(&account)?;
    tracing::info!(id = account.id, number = account.number, "account created");

    Ok(([(TOKEN_HEADER, token)], Json(account)))
}

/// Get a specific account by ID.
///
/// Runs behind `require_account_owner`, which has already loaded the account
/// and checked it against the caller's credential.
///
/// # Response
///
/// - **Success (200 OK)**: account details
/// - **Error (400)**: `{id}` is not an integer
/// - **Error (403)**: Missing, invalid, or foreign credential
/// - **Error (404)**: Account not found
pub async fn get_account(
    Extension(AuthenticatedAccount(account)): Extension<AuthenticatedAccount>,
) -> Json<Account> {
    Json(account)
}

/// Delete an account.
///
/// # Response
///
/// - **Success (200 OK)**: `{"deleted": <id>}`
/// - **Error (400)**: `{id}` is not an integer
/// - **Error (403)**: Missing, invalid, or foreign credential
/// - **Error (404)**: Account not found
pub async fn delete_account(
    State(state): State<AppState>,
    Extension(AuthenticatedAccount(owner)): Extension<AuthenticatedAccount>,
    AppPath(id): AppPath<i32>,
) -> Result<Json<DeleteAccountResponse>, AppError> {
    state.store.delete_account(id).await?;
    tracing::info!(id, number = owner.number, "account deleted");

    Ok(Json(DeleteAccountResponse { deleted: id }))
}
