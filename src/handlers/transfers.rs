//! Transfer HTTP handler.

use axum::{Json, extract::State, http::HeaderMap};

use crate::{
    app::AppState, error::AppError, extract::AppJson, middleware::auth::require_credential_for,
    models::transfer::TransferRequest,
};

/// Transfer money into an account.
///
/// # Endpoint
///
/// `POST /transfer`
///
/// # Request Body
///
/// ```json
/// { "accountNumber": 123456, "amount": 2500 }
/// ```
///
/// Adding `"fromAccountNumber"` debits that account in the same database
/// transaction; without it the destination is only credited. A debit needs a
/// credential for the source account in `x-jwt-token`.
///
/// # Response
///
/// - **Success (200 OK)**: the request, echoed back
/// - **Error (400)**: Non-positive amount, self-transfer, insufficient funds, balance overflow
/// - **Error (403)**: Debit without a valid credential for the source account
/// - **Error (404)**: Unknown account number
/// - **Error (500)**: Storage error
pub async fn create_transfer(
    State(state): State<AppState>,
    headers: HeaderMap,
    AppJson(request): AppJson<TransferRequest>,
) -> Result<Json<TransferRequest>, AppError> {
    request.validate()?;

    match request.from_account_number {
        Some(source) => {
            require_credential_for(&state, &headers, source)?;
            state
                .store
                .transfer_from(source, request.account_number, request.amount)
                .await?;
        }
        None => {
            state
                .store
                .transfer(request.account_number, request.amount)
                .await?;
        }
    }

    tracing::info!(
        to = request.account_number,
        from = ?request.from_account_number,
        amount = request.amount,
        "transfer applied"
    );

    Ok(Json(request))
}
