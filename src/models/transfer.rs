//! Transfer request model.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Request to move money into an account.
///
/// # JSON Example
///
/// ```json
/// {
///   "accountNumber": 123456,
///   "amount": 2500,
///   "fromAccountNumber": 654321
/// }
/// ```
///
/// Without `fromAccountNumber` the destination is simply credited. With it,
/// the source is debited and the destination credited in one database
/// transaction. The request is echoed back on success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    /// Destination account number
    pub account_number: i64,

    /// Amount in minor units, must be positive
    pub amount: i64,

    /// Optional source account number to debit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_account_number: Option<i64>,
}

impl TransferRequest {
    /// Reject requests the store would refuse anyway, before touching it.
    pub fn validate(&self) -> Result<(), AppError> {
        validate_amount(self.amount)?;

        if self.from_account_number == Some(self.account_number) {
            return Err(AppError::validation("cannot transfer to the same account"));
        }

        Ok(())
    }
}

/// Transfers only move strictly positive amounts.
pub fn validate_amount(amount: i64) -> Result<(), AppError> {
    if amount <= 0 {
        return Err(AppError::validation(format!(
            "transfer amount must be positive, got {amount}"
        )));
    }
    Ok(())
}
