//! Account data models and API request/response types.
//!
//! This module defines:
//! - `Account`: database entity, also the JSON shape returned to clients
//! - `NewAccount`: an account that has not been stored yet
//! - `CreateAccountRequest`: request body for creating accounts
//! - `DeleteAccountResponse`: response body for deletions

use chrono::{DateTime, SubsecRound, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Longest first or last name the `account` table accepts.
pub const MAX_NAME_LEN: usize = 50;

/// Account numbers are drawn uniformly from this range.
const ACCOUNT_NUMBER_RANGE: std::ops::RangeInclusive<i64> = 1..=999_999_999;

/// Represents an account record from the database.
///
/// # Database Table
///
/// Maps to the `account` table. `id` is assigned by the store; `number` is
/// the public identifier carried in credentials and transfer requests.
///
/// # Balance Storage
///
/// Balances are integer minor units and never negative.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub number: i64,
    pub balance: i64,
    pub created_at: DateTime<Utc>,
}

/// An account ready to be inserted; the store assigns the `id`.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub first_name: String,
    pub last_name: String,
    pub number: i64,
    pub created_at: DateTime<Utc>,
}

impl NewAccount {
    /// Build an account with a random number, zero balance and the current time.
    ///
    /// The timestamp is truncated to microseconds, the precision PostgreSQL
    /// stores, so the value read back is identical to the one written.
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            number: rand::rng().random_range(ACCOUNT_NUMBER_RANGE),
            created_at: Utc::now().trunc_subsecs(6),
        }
    }

    /// Same as [`NewAccount::new`] with a caller-chosen number.
    #[cfg(test)]
    pub fn with_number(mut self, number: i64) -> Self {
        self.number = number;
        self
    }
}

/// Request body for creating a new account.
///
/// # JSON Example
///
/// ```json
/// {
///   "firstName": "Ada",
///   "lastName": "Lovelace"
/// }
/// ```
///
/// # Validation
///
/// Both names are trimmed, must be non-empty, and at most 50 characters.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    pub first_name: String,
    pub last_name: String,
}

impl CreateAccountRequest {
    /// Validate the request and turn it into an insertable account.
    pub fn into_new_account(self) -> Result<NewAccount, AppError> {
        let first_name = validate_name("firstName", &self.first_name)?;
        let last_name = validate_name("lastName", &self.last_name)?;

        Ok(NewAccount::new(first_name, last_name))
    }
}

fn validate_name<'a>(field: &str, value: &'a str) -> Result<&'a str, AppError> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(AppError::validation(format!(
            "{field} must be at most {MAX_NAME_LEN} characters"
        )));
    }

    Ok(trimmed)
}

/// Response body for `DELETE /account/{id}`.
#[derive(Debug, Serialize)]
pub struct DeleteAccountResponse {
    pub deleted: i32,
}
