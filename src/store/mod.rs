//! Account persistence.
//!
//! Handlers and middleware only see the [`AccountStore`] trait; the server
//! picks the PostgreSQL or in-memory implementation at startup.

use async_trait::async_trait;

use crate::{
    error::AppError,
    models::account::{Account, NewAccount},
};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryAccountStore;
pub use postgres::PgAccountStore;

/// Persistence contract for accounts.
///
/// Every method may fail with [`AppError::Storage`]. Lookups of a missing row
/// fail with [`AppError::AccountNotFound`].
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Insert a new account and return it with its assigned `id`.
    ///
    /// A duplicate account number is a storage error.
    async fn create_account(&self, account: NewAccount) -> Result<Account, AppError>;

    /// All accounts, ordered by `id`.
    async fn get_accounts(&self) -> Result<Vec<Account>, AppError>;

    async fn get_account_by_id(&self, id: i32) -> Result<Account, AppError>;

    async fn get_account_by_number(&self, number: i64) -> Result<Account, AppError>;

    /// Remove an account. Deleting a missing account is `AccountNotFound`.
    async fn delete_account(&self, id: i32) -> Result<(), AppError>;

    /// Names are immutable and the balance only changes through transfers,
    /// so implementations return [`AppError::Unimplemented`].
    async fn update_account(&self, account: &Account) -> Result<Account, AppError>;

    /// Credit `amount` to the account with `destination_number` in one atomic
    /// step and return the updated account.
    ///
    /// Concurrent credits to the same account must all apply. A credit that
    /// would push the balance past `i64::MAX` fails with a validation error
    /// and leaves the balance unchanged.
    async fn transfer(&self, destination_number: i64, amount: i64) -> Result<Account, AppError>;

    /// Debit `source_number` and credit `destination_number` atomically.
    ///
    /// Fails with a validation error, leaving both balances untouched, when
    /// the source balance is below `amount` or the destination would overflow.
    async fn transfer_from(
        &self,
        source_number: i64,
        destination_number: i64,
        amount: i64,
    ) -> Result<(), AppError>;

    /// Check the backing storage is reachable.
    async fn ping(&self) -> Result<(), AppError>;
}

pub(crate) fn insufficient_funds(source_number: i64, balance: i64, amount: i64) -> AppError {
    AppError::validation(format!(
        "insufficient funds in account {source_number}: balance {balance}, requested {amount}"
    ))
}

pub(crate) fn balance_overflow() -> AppError {
    AppError::validation("transfer would overflow the balance")
}
