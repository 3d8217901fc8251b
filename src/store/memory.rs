//! In-memory account store.
//!
//! Used by the test suite and when the server starts without a
//! `DATABASE_URL`. State lives only as long as the process.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{AccountStore, balance_overflow, insufficient_funds};
use crate::{
    error::{AppError, StorageError},
    models::{
        account::{Account, NewAccount},
        transfer::validate_amount,
    },
};

#[derive(Debug, Default)]
struct Accounts {
    last_id: i32,
    by_id: BTreeMap<i32, Account>,
}

impl Accounts {
    fn find_by_number_mut(&mut self, number: i64) -> Result<&mut Account, AppError> {
        self.by_id
            .values_mut()
            .find(|account| account.number == number)
            .ok_or(AppError::AccountNotFound)
    }
}

/// [`AccountStore`] keeping accounts in a map behind a single lock.
///
/// The lock is held for the whole read-modify-write of every mutation, which
/// gives the same no-lost-update guarantee as the PostgreSQL store.
#[derive(Debug, Default)]
pub struct InMemoryAccountStore {
    accounts: Mutex<Accounts>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn create_account(&self, account: NewAccount) -> Result<Account, AppError> {
        let mut accounts = self.accounts.lock().await;

        if accounts.by_id.values().any(|a| a.number == account.number) {
            return Err(StorageError::Conflict(format!(
                "account number {} already exists",
                account.number
            ))
            .into());
        }

        accounts.last_id += 1;
        let account = Account {
            id: accounts.last_id,
            first_name: account.first_name,
            last_name: account.last_name,
            number: account.number,
            balance: 0,
            created_at: account.created_at,
        };
        accounts.by_id.insert(account.id, account.clone());

        tracing::debug!(id = account.id, "account inserted");
        Ok(account)
    }

    async fn get_accounts(&self) -> Result<Vec<Account>, AppError> {
        Ok(self.accounts.lock().await.by_id.values().cloned().collect())
    }

    async fn get_account_by_id(&self, id: i32) -> Result<Account, AppError> {
        self.accounts
            .lock()
            .await
            .by_id
            .get(&id)
            .cloned()
            .ok_or(AppError::AccountNotFound)
    }

    async fn get_account_by_number(&self, number: i64) -> Result<Account, AppError> {
        self.accounts
            .lock()
            .await
            .by_id
            .values()
            .find(|account| account.number == number)
            .cloned()
            .ok_or(AppError::AccountNotFound)
    }

    async fn delete_account(&self, id: i32) -> Result<(), AppError> {
        self.accounts
            .lock()
            .await
            .by_id
            .remove(&id)
            .map(|_| ())
            .ok_or(AppError::AccountNotFound)
    }

    async fn update_account(&self, _account: &Account) -> Result<Account, AppError> {
        Err(AppError::Unimplemented("update_account"))
    }

    async fn transfer(&self, destination_number: i64, amount: i64) -> Result<Account, AppError> {
        validate_amount(amount)?;

        let mut accounts = self.accounts.lock().await;
        let account = accounts.find_by_number_mut(destination_number)?;

        account.balance = account
            .balance
            .checked_add(amount)
            .ok_or_else(balance_overflow)?;

        Ok(account.clone())
    }

    async fn transfer_from(
        &self,
        source_number: i64,
        destination_number: i64,
        amount: i64,
    ) -> Result<(), AppError> {
        validate_amount(amount)?;
        if source_number == destination_number {
            return Err(AppError::validation("cannot transfer to the same account"));
        }

        let mut accounts = self.accounts.lock().await;

        // Check everything before touching either balance
        let source_balance = accounts.find_by_number_mut(source_number)?.balance;
        let destination_balance = accounts.find_by_number_mut(destination_number)?.balance;

        if source_balance < amount {
            return Err(insufficient_funds(source_number, source_balance, amount));
        }
        let credited = destination_balance
            .checked_add(amount)
            .ok_or_else(balance_overflow)?;

        accounts.find_by_number_mut(source_number)?.balance = source_balance - amount;
        accounts.find_by_number_mut(destination_number)?.balance = credited;

        Ok(())
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}
