//! PostgreSQL account store.
//!
//! # Atomicity Guarantees
//!
//! A credit is a single `UPDATE ... SET balance = balance + $1`, so
//! concurrent credits to one row serialize inside PostgreSQL. A debit+credit
//! pair runs in one transaction with both rows locked `FOR UPDATE`.
//!
//! A credit past `i64::MAX` makes PostgreSQL raise `bigint out of range`;
//! that is reported as the same validation error the in-memory store gives.

use async_trait::async_trait;

use super::{AccountStore, balance_overflow, insufficient_funds};
use crate::{
    db::DbPool,
    error::AppError,
    models::{
        account::{Account, NewAccount},
        transfer::validate_amount,
    },
};

/// [`AccountStore`] backed by the `account` table.
#[derive(Debug, Clone)]
pub struct PgAccountStore {
    pool: DbPool,
}

impl PgAccountStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    #[tracing::instrument(skip(self, account), fields(number = account.number))]
    async fn create_account(&self, account: NewAccount) -> Result<Account, AppError> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO account (first_name, last_name, number, balance, created_at)
            VALUES ($1, $2, $3, 0, $4)
            RETURNING id, first_name, last_name, number, balance, created_at
            "#,
        )
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(account.number)
        .bind(account.created_at)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(id = account.id, "account inserted");
        Ok(account)
    }

    #[tracing::instrument(skip(self))]
    async fn get_accounts(&self) -> Result<Vec<Account>, AppError> {
        let accounts = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, first_name, last_name, number, balance, created_at
            FROM account
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!(count = accounts.len(), "accounts loaded");
        Ok(accounts)
    }

    #[tracing::instrument(skip(self))]
    async fn get_account_by_id(&self, id: i32) -> Result<Account, AppError> {
        sqlx::query_as::<_, Account>(
            r#"
            SELECT id, first_name, last_name, number, balance, created_at
            FROM account
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::AccountNotFound)
    }

    #[tracing::instrument(skip(self))]
    async fn get_account_by_number(&self, number: i64) -> Result<Account, AppError> {
        sqlx::query_as::<_, Account>(
            r#"
            SELECT id, first_name, last_name, number, balance, created_at
            FROM account
            WHERE number = $1
            "#,
        )
        .bind(number)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::AccountNotFound)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_account(&self, id: i32) -> Result<(), AppError> {
        let deleted = sqlx::query("DELETE FROM account WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(AppError::AccountNotFound);
        }

        tracing::debug!("account deleted");
        Ok(())
    }

    async fn update_account(&self, _account: &Account) -> Result<Account, AppError> {
        Err(AppError::Unimplemented("update_account"))
    }

    #[tracing::instrument(skip(self))]
    async fn transfer(&self, destination_number: i64, amount: i64) -> Result<Account, AppError> {
        validate_amount(amount)?;

        // Read-modify-write happens inside one statement; no lost updates
        let account = sqlx::query_as::<_, Account>(
            r#"
            UPDATE account
            SET balance = balance + $1
            WHERE number = $2
            RETURNING id, first_name, last_name, number, balance, created_at
            "#,
        )
        .bind(amount)
        .bind(destination_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(overflow_as_validation)?
        .ok_or(AppError::AccountNotFound)?;

        tracing::debug!(balance = account.balance, "account credited");
        Ok(account)
    }

    #[tracing::instrument(skip(self))]
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

        let mut tx = self.pool.begin().await?;

        // Lock both rows in number order so opposing transfers cannot deadlock
        let rows: Vec<(i64, i64)> = sqlx::query_as(
            "SELECT number, balance FROM account WHERE number = ANY($1) ORDER BY number FOR UPDATE",
        )
        .bind(vec![source_number, destination_number])
        .fetch_all(&mut *tx)
        .await?;

        if rows.len() != 2 {
            tx.rollback().await?;
            return Err(AppError::AccountNotFound);
        }

        let source_balance = rows
            .iter()
            .find(|(number, _)| *number == source_number)
            .map(|(_, balance)| *balance)
            .ok_or(AppError::AccountNotFound)?;

        if source_balance < amount {
            tx.rollback().await?;
            return Err(insufficient_funds(source_number, source_balance, amount));
        }

        sqlx::query("UPDATE account SET balance = balance - $1 WHERE number = $2")
            .bind(amount)
            .bind(source_number)
            .execute(&mut *tx)
            .await?;

        // An overflow error drops `tx`, which rolls the debit back
        sqlx::query("UPDATE account SET balance = balance + $1 WHERE number = $2")
            .bind(amount)
            .bind(destination_number)
            .execute(&mut *tx)
            .await
            .map_err(overflow_as_validation)?;

        tx.commit().await?;

        tracing::debug!("transfer committed");
        Ok(())
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// SQLSTATE `numeric_value_out_of_range`.
const NUMERIC_VALUE_OUT_OF_RANGE: &str = "22003";

fn overflow_as_validation(err: sqlx::Error) -> AppError {
    let out_of_range = matches!(
        &err,
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(NUMERIC_VALUE_OUT_OF_RANGE)
    );

    if out_of_range {
        balance_overflow()
    } else {
        err.into()
    }
}
