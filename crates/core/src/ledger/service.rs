//! Ledger Engine: atomic deposits, withdrawals and transfers.
//!
//! Every composite operation validates its input before touching the store,
//! then runs inside one [`LedgerUnit`]. The unit is committed only after every
//! balance mutation and every record has been written; any error (or the
//! timeout firing) drops the unit, which rolls the whole operation back.

use std::future::Future;

use chrono::{NaiveDate, Utc};
use fintrack_shared::config::LedgerConfig;
use fintrack_shared::types::{AccountId, PositiveAmount, UserId};
use rust_decimal::Decimal;

use super::balance::BalanceMutator;
use super::error::LedgerError;
use super::recorder::{RecordRequest, TransactionRecorder};
use super::store::{LedgerStore, StoreError};
use super::types::{
    Account, MovementReceipt, NewAccount, OpenAccountInput, OpenAccountReceipt, TransactionQuery,
    TransactionRecord, TransactionType, TransferInput, TransferReceipt, WithdrawInput,
};
use super::validation::{
    ACCOUNT_NUMBER_MAX_LEN, NAME_MAX_LEN, SOURCE_MAX_LEN, ensure_can_debit, ensure_max_len,
    is_present, owned_account, require_amount, require_fields, sanitize_account_number,
};

/// Orchestrates the Balance Mutator and the Transaction Recorder.
#[derive(Debug, Clone)]
pub struct LedgerService<S> {
    store: S,
    config: LedgerConfig,
}

impl<S: LedgerStore> LedgerService<S> {
    /// Creates a ledger service over `store`.
    pub fn new(store: S, config: LedgerConfig) -> Self {
        Self { store, config }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Opens an account and books its initial deposit.
    ///
    /// # Errors
    ///
    /// - `MissingFields` if the name or the (sanitized) account number is blank
    /// - `FieldTooLong` if the name or the account number does not fit the ledger
    /// - `InvalidAmount` if the initial amount is not a valid positive amount
    /// - `DuplicateAccount` if the user already holds this account number
    pub async fn open_account(
        &self,
        input: OpenAccountInput,
    ) -> Result<OpenAccountReceipt, LedgerError> {
        let name = input.name.trim().to_string();
        let account_number = sanitize_account_number(&input.account_number);
        require_fields(&[
            ("name", is_present(&name)),
            ("account_number", !account_number.is_empty()),
        ])?;
        ensure_max_len("name", &name, NAME_MAX_LEN)?;
        ensure_max_len("account_number", &account_number, ACCOUNT_NUMBER_MAX_LEN)?;
        let amount = PositiveAmount::new(input.initial_amount)?;
        let user_id = input.user_id;

        let result = self
            .bounded("open_account", async {
                let mut unit = self.store.begin().await?;

                if unit
                    .find_account_by_number(user_id, &account_number)
                    .await?
                    .is_some()
                {
                    return Err(LedgerError::DuplicateAccount(account_number.clone()));
                }

                let now = Utc::now();
                let opened = unit
                    .insert_account(NewAccount {
                        id: AccountId::new(),
                        user_id,
                        name: name.clone(),
                        account_number: account_number.clone(),
                        created_at: now,
                    })
                    .await
                    .map_err(|e| duplicate_or_store(e, &account_number))?;

                let account =
                    BalanceMutator::apply_delta(unit.as_mut(), opened.id, amount.get(), now)
                        .await?;
                let transaction = TransactionRecorder::record(
                    unit.as_mut(),
                    RecordRequest::for_account(
                        &account,
                        format!("{} (Initial Deposit)", account.name),
                        amount,
                        TransactionType::Income,
                    ),
                    now,
                )
                .await?;
                unit.link_account_name(user_id, &account.name).await?;

                unit.commit()
                    .await
                    .map_err(|e| duplicate_or_store(e, &account_number))?;
                Ok(OpenAccountReceipt {
                    account,
                    transaction,
                })
            })
            .await;

        log_outcome("open_account", user_id, &result);
        if let Ok(receipt) = &result {
            tracing::info!(
                user_id = %user_id,
                account_id = %receipt.account.id,
                balance = %receipt.account.balance,
                "Account opened"
            );
        }
        result
    }

    /// Credits `amount` to one of the user's accounts.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if `amount` is not a valid positive amount
    /// - `AccountNotFound` if the account does not exist or is not the user's
    /// - `BalanceLimitExceeded` if the balance would pass the storable maximum
    pub async fn deposit(
        &self,
        user_id: UserId,
        account_id: AccountId,
        amount: Decimal,
    ) -> Result<MovementReceipt, LedgerError> {
        let amount = PositiveAmount::new(amount)?;

        let result = self
            .bounded("deposit", async {
                let mut unit = self.store.begin().await?;
                owned_account(unit.lock_account(account_id).await?, account_id, user_id)?;

                let now = Utc::now();
                let account =
                    BalanceMutator::apply_delta(unit.as_mut(), account_id, amount.get(), now)
                        .await?;
                let transaction = TransactionRecorder::record(
                    unit.as_mut(),
                    RecordRequest::for_account(
                        &account,
                        format!("{} (Deposit)", account.name),
                        amount,
                        TransactionType::Income,
                    ),
                    now,
                )
                .await?;

                unit.commit().await?;
                Ok::<_, LedgerError>(MovementReceipt {
                    account,
                    transaction,
                })
            })
            .await;

        log_outcome("deposit", user_id, &result);
        if let Ok(receipt) = &result {
            tracing::info!(
                account_id = %account_id,
                amount = %amount,
                balance = %receipt.account.balance,
                "Deposit completed"
            );
        }
        result
    }

    /// Spends money out of one of the user's accounts.
    ///
    /// # Errors
    ///
    /// - `MissingFields` if the description, source or amount is missing
    /// - `FieldTooLong` if the source label does not fit the ledger
    /// - `InvalidAmount` if the amount is not a valid positive amount
    /// - `AccountNotFound` if the account does not exist or is not the user's
    /// - `InsufficientFunds` if the balance is zero or below the amount
    pub async fn withdraw(&self, input: WithdrawInput) -> Result<MovementReceipt, LedgerError> {
        require_fields(&[
            ("description", is_present(&input.description)),
            ("source", is_present(&input.source)),
            ("amount", input.amount.is_some()),
        ])?;
        let amount = require_amount(input.amount)?;
        let WithdrawInput {
            user_id,
            account_id,
            description,
            source,
            ..
        } = input;
        let description = description.trim().to_string();
        let source = source.trim().to_string();
        ensure_max_len("source", &source, SOURCE_MAX_LEN)?;

        let result = self
            .bounded("withdraw", async {
                let mut unit = self.store.begin().await?;
                let account =
                    owned_account(unit.lock_account(account_id).await?, account_id, user_id)?;
                ensure_can_debit(&account, amount)?;

                let now = Utc::now();
                let account =
                    BalanceMutator::apply_delta(unit.as_mut(), account_id, -amount.get(), now)
                        .await?;
                let transaction = TransactionRecorder::record(
                    unit.as_mut(),
                    RecordRequest {
                        user_id,
                        account_id,
                        description: description.clone(),
                        source: source.clone(),
                        amount,
                        transaction_type: TransactionType::Expense,
                    },
                    now,
                )
                .await?;

                unit.commit().await?;
                Ok::<_, LedgerError>(MovementReceipt {
                    account,
                    transaction,
                })
            })
            .await;

        log_outcome("withdraw", user_id, &result);
        if let Ok(receipt) = &result {
            tracing::info!(
                account_id = %account_id,
                amount = %amount,
                balance = %receipt.account.balance,
                "Withdrawal completed"
            );
        }
        result
    }

    /// Moves money between two of the user's accounts.
    ///
    /// Both accounts are locked in ID order so that opposing transfers
    /// cannot deadlock. A transfer from an account to itself is two
    /// offsetting movements: the balance is unchanged and both records are
    /// written.
    ///
    /// # Errors
    ///
    /// - `MissingFields` if either account or the amount is missing
    /// - `InvalidAmount` if the amount is not a valid positive amount
    /// - `AccountNotFound` if either account does not exist or is not the user's
    /// - `InsufficientFunds` if the source balance is zero or below the amount
    /// - `BalanceLimitExceeded` if the destination balance would pass the storable maximum
    pub async fn transfer(&self, input: TransferInput) -> Result<TransferReceipt, LedgerError> {
        require_fields(&[
            ("from_account_id", input.from_account_id.is_some()),
            ("to_account_id", input.to_account_id.is_some()),
            ("amount", input.amount.is_some()),
        ])?;
        let from_id = input
            .from_account_id
            .ok_or(LedgerError::MissingFields(vec!["from_account_id"]))?;
        let to_id = input
            .to_account_id
            .ok_or(LedgerError::MissingFields(vec!["to_account_id"]))?;
        let amount = require_amount(input.amount)?;
        let user_id = input.user_id;

        let result = self
            .bounded("transfer", async {
                let mut unit = self.store.begin().await?;

                let (first_id, second_id) = if from_id <= to_id {
                    (from_id, to_id)
                } else {
                    (to_id, from_id)
                };
                let first = unit.lock_account(first_id).await?;
                let second = if second_id == first_id {
                    first.clone()
                } else {
                    unit.lock_account(second_id).await?
                };
                let (from, to) = if first_id == from_id {
                    (first, second)
                } else {
                    (second, first)
                };

                let from = owned_account(from, from_id, user_id)?;
                ensure_can_debit(&from, amount)?;
                let to = owned_account(to, to_id, user_id)?;

                let now = Utc::now();
                let debited =
                    BalanceMutator::apply_delta(unit.as_mut(), from_id, -amount.get(), now)
                        .await?;
                let to_account =
                    BalanceMutator::apply_delta(unit.as_mut(), to_id, amount.get(), now).await?;
                let from_account = if from_id == to_id {
                    to_account.clone()
                } else {
                    debited
                };

                let debit = TransactionRecorder::record(
                    unit.as_mut(),
                    RecordRequest::for_account(
                        &from,
                        format!("Transfer ({} - {})", from.name, to.name),
                        amount,
                        TransactionType::Expense,
                    ),
                    now,
                )
                .await?;
                let credit = TransactionRecorder::record(
                    unit.as_mut(),
                    RecordRequest::for_account(
                        &to,
                        format!("Received ({} - {})", from.name, to.name),
                        amount,
                        TransactionType::Income,
                    ),
                    now,
                )
                .await?;

                unit.commit().await?;
                Ok::<_, LedgerError>(TransferReceipt {
                    from_account,
                    to_account,
                    debit,
                    credit,
                })
            })
            .await;

        log_outcome("transfer", user_id, &result);
        if result.is_ok() {
            tracing::info!(
                from_account_id = %from_id,
                to_account_id = %to_id,
                amount = %amount,
                "Transfer completed"
            );
        }
        result
    }

    /// Lists the user's accounts, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` or `OperationTimedOut` on infrastructure failure.
    pub async fn accounts(&self, user_id: UserId) -> Result<Vec<Account>, LedgerError> {
        let result = self
            .bounded("accounts", async {
                self.store
                    .list_accounts(user_id)
                    .await
                    .map_err(LedgerError::from)
            })
            .await;
        log_outcome("accounts", user_id, &result);
        result
    }

    /// Lists the user's transaction history, newest first.
    ///
    /// Without explicit dates the range covers the configured number of days
    /// up to and including `today`.
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` or `OperationTimedOut` on infrastructure failure.
    pub async fn transactions(
        &self,
        user_id: UserId,
        query: &TransactionQuery,
        today: NaiveDate,
    ) -> Result<Vec<TransactionRecord>, LedgerError> {
        let resolved = query.resolve(today, self.config.default_history_days);
        let result = self
            .bounded("transactions", async {
                self.store
                    .list_transactions(user_id, &resolved)
                    .await
                    .map_err(LedgerError::from)
            })
            .await;
        log_outcome("transactions", user_id, &result);
        result
    }

    /// Runs `operation` under the configured time budget.
    ///
    /// On expiry the future is dropped, and with it any open unit of work.
    async fn bounded<T, F>(&self, operation: &'static str, fut: F) -> Result<T, LedgerError>
    where
        F: Future<Output = Result<T, LedgerError>>,
    {
        let limit = self.config.operation_timeout();
        tokio::time::timeout(limit, fut).await.unwrap_or_else(|_| {
            tracing::error!(
                operation,
                timeout_ms = self.config.operation_timeout_ms,
                "Ledger operation timed out"
            );
            Err(LedgerError::OperationTimedOut(limit))
        })
    }
}

fn duplicate_or_store(err: StoreError, account_number: &str) -> LedgerError {
    match err {
        StoreError::UniqueViolation(_) => LedgerError::DuplicateAccount(account_number.to_string()),
        other => LedgerError::from(other),
    }
}

/// Logs failures: domain rejections at `warn`, infrastructure at `error`.
fn log_outcome<T>(operation: &'static str, user_id: UserId, result: &Result<T, LedgerError>) {
    let Err(err) = result else {
        return;
    };
    match err {
        LedgerError::StoreUnavailable(source) => {
            tracing::error!(operation, user_id = %user_id, error = %source, "Ledger store failure");
        }
        LedgerError::AmountOverflow => {
            tracing::error!(operation, user_id = %user_id, "Ledger arithmetic overflow");
        }
        LedgerError::OperationTimedOut(_) => {}
        rejection => {
            tracing::warn!(
                operation,
                user_id = %user_id,
                code = rejection.error_code(),
                "Ledger operation rejected: {rejection}"
            );
        }
    }
}
