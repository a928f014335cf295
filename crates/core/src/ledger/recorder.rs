//! Transaction Recorder: appends immutable transaction records.

use chrono::{DateTime, Utc};
use fintrack_shared::types::{AccountId, PositiveAmount, TransactionId, UserId};

use super::error::LedgerError;
use super::store::LedgerUnit;
use super::types::{Account, NewTransaction, TransactionRecord, TransactionType};

/// What a record says about a movement, minus the bookkeeping fields.
#[derive(Debug, Clone)]
pub struct RecordRequest {
    /// Owning user.
    pub user_id: UserId,
    /// Account whose balance changed.
    pub account_id: AccountId,
    /// Human-readable description.
    pub description: String,
    /// Display label for the source.
    pub source: String,
    /// Positive magnitude.
    pub amount: PositiveAmount,
    /// Income or expense.
    pub transaction_type: TransactionType,
}

impl RecordRequest {
    /// Describes a movement on `account`, labelled with the account name.
    #[must_use]
    pub fn for_account(
        account: &Account,
        description: String,
        amount: PositiveAmount,
        transaction_type: TransactionType,
    ) -> Self {
        Self {
            user_id: account.user_id,
            account_id: account.id,
            description,
            source: account.name.clone(),
            amount,
            transaction_type,
        }
    }
}

/// Writes transaction records inside a unit of work.
///
/// The recorder does not look at account state: callers record only
/// movements they have already applied through the Balance Mutator.
pub struct TransactionRecorder;

impl TransactionRecorder {
    /// Appends one `Completed` record stamped with `now`.
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the store rejects the write.
    pub async fn record(
        unit: &mut dyn LedgerUnit,
        request: RecordRequest,
        now: DateTime<Utc>,
    ) -> Result<TransactionRecord, LedgerError> {
        let record = unit
            .insert_transaction(NewTransaction {
                id: TransactionId::new(),
                user_id: request.user_id,
                account_id: request.account_id,
                description: request.description,
                source: request.source,
                amount: request.amount.get(),
                transaction_type: request.transaction_type,
                created_at: now,
            })
            .await?;

        tracing::debug!(
            transaction_id = %record.id,
            account_id = %record.account_id,
            transaction_type = %record.transaction_type,
            amount = %record.amount,
            "Recorded transaction"
        );

        Ok(record)
    }
}
