//! Ledger domain types.
//!
//! Accounts carry the only mutable state in the ledger (their balance).
//! Transaction records are append-only and always reference the account
//! whose balance they describe.

use chrono::{DateTime, Days, NaiveDate, Utc};
use fintrack_shared::types::{AccountId, TransactionId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Direction of a monetary movement as seen by the account it touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money entering an account.
    Income,
    /// Money leaving an account.
    Expense,
}

impl TransactionType {
    /// Returns the lowercase wire/storage name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    /// Applies the direction to a positive magnitude.
    #[must_use]
    pub fn signed(self, amount: Decimal) -> Decimal {
        match self {
            Self::Income => amount,
            Self::Expense => -amount,
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            _ => Err(format!("Unknown transaction type: {s}")),
        }
    }
}

/// Settlement status of a transaction record.
///
/// Only completed movements are recorded; there is no pending state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionStatus {
    /// The movement has been applied to the account balance.
    Completed,
}

impl TransactionStatus {
    /// Returns the storage name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "Completed",
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named monetary balance owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier.
    pub id: AccountId,
    /// Owning user.
    pub user_id: UserId,
    /// Display name.
    pub name: String,
    /// Account number (digits only).
    pub account_number: String,
    /// Current balance, never negative.
    pub balance: Decimal,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last balance change.
    pub updated_at: DateTime<Utc>,
}

/// Values for a new account row.
#[derive(Debug, Clone)]
pub struct NewAccount {
    /// Identifier assigned by the engine.
    pub id: AccountId,
    /// Owning user.
    pub user_id: UserId,
    /// Display name.
    pub name: String,
    /// Sanitized account number.
    pub account_number: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl NewAccount {
    /// Builds the account row with a zero balance.
    #[must_use]
    pub fn into_account(self) -> Account {
        Account {
            id: self.id,
            user_id: self.user_id,
            name: self.name,
            account_number: self.account_number,
            balance: Decimal::ZERO,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

/// An immutable record of one monetary movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Unique identifier.
    pub id: TransactionId,
    /// Owning user.
    pub user_id: UserId,
    /// Account whose balance this record describes.
    pub account_id: AccountId,
    /// Human-readable description.
    pub description: String,
    /// Display label for the source of the movement.
    pub source: String,
    /// Positive magnitude; the sign is carried by `transaction_type`.
    pub amount: Decimal,
    /// Income or expense.
    pub transaction_type: TransactionType,
    /// Settlement status.
    pub status: TransactionStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Update timestamp (equal to `created_at`; records are immutable).
    pub updated_at: DateTime<Utc>,
}

impl TransactionRecord {
    /// Returns the balance effect of this record on its account.
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        self.transaction_type.signed(self.amount)
    }
}

/// Values for a new transaction record.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    /// Identifier assigned by the recorder.
    pub id: TransactionId,
    /// Owning user.
    pub user_id: UserId,
    /// Account whose balance changed.
    pub account_id: AccountId,
    /// Human-readable description.
    pub description: String,
    /// Display label for the source.
    pub source: String,
    /// Positive magnitude.
    pub amount: Decimal,
    /// Income or expense.
    pub transaction_type: TransactionType,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl NewTransaction {
    /// Builds the stored record with status `Completed`.
    #[must_use]
    pub fn into_record(self) -> TransactionRecord {
        TransactionRecord {
            id: self.id,
            user_id: self.user_id,
            account_id: self.account_id,
            description: self.description,
            source: self.source,
            amount: self.amount,
            transaction_type: self.transaction_type,
            status: TransactionStatus::Completed,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

/// Input for opening a new account with its first deposit.
#[derive(Debug, Clone)]
pub struct OpenAccountInput {
    /// The user opening the account.
    pub user_id: UserId,
    /// Display name.
    pub name: String,
    /// Account number as typed; non-digits are stripped.
    pub account_number: String,
    /// Initial deposit.
    pub initial_amount: Decimal,
}

/// Input for spending money out of an account.
#[derive(Debug, Clone)]
pub struct WithdrawInput {
    /// The user spending the money.
    pub user_id: UserId,
    /// The account to debit.
    pub account_id: AccountId,
    /// What the money was spent on.
    pub description: String,
    /// Display label for the source.
    pub source: String,
    /// Amount to withdraw, if supplied.
    pub amount: Option<Decimal>,
}

/// Input for moving money between two accounts.
#[derive(Debug, Clone)]
pub struct TransferInput {
    /// The user performing the transfer.
    pub user_id: UserId,
    /// The account to debit, if supplied.
    pub from_account_id: Option<AccountId>,
    /// The account to credit, if supplied.
    pub to_account_id: Option<AccountId>,
    /// Amount to move, if supplied.
    pub amount: Option<Decimal>,
}

/// Result of opening an account.
#[derive(Debug, Clone)]
pub struct OpenAccountReceipt {
    /// The account after its initial deposit.
    pub account: Account,
    /// The initial deposit record.
    pub transaction: TransactionRecord,
}

/// Result of a single-account movement (deposit or withdrawal).
#[derive(Debug, Clone)]
pub struct MovementReceipt {
    /// The account after the movement.
    pub account: Account,
    /// The record describing the movement.
    pub transaction: TransactionRecord,
}

/// Result of a transfer.
#[derive(Debug, Clone)]
pub struct TransferReceipt {
    /// The source account after the debit.
    pub from_account: Account,
    /// The destination account after the credit.
    pub to_account: Account,
    /// The expense record on the source account.
    pub debit: TransactionRecord,
    /// The income record on the destination account.
    pub credit: TransactionRecord,
}

/// Filter for transaction history.
#[derive(Debug, Clone, Default)]
pub struct TransactionQuery {
    /// First day of the range (inclusive).
    pub from: Option<NaiveDate>,
    /// Last day of the range (inclusive).
    pub to: Option<NaiveDate>,
    /// Case-insensitive search over description, status and source.
    pub search: Option<String>,
}

/// A transaction query with its defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTransactionQuery {
    /// Start of the range (inclusive).
    pub start: DateTime<Utc>,
    /// End of the range (exclusive).
    pub end: DateTime<Utc>,
    /// Lowercased search term; `None` matches everything.
    pub search: Option<String>,
}

impl TransactionQuery {
    /// Applies defaults: the last `default_days` days up to and including `today`.
    ///
    /// Ranges reaching past the calendar are clamped to its ends.
    #[must_use]
    pub fn resolve(&self, today: NaiveDate, default_days: i64) -> ResolvedTransactionQuery {
        let from = self.from.unwrap_or_else(|| {
            let days = Days::new(u64::try_from(default_days).unwrap_or(0));
            today.checked_sub_days(days).unwrap_or(NaiveDate::MIN)
        });
        let to = self.to.unwrap_or(today);
        let search = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(str::to_lowercase);

        ResolvedTransactionQuery {
            start: from.and_time(chrono::NaiveTime::MIN).and_utc(),
            end: to.succ_opt().map_or(DateTime::<Utc>::MAX_UTC, |next| {
                next.and_time(chrono::NaiveTime::MIN).and_utc()
            }),
            search,
        }
    }
}

impl ResolvedTransactionQuery {
    /// Returns true if the record falls in the range and matches the search term.
    #[must_use]
    pub fn matches(&self, record: &TransactionRecord) -> bool {
        if record.created_at < self.start || record.created_at >= self.end {
            return false;
        }
        match &self.search {
            None => true,
            Some(term) => {
                record.description.to_lowercase().contains(term)
                    || record.status.as_str().to_lowercase().contains(term)
                    || record.source.to_lowercase().contains(term)
            }
        }
    }
}
