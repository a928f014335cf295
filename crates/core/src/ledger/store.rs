//! Ledger Store contract.
//!
//! The store is the only component that touches persistent state. Mutations
//! go through a [`LedgerUnit`], one atomic unit of work: everything written
//! through a unit becomes visible on [`LedgerUnit::commit`], and a unit that is
//! dropped without committing leaves no trace.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fintrack_shared::types::{AccountId, UserId};
use rust_decimal::Decimal;
use thiserror::Error;

use super::types::{
    Account, NewAccount, NewTransaction, ResolvedTransactionQuery, TransactionRecord,
    TransactionType,
};

/// Errors reported by a ledger store implementation.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The store could not be reached or the statement failed.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A uniqueness constraint rejected the write.
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    /// An aggregate computed by the store overflowed.
    #[error("arithmetic overflow: {0}")]
    Overflow(String),
}

/// Read access and unit-of-work factory for the ledger.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Starts an atomic unit of work.
    async fn begin(&self) -> Result<Box<dyn LedgerUnit>, StoreError>;

    /// Finds an account by ID without locking it.
    async fn find_account(&self, account_id: AccountId) -> Result<Option<Account>, StoreError>;

    /// Lists a user's accounts, newest first.
    async fn list_accounts(&self, user_id: UserId) -> Result<Vec<Account>, StoreError>;

    /// Lists a user's transactions matching the query, newest first.
    async fn list_transactions(
        &self,
        user_id: UserId,
        query: &ResolvedTransactionQuery,
    ) -> Result<Vec<TransactionRecord>, StoreError>;

    /// Loads the raw rollups behind the dashboard from one consistent snapshot.
    async fn load_dashboard(&self, query: &DashboardQuery) -> Result<DashboardData, StoreError>;
}

/// One atomic unit of work against the ledger.
#[async_trait]
pub trait LedgerUnit: Send {
    /// Loads an account and holds an exclusive lock on it until the unit ends.
    async fn lock_account(&mut self, account_id: AccountId)
    -> Result<Option<Account>, StoreError>;

    /// Finds a user's account by its number.
    async fn find_account_by_number(
        &mut self,
        user_id: UserId,
        account_number: &str,
    ) -> Result<Option<Account>, StoreError>;

    /// Inserts a new account with a zero balance.
    async fn insert_account(&mut self, account: NewAccount) -> Result<Account, StoreError>;

    /// Overwrites an account balance. Callers must hold the account lock.
    async fn update_balance(
        &mut self,
        account_id: AccountId,
        balance: Decimal,
        updated_at: DateTime<Utc>,
    ) -> Result<Account, StoreError>;

    /// Appends a transaction record.
    async fn insert_transaction(
        &mut self,
        transaction: NewTransaction,
    ) -> Result<TransactionRecord, StoreError>;

    /// Appends an account name to the user's denormalized account list.
    async fn link_account_name(&mut self, user_id: UserId, name: &str) -> Result<(), StoreError>;

    /// Makes every write of this unit visible atomically.
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}

/// Parameters for the dashboard snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardQuery {
    /// The user to summarize.
    pub user_id: UserId,
    /// Start of the monthly window (inclusive).
    pub period_start: DateTime<Utc>,
    /// End of the monthly window (inclusive).
    pub period_end: DateTime<Utc>,
    /// Number of recent transactions to return.
    pub recent_transactions: u64,
    /// Number of recent accounts to return.
    pub recent_accounts: u64,
}

/// All-time sum of one transaction type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeTotal {
    /// Income or expense.
    pub transaction_type: TransactionType,
    /// Sum of amounts.
    pub total: Decimal,
}

/// Sum of one transaction type within one calendar month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyTotal {
    /// Calendar month, 1-based.
    pub month: u32,
    /// Income or expense.
    pub transaction_type: TransactionType,
    /// Sum of amounts.
    pub total: Decimal,
}

/// Raw dashboard rollups as returned by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardData {
    /// Number of transactions the user has, all time.
    pub transaction_count: u64,
    /// All-time totals grouped by type.
    pub totals: Vec<TypeTotal>,
    /// Totals grouped by (type, month) within the query window.
    pub monthly: Vec<MonthlyTotal>,
    /// Most recent accounts, newest first.
    pub recent_accounts: Vec<Account>,
    /// Most recent transactions, newest first.
    pub recent_transactions: Vec<TransactionRecord>,
}
