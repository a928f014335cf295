//! In-memory implementation of the Ledger Store.
//!
//! Units of work are serialized through one async mutex: a unit owns the lock
//! from `begin` until it is committed or dropped, and stages its writes on a
//! copy of the state. Commit swaps the copy in; dropping discards it.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use fintrack_shared::types::{AccountId, UserId};
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::store::{
    DashboardData, DashboardQuery, LedgerStore, LedgerUnit, MonthlyTotal, StoreError, TypeTotal,
};
use super::types::{
    Account, NewAccount, NewTransaction, ResolvedTransactionQuery, TransactionRecord,
    TransactionType,
};

#[derive(Debug, Clone, Default)]
struct LedgerState {
    accounts: BTreeMap<AccountId, Account>,
    transactions: Vec<TransactionRecord>,
    account_names: HashMap<UserId, Vec<String>>,
}

impl LedgerState {
    fn user_transactions(&self, user_id: UserId) -> impl Iterator<Item = &TransactionRecord> {
        self.transactions.iter().filter(move |t| t.user_id == user_id)
    }
}

/// Newest first; IDs are time-ordered so they break timestamp ties.
fn newest_first_transactions(records: &mut [TransactionRecord]) {
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}

fn newest_first_accounts(accounts: &mut [Account]) {
    accounts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}

fn take(limit: u64) -> usize {
    usize::try_from(limit).unwrap_or(usize::MAX)
}

/// Ledger store kept entirely in process memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedgerStore {
    state: Arc<Mutex<LedgerState>>,
}

impl InMemoryLedgerStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the denormalized account names recorded for a user.
    pub async fn account_names(&self, user_id: UserId) -> Vec<String> {
        self.state
            .lock()
            .await
            .account_names
            .get(&user_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns every transaction record, in insertion order.
    pub async fn all_transactions(&self) -> Vec<TransactionRecord> {
        self.state.lock().await.transactions.clone()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn begin(&self) -> Result<Box<dyn LedgerUnit>, StoreError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(InMemoryUnit { guard, staged }))
    }

    async fn find_account(&self, account_id: AccountId) -> Result<Option<Account>, StoreError> {
        Ok(self.state.lock().await.accounts.get(&account_id).cloned())
    }

    async fn list_accounts(&self, user_id: UserId) -> Result<Vec<Account>, StoreError> {
        let state = self.state.lock().await;
        let mut accounts: Vec<Account> = state
            .accounts
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        newest_first_accounts(&mut accounts);
        Ok(accounts)
    }

    async fn list_transactions(
        &self,
        user_id: UserId,
        query: &ResolvedTransactionQuery,
    ) -> Result<Vec<TransactionRecord>, StoreError> {
        let state = self.state.lock().await;
        let mut records: Vec<TransactionRecord> = state
            .user_transactions(user_id)
            .filter(|t| query.matches(t))
            .cloned()
            .collect();
        newest_first_transactions(&mut records);
        Ok(records)
    }

    async fn load_dashboard(&self, query: &DashboardQuery) -> Result<DashboardData, StoreError> {
        let state = self.state.lock().await;

        let mut totals: BTreeMap<&'static str, (TransactionType, Decimal)> = BTreeMap::new();
        let mut monthly: BTreeMap<(u32, &'static str), (TransactionType, Decimal)> =
            BTreeMap::new();
        let mut transaction_count = 0u64;

        for record in state.user_transactions(query.user_id) {
            transaction_count += 1;
            let kind = record.transaction_type;
            let total = &mut totals.entry(kind.as_str()).or_insert((kind, Decimal::ZERO)).1;
            *total = accumulate(*total, record.amount, kind.as_str())?;

            if in_window(record.created_at, query) {
                let month = record.created_at.month();
                let total = &mut monthly
                    .entry((month, kind.as_str()))
                    .or_insert((kind, Decimal::ZERO))
                    .1;
                *total = accumulate(*total, record.amount, kind.as_str())?;
            }
        }

        let mut recent_transactions: Vec<TransactionRecord> =
            state.user_transactions(query.user_id).cloned().collect();
        newest_first_transactions(&mut recent_transactions);
        recent_transactions.truncate(take(query.recent_transactions));

        let mut recent_accounts: Vec<Account> = state
            .accounts
            .values()
            .filter(|a| a.user_id == query.user_id)
            .cloned()
            .collect();
        newest_first_accounts(&mut recent_accounts);
        recent_accounts.truncate(take(query.recent_accounts));

        Ok(DashboardData {
            transaction_count,
            totals: totals
                .into_values()
                .map(|(transaction_type, total)| TypeTotal {
                    transaction_type,
                    total,
                })
                .collect(),
            monthly: monthly
                .into_iter()
                .map(|((month, _), (transaction_type, total))| MonthlyTotal {
                    month,
                    transaction_type,
                    total,
                })
                .collect(),
            recent_accounts,
            recent_transactions,
        })
    }
}

fn accumulate(total: Decimal, amount: Decimal, kind: &str) -> Result<Decimal, StoreError> {
    total
        .checked_add(amount)
        .ok_or_else(|| StoreError::Overflow(format!("{kind} total")))
}

fn in_window(at: DateTime<Utc>, query: &DashboardQuery) -> bool {
    at >= query.period_start && at <= query.period_end
}

/// A unit of work over the in-memory state.
struct InMemoryUnit {
    guard: OwnedMutexGuard<LedgerState>,
    staged: LedgerState,
}

#[async_trait]
impl LedgerUnit for InMemoryUnit {
    async fn lock_account(
        &mut self,
        account_id: AccountId,
    ) -> Result<Option<Account>, StoreError> {
        // The whole state is already held exclusively by this unit.
        Ok(self.staged.accounts.get(&account_id).cloned())
    }

    async fn find_account_by_number(
        &mut self,
        user_id: UserId,
        account_number: &str,
    ) -> Result<Option<Account>, StoreError> {
        Ok(self
            .staged
            .accounts
            .values()
            .find(|a| a.user_id == user_id && a.account_number == account_number)
            .cloned())
    }

    async fn insert_account(&mut self, account: NewAccount) -> Result<Account, StoreError> {
        let duplicate = self.staged.accounts.values().any(|a| {
            a.id == account.id
                || (a.user_id == account.user_id && a.account_number == account.account_number)
        });
        if duplicate {
            return Err(StoreError::UniqueViolation(
                "accounts(user_id, account_number)".to_string(),
            ));
        }

        let account = account.into_account();
        self.staged.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn update_balance(
        &mut self,
        account_id: AccountId,
        balance: Decimal,
        updated_at: DateTime<Utc>,
    ) -> Result<Account, StoreError> {
        let account = self
            .staged
            .accounts
            .get_mut(&account_id)
            .ok_or_else(|| StoreError::Unavailable(format!("account {account_id} vanished")))?;
        account.balance = balance;
        account.updated_at = updated_at;
        Ok(account.clone())
    }

    async fn insert_transaction(
        &mut self,
        transaction: NewTransaction,
    ) -> Result<TransactionRecord, StoreError> {
        let record = transaction.into_record();
        self.staged.transactions.push(record.clone());
        Ok(record)
    }

    async fn link_account_name(&mut self, user_id: UserId, name: &str) -> Result<(), StoreError> {
        self.staged
            .account_names
            .entry(user_id)
            .or_default()
            .push(name.to_string());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let Self { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }
}
