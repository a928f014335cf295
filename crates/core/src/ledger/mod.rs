//! Ledger consistency engine.
//!
//! This module implements the money-moving side of the system:
//! - Domain types for accounts and transaction records
//! - The Ledger Store contract and an in-memory implementation
//! - Balance Mutator (single writer path for balances)
//! - Transaction Recorder (append-only records)
//! - Ledger Engine (atomic deposit, withdrawal and transfer)

pub mod balance;
pub mod error;
pub mod memory;
pub mod recorder;
pub mod service;
pub mod store;
pub mod types;
pub mod validation;

#[cfg(test)]
mod service_props;

pub use balance::{BalanceMutator, next_balance};
pub use error::LedgerError;
pub use memory::InMemoryLedgerStore;
pub use recorder::{RecordRequest, TransactionRecorder};
pub use service::LedgerService;
pub use store::{
    DashboardData, DashboardQuery, LedgerStore, LedgerUnit, MonthlyTotal, StoreError, TypeTotal,
};
pub use types::{
    Account, MovementReceipt, NewAccount, NewTransaction, OpenAccountInput, OpenAccountReceipt,
    ResolvedTransactionQuery, TransactionQuery, TransactionRecord, TransactionStatus,
    TransactionType, TransferInput, TransferReceipt, WithdrawInput,
};
