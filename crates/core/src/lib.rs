//! Core business logic for Fintrack.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Persistence is reached only through the [`ledger::LedgerStore`] contract.
//!
//! # Modules
//!
//! - `ledger` - Balance mutation, transaction records and the atomic Ledger Engine
//! - `dashboard` - Read-only rollups over a user's ledger

pub mod dashboard;
pub mod ledger;
