//! Dashboard Aggregator.
//!
//! Read-only rollups over the ledger:
//! - All-time income and expense totals
//! - Monthly series for the current calendar year
//! - Recent accounts and transactions

pub mod service;
pub mod types;

pub use service::DashboardService;
pub use types::*;
