//! Dashboard data types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::{Account, TransactionRecord};

/// Calendar month labels, January first.
pub const MONTH_LABELS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Income and expense within one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyPoint {
    /// Month name.
    pub label: String,
    /// Total income booked in the month.
    pub income: Decimal,
    /// Total expense booked in the month.
    pub expense: Decimal,
}

impl MonthlyPoint {
    /// A month with no activity.
    #[must_use]
    pub fn empty(label: &str) -> Self {
        Self {
            label: label.to_string(),
            income: Decimal::ZERO,
            expense: Decimal::ZERO,
        }
    }
}

/// Dashboard summary for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSummary {
    /// Calendar year covered by `monthly_series`.
    pub year: i32,
    /// All-time income minus all-time expense.
    pub available_balance: Decimal,
    /// All-time income.
    pub total_income: Decimal,
    /// All-time expense.
    pub total_expense: Decimal,
    /// Exactly twelve entries, January first.
    pub monthly_series: Vec<MonthlyPoint>,
    /// Most recent accounts, newest first.
    pub recent_accounts: Vec<Account>,
    /// Most recent transactions, newest first.
    pub recent_transactions: Vec<TransactionRecord>,
}
