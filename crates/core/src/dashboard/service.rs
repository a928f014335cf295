//! Dashboard summary computation.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeDelta, Utc};
use fintrack_shared::config::LedgerConfig;
use fintrack_shared::types::UserId;
use rust_decimal::Decimal;

use super::types::{DashboardSummary, MONTH_LABELS, MonthlyPoint};
use crate::ledger::{DashboardData, DashboardQuery, LedgerError, LedgerStore, TransactionType};

/// Builds dashboard summaries. Never writes to the store.
pub struct DashboardService;

impl DashboardService {
    /// Summarizes a user's ledger as of `as_of`.
    ///
    /// The monthly series covers the calendar year containing `as_of`;
    /// the totals are all-time.
    ///
    /// # Errors
    ///
    /// - `NoTransactions` if the user has no transactions at all
    /// - `AmountOverflow` if a total does not fit in a decimal
    /// - `StoreUnavailable` / `OperationTimedOut` on infrastructure failure
    pub async fn summarize<S: LedgerStore + ?Sized>(
        store: &S,
        user_id: UserId,
        as_of: NaiveDate,
        config: &LedgerConfig,
    ) -> Result<DashboardSummary, LedgerError> {
        let (period_start, period_end) = calendar_year(as_of);
        let query = DashboardQuery {
            user_id,
            period_start,
            period_end,
            recent_transactions: config.recent_transactions_limit,
            recent_accounts: config.recent_accounts_limit,
        };

        let limit = config.operation_timeout();
        let data = tokio::time::timeout(limit, store.load_dashboard(&query))
            .await
            .map_err(|_| LedgerError::OperationTimedOut(limit))?
            .map_err(|e| {
                tracing::error!(user_id = %user_id, error = %e, "Failed to load dashboard");
                LedgerError::from(e)
            })?;

        Self::build_summary(as_of.year(), data)
    }

    /// Folds raw store rollups into a summary.
    ///
    /// # Errors
    ///
    /// - `NoTransactions` if `data` has no transactions
    /// - `AmountOverflow` if a total does not fit in a decimal
    pub fn build_summary(year: i32, data: DashboardData) -> Result<DashboardSummary, LedgerError> {
        if data.transaction_count == 0 {
            return Err(LedgerError::NoTransactions);
        }

        let total_of = |kind: TransactionType| -> Result<Decimal, LedgerError> {
            data.totals
                .iter()
                .filter(|t| t.transaction_type == kind)
                .try_fold(Decimal::ZERO, |sum, t| checked_sum(sum, t.total))
        };
        let total_income = total_of(TransactionType::Income)?;
        let total_expense = total_of(TransactionType::Expense)?;
        let available_balance = total_income
            .checked_sub(total_expense)
            .ok_or(LedgerError::AmountOverflow)?;

        let mut monthly_series: Vec<MonthlyPoint> =
            MONTH_LABELS.iter().map(|label| MonthlyPoint::empty(label)).collect();
        for row in &data.monthly {
            let slot = row
                .month
                .checked_sub(1)
                .and_then(|index| usize::try_from(index).ok())
                .and_then(|index| monthly_series.get_mut(index));
            let Some(point) = slot else {
                tracing::warn!(month = row.month, "Ignoring out-of-range month in dashboard rollup");
                continue;
            };
            let slot = match row.transaction_type {
                TransactionType::Income => &mut point.income,
                TransactionType::Expense => &mut point.expense,
            };
            *slot = checked_sum(*slot, row.total)?;
        }

        Ok(DashboardSummary {
            year,
            available_balance,
            total_income,
            total_expense,
            monthly_series,
            recent_accounts: data.recent_accounts,
            recent_transactions: data.recent_transactions,
        })
    }
}

fn checked_sum(total: Decimal, amount: Decimal) -> Result<Decimal, LedgerError> {
    total.checked_add(amount).ok_or(LedgerError::AmountOverflow)
}

/// First and last instant of the calendar year containing `as_of`.
///
/// The end is clamped to the last representable instant.
fn calendar_year(as_of: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let first = NaiveDate::from_yo_opt(as_of.year(), 1).unwrap_or(as_of);
    let last = NaiveDate::from_ymd_opt(as_of.year(), 12, 31).unwrap_or(as_of);
    let start = first.and_time(NaiveTime::MIN).and_utc();
    let end = last
        .succ_opt()
        .map_or(DateTime::<Utc>::MAX_UTC, |next| {
            next.and_time(NaiveTime::MIN).and_utc() - TimeDelta::nanoseconds(1)
        });
    (start, end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{
        InMemoryLedgerStore, LedgerService, MonthlyTotal, NewTransaction, OpenAccountInput,
        TypeTotal, WithdrawInput,
    };
    use chrono::TimeZone;
    use fintrack_shared::types::{AccountId, TransactionId};
    use rust_decimal_macros::dec;

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    async fn seed(
        store: &InMemoryLedgerStore,
        user_id: UserId,
        at: DateTime<Utc>,
        amount: Decimal,
        transaction_type: TransactionType,
    ) {
        let mut unit = store.begin().await.unwrap();
        unit.insert_transaction(NewTransaction {
            id: TransactionId::new(),
            user_id,
            account_id: AccountId::new(),
            description: "seed".into(),
            source: "Checking".into(),
            amount,
            transaction_type,
            created_at: at,
        })
        .await
        .unwrap();
        unit.commit().await.unwrap();
    }

    #[test]
    fn test_calendar_year_bounds() {
        let (start, end) = calendar_year(as_of());
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
        assert!(end > Utc.with_ymd_and_hms(2026, 12, 31, 23, 59, 59).unwrap());
        assert!(end < Utc.with_ymd_and_hms(2027, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_calendar_year_of_last_representable_date() {
        let (start, end) = calendar_year(NaiveDate::MAX);
        assert_eq!(start.year(), NaiveDate::MAX.year());
        assert_eq!(end, DateTime::<Utc>::MAX_UTC);
    }

    #[test]
    fn test_build_summary_reports_overflowing_totals() {
        let income = |total| TypeTotal {
            transaction_type: TransactionType::Income,
            total,
        };
        let data = DashboardData {
            transaction_count: 2,
            totals: vec![income(Decimal::MAX), income(Decimal::MAX)],
            ..Default::default()
        };
        let err = DashboardService::build_summary(2026, data).unwrap_err();
        assert!(matches!(err, LedgerError::AmountOverflow));

        let data = DashboardData {
            transaction_count: 2,
            totals: vec![income(Decimal::ONE)],
            monthly: vec![
                MonthlyTotal {
                    month: 5,
                    transaction_type: TransactionType::Expense,
                    total: Decimal::MAX,
                },
                MonthlyTotal {
                    month: 5,
                    transaction_type: TransactionType::Expense,
                    total: Decimal::MAX,
                },
            ],
            ..Default::default()
        };
        let err = DashboardService::build_summary(2026, data).unwrap_err();
        assert!(matches!(err, LedgerError::AmountOverflow));
    }

    #[test]
    fn test_build_summary_requires_transactions() {
        let err = DashboardService::build_summary(2026, DashboardData::default()).unwrap_err();
        assert!(matches!(err, LedgerError::NoTransactions));
    }

    #[test]
    fn test_build_summary_fills_missing_months_with_zero() {
        let data = DashboardData {
            transaction_count: 3,
            totals: vec![
                TypeTotal {
                    transaction_type: TransactionType::Income,
                    total: dec!(500),
                },
                TypeTotal {
                    transaction_type: TransactionType::Expense,
                    total: dec!(120.5),
                },
            ],
            monthly: vec![MonthlyTotal {
                month: 12,
                transaction_type: TransactionType::Expense,
                total: dec!(120.5),
            }],
            ..Default::default()
        };

        let summary = DashboardService::build_summary(2026, data).unwrap();
        assert_eq!(summary.available_balance, dec!(379.5));
        assert_eq!(summary.monthly_series.len(), 12);
        assert_eq!(summary.monthly_series[11].label, "December");
        assert_eq!(summary.monthly_series[11].expense, dec!(120.5));
        assert!(summary.monthly_series[..11]
            .iter()
            .all(|p| p.income.is_zero() && p.expense.is_zero()));
    }

    #[tokio::test]
    async fn test_march_only_activity() {
        let store = InMemoryLedgerStore::new();
        let user_id = UserId::new();
        let march = Utc.with_ymd_and_hms(2026, 3, 12, 10, 0, 0).unwrap();
        seed(&store, user_id, march, dec!(200), TransactionType::Income).await;
        seed(&store, user_id, march, dec!(50), TransactionType::Expense).await;

        let summary =
            DashboardService::summarize(&store, user_id, as_of(), &LedgerConfig::default())
                .await
                .unwrap();

        assert_eq!(
            summary.monthly_series[2],
            MonthlyPoint {
                label: "March".into(),
                income: dec!(200),
                expense: dec!(50),
            }
        );
        for (index, point) in summary.monthly_series.iter().enumerate() {
            assert_eq!(point.label, MONTH_LABELS[index]);
            if index != 2 {
                assert!(point.income.is_zero() && point.expense.is_zero());
            }
        }
        assert_eq!(summary.total_income, dec!(200));
        assert_eq!(summary.total_expense, dec!(50));
        assert_eq!(summary.available_balance, dec!(150));
    }

    #[tokio::test]
    async fn test_previous_year_counts_in_totals_only() {
        let store = InMemoryLedgerStore::new();
        let user_id = UserId::new();
        let last_year = Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap();
        seed(&store, user_id, last_year, dec!(75), TransactionType::Income).await;

        let summary =
            DashboardService::summarize(&store, user_id, as_of(), &LedgerConfig::default())
                .await
                .unwrap();

        assert_eq!(summary.total_income, dec!(75));
        assert!(summary.monthly_series.iter().all(|p| p.income.is_zero()));
    }

    #[tokio::test]
    async fn test_huge_records_yield_an_error_not_a_panic() {
        let store = InMemoryLedgerStore::new();
        let user_id = UserId::new();
        let march = Utc.with_ymd_and_hms(2026, 3, 12, 10, 0, 0).unwrap();
        seed(&store, user_id, march, Decimal::MAX, TransactionType::Income).await;
        seed(&store, user_id, march, Decimal::MAX, TransactionType::Income).await;

        let err = DashboardService::summarize(&store, user_id, as_of(), &LedgerConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::AmountOverflow));
    }

    #[tokio::test]
    async fn test_user_without_transactions() {
        let store = InMemoryLedgerStore::new();
        let err = DashboardService::summarize(
            &store,
            UserId::new(),
            as_of(),
            &LedgerConfig::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, LedgerError::NoTransactions));
    }

    #[tokio::test]
    async fn test_summary_is_idempotent_and_limits_recent_activity() {
        let store = InMemoryLedgerStore::new();
        let ledger = LedgerService::new(store.clone(), LedgerConfig::default());
        let user_id = UserId::new();

        let mut last_account = None;
        for n in 1..=5 {
            let receipt = ledger
                .open_account(OpenAccountInput {
                    user_id,
                    name: format!("Account {n}"),
                    account_number: format!("100{n}"),
                    initial_amount: dec!(100),
                })
                .await
                .unwrap();
            last_account = Some(receipt.account.id);
        }
        let account_id = last_account.unwrap();
        ledger
            .withdraw(WithdrawInput {
                user_id,
                account_id,
                description: "Groceries".into(),
                source: "Account 5".into(),
                amount: Some(dec!(30)),
            })
            .await
            .unwrap();

        let config = LedgerConfig::default();
        let first = DashboardService::summarize(&store, user_id, Utc::now().date_naive(), &config)
            .await
            .unwrap();
        let second = DashboardService::summarize(&store, user_id, Utc::now().date_naive(), &config)
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(first.total_income, dec!(500));
        assert_eq!(first.total_expense, dec!(30));
        assert_eq!(first.recent_accounts.len(), 4);
        assert_eq!(first.recent_accounts[0].id, account_id);
        assert_eq!(first.recent_transactions.len(), 5);
        assert_eq!(first.recent_transactions[0].description, "Groceries");
    }
}
