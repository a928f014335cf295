//! Balance Mutator: the single writer path for account balances.
//!
//! A balance is read under the account lock, moved by a signed delta and
//! written back in the same unit. A delta that would leave the balance
//! negative, or above [`MAX_AMOUNT`], is rejected before anything is written.

use chrono::{DateTime, Utc};
use fintrack_shared::types::{AccountId, MAX_AMOUNT, PositiveAmount};
use rust_decimal::Decimal;

use super::error::LedgerError;
use super::store::LedgerUnit;
use super::types::Account;

/// Computes the balance after applying `delta`.
///
/// # Errors
///
/// - `InsufficientFunds` if the result would be negative
/// - `BalanceLimitExceeded` if the result would be above [`MAX_AMOUNT`]
pub fn next_balance(
    account_id: AccountId,
    current: Decimal,
    delta: Decimal,
) -> Result<Decimal, LedgerError> {
    let limit_exceeded = || LedgerError::BalanceLimitExceeded {
        account_id,
        balance: current,
        requested: delta,
    };
    let next = current.checked_add(delta).ok_or_else(limit_exceeded)?;
    if next > MAX_AMOUNT {
        return Err(limit_exceeded());
    }
    if next < Decimal::ZERO {
        return Err(LedgerError::InsufficientFunds {
            account_id,
            balance: current,
            requested: -delta,
        });
    }
    Ok(next)
}

/// Applies signed deltas to account balances inside a unit of work.
pub struct BalanceMutator;

impl BalanceMutator {
    /// Applies `signed_amount` to the account and returns the updated snapshot.
    ///
    /// The magnitude of `signed_amount` must itself be a valid positive amount.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if the magnitude is zero or too precise
    /// - `AccountNotFound` if the account does not exist
    /// - `InsufficientFunds` if the balance would go negative
    /// - `BalanceLimitExceeded` if the balance would pass the storable maximum
    /// - `StoreUnavailable` if the store fails
    pub async fn apply_delta(
        unit: &mut dyn LedgerUnit,
        account_id: AccountId,
        signed_amount: Decimal,
        now: DateTime<Utc>,
    ) -> Result<Account, LedgerError> {
        PositiveAmount::new(signed_amount.abs())?;

        let account = unit
            .lock_account(account_id)
            .await?
            .ok_or(LedgerError::AccountNotFound(account_id))?;

        let balance = next_balance(account_id, account.balance, signed_amount)?;
        let updated = unit.update_balance(account_id, balance, now).await?;

        tracing::debug!(
            account_id = %account_id,
            previous = %account.balance,
            current = %updated.balance,
            "Applied balance delta"
        );

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::memory::InMemoryLedgerStore;
    use crate::ledger::store::LedgerStore;
    use crate::ledger::types::NewAccount;
    use fintrack_shared::types::{AmountError, UserId};
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    /// Strategy for balances (0.00 to 100,000.00).
    fn balance_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
    }

    /// Strategy for signed deltas (-100,000.00 to 100,000.00).
    fn delta_strategy() -> impl Strategy<Value = Decimal> {
        (-10_000_000i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// A successful mutation never produces a negative balance and moves it by exactly delta.
        #[test]
        fn prop_next_balance_never_negative(
            current in balance_strategy(),
            delta in delta_strategy(),
        ) {
            match next_balance(AccountId::new(), current, delta) {
                Ok(next) => {
                    prop_assert!(next >= Decimal::ZERO);
                    prop_assert_eq!(next, current + delta);
                }
                Err(LedgerError::InsufficientFunds { balance, requested, .. }) => {
                    prop_assert!(current + delta < Decimal::ZERO);
                    prop_assert_eq!(balance, current);
                    prop_assert_eq!(requested, -delta);
                }
                Err(other) => prop_assert!(false, "unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn test_next_balance_allows_draining_to_zero() {
        let next = next_balance(AccountId::new(), dec!(100), dec!(-100)).unwrap();
        assert_eq!(next, Decimal::ZERO);
    }

    #[test]
    fn test_next_balance_stops_at_storable_maximum() {
        let id = AccountId::new();
        assert_eq!(next_balance(id, MAX_AMOUNT - dec!(1), dec!(1)).unwrap(), MAX_AMOUNT);

        let err = next_balance(id, MAX_AMOUNT, dec!(0.0001)).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::BalanceLimitExceeded { account_id, balance, requested }
                if account_id == id && balance == MAX_AMOUNT && requested == dec!(0.0001)
        ));

        // Past the decimal range itself: an error, not a panic.
        let err = next_balance(id, Decimal::MAX, Decimal::MAX).unwrap_err();
        assert!(matches!(err, LedgerError::BalanceLimitExceeded { .. }));
    }

    async fn store_with_account(balance: Decimal) -> (InMemoryLedgerStore, AccountId) {
        let store = InMemoryLedgerStore::new();
        let id = AccountId::new();
        let mut unit = store.begin().await.unwrap();
        unit.insert_account(NewAccount {
            id,
            user_id: UserId::new(),
            name: "Checking".into(),
            account_number: "1234".into(),
            created_at: Utc::now(),
        })
        .await
        .unwrap();
        if balance > Decimal::ZERO {
            unit.update_balance(id, balance, Utc::now()).await.unwrap();
        }
        unit.commit().await.unwrap();
        (store, id)
    }

    #[tokio::test]
    async fn test_apply_delta_updates_balance_and_timestamp() {
        let (store, id) = store_with_account(dec!(20)).await;
        let now = Utc::now();

        let mut unit = store.begin().await.unwrap();
        let updated = BalanceMutator::apply_delta(unit.as_mut(), id, dec!(30), now)
            .await
            .unwrap();
        unit.commit().await.unwrap();

        assert_eq!(updated.balance, dec!(50));
        assert_eq!(updated.updated_at, now);
        assert_eq!(store.find_account(id).await.unwrap().unwrap().balance, dec!(50));
    }

    #[tokio::test]
    async fn test_apply_delta_rejects_overdraft() {
        let (store, id) = store_with_account(dec!(100)).await;

        let mut unit = store.begin().await.unwrap();
        let err = BalanceMutator::apply_delta(unit.as_mut(), id, dec!(-150), Utc::now())
            .await
            .unwrap_err();
        drop(unit);

        assert!(matches!(err, LedgerError::InsufficientFunds { .. }));
        assert_eq!(store.find_account(id).await.unwrap().unwrap().balance, dec!(100));
    }

    #[tokio::test]
    async fn test_apply_delta_rejects_credit_past_maximum() {
        let (store, id) = store_with_account(MAX_AMOUNT).await;

        let mut unit = store.begin().await.unwrap();
        let err = BalanceMutator::apply_delta(unit.as_mut(), id, dec!(1), Utc::now())
            .await
            .unwrap_err();
        drop(unit);

        assert!(matches!(err, LedgerError::BalanceLimitExceeded { .. }));
        assert_eq!(store.find_account(id).await.unwrap().unwrap().balance, MAX_AMOUNT);
    }

    #[tokio::test]
    async fn test_apply_delta_rejects_zero_and_unknown_account() {
        let (store, id) = store_with_account(dec!(10)).await;
        let mut unit = store.begin().await.unwrap();

        let err = BalanceMutator::apply_delta(unit.as_mut(), id, Decimal::ZERO, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InvalidAmount(AmountError::NotPositive)
        ));

        let missing = AccountId::new();
        let err = BalanceMutator::apply_delta(unit.as_mut(), missing, dec!(5), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::AccountNotFound(got) if got == missing));
    }
}
