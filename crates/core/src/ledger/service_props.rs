//! Property-based tests for the Ledger Engine.

use fintrack_shared::config::LedgerConfig;
use fintrack_shared::types::UserId;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::error::LedgerError;
use super::memory::InMemoryLedgerStore;
use super::service::LedgerService;
use super::store::LedgerStore;
use super::types::{OpenAccountInput, TransactionType, TransferInput, WithdrawInput};

/// Strategy for positive amounts (0.01 to 10,000.00).
fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap()
}

#[derive(Debug, Clone)]
enum Step {
    Deposit(usize, Decimal),
    Withdraw(usize, Decimal),
    Transfer(usize, usize, Decimal),
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        (0usize..3, amount_strategy()).prop_map(|(i, a)| Step::Deposit(i, a)),
        (0usize..3, amount_strategy()).prop_map(|(i, a)| Step::Withdraw(i, a)),
        (0usize..3, 0usize..3, amount_strategy()).prop_map(|(f, t, a)| Step::Transfer(f, t, a)),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Conservation: a successful transfer leaves the sum of both balances unchanged,
    /// and a rejected one changes nothing.
    #[test]
    fn prop_transfer_conserves_money(
        from_balance in amount_strategy(),
        to_balance in amount_strategy(),
        amount in amount_strategy(),
    ) {
        runtime().block_on(async {
            let ledger = LedgerService::new(InMemoryLedgerStore::new(), LedgerConfig::default());
            let user_id = UserId::new();
            let from = ledger
                .open_account(OpenAccountInput {
                    user_id,
                    name: "From".into(),
                    account_number: "1".into(),
                    initial_amount: from_balance,
                })
                .await
                .unwrap()
                .account;
            let to = ledger
                .open_account(OpenAccountInput {
                    user_id,
                    name: "To".into(),
                    account_number: "2".into(),
                    initial_amount: to_balance,
                })
                .await
                .unwrap()
                .account;

            let result = ledger
                .transfer(TransferInput {
                    user_id,
                    from_account_id: Some(from.id),
                    to_account_id: Some(to.id),
                    amount: Some(amount),
                })
                .await;

            let from_after = ledger.store().find_account(from.id).await.unwrap().unwrap().balance;
            let to_after = ledger.store().find_account(to.id).await.unwrap().unwrap().balance;
            prop_assert_eq!(from_after + to_after, from_balance + to_balance);

            match result {
                Ok(receipt) => {
                    prop_assert!(amount <= from_balance);
                    prop_assert_eq!(from_after, from_balance - amount);
                    prop_assert_eq!(receipt.debit.amount, receipt.credit.amount);
                    prop_assert_eq!(receipt.debit.transaction_type, TransactionType::Expense);
                    prop_assert_eq!(receipt.credit.transaction_type, TransactionType::Income);
                }
                Err(LedgerError::InsufficientFunds { .. }) => {
                    prop_assert!(amount > from_balance);
                    prop_assert_eq!(from_after, from_balance);
                }
                Err(other) => prop_assert!(false, "unexpected error: {other}"),
            }
            Ok(())
        })?;
    }

    /// Non-negativity and record correspondence over arbitrary operation sequences:
    /// every balance equals its opening deposit plus the signed sum of its records.
    #[test]
    fn prop_balances_match_records(
        opening in prop::collection::vec(amount_strategy(), 3),
        steps in prop::collection::vec(step_strategy(), 1..24),
    ) {
        runtime().block_on(async {
            let ledger = LedgerService::new(InMemoryLedgerStore::new(), LedgerConfig::default());
            let user_id = UserId::new();
            let mut ids = Vec::new();
            for (n, amount) in opening.iter().enumerate() {
                let receipt = ledger
                    .open_account(OpenAccountInput {
                        user_id,
                        name: format!("Account {n}"),
                        account_number: format!("{n}"),
                        initial_amount: *amount,
                    })
                    .await
                    .unwrap();
                ids.push(receipt.account.id);
            }

            let mut expected_records = ids.len();
            for step in steps {
                let written = match step {
                    Step::Deposit(i, amount) => {
                        ledger.deposit(user_id, ids[i], amount).await.map(|_| 1)
                    }
                    Step::Withdraw(i, amount) => ledger
                        .withdraw(WithdrawInput {
                            user_id,
                            account_id: ids[i],
                            description: "Spend".into(),
                            source: "Card".into(),
                            amount: Some(amount),
                        })
                        .await
                        .map(|_| 1),
                    Step::Transfer(from, to, amount) => ledger
                        .transfer(TransferInput {
                            user_id,
                            from_account_id: Some(ids[from]),
                            to_account_id: Some(ids[to]),
                            amount: Some(amount),
                        })
                        .await
                        .map(|_| 2),
                };
                match written {
                    Ok(count) => expected_records += count,
                    Err(LedgerError::InsufficientFunds { .. }) => {}
                    Err(other) => prop_assert!(false, "unexpected error: {other}"),
                }
            }

            let records = ledger.store().all_transactions().await;
            prop_assert_eq!(records.len(), expected_records);

            for id in &ids {
                let balance = ledger.store().find_account(*id).await.unwrap().unwrap().balance;
                let replayed: Decimal = records
                    .iter()
                    .filter(|r| r.account_id == *id)
                    .map(|r| r.signed_amount())
                    .sum();
                prop_assert!(balance >= Decimal::ZERO);
                prop_assert_eq!(balance, replayed);
            }
            Ok(())
        })?;
    }
}
