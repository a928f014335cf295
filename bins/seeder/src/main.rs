//! Demo data seeder for Fintrack development.
//!
//! Creates a demo user with a few accounts and some activity, driving every
//! write through the ledger engine so balances and records stay consistent.
//! Running it twice is a no-op.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use chrono::Utc;
use rust_decimal_macros::dec;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fintrack_core::dashboard::DashboardService;
use fintrack_core::ledger::{LedgerService, OpenAccountInput, TransferInput, WithdrawInput};
use fintrack_db::{PgLedgerStore, UserRepository, connect};
use fintrack_shared::AppConfig;
use fintrack_shared::types::UserId;

const DEMO_EMAIL: &str = "demo@fintrack.local";
const DEMO_NAME: &str = "Demo User";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fintrack=debug,seeder=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;
    let db = connect(&config.database).await?;
    info!("Connected to database");

    let users = UserRepository::new(db.clone());
    let user = match users.find_by_email(DEMO_EMAIL).await? {
        Some(user) => user,
        None => users.create(DEMO_EMAIL, DEMO_NAME).await?,
    };
    let user_id = UserId::from_uuid(user.id);

    let ledger = LedgerService::new(PgLedgerStore::new(db), config.ledger.clone());
    if !ledger.accounts(user_id).await?.is_empty() {
        info!(user_id = %user_id, "Demo user already has accounts, nothing to seed");
        return Ok(());
    }

    seed_activity(&ledger, user_id).await?;

    let summary = DashboardService::summarize(
        ledger.store(),
        user_id,
        Utc::now().date_naive(),
        &config.ledger,
    )
    .await?;
    info!(
        user_id = %user_id,
        available_balance = %summary.available_balance,
        total_income = %summary.total_income,
        total_expense = %summary.total_expense,
        "Seeding complete"
    );
    Ok(())
}

async fn seed_activity(
    ledger: &LedgerService<PgLedgerStore>,
    user_id: UserId,
) -> anyhow::Result<()> {
    let checking = ledger
        .open_account(OpenAccountInput {
            user_id,
            name: "Checking".into(),
            account_number: "1001-2002".into(),
            initial_amount: dec!(2500),
        })
        .await?
        .account;
    let savings = ledger
        .open_account(OpenAccountInput {
            user_id,
            name: "Savings".into(),
            account_number: "3003-4004".into(),
            initial_amount: dec!(10000),
        })
        .await?
        .account;
    info!(checking = %checking.id, savings = %savings.id, "Opened demo accounts");

    ledger.deposit(user_id, checking.id, dec!(3200)).await?;

    for (description, source, amount) in [
        ("Rent", "Landlord", dec!(1400)),
        ("Groceries", "Market", dec!(182.35)),
        ("Electricity", "Utility Co", dec!(96.1)),
    ] {
        ledger
            .withdraw(WithdrawInput {
                user_id,
                account_id: checking.id,
                description: description.into(),
                source: source.into(),
                amount: Some(amount),
            })
            .await?;
    }

    ledger
        .transfer(TransferInput {
            user_id,
            from_account_id: Some(checking.id),
            to_account_id: Some(savings.id),
            amount: Some(dec!(500)),
        })
        .await?;

    Ok(())
}
