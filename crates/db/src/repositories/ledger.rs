//! PostgreSQL-backed Ledger Store.
//!
//! A unit of work is one database transaction. Account rows are locked with
//! `SELECT ... FOR UPDATE`, so concurrent units touching the same account are
//! serialized at the row level. Dropping a unit without committing rolls the
//! database transaction back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fintrack_core::ledger::{
    Account, DashboardData, DashboardQuery, LedgerStore, LedgerUnit, MonthlyTotal, NewAccount,
    NewTransaction, ResolvedTransactionQuery, StoreError, TransactionRecord, TypeTotal,
};
use fintrack_shared::types::{AccountId, UserId};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    AccessMode, ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, DbBackend, DbErr, EntityTrait, FromQueryResult, IsolationLevel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, Statement,
    TransactionTrait,
};

use crate::entities::{
    accounts,
    sea_orm_active_enums::{TransactionStatus, TransactionType},
    transactions,
};

/// Maps a database error onto the store contract.
///
/// Unique violations are kept distinct; everything else is unavailability.
pub(crate) fn store_error(err: DbErr) -> StoreError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => StoreError::UniqueViolation(detail),
        _ => StoreError::Unavailable(err.to_string()),
    }
}

impl From<accounts::Model> for Account {
    fn from(model: accounts::Model) -> Self {
        Self {
            id: AccountId::from_uuid(model.id),
            user_id: UserId::from_uuid(model.user_id),
            name: model.name,
            account_number: model.account_number,
            balance: model.balance,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<transactions::Model> for TransactionRecord {
    fn from(model: transactions::Model) -> Self {
        Self {
            id: model.id.into(),
            user_id: UserId::from_uuid(model.user_id),
            account_id: AccountId::from_uuid(model.account_id),
            description: model.description,
            source: model.source,
            amount: model.amount,
            transaction_type: model.transaction_type.into(),
            status: model.status.into(),
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

/// Escapes a search term for use inside a `LIKE` pattern.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[derive(Debug, FromQueryResult)]
struct MonthlyRow {
    transaction_type: TransactionType,
    month: i32,
    total: Decimal,
}

/// Converts a monthly rollup row, skipping rows with an impossible month.
fn monthly_total(row: MonthlyRow) -> Option<MonthlyTotal> {
    let Ok(month) = u32::try_from(row.month) else {
        tracing::warn!(month = row.month, "Ignoring malformed month in dashboard rollup");
        return None;
    };
    Some(MonthlyTotal {
        month,
        transaction_type: row.transaction_type.into(),
        total: row.total,
    })
}

/// Ledger store over a `SeaORM` connection pool.
#[derive(Debug, Clone)]
pub struct PgLedgerStore {
    db: DatabaseConnection,
}

impl PgLedgerStore {
    /// Creates a new ledger store.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Returns the denormalized account names recorded for a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn account_names(&self, user_id: UserId) -> Result<Vec<String>, StoreError> {
        #[derive(Debug, FromQueryResult)]
        struct NameRow {
            name: String,
        }

        let rows = NameRow::find_by_statement(Statement::from_sql_and_values(
            DbBackend::Postgres,
            "SELECT unnest(account_names) AS name FROM users WHERE id = $1",
            [user_id.into_inner().into()],
        ))
        .all(&self.db)
        .await
        .map_err(store_error)?;

        Ok(rows.into_iter().map(|row| row.name).collect())
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn begin(&self) -> Result<Box<dyn LedgerUnit>, StoreError> {
        let txn = self.db.begin().await.map_err(store_error)?;
        Ok(Box::new(PgLedgerUnit { txn }))
    }

    async fn find_account(&self, account_id: AccountId) -> Result<Option<Account>, StoreError> {
        let account = accounts::Entity::find_by_id(account_id.into_inner())
            .one(&self.db)
            .await
            .map_err(store_error)?;
        Ok(account.map(Account::from))
    }

    async fn list_accounts(&self, user_id: UserId) -> Result<Vec<Account>, StoreError> {
        let accounts = accounts::Entity::find()
            .filter(accounts::Column::UserId.eq(user_id.into_inner()))
            .order_by_desc(accounts::Column::CreatedAt)
            .order_by_desc(accounts::Column::Id)
            .all(&self.db)
            .await
            .map_err(store_error)?;
        Ok(accounts.into_iter().map(Account::from).collect())
    }

    async fn list_transactions(
        &self,
        user_id: UserId,
        query: &ResolvedTransactionQuery,
    ) -> Result<Vec<TransactionRecord>, StoreError> {
        let mut select = transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user_id.into_inner()))
            .filter(transactions::Column::CreatedAt.gte(query.start))
            .filter(transactions::Column::CreatedAt.lt(query.end));

        if let Some(term) = &query.search {
            let pattern = like_pattern(term);
            let matches = |column: transactions::Column| Expr::col(column).ilike(pattern.as_str());
            select = select.filter(
                Condition::any()
                    .add(matches(transactions::Column::Description))
                    .add(matches(transactions::Column::Status))
                    .add(matches(transactions::Column::Source)),
            );
        }

        let records = select
            .order_by_desc(transactions::Column::CreatedAt)
            .order_by_desc(transactions::Column::Id)
            .all(&self.db)
            .await
            .map_err(store_error)?;
        Ok(records.into_iter().map(TransactionRecord::from).collect())
    }

    async fn load_dashboard(&self, query: &DashboardQuery) -> Result<DashboardData, StoreError> {
        #[derive(Debug, FromQueryResult)]
        struct TotalRow {
            transaction_type: TransactionType,
            total: Decimal,
        }

        let user_id = query.user_id.into_inner();

        // One snapshot for every rollup.
        let txn = self
            .db
            .begin_with_config(
                Some(IsolationLevel::RepeatableRead),
                Some(AccessMode::ReadOnly),
            )
            .await
            .map_err(store_error)?;

        let transaction_count = transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user_id))
            .count(&txn)
            .await
            .map_err(store_error)?;

        let totals = TotalRow::find_by_statement(Statement::from_sql_and_values(
            DbBackend::Postgres,
            r"SELECT transaction_type, SUM(amount) AS total
              FROM transactions
              WHERE user_id = $1
              GROUP BY transaction_type",
            [user_id.into()],
        ))
        .all(&txn)
        .await
        .map_err(store_error)?;

        let monthly = MonthlyRow::find_by_statement(Statement::from_sql_and_values(
            DbBackend::Postgres,
            r"SELECT transaction_type,
                     EXTRACT(MONTH FROM created_at AT TIME ZONE 'UTC')::int4 AS month,
                     SUM(amount) AS total
              FROM transactions
              WHERE user_id = $1 AND created_at >= $2 AND created_at <= $3
              GROUP BY transaction_type, month
              ORDER BY month",
            [
                user_id.into(),
                query.period_start.into(),
                query.period_end.into(),
            ],
        ))
        .all(&txn)
        .await
        .map_err(store_error)?;

        let recent_transactions = transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user_id))
            .order_by_desc(transactions::Column::CreatedAt)
            .order_by_desc(transactions::Column::Id)
            .limit(query.recent_transactions)
            .all(&txn)
            .await
            .map_err(store_error)?;

        let recent_accounts = accounts::Entity::find()
            .filter(accounts::Column::UserId.eq(user_id))
            .order_by_desc(accounts::Column::CreatedAt)
            .order_by_desc(accounts::Column::Id)
            .limit(query.recent_accounts)
            .all(&txn)
            .await
            .map_err(store_error)?;

        txn.commit().await.map_err(store_error)?;

        Ok(DashboardData {
            transaction_count,
            totals: totals
                .into_iter()
                .map(|row| TypeTotal {
                    transaction_type: row.transaction_type.into(),
                    total: row.total,
                })
                .collect(),
            monthly: monthly.into_iter().filter_map(monthly_total).collect(),
            recent_accounts: recent_accounts.into_iter().map(Account::from).collect(),
            recent_transactions: recent_transactions
                .into_iter()
                .map(TransactionRecord::from)
                .collect(),
        })
    }
}

/// One database transaction acting as a ledger unit of work.
pub struct PgLedgerUnit {
    txn: DatabaseTransaction,
}

#[async_trait]
impl LedgerUnit for PgLedgerUnit {
    async fn lock_account(
        &mut self,
        account_id: AccountId,
    ) -> Result<Option<Account>, StoreError> {
        let account = accounts::Entity::find_by_id(account_id.into_inner())
            .lock_exclusive()
            .one(&self.txn)
            .await
            .map_err(store_error)?;
        Ok(account.map(Account::from))
    }

    async fn find_account_by_number(
        &mut self,
        user_id: UserId,
        account_number: &str,
    ) -> Result<Option<Account>, StoreError> {
        let account = accounts::Entity::find()
            .filter(accounts::Column::UserId.eq(user_id.into_inner()))
            .filter(accounts::Column::AccountNumber.eq(account_number))
            .one(&self.txn)
            .await
            .map_err(store_error)?;
        Ok(account.map(Account::from))
    }

    async fn insert_account(&mut self, account: NewAccount) -> Result<Account, StoreError> {
        let created_at = account.created_at.into();
        let model = accounts::ActiveModel {
            id: Set(account.id.into_inner()),
            user_id: Set(account.user_id.into_inner()),
            name: Set(account.name),
            account_number: Set(account.account_number),
            balance: Set(Decimal::ZERO),
            created_at: Set(created_at),
            updated_at: Set(created_at),
        }
        .insert(&self.txn)
        .await
        .map_err(store_error)?;
        Ok(model.into())
    }

    async fn update_balance(
        &mut self,
        account_id: AccountId,
        balance: Decimal,
        updated_at: DateTime<Utc>,
    ) -> Result<Account, StoreError> {
        let model = accounts::ActiveModel {
            id: Set(account_id.into_inner()),
            balance: Set(balance),
            updated_at: Set(updated_at.into()),
            ..Default::default()
        }
        .update(&self.txn)
        .await
        .map_err(store_error)?;
        Ok(model.into())
    }

    async fn insert_transaction(
        &mut self,
        transaction: NewTransaction,
    ) -> Result<TransactionRecord, StoreError> {
        let created_at = transaction.created_at.into();
        let model = transactions::ActiveModel {
            id: Set(transaction.id.into_inner()),
            user_id: Set(transaction.user_id.into_inner()),
            account_id: Set(transaction.account_id.into_inner()),
            description: Set(transaction.description),
            source: Set(transaction.source),
            amount: Set(transaction.amount),
            transaction_type: Set(transaction.transaction_type.into()),
            status: Set(TransactionStatus::Completed),
            created_at: Set(created_at),
            updated_at: Set(created_at),
        }
        .insert(&self.txn)
        .await
        .map_err(store_error)?;
        Ok(model.into())
    }

    async fn link_account_name(&mut self, user_id: UserId, name: &str) -> Result<(), StoreError> {
        self.txn
            .execute(Statement::from_sql_and_values(
                DbBackend::Postgres,
                r"UPDATE users
                  SET account_names = array_append(account_names, $1), updated_at = now()
                  WHERE id = $2",
                [name.into(), user_id.into_inner().into()],
            ))
            .await
            .map_err(store_error)?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.txn.commit().await.map_err(store_error)
    }
}
