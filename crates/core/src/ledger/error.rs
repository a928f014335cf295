//! Ledger error types.
//!
//! Every failure of a ledger operation resolves to one `LedgerError` with a
//! stable code. Messages never include storage details; the underlying store
//! error is kept as the `source` for logging.

use std::time::Duration;

use fintrack_shared::AppError;
use fintrack_shared::types::{AccountId, AmountError};
use rust_decimal::Decimal;
use thiserror::Error;

use super::store::StoreError;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Amount is missing, not positive, or not representable.
    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),

    /// One or more required fields were empty.
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    /// A text field is longer than the ledger stores.
    #[error("Field {field} cannot be longer than {max} characters")]
    FieldTooLong {
        /// The offending field.
        field: &'static str,
        /// Maximum length in characters.
        max: usize,
    },

    // ========== Account Errors ==========
    /// Account does not exist or is not owned by the caller.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// The account balance does not cover the requested amount.
    #[error("Insufficient funds in account {account_id}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        /// The account that would be overdrawn.
        account_id: AccountId,
        /// Balance at the time of the check.
        balance: Decimal,
        /// The amount requested.
        requested: Decimal,
    },

    /// The credit would push the balance above the largest storable amount.
    #[error("Balance limit exceeded in account {account_id}: balance {balance}, credit {requested}")]
    BalanceLimitExceeded {
        /// The account that would overflow.
        account_id: AccountId,
        /// Balance at the time of the check.
        balance: Decimal,
        /// The amount credited.
        requested: Decimal,
    },

    /// The user already has an account with this number.
    #[error("An account with number {0} already exists")]
    DuplicateAccount(String),

    // ========== Read Conditions ==========
    /// The user has no transactions to summarize.
    #[error("There are no transactions for this user")]
    NoTransactions,

    /// A rollup over the user's records does not fit in a decimal.
    #[error("Totals are too large to compute")]
    AmountOverflow,

    // ========== Infrastructure Errors ==========
    /// The ledger store could not be reached or failed mid-operation.
    #[error("Ledger store is unavailable, please retry")]
    StoreUnavailable(#[source] StoreError),

    /// The operation did not complete within its time budget.
    #[error("Operation timed out after {}ms", .0.as_millis())]
    OperationTimedOut(Duration),
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Overflow(_) => Self::AmountOverflow,
            other => Self::StoreUnavailable(other),
        }
    }
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::MissingFields(_) => "MISSING_FIELDS",
            Self::FieldTooLong { .. } => "FIELD_TOO_LONG",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::BalanceLimitExceeded { .. } => "BALANCE_LIMIT_EXCEEDED",
            Self::DuplicateAccount(_) => "DUPLICATE_ACCOUNT",
            Self::NoTransactions => "NO_TRANSACTIONS",
            Self::AmountOverflow => "AMOUNT_OVERFLOW",
            Self::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            Self::OperationTimedOut(_) => "OPERATION_TIMED_OUT",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - validation errors
            Self::InvalidAmount(_) | Self::MissingFields(_) | Self::FieldTooLong { .. } => 400,

            // 403 Forbidden - refused by balance rules
            Self::InsufficientFunds { .. } | Self::BalanceLimitExceeded { .. } => 403,

            // 404 Not Found
            Self::AccountNotFound(_) | Self::NoTransactions => 404,

            // 409 Conflict
            Self::DuplicateAccount(_) => 409,

            // 500/503/504 - infrastructure
            Self::AmountOverflow => 500,
            Self::StoreUnavailable(_) => 503,
            Self::OperationTimedOut(_) => 504,
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_) | Self::OperationTimedOut(_))
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let message = err.to_string();
        match err {
            LedgerError::InvalidAmount(_)
            | LedgerError::MissingFields(_)
            | LedgerError::FieldTooLong { .. } => Self::Validation(message),
            LedgerError::InsufficientFunds { .. } | LedgerError::BalanceLimitExceeded { .. } => {
                Self::Forbidden(message)
            }
            LedgerError::AccountNotFound(_) | LedgerError::NoTransactions => {
                Self::NotFound(message)
            }
            LedgerError::DuplicateAccount(_) => Self::Conflict(message),
            LedgerError::AmountOverflow => Self::Internal(message),
            LedgerError::StoreUnavailable(_) => Self::Unavailable(message),
            LedgerError::OperationTimedOut(_) => Self::Timeout(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            LedgerError::InvalidAmount(AmountError::NotPositive).error_code(),
            "INVALID_AMOUNT"
        );
        assert_eq!(
            LedgerError::MissingFields(vec!["amount"]).error_code(),
            "MISSING_FIELDS"
        );
        assert_eq!(LedgerError::NoTransactions.error_code(), "NO_TRANSACTIONS");
        assert_eq!(
            LedgerError::OperationTimedOut(Duration::from_secs(1)).error_code(),
            "OPERATION_TIMED_OUT"
        );
    }

    #[test]
    fn test_http_status_codes() {
        assert_eq!(
            LedgerError::AccountNotFound(AccountId::new()).http_status_code(),
            404
        );
        assert_eq!(
            LedgerError::InsufficientFunds {
                account_id: AccountId::new(),
                balance: dec!(100),
                requested: dec!(150),
            }
            .http_status_code(),
            403
        );
        assert_eq!(
            LedgerError::DuplicateAccount("123".into()).http_status_code(),
            409
        );
        assert_eq!(
            LedgerError::StoreUnavailable(StoreError::Unavailable("down".into()))
                .http_status_code(),
            503
        );
    }

    #[test]
    fn test_retryable_errors() {
        assert!(LedgerError::StoreUnavailable(StoreError::Unavailable("x".into())).is_retryable());
        assert!(LedgerError::OperationTimedOut(Duration::from_millis(10)).is_retryable());
        assert!(!LedgerError::NoTransactions.is_retryable());
        assert!(
            !LedgerError::InsufficientFunds {
                account_id: AccountId::new(),
                balance: Decimal::ZERO,
                requested: Decimal::ONE,
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            LedgerError::MissingFields(vec!["description", "source"]).to_string(),
            "Missing required fields: description, source"
        );
        assert_eq!(
            LedgerError::OperationTimedOut(Duration::from_millis(250)).to_string(),
            "Operation timed out after 250ms"
        );
    }

    #[test]
    fn test_store_details_do_not_leak_into_message() {
        let err = LedgerError::from(StoreError::Unavailable(
            "connection refused (os error 111) at 10.0.0.5:5432".into(),
        ));
        assert_eq!(err.to_string(), "Ledger store is unavailable, please retry");
        let app: AppError = err.into();
        assert_eq!(app.status_code(), 503);
        assert!(!app.to_string().contains("10.0.0.5"));
    }

    #[test]
    fn test_app_error_mapping() {
        let app: AppError = LedgerError::AccountNotFound(AccountId::new()).into();
        assert_eq!(app.status_code(), 404);

        let app: AppError = LedgerError::InvalidAmount(AmountError::NotPositive).into();
        assert_eq!(app.error_code(), "VALIDATION_ERROR");

        let app: AppError = LedgerError::DuplicateAccount("42".into()).into();
        assert_eq!(app.status_code(), 409);

        let app: AppError = LedgerError::FieldTooLong {
            field: "name",
            max: 255,
        }
        .into();
        assert_eq!(app.error_code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_limit_errors_are_not_retryable() {
        let limit = LedgerError::BalanceLimitExceeded {
            account_id: AccountId::new(),
            balance: dec!(1),
            requested: dec!(2),
        };
        assert_eq!(limit.error_code(), "BALANCE_LIMIT_EXCEEDED");
        assert_eq!(limit.http_status_code(), 403);
        assert!(!limit.is_retryable());

        let too_long = LedgerError::FieldTooLong {
            field: "account_number",
            max: 64,
        };
        assert_eq!(too_long.http_status_code(), 400);
        assert_eq!(
            too_long.to_string(),
            "Field account_number cannot be longer than 64 characters"
        );
        assert!(!too_long.is_retryable());
    }

    #[test]
    fn test_store_overflow_maps_to_amount_overflow() {
        let err = LedgerError::from(StoreError::Overflow("income total".into()));
        assert!(matches!(err, LedgerError::AmountOverflow));
        assert_eq!(err.http_status_code(), 500);
        assert!(!err.is_retryable());
    }
}
