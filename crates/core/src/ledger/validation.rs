//! Business rule validation for ledger operations.
//!
//! All of these checks run before any write.

use fintrack_shared::types::{AccountId, PositiveAmount, UserId};
use rust_decimal::Decimal;

use super::error::LedgerError;
use super::types::Account;

/// Longest account name, in characters.
pub const NAME_MAX_LEN: usize = 255;
/// Longest transaction source label, in characters.
pub const SOURCE_MAX_LEN: usize = 255;
/// Longest account number, in digits.
pub const ACCOUNT_NUMBER_MAX_LEN: usize = 64;

/// Collects the names of blank fields.
///
/// # Errors
///
/// Returns `MissingFields` listing every blank field.
pub fn require_fields(fields: &[(&'static str, bool)]) -> Result<(), LedgerError> {
    let missing: Vec<&'static str> = fields
        .iter()
        .filter(|(_, present)| !present)
        .map(|(name, _)| *name)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(LedgerError::MissingFields(missing))
    }
}

/// Checks that `value` fits in a column of `max` characters.
///
/// # Errors
///
/// Returns `FieldTooLong` if it does not.
pub fn ensure_max_len(field: &'static str, value: &str, max: usize) -> Result<(), LedgerError> {
    if value.chars().count() > max {
        return Err(LedgerError::FieldTooLong { field, max });
    }
    Ok(())
}

/// Returns true if the text has non-whitespace content.
#[must_use]
pub fn is_present(text: &str) -> bool {
    !text.trim().is_empty()
}

/// Validates a required amount.
///
/// # Errors
///
/// Returns `MissingFields` if absent and `InvalidAmount` if not a valid positive amount.
pub fn require_amount(amount: Option<Decimal>) -> Result<PositiveAmount, LedgerError> {
    let amount = amount.ok_or_else(|| LedgerError::MissingFields(vec!["amount"]))?;
    Ok(PositiveAmount::new(amount)?)
}

/// Strips everything but ASCII digits from an account number.
#[must_use]
pub fn sanitize_account_number(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Resolves a loaded account, hiding accounts owned by someone else.
///
/// # Errors
///
/// Returns `AccountNotFound` if the account is absent or belongs to another user.
pub fn owned_account(
    account: Option<Account>,
    account_id: AccountId,
    user_id: UserId,
) -> Result<Account, LedgerError> {
    account
        .filter(|account| account.user_id == user_id)
        .ok_or(LedgerError::AccountNotFound(account_id))
}

/// Checks that an account can fund a debit of `amount`.
///
/// An empty account can never be a source, whatever the amount.
///
/// # Errors
///
/// Returns `InsufficientFunds` if the balance is zero or below `amount`.
pub fn ensure_can_debit(account: &Account, amount: PositiveAmount) -> Result<(), LedgerError> {
    if account.balance <= Decimal::ZERO || account.balance < amount.get() {
        return Err(LedgerError::InsufficientFunds {
            account_id: account.id,
            balance: account.balance,
            requested: amount.get(),
        });
    }
    Ok(())
}
