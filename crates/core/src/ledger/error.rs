//! Ledger error types for validation and state errors.

use coopledger_shared::ErrorKind;
use coopledger_shared::types::AccountId;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Debit amount cannot be negative.
    #[error("Debit amount cannot be negative: {0}")]
    NegativeDebit(Decimal),

    /// Credit amount cannot be negative.
    #[error("Credit amount cannot be negative: {0}")]
    NegativeCredit(Decimal),

    /// Amount has more decimal places than the ledger stores.
    #[error("Amount has more than {max} decimal places: {amount}")]
    ExcessScale {
        /// Rejected amount.
        amount: Decimal,
        /// Largest scale accepted.
        max: u32,
    },

    /// The account has no general ledger classification, so no sign rule applies.
    #[error("Account {0} has no general ledger type")]
    UnclassifiedAccount(AccountId),

    // ========== Account Errors ==========
    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Account has been deleted.
    #[error("Account {0} is deleted")]
    AccountDeleted(AccountId),

    // ========== Concurrency Errors ==========
    /// The prior balance row could not be locked, or another writer got there first.
    #[error("Lock conflict on {0}, please retry")]
    LockConflict(String),

    // ========== State Errors ==========
    /// Programming error, e.g. a posting attempted without a transaction.
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NegativeDebit(_) | Self::NegativeCredit(_) => "NEGATIVE_AMOUNT",
            Self::ExcessScale { .. } => "AMOUNT_SCALE",
            Self::UnclassifiedAccount(_) => "UNCLASSIFIED_ACCOUNT",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::AccountDeleted(_) => "ACCOUNT_DELETED",
            Self::LockConflict(_) => "LOCK_CONFLICT",
            Self::InvalidState(_) => "INVALID_STATE",
        }
    }

    /// Returns the transport-agnostic class of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NegativeDebit(_)
            | Self::NegativeCredit(_)
            | Self::ExcessScale { .. }
            | Self::UnclassifiedAccount(_)
            | Self::AccountDeleted(_) => ErrorKind::Validation,
            Self::AccountNotFound(_) => ErrorKind::NotFound,
            Self::LockConflict(_) => ErrorKind::LockConflict,
            Self::InvalidState(_) => ErrorKind::InvalidState,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        self.kind().status_code()
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}
