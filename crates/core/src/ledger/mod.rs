//! Ledger posting logic.
//!
//! This module implements the pure half of the posting engine:
//! - Account classifications and the balance sign rule
//! - Posting scopes (which running balance an entry belongs to)
//! - Running balance chaining
//! - Error types for ledger operations

pub mod balance;
pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use balance::{NormalBalance, RunningBalance};
pub use error::LedgerError;
pub use service::{PostingService, PreparedPosting};
pub use types::{
    AccountInfo, AccountKind, EntrySource, GeneralLedgerType, MONEY_SCALE, PostingInput,
    PostingScope,
};
