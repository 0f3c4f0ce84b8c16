//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.
//! Writes take the caller's `&DatabaseTransaction`; reads use the pool.

pub mod account;
pub mod daily_balance;
pub mod interest_batch;
pub mod member_ledger;
pub mod posting;
pub mod snapshot;

pub use account::{AccountError, AccountRepository, CreateAccountInput, UpdateAccountInput};
pub use daily_balance::{DailyBalanceError, DailyBalanceRepository};
pub use interest_batch::{
    CreateBatchInput, GeneratedBatch, InterestBatchError, InterestBatchRepository, RecordedEntry,
};
pub use member_ledger::{
    ConsistencyReport, MemberLedgerError, MemberLedgerRepository, SummaryFilter,
};
pub use posting::{PostedEntry, PostingError, PostingRepository};
pub use snapshot::{SnapshotError, SnapshotFilter, SnapshotRepository};
