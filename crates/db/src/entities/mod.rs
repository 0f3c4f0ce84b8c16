//! `SeaORM` entity definitions, one module per table.

#![allow(missing_docs)]

pub mod account_snapshots;
pub mod accounts;
pub mod branches;
pub mod general_ledger_entries;
pub mod interest_batch_entries;
pub mod interest_batches;
pub mod member_ledger_summaries;
pub mod member_profiles;
pub mod organizations;
pub mod sea_orm_active_enums;
