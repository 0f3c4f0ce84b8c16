//! Core ledger logic for Coopledger.
//!
//! This crate contains pure business logic with no database dependency.
//! Repositories in `coopledger-db` load rows, call into these modules, and
//! persist what they return.
//!
//! # Modules
//!
//! - `ledger` - Sign rule, posting scopes and running balances
//! - `snapshot` - Point-in-time account configuration
//! - `member_ledger` - Per-member summary upsert rule
//! - `daily_balance` - Sparse ledger to dense daily series
//! - `interest` - Series statistics and savings interest
//! - `account` - Account deletion guard
//! - `event` - Domain events

pub mod account;
pub mod daily_balance;
pub mod event;
pub mod interest;
pub mod ledger;
pub mod member_ledger;
pub mod snapshot;
