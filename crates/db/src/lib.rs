//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Repositories for postings, snapshots, member summaries, daily balances
//!   and interest batches
//! - Database migrations
//! - [`LedgerServices`], the one object callers pass around

pub mod convert;
pub mod entities;
pub mod lock;
pub mod migration;
pub mod repositories;

use std::time::Duration;

use coopledger_core::interest::InterestPolicy;
use coopledger_shared::AppConfig;
use coopledger_shared::config::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use tracing::info;

pub use repositories::{
    AccountRepository, DailyBalanceRepository, InterestBatchRepository, MemberLedgerRepository,
    PostingRepository, SnapshotRepository,
};

/// Establishes a connection pool to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);

    let db = Database::connect(options).await?;
    info!(
        max_connections = config.max_connections,
        "Connected to database"
    );
    Ok(db)
}

/// Every repository, built once and shared by reference.
#[derive(Debug, Clone)]
pub struct LedgerServices {
    db: DatabaseConnection,
    /// Chart of accounts.
    pub accounts: AccountRepository,
    /// Ledger postings and balances.
    pub postings: PostingRepository,
    /// Account history.
    pub snapshots: SnapshotRepository,
    /// Per-member summaries.
    pub member_ledger: MemberLedgerRepository,
    /// Daily balance series.
    pub daily_balances: DailyBalanceRepository,
    /// Savings interest runs.
    pub interest_batches: InterestBatchRepository,
}

impl LedgerServices {
    /// Builds the repositories over one connection pool.
    #[must_use]
    pub fn new(db: DatabaseConnection, config: &AppConfig) -> Self {
        let policy = InterestPolicy {
            annual_divisor: config.interest.annual_divisor,
            minimum_period_days: config.interest.minimum_period_days,
        };
        Self {
            accounts: AccountRepository::new(db.clone()),
            postings: PostingRepository::new(db.clone(), config.database.lock_timeout_ms),
            snapshots: SnapshotRepository::new(db.clone()),
            member_ledger: MemberLedgerRepository::new(db.clone()),
            daily_balances: DailyBalanceRepository::new(db.clone()),
            interest_batches: InterestBatchRepository::new(db.clone(), policy),
            db,
        }
    }

    /// Connects with `config.database` and builds the repositories.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub async fn connect(config: &AppConfig) -> Result<Self, DbErr> {
        let db = connect(&config.database).await?;
        Ok(Self::new(db, config))
    }

    /// The underlying pool, for opening transactions.
    #[must_use]
    pub const fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}
