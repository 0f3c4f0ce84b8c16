//! Daily balance reconstruction over stored ledger entries.

use chrono::NaiveDate;
use chrono_tz::Tz;
use coopledger_core::daily_balance::{self, BalanceError, DailySeries, DatedBalance};
use coopledger_core::ledger::PostingScope;
use coopledger_shared::types::BranchId;
use coopledger_shared::{AppError, ErrorKind};
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use tracing::debug;

use super::posting::scope_condition;
use crate::convert;
use crate::entities::{branches, general_ledger_entries};

/// Error types for daily balance reads.
#[derive(Debug, thiserror::Error)]
pub enum DailyBalanceError {
    /// The requested window is invalid.
    #[error(transparent)]
    Balance(#[from] BalanceError),

    /// Branch not found.
    #[error("Branch not found: {0}")]
    BranchNotFound(BranchId),

    /// The branch carries a time zone name chrono-tz does not know.
    #[error("Branch {0} has unknown time zone '{1}'")]
    UnknownTimeZone(BranchId, String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl DailyBalanceError {
    /// Returns the transport-agnostic class of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Balance(_) => ErrorKind::Validation,
            Self::BranchNotFound(_) => ErrorKind::NotFound,
            Self::UnknownTimeZone(..) => ErrorKind::InvalidState,
            Self::Database(_) => ErrorKind::Database,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Balance(e) => e.error_code(),
            Self::BranchNotFound(_) => "BRANCH_NOT_FOUND",
            Self::UnknownTimeZone(..) => "UNKNOWN_TIME_ZONE",
            Self::Database(_) => self.kind().error_code(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        self.kind().status_code()
    }
}

impl From<DailyBalanceError> for AppError {
    fn from(err: DailyBalanceError) -> Self {
        Self::new(err.kind(), err.to_string())
    }
}

/// Reads dense daily balance series from the ledger.
#[derive(Debug, Clone)]
pub struct DailyBalanceRepository {
    db: DatabaseConnection,
}

impl DailyBalanceRepository {
    /// Creates a new daily balance repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// One closing balance per calendar day of `[from, to]` in the branch
    /// time zone.
    ///
    /// The first day starts from the balance of the last entry before `from`,
    /// zero when there is none.
    ///
    /// Balances follow the append-only chain, soft-deleted entries included:
    /// a soft delete never rewrites the running balance, so the series always
    /// agrees with `PostingRepository::balance_of`.
    ///
    /// # Errors
    ///
    /// Returns an error if `to < from`, the branch is unknown, or a query fails.
    pub async fn daily_ending_balances(
        &self,
        scope: &PostingScope,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<DailySeries, DailyBalanceError> {
        series_for_scope(&self.db, scope, from, to).await
    }

    /// Time zone a branch counts calendar days in.
    ///
    /// # Errors
    ///
    /// Returns an error if the branch is unknown or its zone does not parse.
    pub async fn branch_time_zone(&self, branch_id: BranchId) -> Result<Tz, DailyBalanceError> {
        branch_time_zone(&self.db, branch_id).await
    }
}

pub(crate) async fn branch_time_zone<C: ConnectionTrait>(
    conn: &C,
    branch_id: BranchId,
) -> Result<Tz, DailyBalanceError> {
    let branch = branches::Entity::find_by_id(branch_id.into_inner())
        .one(conn)
        .await?
        .ok_or(DailyBalanceError::BranchNotFound(branch_id))?;
    branch
        .timezone
        .parse::<Tz>()
        .map_err(|_| DailyBalanceError::UnknownTimeZone(branch_id, branch.timezone.clone()))
}

/// Both queries read every entry of the scope; `deleted_at` is not filtered
/// because the stored balances already count soft-deleted rows.
pub(crate) async fn series_for_scope<C: ConnectionTrait>(
    conn: &C,
    scope: &PostingScope,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<DailySeries, DailyBalanceError> {
    let tz = branch_time_zone(conn, scope.branch_id).await?;
    let (start, end) = daily_balance::window_bounds(from, to, tz)?;

    let opening = general_ledger_entries::Entity::find()
        .filter(scope_condition(scope))
        .filter(general_ledger_entries::Column::EntryDate.lt(convert::from_utc(start)))
        .order_by_desc(general_ledger_entries::Column::EntryDate)
        .order_by_desc(general_ledger_entries::Column::ScopeVersion)
        .limit(1)
        .one(conn)
        .await?
        .map_or(Decimal::ZERO, |entry| entry.balance);

    let entries = general_ledger_entries::Entity::find()
        .filter(scope_condition(scope))
        .filter(general_ledger_entries::Column::EntryDate.gte(convert::from_utc(start)))
        .filter(general_ledger_entries::Column::EntryDate.lt(convert::from_utc(end)))
        .all(conn)
        .await?;

    let closings = daily_balance::collapse_latest_per_day(
        entries.iter().map(|entry| DatedBalance {
            at: convert::to_utc(&entry.entry_date),
            sequence: entry.scope_version,
            balance: entry.balance,
        }),
        tz,
    );

    debug!(
        scope = %scope.lock_key(),
        %from,
        %to,
        entries = entries.len(),
        active_days = closings.len(),
        "Rebuilt daily balances"
    );

    Ok(daily_balance::densify(from, to, opening, &closings)?)
}
