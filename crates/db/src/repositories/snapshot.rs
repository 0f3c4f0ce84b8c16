//! Account snapshot repository.
//!
//! Snapshots are insert-only. Each row copies a committed account state and
//! its `valid_from` is the moment that state took effect, so the newest
//! snapshot always matches the live `accounts` row.

use chrono::{DateTime, Utc};
use coopledger_core::snapshot::{self, AccountSnapshot, ChangeType, Resolved};
use coopledger_shared::types::{AccountId, AccountSnapshotId, BranchId, OrganizationId, UserId};
use coopledger_shared::{AppError, ErrorKind};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr,
    EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::{debug, warn};

use crate::convert;
use crate::entities::{account_snapshots, accounts};

/// Error types for snapshot operations.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl SnapshotError {
    /// Returns the transport-agnostic class of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::AccountNotFound(_) => ErrorKind::NotFound,
            Self::Database(_) => ErrorKind::Database,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::Database(_) => self.kind().error_code(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        self.kind().status_code()
    }
}

impl From<SnapshotError> for AppError {
    fn from(err: SnapshotError) -> Self {
        Self::new(err.kind(), err.to_string())
    }
}

/// Filter for [`SnapshotRepository::effective_for_filter`].
#[derive(Debug, Clone, Default)]
pub struct SnapshotFilter {
    /// Only accounts linked to this loan account.
    pub loan_account_id: Option<AccountId>,
    /// Only accounts in this currency.
    pub currency_code: Option<String>,
}

/// Account snapshot repository.
#[derive(Debug, Clone)]
pub struct SnapshotRepository {
    db: DatabaseConnection,
}

impl SnapshotRepository {
    /// Creates a new snapshot repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Records a copy of the account's terms as just written.
    ///
    /// Call after the row change lands; `valid_from` is the row's
    /// `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn snapshot(
        txn: &DatabaseTransaction,
        account: &accounts::Model,
        change_type: ChangeType,
        changed_fields: &[&str],
        reason: Option<String>,
        actor: UserId,
    ) -> Result<account_snapshots::Model, SnapshotError> {
        let now = convert::from_utc(Utc::now());
        let row = account_snapshots::ActiveModel {
            id: Set(AccountSnapshotId::new().into_inner()),
            account_id: Set(account.id),
            organization_id: Set(account.organization_id),
            branch_id: Set(account.branch_id),
            change_type: Set(change_type.into()),
            change_reason: Set(reason),
            changed_fields: Set(serde_json::json!(changed_fields)),
            name: Set(account.name.clone()),
            description: Set(account.description.clone()),
            general_ledger_type: Set(account.general_ledger_type),
            kind: Set(account.kind),
            currency_code: Set(account.currency_code.clone()),
            member_type_id: Set(account.member_type_id),
            loan_account_id: Set(account.loan_account_id),
            min_amount: Set(account.min_amount),
            max_amount: Set(account.max_amount),
            interest_rate: Set(account.interest_rate),
            minimum_balance: Set(account.minimum_balance),
            below_minimum_charge: Set(account.below_minimum_charge),
            interest_standard: Set(account.interest_standard),
            interest_secured: Set(account.interest_secured),
            fines_amortization: Set(account.fines_amortization),
            fines_maturity: Set(account.fines_maturity),
            grace_period_amortization: Set(account.grace_period_amortization),
            grace_period_maturity: Set(account.grace_period_maturity),
            cut_off_days: Set(account.cut_off_days),
            cut_off_months: Set(account.cut_off_months),
            is_internal: Set(account.is_internal),
            cash_on_hand: Set(account.cash_on_hand),
            paid_up_share_capital: Set(account.paid_up_share_capital),
            is_taxable: Set(account.is_taxable),
            valid_from: Set(account.updated_at),
            created_at: Set(now),
            created_by: Set(actor.into_inner()),
        }
        .insert(txn)
        .await?;

        debug!(
            account_id = %account.id,
            change_type = ?change_type,
            changed = changed_fields.len(),
            "Recorded account snapshot"
        );
        Ok(row)
    }

    /// Terms of an account as they were at `as_of`, now when `None`.
    ///
    /// Falls back to the live row, flagged approximate, when no snapshot
    /// predates `as_of`.
    ///
    /// # Errors
    ///
    /// Returns an error if the account does not exist or a query fails.
    pub async fn effective_at(
        &self,
        account_id: AccountId,
        as_of: Option<DateTime<Utc>>,
    ) -> Result<Resolved<AccountSnapshot>, SnapshotError> {
        effective_at(&self.db, account_id, as_of.unwrap_or_else(Utc::now)).await
    }

    /// Every snapshot of an account, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn history(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<account_snapshots::Model>, SnapshotError> {
        let rows = account_snapshots::Entity::find()
            .filter(account_snapshots::Column::AccountId.eq(account_id.into_inner()))
            .order_by_desc(account_snapshots::Column::ValidFrom)
            .order_by_desc(account_snapshots::Column::Id)
            .all(&self.db)
            .await?;
        Ok(rows)
    }

    /// Latest snapshot per account of a branch at `as_of`.
    ///
    /// Accounts whose effective snapshot is a deletion are left out.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn effective_for_filter(
        &self,
        organization_id: OrganizationId,
        branch_id: BranchId,
        as_of: DateTime<Utc>,
        filter: &SnapshotFilter,
    ) -> Result<Vec<AccountSnapshot>, SnapshotError> {
        let mut query = account_snapshots::Entity::find()
            .filter(account_snapshots::Column::OrganizationId.eq(organization_id.into_inner()))
            .filter(account_snapshots::Column::BranchId.eq(branch_id.into_inner()))
            .filter(account_snapshots::Column::ValidFrom.lte(convert::from_utc(as_of)));

        if let Some(loan) = filter.loan_account_id {
            query = query.filter(account_snapshots::Column::LoanAccountId.eq(loan.into_inner()));
        }
        if let Some(currency) = &filter.currency_code {
            query = query.filter(account_snapshots::Column::CurrencyCode.eq(currency.as_str()));
        }

        let rows: Vec<AccountSnapshot> = query
            .order_by_asc(account_snapshots::Column::ValidFrom)
            .order_by_asc(account_snapshots::Column::Id)
            .all(&self.db)
            .await?
            .iter()
            .map(convert::snapshot_from_row)
            .collect();

        Ok(snapshot::latest_per_key(&rows, as_of, |s| s.account_id)
            .into_iter()
            .filter(|s| s.change_type != ChangeType::Deleted)
            .cloned()
            .collect())
    }

    /// Snapshots of a branch recorded in `[from, to]`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn changed_in_range(
        &self,
        organization_id: OrganizationId,
        branch_id: BranchId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<account_snapshots::Model>, SnapshotError> {
        let rows = account_snapshots::Entity::find()
            .filter(account_snapshots::Column::OrganizationId.eq(organization_id.into_inner()))
            .filter(account_snapshots::Column::BranchId.eq(branch_id.into_inner()))
            .filter(account_snapshots::Column::ValidFrom.gte(convert::from_utc(from)))
            .filter(account_snapshots::Column::ValidFrom.lte(convert::from_utc(to)))
            .order_by_asc(account_snapshots::Column::ValidFrom)
            .all(&self.db)
            .await?;
        Ok(rows)
    }
}

/// Resolves the terms of an account at `as_of` on any connection.
pub(crate) async fn effective_at<C: ConnectionTrait>(
    conn: &C,
    account_id: AccountId,
    as_of: DateTime<Utc>,
) -> Result<Resolved<AccountSnapshot>, SnapshotError> {
    let found = account_snapshots::Entity::find()
        .filter(account_snapshots::Column::AccountId.eq(account_id.into_inner()))
        .filter(account_snapshots::Column::ValidFrom.lte(convert::from_utc(as_of)))
        .order_by_desc(account_snapshots::Column::ValidFrom)
        .order_by_desc(account_snapshots::Column::Id)
        .one(conn)
        .await?
        .map(|row| convert::snapshot_from_row(&row));

    let live = if found.is_none() {
        accounts::Entity::find_by_id(account_id.into_inner())
            .one(conn)
            .await?
    } else {
        None
    };

    let resolved = snapshot::resolve_effective(found, || {
        live.as_ref().map(|row| AccountSnapshot {
            account_id,
            change_type: if row.deleted_at.is_some() {
                ChangeType::Deleted
            } else {
                ChangeType::Updated
            },
            recorded_at: convert::to_utc(&row.updated_at),
            terms: convert::account_terms(row),
        })
    })
    .ok_or(SnapshotError::AccountNotFound(account_id))?;

    if !resolved.is_exact() {
        warn!(
            account_id = %account_id,
            as_of = %as_of,
            "No snapshot at or before as_of, using live account row"
        );
    }
    Ok(resolved)
}
