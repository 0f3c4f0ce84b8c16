//! Posting repository: the write side of the general ledger.
//!
//! Every posting runs inside a transaction owned by the caller. The scope of
//! the entry is locked, the prior balance is read `FOR UPDATE`, the next
//! running balance is computed by `coopledger_core`, and the entry plus the
//! member summary are written before control returns.

use chrono::{DateTime, Utc};
use coopledger_core::event::{EntityRef, LedgerEvent};
use coopledger_core::ledger::{
    LedgerError, PostingInput, PostingScope, PostingService, RunningBalance,
};
use coopledger_core::member_ledger::SummaryKey;
use coopledger_shared::types::{AccountId, LedgerEntryId, MemberProfileId};
use coopledger_shared::{AppError, ErrorKind};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use tracing::{debug, info};
use uuid::Uuid;

use super::member_ledger::{MemberLedgerError, MemberLedgerRepository};
use crate::convert;
use crate::entities::{accounts, general_ledger_entries, member_ledger_summaries};
use crate::lock;

/// Error types for posting operations.
#[derive(Debug, thiserror::Error)]
pub enum PostingError {
    /// The posting was rejected by the ledger rules.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// The entry does not exist.
    #[error("Ledger entry not found: {0}")]
    EntryNotFound(Uuid),

    /// The scope could not be locked, or a concurrent writer took the version.
    #[error("Lock conflict on {scope}: {source}")]
    LockConflict {
        /// Scope key.
        scope: String,
        /// Underlying database error.
        source: DbErr,
    },

    /// Keeping the member summary in step failed.
    #[error(transparent)]
    MemberLedger(#[from] MemberLedgerError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl PostingError {
    /// Returns the transport-agnostic class of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Ledger(e) => e.kind(),
            Self::EntryNotFound(_) => ErrorKind::NotFound,
            Self::LockConflict { .. } => ErrorKind::LockConflict,
            Self::MemberLedger(e) => e.kind(),
            Self::Database(_) => ErrorKind::Database,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Ledger(e) => e.error_code(),
            other => other.kind().error_code(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        self.kind().status_code()
    }

    /// Returns true if the whole transaction may be retried.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }

    fn from_locked(scope: &PostingScope, err: DbErr) -> Self {
        if lock::is_lock_conflict(&err) {
            Self::LockConflict {
                scope: scope.lock_key(),
                source: err,
            }
        } else {
            Self::Database(err)
        }
    }
}

impl From<PostingError> for AppError {
    fn from(err: PostingError) -> Self {
        Self::new(err.kind(), err.to_string())
    }
}

/// Result of a posting.
#[derive(Debug, Clone)]
pub struct PostedEntry {
    /// The persisted entry.
    pub entry: general_ledger_entries::Model,
    /// The member summary after the posting, for member-trackable scopes.
    pub summary: Option<member_ledger_summaries::Model>,
    /// What changed, in write order.
    pub events: Vec<LedgerEvent>,
}

/// Ledger repository for postings and balance reads.
#[derive(Debug, Clone)]
pub struct PostingRepository {
    db: DatabaseConnection,
    lock_timeout_ms: u64,
}

impl PostingRepository {
    /// Creates a new posting repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, lock_timeout_ms: u64) -> Self {
        Self {
            db,
            lock_timeout_ms,
        }
    }

    /// Appends one entry to the ledger inside `txn`.
    ///
    /// The balance is `previous + signed delta`, where the previous balance is
    /// read under lock. Nothing is committed here; dropping `txn` without
    /// committing discards the entry and the summary change together.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - An amount is negative or the account is unclassified, missing or deleted
    /// - The scope lock times out or a deadlock is detected (retryable)
    /// - Database operation fails
    pub async fn post_entry(
        &self,
        txn: &DatabaseTransaction,
        input: PostingInput,
    ) -> Result<PostedEntry, PostingError> {
        let account = accounts::Entity::find_by_id(input.account_id.into_inner())
            .one(txn)
            .await?
            .filter(|a| {
                a.organization_id == input.organization_id.into_inner()
                    && a.branch_id == input.branch_id.into_inner()
            })
            .ok_or(LedgerError::AccountNotFound(input.account_id))?;
        let info = convert::account_info(&account);

        // Fail fast on bad input before waiting on any lock.
        let scope = PostingService::resolve_scope(&input, &info)?;

        lock::set_lock_timeout(txn, self.lock_timeout_ms)
            .await
            .map_err(|e| PostingError::from_locked(&scope, e))?;
        lock::lock_scope(txn, &scope.lock_key())
            .await
            .map_err(|e| PostingError::from_locked(&scope, e))?;

        let previous = latest_in_scope(txn, &scope, true)
            .await
            .map_err(|e| PostingError::from_locked(&scope, e))?;
        let prepared = PostingService::prepare(&input, &info, previous.as_ref())?;

        let now = Utc::now();
        let entry_date = input.entry_date.unwrap_or(now);
        let entry_id = LedgerEntryId::new();

        let entry = general_ledger_entries::ActiveModel {
            id: Set(entry_id.into_inner()),
            organization_id: Set(input.organization_id.into_inner()),
            branch_id: Set(input.branch_id.into_inner()),
            account_id: Set(input.account_id.into_inner()),
            member_profile_id: Set(input.member_profile_id.map(MemberProfileId::into_inner)),
            scope_member_profile_id: Set(scope.member_profile_id.map(MemberProfileId::into_inner)),
            scope_version: Set(prepared.running.scope_version),
            debit: Set(input.debit),
            credit: Set(input.credit),
            previous_balance: Set(prepared.running.previous_balance),
            balance: Set(prepared.running.current_balance),
            entry_date: Set(convert::from_utc(entry_date)),
            source: Set(input.source.into()),
            reference_number: Set(input.reference_number.clone()),
            transaction_batch_id: Set(input.transaction_batch_id),
            description: Set(input.description.clone()),
            created_at: Set(convert::from_utc(now)),
            created_by: Set(input.created_by.into_inner()),
            deleted_at: Set(None),
        }
        .insert(txn)
        .await
        .map_err(|e| PostingError::from_locked(&scope, e))?;

        let mut events = vec![LedgerEvent::created(EntityRef::LedgerEntry {
            organization_id: input.organization_id,
            branch_id: input.branch_id,
            account_id: input.account_id,
            member_profile_id: input.member_profile_id,
            entry_id,
        })];

        let summary_key =
            SummaryKey::for_scope(&scope).filter(|_| prepared.updates_member_summary);
        let summary = match summary_key {
            Some(key) => {
                let (summary, event) = MemberLedgerRepository::upsert_on_posting(
                    txn,
                    &scope,
                    key,
                    prepared.running.current_balance,
                    entry_date,
                    input.created_by,
                )
                .await?;
                events.push(event);
                Some(summary)
            }
            None => None,
        };

        info!(
            entry_id = %entry_id,
            scope = %scope.lock_key(),
            scope_version = prepared.running.scope_version,
            debit = %input.debit,
            credit = %input.credit,
            balance = %prepared.running.current_balance,
            "Posted ledger entry"
        );

        Ok(PostedEntry {
            entry,
            summary,
            events,
        })
    }

    /// Current balance of a scope, zero when it has no entries.
    ///
    /// Reads without locking.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn balance_of(&self, scope: &PostingScope) -> Result<Decimal, PostingError> {
        let latest = latest_in_scope(&self.db, scope, false).await?;
        Ok(latest.map_or(Decimal::ZERO, |r| r.current_balance))
    }

    /// Entries of a scope, newest first, optionally limited to an
    /// `entry_date` range `[from, to)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn entries_for_scope(
        &self,
        scope: &PostingScope,
        range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> Result<Vec<general_ledger_entries::Model>, PostingError> {
        let mut query = general_ledger_entries::Entity::find().filter(scope_condition(scope));

        if let Some((from, to)) = range {
            query = query
                .filter(general_ledger_entries::Column::EntryDate.gte(convert::from_utc(from)))
                .filter(general_ledger_entries::Column::EntryDate.lt(convert::from_utc(to)));
        }

        let entries = query
            .order_by_desc(general_ledger_entries::Column::ScopeVersion)
            .all(&self.db)
            .await?;
        Ok(entries)
    }

    /// Flags an entry as deleted.
    ///
    /// The row and the running balance chain are untouched; the flag only
    /// affects how account deletion counts entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry does not exist or the update fails.
    pub async fn soft_delete_entry(
        &self,
        txn: &DatabaseTransaction,
        entry_id: LedgerEntryId,
    ) -> Result<general_ledger_entries::Model, PostingError> {
        let entry = general_ledger_entries::Entity::find_by_id(entry_id.into_inner())
            .one(txn)
            .await?
            .ok_or(PostingError::EntryNotFound(entry_id.into_inner()))?;

        if entry.deleted_at.is_some() {
            return Ok(entry);
        }

        let mut active: general_ledger_entries::ActiveModel = entry.into();
        active.deleted_at = Set(Some(convert::from_utc(Utc::now())));
        let updated = active.update(txn).await?;

        debug!(entry_id = %entry_id, "Soft-deleted ledger entry");
        Ok(updated)
    }

    /// Counts entries of an account as `(active, soft_deleted)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count_entries<C: ConnectionTrait>(
        conn: &C,
        account_id: AccountId,
    ) -> Result<(u64, u64), DbErr> {
        use sea_orm::PaginatorTrait;

        let active = general_ledger_entries::Entity::find()
            .filter(general_ledger_entries::Column::AccountId.eq(account_id.into_inner()))
            .filter(general_ledger_entries::Column::DeletedAt.is_null())
            .count(conn)
            .await?;
        let deleted = general_ledger_entries::Entity::find()
            .filter(general_ledger_entries::Column::AccountId.eq(account_id.into_inner()))
            .filter(general_ledger_entries::Column::DeletedAt.is_not_null())
            .count(conn)
            .await?;
        Ok((active, deleted))
    }
}

/// Filter selecting exactly the rows of one posting scope.
pub(crate) fn scope_condition(scope: &PostingScope) -> Condition {
    let base = Condition::all()
        .add(general_ledger_entries::Column::OrganizationId.eq(scope.organization_id.into_inner()))
        .add(general_ledger_entries::Column::BranchId.eq(scope.branch_id.into_inner()))
        .add(general_ledger_entries::Column::AccountId.eq(scope.account_id.into_inner()));

    match scope.member_profile_id {
        Some(member) => base.add(
            general_ledger_entries::Column::ScopeMemberProfileId.eq(member.into_inner()),
        ),
        None => base.add(general_ledger_entries::Column::ScopeMemberProfileId.is_null()),
    }
}

/// Latest running balance of a scope, optionally locking its row.
pub(crate) async fn latest_in_scope<C: ConnectionTrait>(
    conn: &C,
    scope: &PostingScope,
    for_update: bool,
) -> Result<Option<RunningBalance>, DbErr> {
    let mut query = general_ledger_entries::Entity::find()
        .filter(scope_condition(scope))
        .order_by_desc(general_ledger_entries::Column::ScopeVersion)
        .limit(1);

    if for_update {
        query = query.lock_exclusive();
    }

    let latest = query.one(conn).await?;
    Ok(latest.map(|entry| RunningBalance {
        scope_version: entry.scope_version,
        previous_balance: entry.previous_balance,
        current_balance: entry.balance,
    }))
}
