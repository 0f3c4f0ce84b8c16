//! Savings interest batch repository.
//!
//! A batch fixes a window, filters and a computation type. Generating it
//! rebuilds the daily series of every matching member account, computes the
//! interest with the terms in force at the end of the window, and stores one
//! entry per pair. Nothing here posts to the ledger.

use chrono::{NaiveDate, Utc};
use coopledger_core::daily_balance::{self, BalanceError, DailySeries};
use coopledger_core::event::{EntityRef, LedgerEvent};
use coopledger_core::interest::{
    self, ComputationType, InterestError, InterestPolicy, InterestTerms, SeriesStats,
};
use coopledger_core::ledger::PostingScope;
use coopledger_core::member_ledger::SummaryKey;
use coopledger_core::snapshot::ChangeType;
use coopledger_shared::types::{
    AccountId, BranchId, InterestBatchEntryId, InterestBatchId, MemberProfileId, MemberTypeId,
    OrganizationId, UserId,
};
use coopledger_shared::{AppError, ErrorKind};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use tracing::{debug, info};

use super::daily_balance::{self as daily, DailyBalanceError};
use super::member_ledger::{self, SummaryFilter};
use super::snapshot::{self as snapshots, SnapshotError};
use crate::convert;
use crate::entities::{interest_batch_entries, interest_batches};

/// Error types for interest batch operations.
#[derive(Debug, thiserror::Error)]
pub enum InterestBatchError {
    /// Batch not found.
    #[error("Interest batch not found: {0}")]
    BatchNotFound(InterestBatchId),

    /// Batch entry not found.
    #[error("Interest batch entry not found: {0}")]
    EntryNotFound(InterestBatchEntryId),

    /// The batch was already posted and can no longer change.
    #[error("Interest batch {0} is already posted")]
    AlreadyPosted(InterestBatchId),

    /// The computation rejected its inputs.
    #[error(transparent)]
    Interest(#[from] InterestError),

    /// The window is invalid.
    #[error(transparent)]
    Window(#[from] BalanceError),

    /// Rebuilding a daily series failed.
    #[error(transparent)]
    DailyBalance(#[from] DailyBalanceError),

    /// Resolving account terms failed.
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl InterestBatchError {
    /// Returns the transport-agnostic class of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::BatchNotFound(_) | Self::EntryNotFound(_) => ErrorKind::NotFound,
            Self::AlreadyPosted(_) => ErrorKind::InvalidState,
            Self::Interest(_) | Self::Window(_) => ErrorKind::Validation,
            Self::DailyBalance(e) => e.kind(),
            Self::Snapshot(e) => e.kind(),
            Self::Database(_) => ErrorKind::Database,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::BatchNotFound(_) => "INTEREST_BATCH_NOT_FOUND",
            Self::EntryNotFound(_) => "INTEREST_BATCH_ENTRY_NOT_FOUND",
            Self::AlreadyPosted(_) => "INTEREST_BATCH_POSTED",
            Self::Interest(e) => e.error_code(),
            Self::Window(e) => e.error_code(),
            Self::DailyBalance(e) => e.error_code(),
            Self::Snapshot(e) => e.error_code(),
            Self::Database(_) => self.kind().error_code(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        self.kind().status_code()
    }
}

impl From<InterestBatchError> for AppError {
    fn from(err: InterestBatchError) -> Self {
        Self::new(err.kind(), err.to_string())
    }
}

/// Input for creating a batch.
#[derive(Debug, Clone)]
pub struct CreateBatchInput {
    /// Owning organization.
    pub organization_id: OrganizationId,
    /// Owning branch.
    pub branch_id: BranchId,
    /// Document number shown on reports.
    pub document_no: String,
    /// First day of the window.
    pub last_computation_date: NaiveDate,
    /// Last day of the window.
    pub new_computation_date: NaiveDate,
    /// Only this account.
    pub account_id: Option<AccountId>,
    /// Only members of this type.
    pub member_type_id: Option<MemberTypeId>,
    /// How the base balance is chosen.
    pub computation_type: ComputationType,
    /// Include summaries of closed member profiles.
    pub include_closed_accounts: bool,
    /// Withholding tax rate on interest.
    pub interest_tax_rate: Decimal,
    /// Acting user.
    pub created_by: UserId,
}

/// Figures supplied for one pair instead of being computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedEntry {
    /// Member and account.
    pub key: SummaryKey,
    /// Statistics of the pair's window.
    pub stats: SeriesStats,
    /// Interest amount.
    pub interest: Decimal,
    /// Tax withheld.
    pub tax: Decimal,
}

/// Result of a generation run.
#[derive(Debug, Clone)]
pub struct GeneratedBatch {
    /// The batch with refreshed totals.
    pub batch: interest_batches::Model,
    /// Entries written by this run.
    pub entries: Vec<interest_batch_entries::Model>,
    /// Pairs that produced no entry.
    pub skipped: usize,
    /// What changed.
    pub events: Vec<LedgerEvent>,
}

/// Interest batch repository.
#[derive(Debug, Clone)]
pub struct InterestBatchRepository {
    db: DatabaseConnection,
    policy: InterestPolicy,
}

impl InterestBatchRepository {
    /// Creates a new interest batch repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, policy: InterestPolicy) -> Self {
        Self { db, policy }
    }

    /// Creates an empty batch.
    ///
    /// # Errors
    ///
    /// Returns an error if the window is inverted, the tax rate is negative,
    /// or the insert fails.
    pub async fn create_batch(
        &self,
        txn: &DatabaseTransaction,
        input: CreateBatchInput,
    ) -> Result<(interest_batches::Model, LedgerEvent), InterestBatchError> {
        if input.new_computation_date < input.last_computation_date {
            return Err(BalanceError::InvertedRange {
                from: input.last_computation_date,
                to: input.new_computation_date,
            }
            .into());
        }
        if input.interest_tax_rate < Decimal::ZERO {
            return Err(InterestError::NegativeRate.into());
        }

        let batch = interest_batches::ActiveModel {
            id: Set(InterestBatchId::new().into_inner()),
            organization_id: Set(input.organization_id.into_inner()),
            branch_id: Set(input.branch_id.into_inner()),
            document_no: Set(input.document_no),
            last_computation_date: Set(input.last_computation_date),
            new_computation_date: Set(input.new_computation_date),
            account_id: Set(input.account_id.map(AccountId::into_inner)),
            member_type_id: Set(input.member_type_id.map(MemberTypeId::into_inner)),
            computation_type: Set(input.computation_type.into()),
            include_closed_accounts: Set(input.include_closed_accounts),
            interest_tax_rate: Set(input.interest_tax_rate),
            total_interest: Set(Decimal::ZERO),
            total_tax: Set(Decimal::ZERO),
            created_at: Set(convert::from_utc(Utc::now())),
            created_by: Set(input.created_by.into_inner()),
            posted_at: Set(None),
        }
        .insert(txn)
        .await?;

        info!(
            batch_id = %batch.id,
            document_no = %batch.document_no,
            computation_type = ?input.computation_type,
            "Created interest batch"
        );
        let event = LedgerEvent::created(batch_ref(&batch));
        Ok((batch, event))
    }

    /// Computes and stores the entries of a batch.
    ///
    /// Running it again replaces the computed entries and keeps the ones
    /// recorded with supplied figures.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch is missing or posted, a series cannot be
    /// rebuilt, or a write fails.
    pub async fn generate_entries(
        &self,
        txn: &DatabaseTransaction,
        batch_id: InterestBatchId,
    ) -> Result<GeneratedBatch, InterestBatchError> {
        let batch = find_unposted(txn, batch_id).await?;
        let from = batch.last_computation_date;
        let to = batch.new_computation_date;
        let organization_id = OrganizationId::from_uuid(batch.organization_id);
        let branch_id = BranchId::from_uuid(batch.branch_id);
        let computation: ComputationType = batch.computation_type.into();

        let tz = daily::branch_time_zone(txn, branch_id).await?;
        let (_, window_end) = daily_balance::window_bounds(from, to, tz)?;

        interest_batch_entries::Entity::delete_many()
            .filter(interest_batch_entries::Column::InterestBatchId.eq(batch.id))
            .filter(interest_batch_entries::Column::Computed.eq(true))
            .exec(txn)
            .await?;
        let recorded: Vec<(uuid::Uuid, uuid::Uuid)> = interest_batch_entries::Entity::find()
            .filter(interest_batch_entries::Column::InterestBatchId.eq(batch.id))
            .all(txn)
            .await?
            .into_iter()
            .map(|e| (e.member_profile_id, e.account_id))
            .collect();

        let summaries = member_ledger::query_summaries(
            txn,
            SummaryFilter {
                organization_id: Some(organization_id),
                branch_id: Some(branch_id),
                account_id: batch.account_id.map(AccountId::from_uuid),
                member_type_id: batch.member_type_id.map(MemberTypeId::from_uuid),
                include_closed: batch.include_closed_accounts,
            },
        )
        .await?;

        let mut entries = Vec::new();
        let mut skipped = 0usize;
        for summary in &summaries {
            if recorded.contains(&(summary.member_profile_id, summary.account_id)) {
                continue;
            }

            let account_id = AccountId::from_uuid(summary.account_id);
            let resolved = snapshots::effective_at(txn, account_id, window_end).await?;
            let snapshot = resolved.value();
            if snapshot.change_type == ChangeType::Deleted {
                skipped += 1;
                continue;
            }

            let scope = PostingScope {
                organization_id,
                branch_id,
                account_id,
                member_profile_id: Some(MemberProfileId::from_uuid(summary.member_profile_id)),
            };
            let series = daily::series_for_scope(txn, &scope, from, to).await?;
            let stats = series.stats();
            let terms = InterestTerms {
                rate: snapshot.terms.interest_rate,
                tax_rate: batch.interest_tax_rate,
                taxable: snapshot.terms.is_taxable,
                minimum_balance: snapshot.terms.minimum_balance,
                below_minimum_charge: snapshot.terms.below_minimum_charge,
            };

            let Some(outcome) =
                interest::compute_interest(computation, &series, &stats, &terms, &self.policy)?
            else {
                skipped += 1;
                continue;
            };

            debug!(
                member_profile_id = %summary.member_profile_id,
                account_id = %summary.account_id,
                base = %outcome.base_balance,
                interest = %outcome.interest,
                tax = %outcome.tax,
                exact_terms = resolved.is_exact(),
                "Computed interest"
            );

            let entry = insert_entry(
                txn,
                batch.id,
                summary.member_profile_id,
                summary.account_id,
                &stats,
                outcome.interest,
                outcome.tax,
                true,
            )
            .await?;
            entries.push(entry);
        }

        let batch = refresh_totals(txn, batch).await?;

        info!(
            batch_id = %batch_id,
            pairs = summaries.len(),
            generated = entries.len(),
            skipped,
            total_interest = %batch.total_interest,
            total_tax = %batch.total_tax,
            "Generated interest batch entries"
        );

        let events = vec![LedgerEvent::updated(batch_ref(&batch))];
        Ok(GeneratedBatch {
            batch,
            entries,
            skipped,
            events,
        })
    }

    /// Stores an entry with supplied figures instead of computed ones.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch is missing or posted, the pair already
    /// has an entry, or the insert fails.
    pub async fn record_entry(
        &self,
        txn: &DatabaseTransaction,
        batch_id: InterestBatchId,
        recorded: RecordedEntry,
    ) -> Result<interest_batch_entries::Model, InterestBatchError> {
        let batch = find_unposted(txn, batch_id).await?;
        let entry = insert_entry(
            txn,
            batch.id,
            recorded.key.member_profile_id.into_inner(),
            recorded.key.account_id.into_inner(),
            &recorded.stats,
            recorded.interest,
            recorded.tax,
            false,
        )
        .await?;
        refresh_totals(txn, batch).await?;

        info!(
            batch_id = %batch_id,
            member_profile_id = %recorded.key.member_profile_id,
            account_id = %recorded.key.account_id,
            interest = %recorded.interest,
            "Recorded interest batch entry"
        );
        Ok(entry)
    }

    /// Rebuilds the daily series and statistics behind a stored entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry or its batch is missing, or the series
    /// cannot be rebuilt.
    pub async fn daily_balances(
        &self,
        entry_id: InterestBatchEntryId,
    ) -> Result<(DailySeries, SeriesStats), InterestBatchError> {
        let entry = interest_batch_entries::Entity::find_by_id(entry_id.into_inner())
            .one(&self.db)
            .await?
            .ok_or(InterestBatchError::EntryNotFound(entry_id))?;
        let batch = interest_batches::Entity::find_by_id(entry.interest_batch_id)
            .one(&self.db)
            .await?
            .ok_or(InterestBatchError::BatchNotFound(InterestBatchId::from_uuid(
                entry.interest_batch_id,
            )))?;

        let scope = PostingScope {
            organization_id: OrganizationId::from_uuid(batch.organization_id),
            branch_id: BranchId::from_uuid(batch.branch_id),
            account_id: AccountId::from_uuid(entry.account_id),
            member_profile_id: Some(MemberProfileId::from_uuid(entry.member_profile_id)),
        };
        let series = daily::series_for_scope(
            &self.db,
            &scope,
            batch.last_computation_date,
            batch.new_computation_date,
        )
        .await?;
        let stats = series.stats();
        Ok((series, stats))
    }

    /// Finds a batch by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(
        &self,
        batch_id: InterestBatchId,
    ) -> Result<Option<interest_batches::Model>, InterestBatchError> {
        let batch = interest_batches::Entity::find_by_id(batch_id.into_inner())
            .one(&self.db)
            .await?;
        Ok(batch)
    }

    /// All entries of a batch by member, then account.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn entries(
        &self,
        batch_id: InterestBatchId,
    ) -> Result<Vec<interest_batch_entries::Model>, InterestBatchError> {
        let entries = interest_batch_entries::Entity::find()
            .filter(interest_batch_entries::Column::InterestBatchId.eq(batch_id.into_inner()))
            .order_by_asc(interest_batch_entries::Column::MemberProfileId)
            .order_by_asc(interest_batch_entries::Column::AccountId)
            .all(&self.db)
            .await?;
        Ok(entries)
    }

    /// Entries of a batch for one account.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn entries_by_account(
        &self,
        batch_id: InterestBatchId,
        account_id: AccountId,
    ) -> Result<Vec<interest_batch_entries::Model>, InterestBatchError> {
        let entries = interest_batch_entries::Entity::find()
            .filter(interest_batch_entries::Column::InterestBatchId.eq(batch_id.into_inner()))
            .filter(interest_batch_entries::Column::AccountId.eq(account_id.into_inner()))
            .order_by_asc(interest_batch_entries::Column::MemberProfileId)
            .all(&self.db)
            .await?;
        Ok(entries)
    }

    /// Entries of a batch for one member.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn entries_by_member(
        &self,
        batch_id: InterestBatchId,
        member_profile_id: MemberProfileId,
    ) -> Result<Vec<interest_batch_entries::Model>, InterestBatchError> {
        let entries = interest_batch_entries::Entity::find()
            .filter(interest_batch_entries::Column::InterestBatchId.eq(batch_id.into_inner()))
            .filter(
                interest_batch_entries::Column::MemberProfileId.eq(member_profile_id.into_inner()),
            )
            .order_by_asc(interest_batch_entries::Column::AccountId)
            .all(&self.db)
            .await?;
        Ok(entries)
    }

    /// Entries whose ending balance lies in `[min, max]`, smallest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn entries_by_ending_balance(
        &self,
        batch_id: InterestBatchId,
        min: Decimal,
        max: Decimal,
    ) -> Result<Vec<interest_batch_entries::Model>, InterestBatchError> {
        let entries = interest_batch_entries::Entity::find()
            .filter(interest_batch_entries::Column::InterestBatchId.eq(batch_id.into_inner()))
            .filter(interest_batch_entries::Column::EndingBalance.between(min, max))
            .order_by_asc(interest_batch_entries::Column::EndingBalance)
            .all(&self.db)
            .await?;
        Ok(entries)
    }

    /// Marks a batch as posted. Posting the interest itself is the caller's
    /// job.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch is missing or already posted.
    pub async fn mark_posted(
        &self,
        txn: &DatabaseTransaction,
        batch_id: InterestBatchId,
    ) -> Result<(interest_batches::Model, LedgerEvent), InterestBatchError> {
        let batch = find_unposted(txn, batch_id).await?;
        let mut active: interest_batches::ActiveModel = batch.into();
        active.posted_at = Set(Some(convert::from_utc(Utc::now())));
        let batch = active.update(txn).await?;

        info!(batch_id = %batch_id, "Marked interest batch as posted");
        let event = LedgerEvent::updated(batch_ref(&batch));
        Ok((batch, event))
    }
}

fn batch_ref(batch: &interest_batches::Model) -> EntityRef {
    EntityRef::InterestBatch {
        organization_id: OrganizationId::from_uuid(batch.organization_id),
        branch_id: BranchId::from_uuid(batch.branch_id),
        batch_id: InterestBatchId::from_uuid(batch.id),
    }
}

async fn find_unposted(
    txn: &DatabaseTransaction,
    batch_id: InterestBatchId,
) -> Result<interest_batches::Model, InterestBatchError> {
    let batch = interest_batches::Entity::find_by_id(batch_id.into_inner())
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or(InterestBatchError::BatchNotFound(batch_id))?;
    if batch.posted_at.is_some() {
        return Err(InterestBatchError::AlreadyPosted(batch_id));
    }
    Ok(batch)
}

#[allow(clippy::too_many_arguments)]
async fn insert_entry(
    txn: &DatabaseTransaction,
    batch_id: uuid::Uuid,
    member_profile_id: uuid::Uuid,
    account_id: uuid::Uuid,
    stats: &SeriesStats,
    interest: Decimal,
    tax: Decimal,
    computed: bool,
) -> Result<interest_batch_entries::Model, DbErr> {
    interest_batch_entries::ActiveModel {
        id: Set(InterestBatchEntryId::new().into_inner()),
        interest_batch_id: Set(batch_id),
        account_id: Set(account_id),
        member_profile_id: Set(member_profile_id),
        beginning_balance: Set(stats.beginning_balance),
        ending_balance: Set(stats.ending_balance),
        average_daily_balance: Set(stats.average_daily_balance),
        lowest_balance: Set(stats.lowest_balance),
        highest_balance: Set(stats.highest_balance),
        day_count: Set(i32::try_from(stats.day_count).unwrap_or(i32::MAX)),
        interest_amount: Set(interest),
        interest_tax: Set(tax),
        balance_after_interest: Set(stats.ending_balance + interest - tax),
        computed: Set(computed),
        created_at: Set(convert::from_utc(Utc::now())),
    }
    .insert(txn)
    .await
}

async fn refresh_totals(
    txn: &DatabaseTransaction,
    batch: interest_batches::Model,
) -> Result<interest_batches::Model, DbErr> {
    let entries = interest_batch_entries::Entity::find()
        .filter(interest_batch_entries::Column::InterestBatchId.eq(batch.id))
        .all(txn)
        .await?;
    let (total_interest, total_tax) = entries
        .iter()
        .fold((Decimal::ZERO, Decimal::ZERO), |(interest, tax), e| {
            (interest + e.interest_amount, tax + e.interest_tax)
        });

    let mut active: interest_batches::ActiveModel = batch.into();
    active.total_interest = Set(total_interest);
    active.total_tax = Set(total_tax);
    active.update(txn).await
}
