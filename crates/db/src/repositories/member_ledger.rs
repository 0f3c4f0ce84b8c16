//! Member ledger summary repository.
//!
//! Summaries are written only by the posting path, inside the posting
//! transaction. Everything else here is a read.

use chrono::{DateTime, Utc};
use coopledger_core::event::{EntityRef, LedgerEvent};
use coopledger_core::ledger::PostingScope;
use coopledger_core::member_ledger::{self, SummaryChange, SummaryKey, SummaryState};
use coopledger_shared::types::{
    AccountId, BranchId, MemberLedgerSummaryId, MemberProfileId, MemberTypeId, OrganizationId,
    UserId,
};
use coopledger_shared::{AppError, ErrorKind};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr,
    EntityTrait, JoinType, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
};
use tracing::{debug, warn};

use super::posting::latest_in_scope;
use crate::convert;
use crate::entities::{branches, member_ledger_summaries, member_profiles};

/// Error types for member ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum MemberLedgerError {
    /// Branch not found.
    #[error("Branch not found: {0}")]
    BranchNotFound(BranchId),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl MemberLedgerError {
    /// Returns the transport-agnostic class of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::BranchNotFound(_) => ErrorKind::NotFound,
            Self::Database(_) => ErrorKind::Database,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::BranchNotFound(_) => "BRANCH_NOT_FOUND",
            Self::Database(_) => self.kind().error_code(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        self.kind().status_code()
    }
}

impl From<MemberLedgerError> for AppError {
    fn from(err: MemberLedgerError) -> Self {
        Self::new(err.kind(), err.to_string())
    }
}

/// Filter for summary listings.
///
/// `None` fields do not constrain the result.
#[derive(Debug, Clone, Copy, Default)]
pub struct SummaryFilter {
    /// Owning organization.
    pub organization_id: Option<OrganizationId>,
    /// Owning branch.
    pub branch_id: Option<BranchId>,
    /// Only this account.
    pub account_id: Option<AccountId>,
    /// Only members of this type.
    pub member_type_id: Option<MemberTypeId>,
    /// Keep summaries of closed member profiles.
    pub include_closed: bool,
}

/// Outcome of comparing a summary with the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsistencyReport {
    /// The pair that was checked.
    pub key: SummaryKey,
    /// Balance stored on the summary.
    pub summary_balance: Option<Decimal>,
    /// Balance of the latest entry in the scope.
    pub ledger_balance: Option<Decimal>,
    /// Whether the two agree.
    pub consistent: bool,
}

/// Member ledger summary repository.
#[derive(Debug, Clone)]
pub struct MemberLedgerRepository {
    db: DatabaseConnection,
}

impl MemberLedgerRepository {
    /// Creates a new member ledger repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Reads a summary under a row lock.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub(crate) async fn find_for_update(
        txn: &DatabaseTransaction,
        key: SummaryKey,
    ) -> Result<Option<member_ledger_summaries::Model>, MemberLedgerError> {
        let summary = member_ledger_summaries::Entity::find()
            .filter(
                member_ledger_summaries::Column::MemberProfileId
                    .eq(key.member_profile_id.into_inner()),
            )
            .filter(member_ledger_summaries::Column::AccountId.eq(key.account_id.into_inner()))
            .lock_exclusive()
            .one(txn)
            .await?;
        Ok(summary)
    }

    /// Folds a posting into its member summary, creating it on first use.
    ///
    /// Runs in the posting transaction, after the entry row is written.
    pub(crate) async fn upsert_on_posting(
        txn: &DatabaseTransaction,
        scope: &PostingScope,
        key: SummaryKey,
        new_balance: Decimal,
        last_pay: DateTime<Utc>,
        updated_by: UserId,
    ) -> Result<(member_ledger_summaries::Model, LedgerEvent), MemberLedgerError> {
        let existing = Self::find_for_update(txn, key).await?;
        let current = existing.as_ref().map(|row| SummaryState {
            count: row.count,
            balance: row.balance,
            last_pay: row.last_pay.as_ref().map(convert::to_utc),
        });

        let now = convert::from_utc(Utc::now());
        let change = member_ledger::apply_posting(current.as_ref(), new_balance, last_pay);
        let state = *change.state();

        let (summary, created) = match (change, existing) {
            (SummaryChange::Update(_), Some(row)) => {
                let mut active: member_ledger_summaries::ActiveModel = row.into();
                active.count = Set(state.count);
                active.balance = Set(state.balance);
                active.last_pay = Set(state.last_pay.map(convert::from_utc));
                active.updated_at = Set(now);
                active.updated_by = Set(updated_by.into_inner());
                (active.update(txn).await?, false)
            }
            _ => {
                let inserted = member_ledger_summaries::ActiveModel {
                    id: Set(MemberLedgerSummaryId::new().into_inner()),
                    organization_id: Set(scope.organization_id.into_inner()),
                    branch_id: Set(scope.branch_id.into_inner()),
                    member_profile_id: Set(key.member_profile_id.into_inner()),
                    account_id: Set(key.account_id.into_inner()),
                    count: Set(state.count),
                    balance: Set(state.balance),
                    interest: Set(Decimal::ZERO),
                    fines: Set(Decimal::ZERO),
                    due: Set(Decimal::ZERO),
                    carried_forward_due: Set(Decimal::ZERO),
                    stored_value_facility: Set(Decimal::ZERO),
                    principal_due: Set(Decimal::ZERO),
                    last_pay: Set(state.last_pay.map(convert::from_utc)),
                    created_at: Set(now),
                    updated_at: Set(now),
                    updated_by: Set(updated_by.into_inner()),
                }
                .insert(txn)
                .await?;
                (inserted, true)
            }
        };

        debug!(
            member_profile_id = %key.member_profile_id,
            account_id = %key.account_id,
            count = summary.count,
            balance = %summary.balance,
            "Member summary updated"
        );

        let entity = EntityRef::MemberLedgerSummary {
            organization_id: scope.organization_id,
            branch_id: scope.branch_id,
            member_profile_id: key.member_profile_id,
            account_id: key.account_id,
            summary_id: MemberLedgerSummaryId::from_uuid(summary.id),
        };
        let event = if created {
            LedgerEvent::created(entity)
        } else {
            LedgerEvent::updated(entity)
        };
        Ok((summary, event))
    }

    /// Summaries of one member in a branch, excluding the branch cash on hand
    /// account.
    ///
    /// # Errors
    ///
    /// Returns an error if the branch does not exist or the query fails.
    pub async fn member_summaries(
        &self,
        organization_id: OrganizationId,
        branch_id: BranchId,
        member_profile_id: MemberProfileId,
    ) -> Result<Vec<member_ledger_summaries::Model>, MemberLedgerError> {
        let cash_on_hand = self
            .cash_on_hand_account(organization_id, branch_id)
            .await?;

        let mut query = member_ledger_summaries::Entity::find()
            .filter(
                member_ledger_summaries::Column::OrganizationId.eq(organization_id.into_inner()),
            )
            .filter(member_ledger_summaries::Column::BranchId.eq(branch_id.into_inner()))
            .filter(
                member_ledger_summaries::Column::MemberProfileId
                    .eq(member_profile_id.into_inner()),
            );

        if let Some(cash_on_hand) = cash_on_hand {
            query = query.filter(member_ledger_summaries::Column::AccountId.ne(cash_on_hand));
        }

        let summaries = query
            .order_by_asc(member_ledger_summaries::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(summaries)
    }

    /// All summaries of a branch, excluding the branch cash on hand account.
    ///
    /// # Errors
    ///
    /// Returns an error if the branch does not exist or the query fails.
    pub async fn branch_summaries(
        &self,
        organization_id: OrganizationId,
        branch_id: BranchId,
    ) -> Result<Vec<member_ledger_summaries::Model>, MemberLedgerError> {
        let cash_on_hand = self
            .cash_on_hand_account(organization_id, branch_id)
            .await?;
        let mut summaries = self
            .filter_summaries(SummaryFilter {
                organization_id: Some(organization_id),
                branch_id: Some(branch_id),
                include_closed: true,
                ..SummaryFilter::default()
            })
            .await?;
        summaries.retain(|s| Some(s.account_id) != cash_on_hand);
        Ok(summaries)
    }

    async fn cash_on_hand_account(
        &self,
        organization_id: OrganizationId,
        branch_id: BranchId,
    ) -> Result<Option<uuid::Uuid>, MemberLedgerError> {
        let branch = branches::Entity::find_by_id(branch_id.into_inner())
            .one(&self.db)
            .await?
            .filter(|b| b.organization_id == organization_id.into_inner())
            .ok_or(MemberLedgerError::BranchNotFound(branch_id))?;
        Ok(branch.cash_on_hand_account_id)
    }

    /// Summaries matching a filter, joined with their member profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn filter_summaries(
        &self,
        filter: SummaryFilter,
    ) -> Result<Vec<member_ledger_summaries::Model>, MemberLedgerError> {
        Ok(query_summaries(&self.db, filter).await?)
    }

    /// Balance stored on a summary, `None` when there is no summary.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn current_balance(
        &self,
        key: SummaryKey,
    ) -> Result<Option<Decimal>, MemberLedgerError> {
        let summary = member_ledger_summaries::Entity::find()
            .filter(
                member_ledger_summaries::Column::MemberProfileId
                    .eq(key.member_profile_id.into_inner()),
            )
            .filter(member_ledger_summaries::Column::AccountId.eq(key.account_id.into_inner()))
            .one(&self.db)
            .await?;
        Ok(summary.map(|s| s.balance))
    }

    /// Compares a summary with the latest ledger entry of its scope.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn verify_consistency(
        &self,
        organization_id: OrganizationId,
        branch_id: BranchId,
        key: SummaryKey,
    ) -> Result<ConsistencyReport, MemberLedgerError> {
        let scope = PostingScope {
            organization_id,
            branch_id,
            account_id: key.account_id,
            member_profile_id: Some(key.member_profile_id),
        };

        let summary_balance = self.current_balance(key).await?;
        let ledger_balance = latest_in_scope(&self.db, &scope, false)
            .await?
            .map(|r| r.current_balance);
        let consistent = member_ledger::is_consistent(summary_balance, ledger_balance);

        if !consistent {
            warn!(
                member_profile_id = %key.member_profile_id,
                account_id = %key.account_id,
                summary = ?summary_balance,
                ledger = ?ledger_balance,
                "Member summary disagrees with ledger"
            );
        }

        Ok(ConsistencyReport {
            key,
            summary_balance,
            ledger_balance,
            consistent,
        })
    }
}

/// Summaries matching a filter, joined with their member profile.
pub(crate) async fn query_summaries<C: ConnectionTrait>(
    conn: &C,
    filter: SummaryFilter,
) -> Result<Vec<member_ledger_summaries::Model>, DbErr> {
    let mut query = member_ledger_summaries::Entity::find()
        .join(
            JoinType::InnerJoin,
            member_ledger_summaries::Relation::MemberProfiles.def(),
        );

    if let Some(org) = filter.organization_id {
        query = query
            .filter(member_ledger_summaries::Column::OrganizationId.eq(org.into_inner()));
    }
    if let Some(branch) = filter.branch_id {
        query = query.filter(member_ledger_summaries::Column::BranchId.eq(branch.into_inner()));
    }
    if let Some(account) = filter.account_id {
        query =
            query.filter(member_ledger_summaries::Column::AccountId.eq(account.into_inner()));
    }
    if let Some(member_type) = filter.member_type_id {
        query =
            query.filter(member_profiles::Column::MemberTypeId.eq(member_type.into_inner()));
    }
    if !filter.include_closed {
        query = query.filter(member_profiles::Column::IsClosed.eq(false));
    }

    let summaries = query
        .order_by_asc(member_ledger_summaries::Column::MemberProfileId)
        .order_by_asc(member_ledger_summaries::Column::AccountId)
        .all(conn)
        .await?;
    Ok(summaries)
}
