//! Account repository for the chart of accounts.
//!
//! Every write path records a snapshot of the state it just committed, in
//! the same transaction: on creation, update, and delete.

use chrono::Utc;
use coopledger_core::account::{self, DeleteFacts, DeletePolicy, DeleteRejection, DesignatedRole};
use coopledger_core::event::{EntityRef, LedgerEvent};
use coopledger_core::ledger::{AccountKind, GeneralLedgerType};
use coopledger_core::snapshot::{self, AccountTerms, ChangeType};
use coopledger_shared::types::{AccountId, BranchId, MemberTypeId, OrganizationId, UserId};
use coopledger_shared::{AppError, ErrorKind};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use tracing::{info, warn};

use super::posting::PostingRepository;
use super::snapshot::{SnapshotError, SnapshotRepository};
use crate::convert;
use crate::entities::{accounts, branches};

/// Error types for account operations.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Branch not found.
    #[error("Branch not found: {0}")]
    BranchNotFound(BranchId),

    /// Account is already deleted.
    #[error("Account {0} is deleted")]
    AlreadyDeleted(AccountId),

    /// Ledger type or kind cannot change once entries exist.
    #[error("Account {0} has entries; its classification is fixed")]
    ClassificationLocked(AccountId),

    /// The deletion guard refused.
    #[error("Cannot delete account: {0}")]
    DeleteRejected(#[from] DeleteRejection),

    /// Recording the history row failed.
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl AccountError {
    /// Returns the transport-agnostic class of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::AccountNotFound(_) | Self::BranchNotFound(_) => ErrorKind::NotFound,
            Self::AlreadyDeleted(_) | Self::ClassificationLocked(_) => ErrorKind::InvalidState,
            Self::DeleteRejected(_) => ErrorKind::ReferentialIntegrity,
            Self::Snapshot(e) => e.kind(),
            Self::Database(_) => ErrorKind::Database,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::BranchNotFound(_) => "BRANCH_NOT_FOUND",
            Self::AlreadyDeleted(_) => "ACCOUNT_DELETED",
            Self::ClassificationLocked(_) => "ACCOUNT_CLASSIFICATION_LOCKED",
            Self::DeleteRejected(rejection) => rejection.error_code(),
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

impl From<AccountError> for AppError {
    fn from(err: AccountError) -> Self {
        Self::new(err.kind(), err.to_string())
    }
}

/// Input for creating an account.
#[derive(Debug, Clone)]
pub struct CreateAccountInput {
    /// Owning organization.
    pub organization_id: OrganizationId,
    /// Owning branch.
    pub branch_id: BranchId,
    /// Initial configuration.
    pub terms: AccountTerms,
    /// Why the account was opened.
    pub reason: Option<String>,
    /// Acting user.
    pub created_by: UserId,
}

/// Input for updating an account.
///
/// `None` leaves a field unchanged; `Some(None)` clears a nullable field.
#[derive(Debug, Clone, Default)]
pub struct UpdateAccountInput {
    /// Account name.
    pub name: Option<String>,
    /// Account description.
    pub description: Option<Option<String>>,
    /// Balance classification.
    pub general_ledger_type: Option<Option<GeneralLedgerType>>,
    /// Operational kind.
    pub kind: Option<AccountKind>,
    /// Currency code.
    pub currency_code: Option<String>,
    /// Member type the account is offered to.
    pub member_type_id: Option<Option<MemberTypeId>>,
    /// Linked loan account.
    pub loan_account_id: Option<Option<AccountId>>,
    /// Minimum transaction amount.
    pub min_amount: Option<Decimal>,
    /// Maximum transaction amount.
    pub max_amount: Option<Decimal>,
    /// Annual savings interest rate.
    pub interest_rate: Option<Decimal>,
    /// Balance below which the charge applies.
    pub minimum_balance: Option<Decimal>,
    /// Charge for falling below the minimum balance.
    pub below_minimum_charge: Option<Decimal>,
    /// Standard loan interest.
    pub interest_standard: Option<Decimal>,
    /// Secured loan interest.
    pub interest_secured: Option<Decimal>,
    /// Fines on amortization.
    pub fines_amortization: Option<Decimal>,
    /// Fines on maturity.
    pub fines_maturity: Option<Decimal>,
    /// Grace period on amortization.
    pub grace_period_amortization: Option<i32>,
    /// Grace period on maturity.
    pub grace_period_maturity: Option<i32>,
    /// Cut-off days.
    pub cut_off_days: Option<i32>,
    /// Cut-off months.
    pub cut_off_months: Option<i32>,
    /// Internal account flag.
    pub is_internal: Option<bool>,
    /// Cash on hand flag.
    pub cash_on_hand: Option<bool>,
    /// Paid-up share capital flag.
    pub paid_up_share_capital: Option<bool>,
    /// Interest on this account is taxed.
    pub is_taxable: Option<bool>,
}

impl UpdateAccountInput {
    /// Applies the patch to a configuration.
    #[must_use]
    pub fn apply(&self, mut terms: AccountTerms) -> AccountTerms {
        macro_rules! patch {
            ($($field:ident),+ $(,)?) => {
                $(
                    if let Some(value) = &self.$field {
                        terms.$field = value.clone();
                    }
                )+
            };
        }
        patch!(
            name,
            description,
            general_ledger_type,
            kind,
            currency_code,
            member_type_id,
            loan_account_id,
            min_amount,
            max_amount,
            interest_rate,
            minimum_balance,
            below_minimum_charge,
            interest_standard,
            interest_secured,
            fines_amortization,
            fines_maturity,
            grace_period_amortization,
            grace_period_maturity,
            cut_off_days,
            cut_off_months,
            is_internal,
            cash_on_hand,
            paid_up_share_capital,
            is_taxable,
        );
        terms
    }
}

/// Copies a configuration onto an active model.
fn set_terms(active: &mut accounts::ActiveModel, terms: AccountTerms) {
    active.name = Set(terms.name);
    active.description = Set(terms.description);
    active.general_ledger_type = Set(terms.general_ledger_type.map(Into::into));
    active.kind = Set(terms.kind.into());
    active.currency_code = Set(terms.currency_code);
    active.member_type_id = Set(terms.member_type_id.map(MemberTypeId::into_inner));
    active.loan_account_id = Set(terms.loan_account_id.map(AccountId::into_inner));
    active.min_amount = Set(terms.min_amount);
    active.max_amount = Set(terms.max_amount);
    active.interest_rate = Set(terms.interest_rate);
    active.minimum_balance = Set(terms.minimum_balance);
    active.below_minimum_charge = Set(terms.below_minimum_charge);
    active.interest_standard = Set(terms.interest_standard);
    active.interest_secured = Set(terms.interest_secured);
    active.fines_amortization = Set(terms.fines_amortization);
    active.fines_maturity = Set(terms.fines_maturity);
    active.grace_period_amortization = Set(terms.grace_period_amortization);
    active.grace_period_maturity = Set(terms.grace_period_maturity);
    active.cut_off_days = Set(terms.cut_off_days);
    active.cut_off_months = Set(terms.cut_off_months);
    active.is_internal = Set(terms.is_internal);
    active.cash_on_hand = Set(terms.cash_on_hand);
    active.paid_up_share_capital = Set(terms.paid_up_share_capital);
    active.is_taxable = Set(terms.is_taxable);
}

/// Branch roles an account holds.
fn designated_roles(branch: &branches::Model, account_id: uuid::Uuid) -> Vec<DesignatedRole> {
    [
        (branch.cash_on_hand_account_id, DesignatedRole::CashOnHand),
        (
            branch.paid_up_share_capital_account_id,
            DesignatedRole::PaidUpShareCapital,
        ),
        (branch.shortage_account_id, DesignatedRole::Shortage),
        (branch.overage_account_id, DesignatedRole::Overage),
    ]
    .into_iter()
    .filter(|(designated, _)| *designated == Some(account_id))
    .map(|(_, role)| role)
    .collect()
}

fn account_ref(row: &accounts::Model) -> EntityRef {
    EntityRef::Account {
        organization_id: OrganizationId::from_uuid(row.organization_id),
        branch_id: BranchId::from_uuid(row.branch_id),
        account_id: AccountId::from_uuid(row.id),
    }
}

/// Account repository.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: DatabaseConnection,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an account and its first snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the branch does not exist or an insert fails.
    pub async fn create_account(
        &self,
        txn: &DatabaseTransaction,
        input: CreateAccountInput,
    ) -> Result<(accounts::Model, LedgerEvent), AccountError> {
        branches::Entity::find_by_id(input.branch_id.into_inner())
            .one(txn)
            .await?
            .filter(|b| b.organization_id == input.organization_id.into_inner())
            .ok_or(AccountError::BranchNotFound(input.branch_id))?;

        let now = convert::from_utc(Utc::now());
        let mut active = accounts::ActiveModel {
            id: Set(AccountId::new().into_inner()),
            organization_id: Set(input.organization_id.into_inner()),
            branch_id: Set(input.branch_id.into_inner()),
            created_at: Set(now),
            created_by: Set(input.created_by.into_inner()),
            updated_at: Set(now),
            updated_by: Set(input.created_by.into_inner()),
            deleted_at: Set(None),
            ..Default::default()
        };
        set_terms(&mut active, input.terms);
        let account = active.insert(txn).await?;

        SnapshotRepository::snapshot(
            txn,
            &account,
            ChangeType::Created,
            &[],
            input.reason,
            input.created_by,
        )
        .await?;

        info!(account_id = %account.id, name = %account.name, "Created account");
        let event = LedgerEvent::created(account_ref(&account));
        Ok((account, event))
    }

    /// Finds a live or deleted account by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(
        &self,
        account_id: AccountId,
    ) -> Result<Option<accounts::Model>, AccountError> {
        let account = accounts::Entity::find_by_id(account_id.into_inner())
            .one(&self.db)
            .await?;
        Ok(account)
    }

    /// Lists the live accounts of a branch by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_accounts(
        &self,
        organization_id: OrganizationId,
        branch_id: BranchId,
    ) -> Result<Vec<accounts::Model>, AccountError> {
        let accounts = accounts::Entity::find()
            .filter(accounts::Column::OrganizationId.eq(organization_id.into_inner()))
            .filter(accounts::Column::BranchId.eq(branch_id.into_inner()))
            .filter(accounts::Column::DeletedAt.is_null())
            .order_by_asc(accounts::Column::Name)
            .all(&self.db)
            .await?;
        Ok(accounts)
    }

    /// Updates an account and snapshots the new state.
    ///
    /// # Errors
    ///
    /// Returns an error if the account does not exist, is deleted, a write
    /// fails, or the patch changes the ledger type or kind of an account
    /// that already has entries.
    pub async fn update_account(
        &self,
        txn: &DatabaseTransaction,
        account_id: AccountId,
        input: UpdateAccountInput,
        reason: Option<String>,
        updated_by: UserId,
    ) -> Result<(accounts::Model, LedgerEvent), AccountError> {
        let account = Self::find_for_update(txn, account_id).await?;
        if account.deleted_at.is_some() {
            return Err(AccountError::AlreadyDeleted(account_id));
        }

        let before = convert::account_terms(&account);
        let after = input.apply(before.clone());
        let changed = snapshot::changed_fields(&before, &after);

        if after.general_ledger_type != before.general_ledger_type || after.kind != before.kind {
            let (active_entries, deleted_entries) =
                PostingRepository::count_entries(txn, account_id).await?;
            if active_entries + deleted_entries > 0 {
                warn!(
                    account_id = %account_id,
                    entries = active_entries + deleted_entries,
                    "Classification change rejected"
                );
                return Err(AccountError::ClassificationLocked(account_id));
            }
        }

        let mut active: accounts::ActiveModel = account.into();
        set_terms(&mut active, after);
        active.updated_at = Set(convert::from_utc(Utc::now()));
        active.updated_by = Set(updated_by.into_inner());
        let updated = active.update(txn).await?;

        SnapshotRepository::snapshot(
            txn,
            &updated,
            ChangeType::Updated,
            &changed,
            reason,
            updated_by,
        )
        .await?;

        info!(account_id = %account_id, changed = ?changed, "Updated account");
        let event = LedgerEvent::updated(account_ref(&updated));
        Ok((updated, event))
    }

    /// Soft-deletes an account if the deletion guard allows it.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The account does not exist or is already deleted
    /// - The account has ledger entries, a branch designation, or linked accounts
    /// - Database operation fails
    pub async fn delete_account(
        &self,
        txn: &DatabaseTransaction,
        account_id: AccountId,
        policy: DeletePolicy,
        deleted_by: UserId,
    ) -> Result<(accounts::Model, LedgerEvent), AccountError> {
        let account = Self::find_for_update(txn, account_id).await?;
        if account.deleted_at.is_some() {
            return Err(AccountError::AlreadyDeleted(account_id));
        }

        let facts = Self::delete_facts(txn, &account).await?;
        if let Err(rejection) = account::check_delete(&facts, policy) {
            warn!(
                account_id = %account_id,
                policy = ?policy,
                reason = %rejection,
                "Account deletion rejected"
            );
            return Err(rejection.into());
        }

        let now = convert::from_utc(Utc::now());
        let mut active: accounts::ActiveModel = account.into();
        active.deleted_at = Set(Some(now));
        active.updated_at = Set(now);
        active.updated_by = Set(deleted_by.into_inner());
        let deleted = active.update(txn).await?;

        SnapshotRepository::snapshot(
            txn,
            &deleted,
            ChangeType::Deleted,
            &[],
            None,
            deleted_by,
        )
        .await?;

        info!(account_id = %account_id, "Deleted account");
        let event = LedgerEvent::deleted(account_ref(&deleted));
        Ok((deleted, event))
    }

    async fn find_for_update(
        txn: &DatabaseTransaction,
        account_id: AccountId,
    ) -> Result<accounts::Model, AccountError> {
        accounts::Entity::find_by_id(account_id.into_inner())
            .lock_exclusive()
            .one(txn)
            .await?
            .ok_or(AccountError::AccountNotFound(account_id))
    }

    async fn delete_facts(
        txn: &DatabaseTransaction,
        account: &accounts::Model,
    ) -> Result<DeleteFacts, AccountError> {
        let (active_entries, deleted_entries) =
            PostingRepository::count_entries(txn, AccountId::from_uuid(account.id)).await?;

        let branch = branches::Entity::find_by_id(account.branch_id)
            .one(txn)
            .await?
            .ok_or(AccountError::BranchNotFound(BranchId::from_uuid(
                account.branch_id,
            )))?;

        let linked_accounts = accounts::Entity::find()
            .filter(accounts::Column::LoanAccountId.eq(account.id))
            .filter(accounts::Column::DeletedAt.is_null())
            .count(txn)
            .await?;

        Ok(DeleteFacts {
            active_entries,
            deleted_entries,
            designated_roles: designated_roles(&branch, account.id),
            linked_accounts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn terms() -> AccountTerms {
        AccountTerms {
            name: "Regular Savings".to_string(),
            description: Some("Passbook savings".to_string()),
            general_ledger_type: Some(GeneralLedgerType::Liabilities),
            kind: AccountKind::Deposit,
            currency_code: "PHP".to_string(),
            member_type_id: None,
            loan_account_id: None,
            min_amount: dec!(0),
            max_amount: dec!(100000),
            interest_rate: dec!(0.02),
            minimum_balance: dec!(500),
            below_minimum_charge: dec!(10),
            interest_standard: dec!(0),
            interest_secured: dec!(0),
            fines_amortization: dec!(0),
            fines_maturity: dec!(0),
            grace_period_amortization: 0,
            grace_period_maturity: 0,
            cut_off_days: 0,
            cut_off_months: 0,
            is_internal: false,
            cash_on_hand: false,
            paid_up_share_capital: false,
            is_taxable: true,
        }
    }

    #[test]
    fn test_empty_patch_changes_nothing() {
        let before = terms();
        let after = UpdateAccountInput::default().apply(before.clone());
        assert_eq!(before, after);
        assert!(snapshot::changed_fields(&before, &after).is_empty());
    }

    #[test]
    fn test_patch_sets_and_clears_fields() {
        let patch = UpdateAccountInput {
            interest_rate: Some(dec!(0.03)),
            description: Some(None),
            general_ledger_type: Some(None),
            ..Default::default()
        };
        let before = terms();
        let after = patch.apply(before.clone());

        assert_eq!(after.interest_rate, dec!(0.03));
        assert_eq!(after.description, None);
        assert_eq!(after.general_ledger_type, None);
        assert_eq!(
            snapshot::changed_fields(&before, &after),
            vec!["description", "general_ledger_type", "interest_rate"]
        );
    }

    #[test]
    fn test_designated_roles_match_every_slot() {
        let account = uuid::Uuid::now_v7();
        let other = uuid::Uuid::now_v7();
        let now = convert::from_utc(Utc::now());
        let branch = branches::Model {
            id: uuid::Uuid::now_v7(),
            organization_id: uuid::Uuid::now_v7(),
            name: "Main".to_string(),
            timezone: "Asia/Manila".to_string(),
            cash_on_hand_account_id: Some(account),
            paid_up_share_capital_account_id: Some(other),
            shortage_account_id: None,
            overage_account_id: Some(account),
            created_at: now,
            updated_at: now,
        };

        assert_eq!(
            designated_roles(&branch, account),
            vec![DesignatedRole::CashOnHand, DesignatedRole::Overage]
        );
        assert_eq!(
            designated_roles(&branch, other),
            vec![DesignatedRole::PaidUpShareCapital]
        );
        assert!(designated_roles(&branch, uuid::Uuid::now_v7()).is_empty());
    }
}
