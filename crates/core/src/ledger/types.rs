//! Ledger domain types for posting.
//!
//! This module defines the account classifications that drive the sign rule,
//! the scope a running balance belongs to, and the input of a single posting.

use chrono::{DateTime, Utc};
use coopledger_shared::types::{
    AccountId, BranchId, MemberProfileId, OrganizationId, UserId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Decimal places the money columns store (`NUMERIC(19,4)`).
pub const MONEY_SCALE: u32 = 4;

/// General ledger classification of an account.
///
/// Determines the balance sign convention:
/// - Assets/Expenses grow with debits
/// - Liabilities/Equity/Revenue grow with credits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneralLedgerType {
    /// Assets.
    Assets,
    /// Liabilities.
    Liabilities,
    /// Equity.
    Equity,
    /// Revenue.
    Revenue,
    /// Expenses.
    Expenses,
}

impl GeneralLedgerType {
    /// Returns the lowercase name stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Assets => "assets",
            Self::Liabilities => "liabilities",
            Self::Equity => "equity",
            Self::Revenue => "revenue",
            Self::Expenses => "expenses",
        }
    }
}

impl std::str::FromStr for GeneralLedgerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "assets" | "asset" => Ok(Self::Assets),
            "liabilities" | "liability" => Ok(Self::Liabilities),
            "equity" => Ok(Self::Equity),
            "revenue" | "income" => Ok(Self::Revenue),
            "expenses" | "expense" => Ok(Self::Expenses),
            other => Err(format!("unknown general ledger type '{other}'")),
        }
    }
}

/// Operational kind of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    /// Savings or share deposit.
    Deposit,
    /// Loan principal.
    Loan,
    /// Accounts receivable ledger.
    ArLedger,
    /// Accounts receivable aging.
    ArAging,
    /// Loan fines.
    Fines,
    /// Loan interest.
    Interest,
    /// Stored value facility ledger.
    SvfLedger,
    /// Written-off balances.
    WriteOff,
    /// Accounts payable ledger.
    ApLedger,
    /// Time deposit.
    TimeDeposit,
    /// Shared bucket that is never tracked per member.
    Other,
}

impl AccountKind {
    /// Returns true when postings to this account keep a per-member balance.
    #[must_use]
    pub const fn is_member_trackable(self) -> bool {
        !matches!(self, Self::Other)
    }
}

/// Business origin of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntrySource {
    /// Cash withdrawal.
    Withdraw,
    /// Cash deposit.
    Deposit,
    /// Journal entry.
    Journal,
    /// Loan or fee payment.
    Payment,
    /// Manual adjustment.
    Adjustment,
    /// Journal voucher.
    JournalVoucher,
    /// Check voucher.
    CheckVoucher,
    /// Loan release.
    Loan,
    /// Savings interest credit.
    SavingsInterest,
    /// Mutual aid contribution.
    MutualContribution,
}

/// The key a running balance is tracked under.
///
/// A member becomes part of the scope only when the account is member
/// trackable; postings to shared buckets share one balance per branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PostingScope {
    /// Owning organization.
    pub organization_id: OrganizationId,
    /// Owning branch.
    pub branch_id: BranchId,
    /// Posted account.
    pub account_id: AccountId,
    /// Member, when the balance is tracked per member.
    pub member_profile_id: Option<MemberProfileId>,
}

impl PostingScope {
    /// Builds the scope for a posting against an account of the given kind.
    #[must_use]
    pub fn resolve(
        organization_id: OrganizationId,
        branch_id: BranchId,
        account_id: AccountId,
        kind: AccountKind,
        member_profile_id: Option<MemberProfileId>,
    ) -> Self {
        Self {
            organization_id,
            branch_id,
            account_id,
            member_profile_id: member_profile_id.filter(|_| kind.is_member_trackable()),
        }
    }

    /// Returns true if the balance is tracked per member.
    #[must_use]
    pub const fn is_member_scope(&self) -> bool {
        self.member_profile_id.is_some()
    }

    /// Stable text key identifying the scope, used for advisory locking.
    #[must_use]
    pub fn lock_key(&self) -> String {
        let member = self
            .member_profile_id
            .map_or_else(|| "-".to_string(), |m| m.to_string());
        format!(
            "gl:{}:{}:{}:{}",
            self.organization_id, self.branch_id, self.account_id, member
        )
    }
}

/// What the posting engine needs to know about the account being posted.
#[derive(Debug, Clone)]
pub struct AccountInfo {
    /// The account ID.
    pub id: AccountId,
    /// Classification, `None` if never configured.
    pub general_ledger_type: Option<GeneralLedgerType>,
    /// Operational kind.
    pub kind: AccountKind,
    /// Whether the account has been soft-deleted.
    pub is_deleted: bool,
}

/// Input for a single ledger posting.
#[derive(Debug, Clone)]
pub struct PostingInput {
    /// Organization ID.
    pub organization_id: OrganizationId,
    /// Branch ID.
    pub branch_id: BranchId,
    /// Account ID.
    pub account_id: AccountId,
    /// Member the posting belongs to, if any.
    pub member_profile_id: Option<MemberProfileId>,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
    /// Business date of the entry; `None` means now.
    pub entry_date: Option<DateTime<Utc>>,
    /// Business origin.
    pub source: EntrySource,
    /// External reference (receipt, voucher, OR number).
    pub reference_number: Option<String>,
    /// Groups the entries written by one business transaction.
    pub transaction_batch_id: Option<uuid::Uuid>,
    /// Free text.
    pub description: Option<String>,
    /// Author.
    pub created_by: UserId,
}

impl PostingInput {
    /// Creates a posting with the mandatory fields and no references.
    #[must_use]
    pub fn new(
        organization_id: OrganizationId,
        branch_id: BranchId,
        account_id: AccountId,
        debit: Decimal,
        credit: Decimal,
        created_by: UserId,
    ) -> Self {
        Self {
            organization_id,
            branch_id,
            account_id,
            member_profile_id: None,
            debit,
            credit,
            entry_date: None,
            source: EntrySource::Journal,
            reference_number: None,
            transaction_batch_id: None,
            description: None,
            created_by,
        }
    }

    /// Sets the member.
    #[must_use]
    pub const fn for_member(mut self, member_profile_id: MemberProfileId) -> Self {
        self.member_profile_id = Some(member_profile_id);
        self
    }

    /// Sets the business date.
    #[must_use]
    pub const fn dated(mut self, entry_date: DateTime<Utc>) -> Self {
        self.entry_date = Some(entry_date);
        self
    }

    /// Sets the source.
    #[must_use]
    pub const fn with_source(mut self, source: EntrySource) -> Self {
        self.source = source;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::str::FromStr;

    #[rstest]
    #[case("assets", GeneralLedgerType::Assets)]
    #[case("Liabilities", GeneralLedgerType::Liabilities)]
    #[case("EQUITY", GeneralLedgerType::Equity)]
    #[case("revenue", GeneralLedgerType::Revenue)]
    #[case("expense", GeneralLedgerType::Expenses)]
    fn test_general_ledger_type_parse(#[case] raw: &str, #[case] expected: GeneralLedgerType) {
        assert_eq!(GeneralLedgerType::from_str(raw).unwrap(), expected);
    }

    #[test]
    fn test_general_ledger_type_rejects_unknown() {
        assert!(GeneralLedgerType::from_str("").is_err());
        assert!(GeneralLedgerType::from_str("contra").is_err());
    }

    #[test]
    fn test_scope_drops_member_for_other_accounts() {
        let member = MemberProfileId::new();
        let scope = PostingScope::resolve(
            OrganizationId::new(),
            BranchId::new(),
            AccountId::new(),
            AccountKind::Other,
            Some(member),
        );
        assert!(!scope.is_member_scope());
        assert!(scope.lock_key().ends_with(":-"));
    }

    #[test]
    fn test_scope_keeps_member_for_deposits() {
        let member = MemberProfileId::new();
        let scope = PostingScope::resolve(
            OrganizationId::new(),
            BranchId::new(),
            AccountId::new(),
            AccountKind::Deposit,
            Some(member),
        );
        assert_eq!(scope.member_profile_id, Some(member));
        assert!(scope.lock_key().ends_with(&member.to_string()));
    }

    #[test]
    fn test_lock_keys_differ_per_member() {
        let org = OrganizationId::new();
        let branch = BranchId::new();
        let account = AccountId::new();
        let resolve = |member| {
            PostingScope::resolve(org, branch, account, AccountKind::Loan, Some(member))
        };
        let a = resolve(MemberProfileId::new());
        let b = resolve(MemberProfileId::new());
        assert_ne!(a.lock_key(), b.lock_key());
    }
}
