//! Account deletion guard.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How soft-deleted ledger entries count against a deletion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletePolicy {
    /// Any entry blocks deletion, soft-deleted ones included.
    #[default]
    Strict,
    /// Only active entries block deletion.
    IncludingDeleted,
}

/// Role of an account a branch depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DesignatedRole {
    /// Branch cash on hand.
    CashOnHand,
    /// Branch paid-up share capital.
    PaidUpShareCapital,
    /// Teller shortage.
    Shortage,
    /// Teller overage.
    Overage,
}

impl std::fmt::Display for DesignatedRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::CashOnHand => "cash on hand",
            Self::PaidUpShareCapital => "paid-up share capital",
            Self::Shortage => "shortage",
            Self::Overage => "overage",
        };
        f.write_str(name)
    }
}

/// What the store knows about an account that is about to be deleted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteFacts {
    /// Ledger entries that are not soft-deleted.
    pub active_entries: u64,
    /// Ledger entries that are soft-deleted.
    pub deleted_entries: u64,
    /// Branch roles the account is designated for.
    pub designated_roles: Vec<DesignatedRole>,
    /// Live accounts pointing at it through `loan_account_id`.
    pub linked_accounts: u64,
}

/// Why an account cannot be deleted.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeleteRejection {
    /// The account has ledger history.
    #[error("Account has {0} ledger entries")]
    HasLedgerEntries(u64),

    /// A branch designates the account.
    #[error("Account is the branch {0} account")]
    DesignatedBranchAccount(DesignatedRole),

    /// Other accounts reference it as their loan account.
    #[error("Account is referenced by {0} linked accounts")]
    LinkedAccounts(u64),
}

impl DeleteRejection {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::HasLedgerEntries(_) => "ACCOUNT_HAS_LEDGER_ENTRIES",
            Self::DesignatedBranchAccount(_) => "DESIGNATED_BRANCH_ACCOUNT",
            Self::LinkedAccounts(_) => "ACCOUNT_HAS_LINKED_ACCOUNTS",
        }
    }
}

/// Evaluates the deletion rules in order: ledger history, branch
/// designation, linked accounts.
pub fn check_delete(facts: &DeleteFacts, policy: DeletePolicy) -> Result<(), DeleteRejection> {
    let blocking_entries = match policy {
        DeletePolicy::Strict => facts.active_entries.saturating_add(facts.deleted_entries),
        DeletePolicy::IncludingDeleted => facts.active_entries,
    };
    if blocking_entries > 0 {
        return Err(DeleteRejection::HasLedgerEntries(blocking_entries));
    }
    if let Some(role) = facts.designated_roles.first() {
        return Err(DeleteRejection::DesignatedBranchAccount(*role));
    }
    if facts.linked_accounts > 0 {
        return Err(DeleteRejection::LinkedAccounts(facts.linked_accounts));
    }
    Ok(())
}
