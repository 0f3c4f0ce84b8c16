//! Account configuration captured by snapshots.

use chrono::{DateTime, Utc};
use coopledger_shared::types::{AccountId, MemberTypeId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::{AccountKind, GeneralLedgerType};

/// Why a snapshot was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    /// Taken right after the account was created.
    Created,
    /// Taken right before an update landed.
    Updated,
    /// Taken right before the account was soft-deleted.
    Deleted,
}

/// The financially meaningful configuration of an account.
///
/// This is what historical computations must read "as of" a date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountTerms {
    /// Display name.
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// Classification driving the sign rule.
    pub general_ledger_type: Option<GeneralLedgerType>,
    /// Operational kind.
    pub kind: AccountKind,
    /// ISO currency code.
    pub currency_code: String,
    /// Member classification the account is offered to.
    pub member_type_id: Option<MemberTypeId>,
    /// Loan account an interest/fines/SVF account belongs to.
    pub loan_account_id: Option<AccountId>,
    /// Smallest transaction amount.
    pub min_amount: Decimal,
    /// Largest transaction amount.
    pub max_amount: Decimal,
    /// Annual savings interest rate as a fraction.
    pub interest_rate: Decimal,
    /// Balance below which no interest is paid.
    pub minimum_balance: Decimal,
    /// Charge applied instead of interest when below the minimum balance.
    pub below_minimum_charge: Decimal,
    /// Standard loan interest rate.
    pub interest_standard: Decimal,
    /// Secured loan interest rate.
    pub interest_secured: Decimal,
    /// Fines rate during amortization.
    pub fines_amortization: Decimal,
    /// Fines rate after maturity.
    pub fines_maturity: Decimal,
    /// Grace period during amortization, in days.
    pub grace_period_amortization: i32,
    /// Grace period after maturity, in days.
    pub grace_period_maturity: i32,
    /// Cut-off days.
    pub cut_off_days: i32,
    /// Cut-off months.
    pub cut_off_months: i32,
    /// Internal accounts are hidden from members.
    pub is_internal: bool,
    /// Counts as cash on hand.
    pub cash_on_hand: bool,
    /// Counts as paid-up share capital.
    pub paid_up_share_capital: bool,
    /// Interest earned on this account is taxed.
    pub is_taxable: bool,
}

/// One immutable history row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    /// Account the snapshot belongs to.
    pub account_id: AccountId,
    /// Why the snapshot was taken.
    pub change_type: ChangeType,
    /// When it was taken; this is the point in time it describes.
    pub recorded_at: DateTime<Utc>,
    /// Captured configuration.
    pub terms: AccountTerms,
}

/// Anything that sits on a timeline.
pub trait Timestamped {
    /// The instant the value became effective.
    fn recorded_at(&self) -> DateTime<Utc>;
}

impl Timestamped for AccountSnapshot {
    fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }
}

/// An effective-at lookup result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved<T> {
    /// A snapshot recorded at or before the requested instant.
    Exact(T),
    /// No snapshot predates the instant; built from the live row.
    Approximate(T),
}

impl<T> Resolved<T> {
    /// Returns true for [`Resolved::Exact`].
    #[must_use]
    pub const fn is_exact(&self) -> bool {
        matches!(self, Self::Exact(_))
    }

    /// Borrows the resolved value.
    #[must_use]
    pub const fn value(&self) -> &T {
        match self {
            Self::Exact(v) | Self::Approximate(v) => v,
        }
    }

    /// Unwraps the resolved value.
    #[must_use]
    pub fn into_inner(self) -> T {
        match self {
            Self::Exact(v) | Self::Approximate(v) => v,
        }
    }

    /// Maps the value, keeping the exactness flag.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resolved<U> {
        match self {
            Self::Exact(v) => Resolved::Exact(f(v)),
            Self::Approximate(v) => Resolved::Approximate(f(v)),
        }
    }
}
