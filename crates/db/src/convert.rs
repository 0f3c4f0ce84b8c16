//! Conversions between database rows and domain types.

use chrono::{DateTime, Utc};
use coopledger_core::ledger::{self, AccountInfo};
use coopledger_core::snapshot::{self, AccountSnapshot, AccountTerms};
use coopledger_core::interest;
use coopledger_shared::types::{AccountId, MemberTypeId};
use sea_orm::prelude::DateTimeWithTimeZone;

use crate::entities::{account_snapshots, accounts, sea_orm_active_enums as db};

macro_rules! mirror_enum {
    ($dbm:ident :: $db:ident, $dm:ident :: $domain:ident, [$($variant:ident),+ $(,)?]) => {
        impl From<$dbm::$db> for $dm::$domain {
            fn from(value: $dbm::$db) -> Self {
                match value {
                    $($dbm::$db::$variant => Self::$variant,)+
                }
            }
        }

        impl From<$dm::$domain> for $dbm::$db {
            fn from(value: $dm::$domain) -> Self {
                match value {
                    $($dm::$domain::$variant => Self::$variant,)+
                }
            }
        }
    };
}

mirror_enum!(
    db::GeneralLedgerType,
    ledger::GeneralLedgerType,
    [Assets, Liabilities, Equity, Revenue, Expenses]
);

mirror_enum!(
    db::AccountKind,
    ledger::AccountKind,
    [
        Deposit,
        Loan,
        ArLedger,
        ArAging,
        Fines,
        Interest,
        SvfLedger,
        WriteOff,
        ApLedger,
        TimeDeposit,
        Other,
    ]
);

mirror_enum!(
    db::EntrySource,
    ledger::EntrySource,
    [
        Withdraw,
        Deposit,
        Journal,
        Payment,
        Adjustment,
        JournalVoucher,
        CheckVoucher,
        Loan,
        SavingsInterest,
        MutualContribution,
    ]
);

mirror_enum!(
    db::SnapshotChangeType,
    snapshot::ChangeType,
    [Created, Updated, Deleted]
);

mirror_enum!(
    db::SavingsComputationType,
    interest::ComputationType,
    [
        DailyLowestBalance,
        AverageDailyBalance,
        MonthlyEndLowestBalance,
        AdbEndBalance,
        MonthlyLowestBalanceAverage,
        MonthlyEndBalanceAverage,
        MonthlyEndBalanceTotal,
    ]
);

/// Normalizes a stored timestamp to UTC.
#[must_use]
pub fn to_utc(value: &DateTimeWithTimeZone) -> DateTime<Utc> {
    value.with_timezone(&Utc)
}

/// Converts a UTC timestamp into the column type.
#[must_use]
pub fn from_utc(value: DateTime<Utc>) -> DateTimeWithTimeZone {
    value.fixed_offset()
}

/// What the posting engine reads from a live account row.
#[must_use]
pub fn account_info(row: &accounts::Model) -> AccountInfo {
    AccountInfo {
        id: AccountId::from_uuid(row.id),
        general_ledger_type: row.general_ledger_type.map(Into::into),
        kind: row.kind.into(),
        is_deleted: row.deleted_at.is_some(),
    }
}

/// Financial configuration of a live account row.
#[must_use]
pub fn account_terms(row: &accounts::Model) -> AccountTerms {
    AccountTerms {
        name: row.name.clone(),
        description: row.description.clone(),
        general_ledger_type: row.general_ledger_type.map(Into::into),
        kind: row.kind.into(),
        currency_code: row.currency_code.clone(),
        member_type_id: row.member_type_id.map(MemberTypeId::from_uuid),
        loan_account_id: row.loan_account_id.map(AccountId::from_uuid),
        min_amount: row.min_amount,
        max_amount: row.max_amount,
        interest_rate: row.interest_rate,
        minimum_balance: row.minimum_balance,
        below_minimum_charge: row.below_minimum_charge,
        interest_standard: row.interest_standard,
        interest_secured: row.interest_secured,
        fines_amortization: row.fines_amortization,
        fines_maturity: row.fines_maturity,
        grace_period_amortization: row.grace_period_amortization,
        grace_period_maturity: row.grace_period_maturity,
        cut_off_days: row.cut_off_days,
        cut_off_months: row.cut_off_months,
        is_internal: row.is_internal,
        cash_on_hand: row.cash_on_hand,
        paid_up_share_capital: row.paid_up_share_capital,
        is_taxable: row.is_taxable,
    }
}

/// Financial configuration captured by a history row.
#[must_use]
pub fn snapshot_terms(row: &account_snapshots::Model) -> AccountTerms {
    AccountTerms {
        name: row.name.clone(),
        description: row.description.clone(),
        general_ledger_type: row.general_ledger_type.map(Into::into),
        kind: row.kind.into(),
        currency_code: row.currency_code.clone(),
        member_type_id: row.member_type_id.map(MemberTypeId::from_uuid),
        loan_account_id: row.loan_account_id.map(AccountId::from_uuid),
        min_amount: row.min_amount,
        max_amount: row.max_amount,
        interest_rate: row.interest_rate,
        minimum_balance: row.minimum_balance,
        below_minimum_charge: row.below_minimum_charge,
        interest_standard: row.interest_standard,
        interest_secured: row.interest_secured,
        fines_amortization: row.fines_amortization,
        fines_maturity: row.fines_maturity,
        grace_period_amortization: row.grace_period_amortization,
        grace_period_maturity: row.grace_period_maturity,
        cut_off_days: row.cut_off_days,
        cut_off_months: row.cut_off_months,
        is_internal: row.is_internal,
        cash_on_hand: row.cash_on_hand,
        paid_up_share_capital: row.paid_up_share_capital,
        is_taxable: row.is_taxable,
    }
}

/// Domain view of a history row.
#[must_use]
pub fn snapshot_from_row(row: &account_snapshots::Model) -> AccountSnapshot {
    AccountSnapshot {
        account_id: AccountId::from_uuid(row.account_id),
        change_type: row.change_type.into(),
        recorded_at: to_utc(&row.valid_from),
        terms: snapshot_terms(row),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::Iterable;

    #[test]
    fn test_enums_mirror_both_ways() {
        for kind in db::AccountKind::iter() {
            let domain: ledger::AccountKind = kind.into();
            assert_eq!(db::AccountKind::from(domain), kind);
        }
        for source in db::EntrySource::iter() {
            let domain: ledger::EntrySource = source.into();
            assert_eq!(db::EntrySource::from(domain), source);
        }
        for computation in db::SavingsComputationType::iter() {
            let domain: interest::ComputationType = computation.into();
            assert_eq!(db::SavingsComputationType::from(domain), computation);
        }
    }

    #[test]
    fn test_computation_type_names_match_database() {
        use sea_orm::ActiveEnum;
        for computation in db::SavingsComputationType::iter() {
            let domain: interest::ComputationType = computation.into();
            assert_eq!(computation.to_value(), domain.as_str());
        }
    }

    #[test]
    fn test_only_other_accounts_are_shared() {
        for kind in db::AccountKind::iter() {
            let domain: ledger::AccountKind = kind.into();
            assert_eq!(domain.is_member_trackable(), kind != db::AccountKind::Other);
        }
    }
}
