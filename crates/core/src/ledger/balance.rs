//! Running balance calculations.
//!
//! - Assets/Expenses: balance += debit - credit (debit-normal)
//! - Liabilities/Equity/Revenue: balance += credit - debit (credit-normal)

use coopledger_shared::types::AccountId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::LedgerError;
use super::types::GeneralLedgerType;

/// Which side of the ledger increases an account's balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NormalBalance {
    /// Debit-normal accounts (Assets, Expenses)
    DebitNormal,
    /// Credit-normal accounts (Liabilities, Equity, Revenue)
    CreditNormal,
}

impl NormalBalance {
    /// Returns the sign convention of a classification.
    #[must_use]
    pub const fn for_classification(classification: GeneralLedgerType) -> Self {
        match classification {
            GeneralLedgerType::Assets | GeneralLedgerType::Expenses => Self::DebitNormal,
            GeneralLedgerType::Liabilities
            | GeneralLedgerType::Equity
            | GeneralLedgerType::Revenue => Self::CreditNormal,
        }
    }

    /// Resolves the sign convention of an account.
    ///
    /// An unset classification is a configuration error, never a default.
    pub fn for_account(
        account_id: AccountId,
        classification: Option<GeneralLedgerType>,
    ) -> Result<Self, LedgerError> {
        classification
            .map(Self::for_classification)
            .ok_or(LedgerError::UnclassifiedAccount(account_id))
    }

    /// Calculates the balance change for an entry.
    #[must_use]
    pub fn calculate_balance_change(self, debit: Decimal, credit: Decimal) -> Decimal {
        match self {
            Self::DebitNormal => debit - credit,
            Self::CreditNormal => credit - debit,
        }
    }
}

/// Running balance information for a ledger entry.
///
/// - scope_version: monotonically increasing counter within one posting scope
/// - previous_balance: balance before this entry
/// - current_balance: balance after this entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningBalance {
    /// Position of the entry within its scope, starting at 1.
    pub scope_version: i64,
    /// Balance before this entry.
    pub previous_balance: Decimal,
    /// Balance after this entry.
    pub current_balance: Decimal,
}

impl RunningBalance {
    /// Creates the running balance of the first entry in a scope.
    #[must_use]
    pub fn first_entry(balance_change: Decimal) -> Self {
        Self {
            scope_version: 1,
            previous_balance: Decimal::ZERO,
            current_balance: balance_change,
        }
    }

    /// Creates a new running balance based on the previous entry.
    ///
    /// - current_balance[N] = previous_balance[N] + balance_change
    /// - previous_balance[N] = current_balance[N-1]
    #[must_use]
    pub fn next_entry(previous: &Self, balance_change: Decimal) -> Self {
        Self {
            scope_version: previous.scope_version + 1,
            previous_balance: previous.current_balance,
            current_balance: previous.current_balance + balance_change,
        }
    }

    /// Continues from the prior entry, or starts from zero if there is none.
    #[must_use]
    pub fn after(previous: Option<&Self>, balance_change: Decimal) -> Self {
        previous.map_or_else(
            || Self::first_entry(balance_change),
            |prev| Self::next_entry(prev, balance_change),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn balance_change_strategy() -> impl Strategy<Value = Decimal> {
        (-100_000i64..100_000i64).prop_map(|n| Decimal::new(n, 2))
    }

    fn balance_changes_strategy(max_len: usize) -> impl Strategy<Value = Vec<Decimal>> {
        prop::collection::vec(balance_change_strategy(), 1..=max_len)
    }

    fn classification_strategy() -> impl Strategy<Value = GeneralLedgerType> {
        prop_oneof![
            Just(GeneralLedgerType::Assets),
            Just(GeneralLedgerType::Liabilities),
            Just(GeneralLedgerType::Equity),
            Just(GeneralLedgerType::Revenue),
            Just(GeneralLedgerType::Expenses),
        ]
    }

    fn chain(changes: &[Decimal]) -> Vec<RunningBalance> {
        let mut out: Vec<RunningBalance> = Vec::with_capacity(changes.len());
        for change in changes {
            let next = RunningBalance::after(out.last(), *change);
            out.push(next);
        }
        out
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// The final balance of a scope is the signed sum of its postings.
        #[test]
        fn prop_final_balance_equals_sum_of_changes(
            changes in balance_changes_strategy(20),
        ) {
            let entries = chain(&changes);
            let expected: Decimal = changes.iter().copied().sum();
            prop_assert_eq!(entries.last().map(|e| e.current_balance), Some(expected));
        }

        /// Each entry starts where the previous one ended.
        #[test]
        fn prop_previous_equals_prior_current(
            changes in balance_changes_strategy(20),
        ) {
            let entries = chain(&changes);
            for pair in entries.windows(2) {
                prop_assert_eq!(pair[1].previous_balance, pair[0].current_balance);
            }
        }

        /// Versions form the sequence 1..=N.
        #[test]
        fn prop_version_sequence_contiguous(
            changes in balance_changes_strategy(20),
        ) {
            let versions: Vec<i64> = chain(&changes).iter().map(|e| e.scope_version).collect();
            let expected: Vec<i64> = (1..=changes.len() as i64).collect();
            prop_assert_eq!(versions, expected);
        }

        /// Debit-normal and credit-normal accounts mirror each other.
        #[test]
        fn prop_sign_conventions_are_opposite(
            debit in 0i64..1_000_000,
            credit in 0i64..1_000_000,
        ) {
            let debit = Decimal::new(debit, 2);
            let credit = Decimal::new(credit, 2);
            prop_assert_eq!(
                NormalBalance::DebitNormal.calculate_balance_change(debit, credit),
                -NormalBalance::CreditNormal.calculate_balance_change(debit, credit)
            );
        }

        /// Every classification resolves to a sign rule.
        #[test]
        fn prop_classified_accounts_always_resolve(
            classification in classification_strategy(),
        ) {
            prop_assert!(NormalBalance::for_account(AccountId::new(), Some(classification)).is_ok());
        }

        /// A zero-amount posting leaves the balance where it was.
        #[test]
        fn prop_zero_change_preserves_balance(
            initial_change in balance_change_strategy(),
        ) {
            let rb1 = RunningBalance::first_entry(initial_change);
            let rb2 = RunningBalance::next_entry(&rb1, Decimal::ZERO);
            prop_assert_eq!(rb2.current_balance, rb1.current_balance);
            prop_assert_eq!(rb2.scope_version, 2);
        }
    }

    #[test]
    fn test_asset_debit_then_credit() {
        let rule = NormalBalance::for_classification(GeneralLedgerType::Assets);
        let first = RunningBalance::after(None, rule.calculate_balance_change(dec!(500), dec!(0)));
        let second = RunningBalance::after(
            Some(&first),
            rule.calculate_balance_change(dec!(0), dec!(200)),
        );
        assert_eq!(
            [first.current_balance, second.current_balance],
            [dec!(500), dec!(300)]
        );
    }

    #[test]
    fn test_liability_debit_then_credit() {
        let rule = NormalBalance::for_classification(GeneralLedgerType::Liabilities);
        let first = RunningBalance::after(None, rule.calculate_balance_change(dec!(500), dec!(0)));
        let second = RunningBalance::after(
            Some(&first),
            rule.calculate_balance_change(dec!(0), dec!(200)),
        );
        assert_eq!(
            [first.current_balance, second.current_balance],
            [dec!(-500), dec!(-300)]
        );
    }

    #[test]
    fn test_expense_is_debit_normal_and_equity_revenue_credit_normal() {
        assert_eq!(
            NormalBalance::for_classification(GeneralLedgerType::Expenses),
            NormalBalance::DebitNormal
        );
        assert_eq!(
            NormalBalance::for_classification(GeneralLedgerType::Equity),
            NormalBalance::CreditNormal
        );
        assert_eq!(
            NormalBalance::for_classification(GeneralLedgerType::Revenue),
            NormalBalance::CreditNormal
        );
    }

    #[test]
    fn test_unclassified_account_is_rejected() {
        let id = AccountId::new();
        let err = NormalBalance::for_account(id, None).unwrap_err();
        assert!(matches!(err, LedgerError::UnclassifiedAccount(got) if got == id));
    }

    #[test]
    fn test_decimal_accumulation_is_exact() {
        let rule = NormalBalance::CreditNormal;
        let mut balance: Option<RunningBalance> = None;
        for _ in 0..1000 {
            let change = rule.calculate_balance_change(Decimal::ZERO, dec!(0.10));
            balance = Some(RunningBalance::after(balance.as_ref(), change));
        }
        assert_eq!(balance.map(|b| b.current_balance), Some(dec!(100.00)));
    }
}
