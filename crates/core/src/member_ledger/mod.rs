//! Per-member running summary rules.
//!
//! A summary mirrors the latest ledger balance of one (member, account) pair.
//! Only the posting path may change it, and always through [`apply_posting`].

use chrono::{DateTime, Utc};
use coopledger_shared::types::{AccountId, MemberProfileId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::PostingScope;

/// Identity of a summary row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SummaryKey {
    /// Member.
    pub member_profile_id: MemberProfileId,
    /// Account.
    pub account_id: AccountId,
}

impl SummaryKey {
    /// Key of the summary a posting scope feeds, `None` for shared buckets.
    #[must_use]
    pub fn for_scope(scope: &PostingScope) -> Option<Self> {
        scope.member_profile_id.map(|member_profile_id| Self {
            member_profile_id,
            account_id: scope.account_id,
        })
    }
}

/// The fields of a summary the posting path owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryState {
    /// Number of postings folded into the summary.
    pub count: i64,
    /// Latest ledger balance of the scope.
    pub balance: Decimal,
    /// Business date of the latest posting.
    pub last_pay: Option<DateTime<Utc>>,
}

/// What the posting path must write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryChange {
    /// No summary existed; insert this one.
    Create(SummaryState),
    /// Overwrite the existing summary with this state.
    Update(SummaryState),
}

impl SummaryChange {
    /// The state to persist.
    #[must_use]
    pub const fn state(&self) -> &SummaryState {
        match self {
            Self::Create(state) | Self::Update(state) => state,
        }
    }
}

/// Folds one posting into the current summary.
#[must_use]
pub fn apply_posting(
    current: Option<&SummaryState>,
    new_balance: Decimal,
    last_pay: DateTime<Utc>,
) -> SummaryChange {
    match current {
        None => SummaryChange::Create(SummaryState {
            count: 1,
            balance: new_balance,
            last_pay: Some(last_pay),
        }),
        Some(existing) => SummaryChange::Update(SummaryState {
            count: existing.count.saturating_add(1),
            balance: new_balance,
            last_pay: Some(last_pay),
        }),
    }
}

/// Whether a summary agrees with the latest ledger balance of its scope.
///
/// No summary and no entries is consistent; a summary without entries is not.
#[must_use]
pub fn is_consistent(summary: Option<Decimal>, latest_entry: Option<Decimal>) -> bool {
    match (summary, latest_entry) {
        (Some(s), Some(e)) => s == e,
        (None, None) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use coopledger_shared::types::{BranchId, OrganizationId};
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn pay_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 1, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_first_posting_creates_with_count_one() {
        let change = apply_posting(None, dec!(250), pay_time());
        assert_eq!(
            change,
            SummaryChange::Create(SummaryState {
                count: 1,
                balance: dec!(250),
                last_pay: Some(pay_time()),
            })
        );
    }

    #[test]
    fn test_later_posting_increments_count_and_overwrites_balance() {
        let current = SummaryState {
            count: 4,
            balance: dec!(100),
            last_pay: None,
        };
        let change = apply_posting(Some(&current), dec!(75.50), pay_time());
        let SummaryChange::Update(state) = change else {
            panic!("expected update");
        };
        assert_eq!(state.count, 5);
        assert_eq!(state.balance, dec!(75.50));
        assert_eq!(state.last_pay, Some(pay_time()));
    }

    #[test]
    fn test_key_only_for_member_scopes() {
        let mut scope = PostingScope {
            organization_id: OrganizationId::new(),
            branch_id: BranchId::new(),
            account_id: AccountId::new(),
            member_profile_id: None,
        };
        assert!(SummaryKey::for_scope(&scope).is_none());

        let member = MemberProfileId::new();
        scope.member_profile_id = Some(member);
        let key = SummaryKey::for_scope(&scope).unwrap();
        assert_eq!(key.member_profile_id, member);
        assert_eq!(key.account_id, scope.account_id);
    }

    #[test]
    fn test_consistency_check() {
        assert!(is_consistent(Some(dec!(10)), Some(dec!(10.00))));
        assert!(!is_consistent(Some(dec!(10)), Some(dec!(11))));
        assert!(is_consistent(None, None));
        assert!(!is_consistent(Some(dec!(0)), None));
        assert!(!is_consistent(None, Some(dec!(0))));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// After N postings the count is N and the balance is the last one.
        #[test]
        fn prop_summary_tracks_last_balance(
            balances in prop::collection::vec(-1_000_000i64..1_000_000, 1..50),
        ) {
            let mut state: Option<SummaryState> = None;
            for cents in &balances {
                let change = apply_posting(state.as_ref(), Decimal::new(*cents, 2), pay_time());
                state = Some(*change.state());
            }
            let state = state.unwrap();
            prop_assert_eq!(state.count, balances.len() as i64);
            prop_assert_eq!(state.balance, Decimal::new(*balances.last().unwrap(), 2));
        }
    }
}
