//! Point-in-time account configuration.
//!
//! Snapshots are append-only copies of [`AccountTerms`]. The configuration
//! effective at `T` is the latest snapshot recorded at or before `T`.

pub mod types;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

pub use types::{AccountSnapshot, AccountTerms, ChangeType, Resolved, Timestamped};

/// Returns the item with the greatest timestamp `<= as_of`.
///
/// Ties resolve to the later item in slice order, so callers that pass rows in
/// insertion order get the most recently written one.
pub fn select_effective<T: Timestamped>(items: &[T], as_of: DateTime<Utc>) -> Option<&T> {
    items
        .iter()
        .filter(|item| item.recorded_at() <= as_of)
        .fold(None, |best: Option<&T>, item| match best {
            Some(current) if current.recorded_at() > item.recorded_at() => Some(current),
            _ => Some(item),
        })
}

/// Resolves an effective-at lookup, falling back to the live configuration.
///
/// Returns `None` only when there is neither a snapshot nor a live row.
pub fn resolve_effective<T>(
    snapshot: Option<T>,
    live: impl FnOnce() -> Option<T>,
) -> Option<Resolved<T>> {
    match snapshot {
        Some(found) => Some(Resolved::Exact(found)),
        None => live().map(Resolved::Approximate),
    }
}

/// Keeps the effective item per key at `as_of`.
pub fn latest_per_key<T, K, F>(items: &[T], as_of: DateTime<Utc>, key: F) -> Vec<&T>
where
    T: Timestamped,
    K: Ord,
    F: Fn(&T) -> K,
{
    let mut latest: BTreeMap<K, &T> = BTreeMap::new();
    for item in items.iter().filter(|item| item.recorded_at() <= as_of) {
        let slot = latest.entry(key(item)).or_insert(item);
        if item.recorded_at() >= slot.recorded_at() {
            *slot = item;
        }
    }
    latest.into_values().collect()
}

/// Names of the fields that differ between two configurations.
#[must_use]
pub fn changed_fields(before: &AccountTerms, after: &AccountTerms) -> Vec<&'static str> {
    let mut changed = Vec::new();
    macro_rules! diff {
        ($($field:ident),+ $(,)?) => {
            $(
                if before.$field != after.$field {
                    changed.push(stringify!($field));
                }
            )+
        };
    }
    diff!(
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
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{AccountKind, GeneralLedgerType};
    use chrono::{Duration, TimeZone};
    use coopledger_shared::types::AccountId;
    use proptest::prelude::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn terms(rate: Decimal) -> AccountTerms {
        AccountTerms {
            name: "Regular Savings".to_string(),
            description: None,
            general_ledger_type: Some(GeneralLedgerType::Liabilities),
            kind: AccountKind::Deposit,
            currency_code: "PHP".to_string(),
            member_type_id: None,
            loan_account_id: None,
            min_amount: dec!(0),
            max_amount: dec!(1000000),
            interest_rate: rate,
            minimum_balance: dec!(500),
            below_minimum_charge: dec!(0),
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

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    fn snapshot_at(account_id: AccountId, offset_hours: i64, rate: Decimal) -> AccountSnapshot {
        AccountSnapshot {
            account_id,
            change_type: ChangeType::Updated,
            recorded_at: base_time() + Duration::hours(offset_hours),
            terms: terms(rate),
        }
    }

    #[test]
    fn test_select_before_first_snapshot_is_none() {
        let id = AccountId::new();
        let history = vec![snapshot_at(id, 10, dec!(0.01))];
        assert!(select_effective(&history, base_time()).is_none());
    }

    #[test]
    fn test_select_exact_timestamp_is_inclusive() {
        let id = AccountId::new();
        let history = vec![snapshot_at(id, 0, dec!(0.01)), snapshot_at(id, 5, dec!(0.02))];
        let found = select_effective(&history, base_time() + Duration::hours(5)).unwrap();
        assert_eq!(found.terms.interest_rate, dec!(0.02));
    }

    #[test]
    fn test_select_ignores_input_order() {
        let id = AccountId::new();
        let history = vec![
            snapshot_at(id, 20, dec!(0.03)),
            snapshot_at(id, 0, dec!(0.01)),
            snapshot_at(id, 10, dec!(0.02)),
        ];
        let found = select_effective(&history, base_time() + Duration::hours(15)).unwrap();
        assert_eq!(found.terms.interest_rate, dec!(0.02));
    }

    #[test]
    fn test_resolve_prefers_snapshot() {
        let resolved = resolve_effective(Some(1), || Some(2)).unwrap();
        assert_eq!(resolved, Resolved::Exact(1));
        assert!(resolved.is_exact());
    }

    #[test]
    fn test_resolve_falls_back_to_live_row() {
        let resolved = resolve_effective(None, || Some(2)).unwrap();
        assert_eq!(resolved, Resolved::Approximate(2));
        assert!(!resolved.is_exact());
        assert_eq!(resolved.map(|v| v * 10).into_inner(), 20);
    }

    #[test]
    fn test_resolve_none_without_live_row() {
        assert!(resolve_effective::<i32>(None, || None).is_none());
    }

    #[test]
    fn test_latest_per_key() {
        let a = AccountId::new();
        let b = AccountId::new();
        let history = vec![
            snapshot_at(a, 0, dec!(0.01)),
            snapshot_at(b, 1, dec!(0.05)),
            snapshot_at(a, 2, dec!(0.02)),
            snapshot_at(a, 9, dec!(0.09)),
        ];
        let picked = latest_per_key(&history, base_time() + Duration::hours(3), |s| s.account_id);
        assert_eq!(picked.len(), 2);
        let rate_a = picked.iter().find(|s| s.account_id == a).unwrap().terms.interest_rate;
        assert_eq!(rate_a, dec!(0.02));
    }

    #[test]
    fn test_changed_fields_lists_only_differences() {
        let before = terms(dec!(0.01));
        let mut after = terms(dec!(0.02));
        after.name = "Premium Savings".to_string();
        assert_eq!(changed_fields(&before, &after), vec!["name", "interest_rate"]);
        assert!(changed_fields(&before, &before.clone()).is_empty());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// For as_of between snapshot[i] and snapshot[i+1], snapshot[i] is returned.
        #[test]
        fn prop_between_snapshots_returns_earlier(
            gaps in prop::collection::vec(1i64..1000, 2..12),
            pick in any::<prop::sample::Index>(),
            into_gap in 0i64..1000,
        ) {
            let id = AccountId::new();
            let mut offset = 0;
            let mut history = Vec::new();
            for (i, gap) in gaps.iter().enumerate() {
                offset += gap;
                history.push(snapshot_at(id, offset, Decimal::from(i)));
            }
            let i = pick.index(history.len() - 1);
            let start = history[i].recorded_at;
            let end = history[i + 1].recorded_at;
            let span = (end - start).num_minutes();
            let as_of = start + Duration::minutes(span * into_gap / 1000);

            let found = select_effective(&history, as_of).unwrap();
            prop_assert_eq!(found.terms.interest_rate, Decimal::from(i));
        }
    }
}
