//! Dense daily balance reconstruction.
//!
//! The ledger only has rows on days with activity. Interest needs one balance
//! per calendar day, so this module collapses each day to its last write and
//! carries balances forward across quiet days.

use std::collections::BTreeMap;

use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while building a daily series.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BalanceError {
    /// The window ends before it starts.
    #[error("Invalid date range: {to} is before {from}")]
    InvertedRange {
        /// Requested first day.
        from: NaiveDate,
        /// Requested last day.
        to: NaiveDate,
    },

    /// A day boundary does not exist in the time zone.
    #[error("Day {0} has no start in time zone {1}")]
    AmbiguousDay(NaiveDate, String),
}

impl BalanceError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvertedRange { .. } => "INVALID_DATE_RANGE",
            Self::AmbiguousDay(..) => "AMBIGUOUS_DAY",
        }
    }
}

/// A posted balance with its position on the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatedBalance {
    /// When the entry is effective.
    pub at: DateTime<Utc>,
    /// Position within the scope; breaks ties between equal timestamps.
    pub sequence: i64,
    /// Running balance after the entry.
    pub balance: Decimal,
}

/// Collapses entries to the last balance of each calendar day in `tz`.
///
/// "Last" means the greatest `(at, sequence)`; input order does not matter.
pub fn collapse_latest_per_day<I>(entries: I, tz: Tz) -> BTreeMap<NaiveDate, Decimal>
where
    I: IntoIterator<Item = DatedBalance>,
{
    let mut latest: BTreeMap<NaiveDate, DatedBalance> = BTreeMap::new();
    for entry in entries {
        let day = entry.at.with_timezone(&tz).date_naive();
        match latest.get(&day) {
            Some(kept) if (kept.at, kept.sequence) > (entry.at, entry.sequence) => {}
            _ => {
                latest.insert(day, entry);
            }
        }
    }
    latest.into_iter().map(|(day, e)| (day, e.balance)).collect()
}

/// Returns `[start of from, start of the day after to)` in UTC.
pub fn window_bounds(
    from: NaiveDate,
    to: NaiveDate,
    tz: Tz,
) -> Result<(DateTime<Utc>, DateTime<Utc>), BalanceError> {
    if to < from {
        return Err(BalanceError::InvertedRange { from, to });
    }
    let end_day = to
        .checked_add_days(Days::new(1))
        .ok_or(BalanceError::InvertedRange { from, to })?;
    Ok((start_of_day(from, tz)?, start_of_day(end_day, tz)?))
}

/// First instant of a calendar day in `tz`, as UTC.
pub fn start_of_day(day: NaiveDate, tz: Tz) -> Result<DateTime<Utc>, BalanceError> {
    tz.from_local_datetime(&day.and_time(NaiveTime::MIN))
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| BalanceError::AmbiguousDay(day, tz.name().to_string()))
}

/// One balance per calendar day, both endpoints included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySeries {
    from: NaiveDate,
    balances: Vec<Decimal>,
}

impl DailySeries {
    /// First day of the series.
    #[must_use]
    pub const fn from(&self) -> NaiveDate {
        self.from
    }

    /// Last day of the series, `None` if empty.
    #[must_use]
    pub fn to(&self) -> Option<NaiveDate> {
        let len = u64::try_from(self.balances.len()).ok()?;
        len.checked_sub(1)
            .and_then(|offset| self.from.checked_add_days(Days::new(offset)))
    }

    /// The balances in day order.
    #[must_use]
    pub fn balances(&self) -> &[Decimal] {
        &self.balances
    }

    /// Number of days.
    #[must_use]
    pub fn len(&self) -> usize {
        self.balances.len()
    }

    /// True when the series has no days.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }

    /// Iterates `(day, balance)` pairs.
    pub fn days(&self) -> impl Iterator<Item = (NaiveDate, Decimal)> + '_ {
        self.from
            .iter_days()
            .zip(self.balances.iter().copied())
    }

    /// Beginning, ending, mean, extremes and per-day trend.
    #[must_use]
    pub fn stats(&self) -> crate::interest::SeriesStats {
        crate::interest::SeriesStats::from_series(self)
    }

    /// Groups the series by calendar month, in order.
    #[must_use]
    pub fn months(&self) -> Vec<Vec<(NaiveDate, Decimal)>> {
        let mut months: Vec<Vec<(NaiveDate, Decimal)>> = Vec::new();
        for (day, balance) in self.days() {
            match months.last_mut() {
                Some(current)
                    if current
                        .first()
                        .is_some_and(|(first, _)| same_month(*first, day)) =>
                {
                    current.push((day, balance));
                }
                _ => months.push(vec![(day, balance)]),
            }
        }
        months
    }
}

fn same_month(a: NaiveDate, b: NaiveDate) -> bool {
    use chrono::Datelike;
    a.year() == b.year() && a.month() == b.month()
}

/// Densifies sparse day closings into one balance per day of `[from, to]`.
///
/// Days without a closing carry the previous day's balance; the first day
/// carries `opening`, the balance of the last entry before `from`.
pub fn densify(
    from: NaiveDate,
    to: NaiveDate,
    opening: Decimal,
    closings: &BTreeMap<NaiveDate, Decimal>,
) -> Result<DailySeries, BalanceError> {
    if to < from {
        return Err(BalanceError::InvertedRange { from, to });
    }

    let mut balances = Vec::new();
    let mut running = opening;
    for day in from.iter_days().take_while(|day| *day <= to) {
        if let Some(closing) = closings.get(&day) {
            running = *closing;
        }
        balances.push(running);
    }

    Ok(DailySeries { from, balances })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn at(d: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, d, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_densify_carries_forward() {
        let closings = BTreeMap::from([(day(1), dec!(100)), (day(4), dec!(250))]);
        let series = densify(day(1), day(5), Decimal::ZERO, &closings).unwrap();
        assert_eq!(
            series.balances(),
            &[dec!(100), dec!(100), dec!(100), dec!(250), dec!(250)]
        );
        assert_eq!(series.to(), Some(day(5)));
    }

    #[test]
    fn test_densify_uses_opening_until_first_closing() {
        let closings = BTreeMap::from([(day(3), dec!(70))]);
        let series = densify(day(1), day(4), dec!(40), &closings).unwrap();
        assert_eq!(series.balances(), &[dec!(40), dec!(40), dec!(70), dec!(70)]);
    }

    #[test]
    fn test_densify_single_day() {
        let series = densify(day(2), day(2), dec!(5), &BTreeMap::new()).unwrap();
        assert_eq!(series.balances(), &[dec!(5)]);
    }

    #[test]
    fn test_inverted_range_is_error() {
        let err = densify(day(5), day(1), Decimal::ZERO, &BTreeMap::new()).unwrap_err();
        assert_eq!(err, BalanceError::InvertedRange { from: day(5), to: day(1) });
        assert_eq!(err.error_code(), "INVALID_DATE_RANGE");
        assert!(window_bounds(day(5), day(1), Tz::UTC).is_err());
    }

    #[test]
    fn test_collapse_keeps_last_write_of_day() {
        let entries = vec![
            DatedBalance { at: at(1, 9), sequence: 1, balance: dec!(10) },
            DatedBalance { at: at(1, 17), sequence: 3, balance: dec!(30) },
            DatedBalance { at: at(1, 12), sequence: 2, balance: dec!(20) },
            DatedBalance { at: at(2, 8), sequence: 4, balance: dec!(5) },
        ];
        let collapsed = collapse_latest_per_day(entries, Tz::UTC);
        assert_eq!(collapsed.get(&day(1)), Some(&dec!(30)));
        assert_eq!(collapsed.get(&day(2)), Some(&dec!(5)));
    }

    #[test]
    fn test_collapse_breaks_timestamp_ties_by_sequence() {
        let entries = vec![
            DatedBalance { at: at(1, 9), sequence: 8, balance: dec!(80) },
            DatedBalance { at: at(1, 9), sequence: 7, balance: dec!(70) },
        ];
        let collapsed = collapse_latest_per_day(entries, Tz::UTC);
        assert_eq!(collapsed.get(&day(1)), Some(&dec!(80)));
    }

    #[test]
    fn test_collapse_uses_local_calendar_day() {
        // 20:00 UTC on the 1st is already the 2nd in Manila (UTC+8).
        let entries = vec![DatedBalance { at: at(1, 20), sequence: 1, balance: dec!(9) }];
        let collapsed = collapse_latest_per_day(entries, chrono_tz::Asia::Manila);
        assert_eq!(collapsed.get(&day(2)), Some(&dec!(9)));
        assert!(collapsed.get(&day(1)).is_none());
    }

    #[test]
    fn test_window_bounds_in_time_zone() {
        let (start, end) = window_bounds(day(1), day(1), chrono_tz::Asia::Manila).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 2, 28, 16, 0, 0).unwrap());
        assert_eq!(end - start, Duration::days(1));
    }

    #[test]
    fn test_months_split_on_month_boundary() {
        let from = NaiveDate::from_ymd_opt(2025, 1, 30).unwrap();
        let to = NaiveDate::from_ymd_opt(2025, 2, 2).unwrap();
        let series = densify(from, to, dec!(1), &BTreeMap::new()).unwrap();
        let months = series.months();
        assert_eq!(months.len(), 2);
        assert_eq!(months[0].len(), 2);
        assert_eq!(months[1].len(), 2);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// The series has exactly one value per day of the inclusive window.
        #[test]
        fn prop_series_length_matches_window(
            start in 0u64..3000,
            span in 0u64..400,
            opening in -100_000i64..100_000,
        ) {
            let base = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
            let from = base + Days::new(start);
            let to = from + Days::new(span);
            let series = densify(from, to, Decimal::new(opening, 2), &BTreeMap::new()).unwrap();
            prop_assert_eq!(series.len() as u64, span + 1);
            prop_assert!(series.balances().iter().all(|b| *b == Decimal::new(opening, 2)));
        }

        /// Every day reports the latest closing at or before it.
        #[test]
        fn prop_each_day_is_latest_closing_so_far(
            closings in prop::collection::btree_map(0u64..60, -10_000i64..10_000, 0..20),
        ) {
            let base = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
            let closings: BTreeMap<NaiveDate, Decimal> = closings
                .into_iter()
                .map(|(offset, b)| (base + Days::new(offset), Decimal::from(b)))
                .collect();
            let series = densify(base, base + Days::new(59), Decimal::ZERO, &closings).unwrap();
            for (day, balance) in series.days() {
                let expected = closings
                    .range(..=day)
                    .next_back()
                    .map_or(Decimal::ZERO, |(_, b)| *b);
                prop_assert_eq!(balance, expected);
            }
        }
    }
}
