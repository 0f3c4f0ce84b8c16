//! Statistics over a daily balance series.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::daily_balance::DailySeries;

/// Movement of a day's balance relative to the previous day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    /// Higher than the previous day.
    Increase,
    /// Lower than the previous day.
    Decrease,
    /// Unchanged, or the first day.
    NoChange,
}

/// One day of a classified series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendPoint {
    /// Calendar day.
    pub date: NaiveDate,
    /// Ending balance of the day.
    pub balance: Decimal,
    /// Movement against the previous day.
    pub trend: Trend,
}

/// Summary figures of a daily series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesStats {
    /// Balance of the first day.
    pub beginning_balance: Decimal,
    /// Balance of the last day.
    pub ending_balance: Decimal,
    /// Arithmetic mean of all days.
    pub average_daily_balance: Decimal,
    /// Smallest daily balance.
    pub lowest_balance: Decimal,
    /// Largest daily balance.
    pub highest_balance: Decimal,
    /// Number of days.
    pub day_count: u32,
    /// Per-day classification.
    pub points: Vec<TrendPoint>,
}

impl SeriesStats {
    /// Stats of an empty window: every figure zero.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            beginning_balance: Decimal::ZERO,
            ending_balance: Decimal::ZERO,
            average_daily_balance: Decimal::ZERO,
            lowest_balance: Decimal::ZERO,
            highest_balance: Decimal::ZERO,
            day_count: 0,
            points: Vec::new(),
        }
    }

    /// Computes the statistics of a series.
    ///
    /// The mean is an exact decimal sum divided by the day count.
    #[must_use]
    pub fn from_series(series: &DailySeries) -> Self {
        let balances = series.balances();
        let (Some(&first), Some(&last)) = (balances.first(), balances.last()) else {
            return Self::empty();
        };

        let mut sum = Decimal::ZERO;
        let mut lowest = first;
        let mut highest = first;
        let mut previous: Option<Decimal> = None;
        let mut points = Vec::with_capacity(balances.len());

        for (date, balance) in series.days() {
            sum += balance;
            lowest = lowest.min(balance);
            highest = highest.max(balance);
            points.push(TrendPoint {
                date,
                balance,
                trend: classify(previous, balance),
            });
            previous = Some(balance);
        }

        let day_count = u32::try_from(balances.len()).unwrap_or(u32::MAX);
        Self {
            beginning_balance: first,
            ending_balance: last,
            average_daily_balance: sum / Decimal::from(day_count),
            lowest_balance: lowest,
            highest_balance: highest,
            day_count,
            points,
        }
    }
}

fn classify(previous: Option<Decimal>, current: Decimal) -> Trend {
    match previous {
        Some(prev) if current > prev => Trend::Increase,
        Some(prev) if current < prev => Trend::Decrease,
        _ => Trend::NoChange,
    }
}

/// Arithmetic mean of a slice, zero when empty.
#[must_use]
pub fn mean(values: &[Decimal]) -> Decimal {
    if values.is_empty() {
        return Decimal::ZERO;
    }
    let sum: Decimal = values.iter().copied().sum();
    sum / Decimal::from(values.len())
}
