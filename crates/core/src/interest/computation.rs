//! Savings interest computation.
//!
//! Each computation type picks a base balance out of the daily series; the
//! base accrues `rate * days / annual_divisor`, and tax is a fraction of the
//! interest.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::error::InterestError;
use super::stats::{SeriesStats, mean};
use crate::daily_balance::DailySeries;

/// How the base balance of a savings account is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComputationType {
    /// Lowest balance of any day.
    DailyLowestBalance,
    /// Mean of all days.
    AverageDailyBalance,
    /// Lowest of the month-end balances.
    MonthlyEndLowestBalance,
    /// The smaller of the daily average and the ending balance.
    AdbEndBalance,
    /// Mean of each month's lowest balance.
    MonthlyLowestBalanceAverage,
    /// Mean of the month-end balances.
    MonthlyEndBalanceAverage,
    /// Ending balance of the window.
    MonthlyEndBalanceTotal,
}

impl ComputationType {
    /// All computation types.
    pub const ALL: [Self; 7] = [
        Self::DailyLowestBalance,
        Self::AverageDailyBalance,
        Self::MonthlyEndLowestBalance,
        Self::AdbEndBalance,
        Self::MonthlyLowestBalanceAverage,
        Self::MonthlyEndBalanceAverage,
        Self::MonthlyEndBalanceTotal,
    ];

    /// Returns the snake_case name stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DailyLowestBalance => "daily_lowest_balance",
            Self::AverageDailyBalance => "average_daily_balance",
            Self::MonthlyEndLowestBalance => "monthly_end_lowest_balance",
            Self::AdbEndBalance => "adb_end_balance",
            Self::MonthlyLowestBalanceAverage => "monthly_lowest_balance_average",
            Self::MonthlyEndBalanceAverage => "monthly_end_balance_average",
            Self::MonthlyEndBalanceTotal => "monthly_end_balance_total",
        }
    }

    /// Picks the base balance from a series and its statistics.
    #[must_use]
    pub fn base_balance(self, series: &DailySeries, stats: &SeriesStats) -> Decimal {
        let months = series.months();
        let month_ends: Vec<Decimal> = months
            .iter()
            .filter_map(|m| m.last().map(|(_, b)| *b))
            .collect();

        match self {
            Self::DailyLowestBalance => stats.lowest_balance,
            Self::AverageDailyBalance => stats.average_daily_balance,
            Self::MonthlyEndLowestBalance => month_ends
                .iter()
                .copied()
                .min()
                .unwrap_or(Decimal::ZERO),
            Self::AdbEndBalance => stats.average_daily_balance.min(stats.ending_balance),
            Self::MonthlyLowestBalanceAverage => {
                let lows: Vec<Decimal> = months
                    .iter()
                    .filter_map(|m| m.iter().map(|(_, b)| *b).min())
                    .collect();
                mean(&lows)
            }
            Self::MonthlyEndBalanceAverage => mean(&month_ends),
            Self::MonthlyEndBalanceTotal => stats.ending_balance,
        }
    }
}

impl std::str::FromStr for ComputationType {
    type Err = InterestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| InterestError::UnknownComputationType(s.to_string()))
    }
}

/// Account-level inputs of an interest computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterestTerms {
    /// Annual rate as a fraction (0.03 = 3%).
    pub rate: Decimal,
    /// Fraction of interest withheld as tax.
    pub tax_rate: Decimal,
    /// Whether the account is taxable at all.
    pub taxable: bool,
    /// Balances below this earn nothing and may be charged.
    pub minimum_balance: Decimal,
    /// Charge applied when the ending balance is below the minimum.
    pub below_minimum_charge: Decimal,
}

/// Run-level inputs of an interest computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterestPolicy {
    /// Days in the interest year.
    pub annual_divisor: u32,
    /// Windows shorter than this accrue nothing.
    pub minimum_period_days: u32,
}

impl Default for InterestPolicy {
    fn default() -> Self {
        Self {
            annual_divisor: 365,
            minimum_period_days: 30,
        }
    }
}

/// Outcome for one (member, account) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterestOutcome {
    /// Base balance the interest was computed on.
    pub base_balance: Decimal,
    /// Interest credited; negative when a below-minimum charge applies.
    pub interest: Decimal,
    /// Tax withheld.
    pub tax: Decimal,
    /// Balance after interest, tax and charges.
    pub ending_balance: Decimal,
}

/// Rounds a currency amount to cents with banker's rounding.
#[must_use]
pub fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
}

/// Computes the interest of one pair.
///
/// Returns `Ok(None)` when the pair is skipped: a zero ending balance, or a
/// below-minimum balance with no charge configured.
pub fn compute_interest(
    computation: ComputationType,
    series: &DailySeries,
    stats: &SeriesStats,
    terms: &InterestTerms,
    policy: &InterestPolicy,
) -> Result<Option<InterestOutcome>, InterestError> {
    if policy.annual_divisor == 0 {
        return Err(InterestError::ZeroAnnualDivisor);
    }
    if terms.rate < Decimal::ZERO || terms.tax_rate < Decimal::ZERO {
        return Err(InterestError::NegativeRate);
    }

    let ending = stats.ending_balance;
    if ending.is_zero() {
        return Ok(None);
    }

    if ending < terms.minimum_balance {
        if terms.below_minimum_charge.is_zero() {
            return Ok(None);
        }
        return Ok(Some(InterestOutcome {
            base_balance: ending,
            interest: -terms.below_minimum_charge,
            tax: Decimal::ZERO,
            ending_balance: ending - terms.below_minimum_charge,
        }));
    }

    let base = computation.base_balance(series, stats);
    let interest = if stats.day_count < policy.minimum_period_days || base <= Decimal::ZERO {
        Decimal::ZERO
    } else {
        round_currency(
            base * terms.rate * Decimal::from(stats.day_count)
                / Decimal::from(policy.annual_divisor),
        )
    };
    let tax = if terms.taxable {
        round_currency(interest * terms.tax_rate)
    } else {
        Decimal::ZERO
    };

    Ok(Some(InterestOutcome {
        base_balance: base,
        interest,
        tax,
        ending_balance: ending + interest - tax,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::daily_balance::densify;
    use chrono::{Days, NaiveDate};
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;
    use std::str::FromStr;

    fn jan(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    fn terms() -> InterestTerms {
        InterestTerms {
            rate: dec!(0.0365),
            tax_rate: dec!(0.20),
            taxable: true,
            minimum_balance: dec!(100),
            below_minimum_charge: dec!(0),
        }
    }

    fn flat_series(days: u64, balance: Decimal) -> DailySeries {
        densify(jan(1), jan(1) + Days::new(days - 1), balance, &BTreeMap::new()).unwrap()
    }

    #[test]
    fn test_flat_balance_interest() {
        // 1000 * 0.0365 * 100 / 365 = 10.00
        let series = flat_series(100, dec!(1000));
        let stats = SeriesStats::from_series(&series);
        let outcome = compute_interest(
            ComputationType::AverageDailyBalance,
            &series,
            &stats,
            &terms(),
            &InterestPolicy::default(),
        )
        .unwrap()
        .unwrap();
        assert_eq!(outcome.interest, dec!(10.00));
        assert_eq!(outcome.tax, dec!(2.00));
        assert_eq!(outcome.ending_balance, dec!(1008.00));
    }

    #[test]
    fn test_short_window_accrues_nothing() {
        let series = flat_series(10, dec!(1000));
        let stats = SeriesStats::from_series(&series);
        let outcome = compute_interest(
            ComputationType::DailyLowestBalance,
            &series,
            &stats,
            &terms(),
            &InterestPolicy::default(),
        )
        .unwrap()
        .unwrap();
        assert_eq!(outcome.interest, Decimal::ZERO);
        assert_eq!(outcome.ending_balance, dec!(1000));
    }

    #[test]
    fn test_zero_ending_balance_is_skipped() {
        let series = flat_series(40, Decimal::ZERO);
        let stats = SeriesStats::from_series(&series);
        let outcome = compute_interest(
            ComputationType::AverageDailyBalance,
            &series,
            &stats,
            &terms(),
            &InterestPolicy::default(),
        )
        .unwrap();
        assert!(outcome.is_none());
    }

    #[test]
    fn test_below_minimum_without_charge_is_skipped() {
        let series = flat_series(40, dec!(50));
        let stats = SeriesStats::from_series(&series);
        let outcome = compute_interest(
            ComputationType::AverageDailyBalance,
            &series,
            &stats,
            &terms(),
            &InterestPolicy::default(),
        )
        .unwrap();
        assert!(outcome.is_none());
    }

    #[test]
    fn test_below_minimum_with_charge() {
        let series = flat_series(40, dec!(50));
        let stats = SeriesStats::from_series(&series);
        let mut t = terms();
        t.below_minimum_charge = dec!(15);
        let outcome = compute_interest(
            ComputationType::AverageDailyBalance,
            &series,
            &stats,
            &t,
            &InterestPolicy::default(),
        )
        .unwrap()
        .unwrap();
        assert_eq!(outcome.interest, dec!(-15));
        assert_eq!(outcome.tax, Decimal::ZERO);
        assert_eq!(outcome.ending_balance, dec!(35));
    }

    #[test]
    fn test_non_taxable_account_has_no_tax() {
        let series = flat_series(100, dec!(1000));
        let stats = SeriesStats::from_series(&series);
        let mut t = terms();
        t.taxable = false;
        let outcome = compute_interest(
            ComputationType::MonthlyEndBalanceTotal,
            &series,
            &stats,
            &t,
            &InterestPolicy::default(),
        )
        .unwrap()
        .unwrap();
        assert_eq!(outcome.tax, Decimal::ZERO);
    }

    #[test]
    fn test_zero_divisor_rejected() {
        let series = flat_series(40, dec!(1000));
        let stats = SeriesStats::from_series(&series);
        let policy = InterestPolicy {
            annual_divisor: 0,
            minimum_period_days: 30,
        };
        assert_eq!(
            compute_interest(ComputationType::AverageDailyBalance, &series, &stats, &terms(), &policy),
            Err(InterestError::ZeroAnnualDivisor)
        );
    }

    fn two_month_series() -> DailySeries {
        // Jan 30 = 100, Jan 31 = 300, Feb 1 = 50, Feb 2 = 200
        let closings = BTreeMap::from([
            (jan(30), dec!(100)),
            (jan(31), dec!(300)),
            (NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(), dec!(50)),
            (NaiveDate::from_ymd_opt(2025, 2, 2).unwrap(), dec!(200)),
        ]);
        densify(jan(30), NaiveDate::from_ymd_opt(2025, 2, 2).unwrap(), Decimal::ZERO, &closings)
            .unwrap()
    }

    #[rstest]
    #[case(ComputationType::DailyLowestBalance, dec!(50))]
    #[case(ComputationType::AverageDailyBalance, dec!(162.5))]
    #[case(ComputationType::MonthlyEndLowestBalance, dec!(200))]
    #[case(ComputationType::AdbEndBalance, dec!(162.5))]
    #[case(ComputationType::MonthlyLowestBalanceAverage, dec!(75))]
    #[case(ComputationType::MonthlyEndBalanceAverage, dec!(250))]
    #[case(ComputationType::MonthlyEndBalanceTotal, dec!(200))]
    fn test_base_balance_per_type(#[case] computation: ComputationType, #[case] expected: Decimal) {
        let series = two_month_series();
        let stats = SeriesStats::from_series(&series);
        assert_eq!(computation.base_balance(&series, &stats), expected);
    }

    #[test]
    fn test_computation_type_round_trips_names() {
        for t in ComputationType::ALL {
            assert_eq!(ComputationType::from_str(t.as_str()).unwrap(), t);
        }
        assert!(ComputationType::from_str("weekly").is_err());
    }

    #[test]
    fn test_round_currency_is_bankers() {
        assert_eq!(round_currency(dec!(0.125)), dec!(0.12));
        assert_eq!(round_currency(dec!(0.135)), dec!(0.14));
    }
}
