//! Interest batch computation.
//!
//! Turns a dense daily series into statistics and, given an account's
//! savings terms, into interest and tax figures.

pub mod computation;
pub mod error;
pub mod stats;

pub use computation::{
    ComputationType, InterestOutcome, InterestPolicy, InterestTerms, compute_interest,
    round_currency,
};
pub use error::InterestError;
pub use stats::{SeriesStats, Trend, TrendPoint, mean};
