//! Interest computation errors.

use thiserror::Error;

/// Errors that can occur while computing interest.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InterestError {
    /// The interest year has no days.
    #[error("Annual divisor must be greater than zero")]
    ZeroAnnualDivisor,

    /// Interest and tax rates cannot be negative.
    #[error("Interest and tax rates cannot be negative")]
    NegativeRate,

    /// The stored computation type is not recognised.
    #[error("Unknown savings computation type '{0}'")]
    UnknownComputationType(String),
}

impl InterestError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::ZeroAnnualDivisor => "ZERO_ANNUAL_DIVISOR",
            Self::NegativeRate => "NEGATIVE_RATE",
            Self::UnknownComputationType(_) => "UNKNOWN_COMPUTATION_TYPE",
        }
    }
}
