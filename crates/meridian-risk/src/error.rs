//! Error types for risk estimation.

use chrono::NaiveDate;
use meridian_data::{DataError, EstimationMethod};
use thiserror::Error;

/// Result type for risk estimation.
pub type Result<T> = std::result::Result<T, RiskError>;

/// Errors that can occur while building samples and estimating statistics.
#[derive(Debug, Error)]
pub enum RiskError {
    /// Insufficient data for estimation
    #[error("Insufficient data: need at least {required} observations, got {actual}")]
    InsufficientData {
        /// Required number of observations
        required: usize,
        /// Actual number of observations
        actual: usize,
    },

    /// A price that cannot produce a log return
    #[error("Invalid price for {symbol} on {date}: {price}")]
    InvalidPrice {
        /// Ticker symbol
        symbol: String,
        /// Date of the observation
        date: NaiveDate,
        /// Offending price
        price: f64,
    },

    /// Dimension mismatch
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension
        actual: usize,
    },

    /// The estimator could not fit the sample
    #[error("{method} estimation failed: {reason}")]
    Estimation {
        /// Method that failed
        method: EstimationMethod,
        /// Reason for the failure
        reason: String,
    },

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Data model error
    #[error("Data error: {0}")]
    Data(#[from] DataError),
}

impl RiskError {
    pub(crate) fn estimation(method: EstimationMethod, reason: impl ToString) -> Self {
        Self::Estimation {
            method,
            reason: reason.to_string(),
        }
    }

    /// Whether this is a sample-size failure.
    pub const fn is_insufficient_data(&self) -> bool {
        matches!(self, Self::InsufficientData { .. })
    }
}
