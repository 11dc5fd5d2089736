//! Error types for the engine.

use chrono::NaiveDate;
use meridian_data::DataError;
use meridian_risk::RiskError;
use thiserror::Error;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors returned by [`crate::RiskEngine`].
#[derive(Debug, Error)]
pub enum EngineError {
    /// Data, provider or cache error
    #[error(transparent)]
    Data(#[from] DataError),

    /// Estimation error
    #[error(transparent)]
    Risk(#[from] RiskError),

    /// The requested range ends before it starts
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidDateRange {
        /// Requested start date
        start: NaiveDate,
        /// Resolved end date
        end: NaiveDate,
    },

    /// The requested range starts in the future
    #[error("Start date {start} is after today ({today})")]
    FutureStartDate {
        /// Requested start date
        start: NaiveDate,
        /// Reference date
        today: NaiveDate,
    },
}
