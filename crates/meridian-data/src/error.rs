//! Error types for data operations.

use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors raised by price data, providers and the result cache.
#[derive(Debug, Error)]
pub enum DataError {
    /// SQLite failure in the result cache
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// No usable price history
    #[error("Missing price data for {symbol}: {reason}")]
    MissingData {
        /// Ticker that was queried
        symbol: String,
        /// What was missing
        reason: String,
    },

    /// JSON encoding or decoding failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Ticker unknown to a provider or resolver
    #[error("Unknown ticker: {0}")]
    InvalidSymbol(String),

    /// Unrecognized estimation method or asset class key
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Cache handle unusable
    #[error("Cache error: {0}")]
    Cache(String),

    /// Filesystem failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = DataError::MissingData {
            symbol: "SPY".to_string(),
            reason: "Price history is empty".to_string(),
        };
        assert_eq!(err.to_string(), "Missing price data for SPY: Price history is empty");
        assert_eq!(
            DataError::InvalidSymbol("NOPE".to_string()).to_string(),
            "Unknown ticker: NOPE"
        );
    }
}
