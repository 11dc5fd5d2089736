//! Asset classes and estimation method identifiers.

use crate::error::{DataError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Trading days in an equity year.
pub const EQUITY_TRADING_DAYS: f64 = 252.0;

/// Trading days in a crypto year (every calendar day).
pub const CRYPTO_TRADING_DAYS: f64 = 365.0;

/// Asset class, which determines the trading calendar of a ticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetClass {
    /// Exchange-traded equity (business-day calendar)
    Equity,
    /// Crypto currency (trades continuously)
    Crypto,
}

impl AssetClass {
    /// Fraction of a year represented by one observation.
    pub const fn period(&self) -> f64 {
        match self {
            Self::Equity => 1.0 / EQUITY_TRADING_DAYS,
            Self::Crypto => 1.0 / CRYPTO_TRADING_DAYS,
        }
    }

    /// Whether the asset trades on every calendar day.
    pub const fn is_continuous(&self) -> bool {
        matches!(self, Self::Crypto)
    }

    /// Convert to database string representation.
    pub const fn to_db_str(&self) -> &'static str {
        match self {
            Self::Equity => "equity",
            Self::Crypto => "crypto",
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

/// Statistical methodology used to fit a normal return model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EstimationMethod {
    /// Sample moments (telescoping drift, Bessel-corrected variance)
    MomentMatching,
    /// Quartile matching against the normal inverse CDF
    PercentileMatching,
    /// Maximum likelihood
    MaximumLikelihood,
}

impl EstimationMethod {
    /// All methods, in a stable order.
    pub const ALL: [Self; 3] = [
        Self::MomentMatching,
        Self::PercentileMatching,
        Self::MaximumLikelihood,
    ];

    /// Convert to database string representation.
    pub const fn to_db_str(&self) -> &'static str {
        match self {
            Self::MomentMatching => "moments",
            Self::PercentileMatching => "percentiles",
            Self::MaximumLikelihood => "likelihood",
        }
    }

    /// Parse from database string representation.
    pub fn from_db_str(s: &str) -> Result<Self> {
        match s {
            "moments" => Ok(Self::MomentMatching),
            "percentiles" => Ok(Self::PercentileMatching),
            "likelihood" => Ok(Self::MaximumLikelihood),
            _ => Err(DataError::Configuration(format!(
                "Unrecognized estimation method: {s}"
            ))),
        }
    }
}

impl fmt::Display for EstimationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

impl FromStr for EstimationMethod {
    type Err = DataError;

    /// Accepts the storage keys as well as the snake-case variant names.
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "moments" | "moment_matching" => Ok(Self::MomentMatching),
            "percentiles" | "percentile_matching" => Ok(Self::PercentileMatching),
            "likelihood" | "maximum_likelihood" => Ok(Self::MaximumLikelihood),
            _ => Err(DataError::Configuration(format!(
                "Unrecognized estimation method: {s}"
            ))),
        }
    }
}
