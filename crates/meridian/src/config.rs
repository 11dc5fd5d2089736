//! Engine configuration.

use crate::cache_location::default_cache_path;
use crate::error::Result;
use chrono::NaiveDate;
use meridian_data::DataError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for [`crate::RiskEngine`].
///
/// The estimation method is deliberately absent: every call names its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// SQLite cache location (default: platform cache directory)
    pub cache_path: Option<PathBuf>,

    /// Ticker used as the market proxy for betas (default: SPY)
    pub market_ticker: String,

    /// Trading days looked back when no start date is given (default: 100)
    pub lookback_days: u32,

    /// Refit with moment matching when another method fails (default: false)
    pub fallback_to_moments: bool,

    /// Reference date standing in for today (default: current UTC date)
    pub as_of: Option<NaiveDate>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_path: None,
            market_ticker: "SPY".to_string(),
            lookback_days: 100,
            fallback_to_moments: false,
            as_of: None,
        }
    }
}

impl EngineConfig {
    /// Load a configuration from a JSON file. Missing keys take their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(DataError::from)?;
        Self::from_json(&contents)
    }

    /// Parse a configuration from JSON.
    pub fn from_json(contents: &str) -> Result<Self> {
        Ok(serde_json::from_str(contents).map_err(DataError::from)?)
    }

    /// Cache location, falling back to the platform default.
    pub fn resolved_cache_path(&self) -> PathBuf {
        self.cache_path.clone().unwrap_or_else(default_cache_path)
    }
}
