//! Computed results and the keys they are cached under.

use crate::asset::EstimationMethod;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Cache key of a univariate risk profile.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProfileKey {
    /// Ticker symbol
    pub ticker: String,
    /// First date of the sample
    pub start_date: NaiveDate,
    /// Last date of the sample
    pub end_date: NaiveDate,
    /// Estimation method
    pub method: EstimationMethod,
}

impl ProfileKey {
    /// Create a new profile key.
    pub fn new(
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        method: EstimationMethod,
    ) -> Self {
        Self {
            ticker: ticker.to_string(),
            start_date,
            end_date,
            method,
        }
    }
}

/// Cache key of a pairwise correlation. Lookups are order-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrelationKey {
    /// First ticker
    pub ticker_1: String,
    /// Second ticker
    pub ticker_2: String,
    /// First date of the sample
    pub start_date: NaiveDate,
    /// Last date of the sample
    pub end_date: NaiveDate,
    /// Estimation method
    pub method: EstimationMethod,
}

impl CorrelationKey {
    /// Create a new correlation key.
    pub fn new(
        ticker_1: &str,
        ticker_2: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        method: EstimationMethod,
    ) -> Self {
        Self {
            ticker_1: ticker_1.to_string(),
            ticker_2: ticker_2.to_string(),
            start_date,
            end_date,
            method,
        }
    }

    /// The same key with the tickers swapped.
    pub fn reversed(&self) -> Self {
        Self {
            ticker_1: self.ticker_2.clone(),
            ticker_2: self.ticker_1.clone(),
            ..self.clone()
        }
    }
}

/// Annualized return and volatility of one ticker over a date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskProfile {
    /// Ticker symbol
    pub ticker: String,
    /// First date of the sample
    pub start_date: NaiveDate,
    /// Last date of the sample
    pub end_date: NaiveDate,
    /// Estimation method
    pub method: EstimationMethod,
    /// Annualized expected (simple) return, Ito-corrected
    pub annual_return: f64,
    /// Annualized volatility
    pub annual_volatility: f64,
}

impl RiskProfile {
    /// Build a profile for a key.
    pub fn from_key(key: &ProfileKey, annual_return: f64, annual_volatility: f64) -> Self {
        Self {
            ticker: key.ticker.clone(),
            start_date: key.start_date,
            end_date: key.end_date,
            method: key.method,
            annual_return,
            annual_volatility,
        }
    }

    /// Drift of the log price, i.e. the annual return without the Ito term.
    pub fn log_drift(&self) -> f64 {
        self.annual_return - 0.5 * self.annual_volatility.powi(2)
    }
}

/// Correlation between two tickers over a date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResult {
    /// First ticker
    pub ticker_1: String,
    /// Second ticker
    pub ticker_2: String,
    /// First date of the sample
    pub start_date: NaiveDate,
    /// Last date of the sample
    pub end_date: NaiveDate,
    /// Estimation method
    pub method: EstimationMethod,
    /// Correlation coefficient in [-1, 1]
    pub correlation: f64,
}

impl CorrelationResult {
    /// Build a result for a key.
    pub fn from_key(key: &CorrelationKey, correlation: f64) -> Self {
        Self {
            ticker_1: key.ticker_1.clone(),
            ticker_2: key.ticker_2.clone(),
            start_date: key.start_date,
            end_date: key.end_date,
            method: key.method,
            correlation,
        }
    }
}

/// Nullable columns of a cached profile row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileField {
    /// Annualized return
    AnnualReturn,
    /// Annualized volatility
    AnnualVolatility,
    /// Sharpe ratio
    SharpeRatio,
    /// Market beta
    AssetBeta,
    /// Cost of equity
    EquityCost,
}

impl ProfileField {
    /// Return and volatility, the fields of a [`RiskProfile`].
    pub const RISK_RETURN: [Self; 2] = [Self::AnnualReturn, Self::AnnualVolatility];
}

/// A partial set of profile columns. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProfileUpdate {
    /// Annualized return
    pub annual_return: Option<f64>,
    /// Annualized volatility
    pub annual_volatility: Option<f64>,
    /// Sharpe ratio
    pub sharpe_ratio: Option<f64>,
    /// Market beta
    pub asset_beta: Option<f64>,
    /// Cost of equity
    pub equity_cost: Option<f64>,
}

impl ProfileUpdate {
    /// Update carrying a return and a volatility.
    pub const fn risk_return(annual_return: f64, annual_volatility: f64) -> Self {
        Self {
            annual_return: Some(annual_return),
            annual_volatility: Some(annual_volatility),
            sharpe_ratio: None,
            asset_beta: None,
            equity_cost: None,
        }
    }

    /// Value of one field, if set.
    pub const fn get(&self, field: ProfileField) -> Option<f64> {
        match field {
            ProfileField::AnnualReturn => self.annual_return,
            ProfileField::AnnualVolatility => self.annual_volatility,
            ProfileField::SharpeRatio => self.sharpe_ratio,
            ProfileField::AssetBeta => self.asset_beta,
            ProfileField::EquityCost => self.equity_cost,
        }
    }
}

/// A stored profile row. Columns may still be null.
pub type ProfileRecord = ProfileUpdate;
