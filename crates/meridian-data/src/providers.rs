//! Collaborator contracts for upstream data.
//!
//! The engine never fetches anything itself. Price histories, asset classes
//! and the risk-free rate are supplied through these traits; network-backed
//! implementations live outside this workspace.

use crate::asset::AssetClass;
use crate::error::{DataError, Result};
use crate::prices::PriceSeries;
use chrono::NaiveDate;
use std::collections::HashMap;

/// Source of daily price histories.
pub trait PriceHistoryProvider: Send + Sync {
    /// Prices for `ticker` within `[start, end]`, latest first.
    fn get(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<PriceSeries>;
}

/// Maps tickers to their asset class.
pub trait AssetTypeResolver: Send + Sync {
    /// Asset class of `ticker`.
    ///
    /// # Errors
    /// Returns [`DataError::InvalidSymbol`] when the ticker cannot be mapped.
    fn resolve(&self, ticker: &str) -> Result<AssetClass>;
}

/// Source of the annualized risk-free rate.
pub trait RiskFreeRateProvider: Send + Sync {
    /// Current annualized risk-free rate, as a decimal.
    fn rate(&self) -> Result<f64>;
}

/// Provider backed by histories held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    series: HashMap<String, PriceSeries>,
    classes: HashMap<String, AssetClass>,
    risk_free_rate: f64,
}

impl InMemoryProvider {
    /// Create an empty provider with a zero risk-free rate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a ticker's history and asset class.
    pub fn with_series(mut self, series: PriceSeries, class: AssetClass) -> Self {
        let symbol = series.symbol().to_string();
        self.classes.insert(symbol.clone(), class);
        self.series.insert(symbol, series);
        self
    }

    /// Set the risk-free rate.
    pub const fn with_risk_free_rate(mut self, rate: f64) -> Self {
        self.risk_free_rate = rate;
        self
    }
}

impl PriceHistoryProvider for InMemoryProvider {
    fn get(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<PriceSeries> {
        self.series
            .get(ticker)
            .ok_or_else(|| DataError::InvalidSymbol(ticker.to_string()))?
            .between(start, end)
    }
}

impl AssetTypeResolver for InMemoryProvider {
    fn resolve(&self, ticker: &str) -> Result<AssetClass> {
        self.classes
            .get(ticker)
            .copied()
            .ok_or_else(|| DataError::InvalidSymbol(ticker.to_string()))
    }
}

impl RiskFreeRateProvider for InMemoryProvider {
    fn rate(&self) -> Result<f64> {
        Ok(self.risk_free_rate)
    }
}
