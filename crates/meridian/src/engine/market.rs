//! Market statistics built on cached profiles and correlations.
//!
//! Each statistic is cached in its own column of the ticker's profile row, so
//! computing one never overwrites another.

use super::RiskEngine;
use crate::error::Result;
use chrono::NaiveDate;
use meridian_data::{EstimationMethod, ProfileField, ProfileKey, ProfileUpdate};
use meridian_risk::RiskError;
use tracing::{debug, info};

impl RiskEngine {
    fn cached_field(&self, key: &ProfileKey, field: ProfileField) -> Option<f64> {
        let value = self.cache.filter_profile(key, &[field])?.get(field);
        if value.is_some() {
            debug!(ticker = %key.ticker, ?field, "profile field cache hit");
        }
        value
    }

    fn market_dates(
        &self,
        ticker: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<(NaiveDate, NaiveDate)> {
        let (_, _, calendar) = self.pair_calendar(ticker, &self.config.market_ticker)?;
        self.resolve_dates(&calendar, start, end)
    }

    /// Excess return per unit of volatility, against the current risk-free rate.
    pub fn sharpe_ratio(
        &self,
        ticker: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        method: EstimationMethod,
    ) -> Result<f64> {
        let profile = self.calculate_risk_return(ticker, start, end, method)?;
        let key = ProfileKey::new(ticker, profile.start_date, profile.end_date, method);
        if let Some(sharpe) = self.cached_field(&key, ProfileField::SharpeRatio) {
            return Ok(sharpe);
        }

        if profile.annual_volatility <= 0.0 {
            return Err(RiskError::InvalidParameter(format!(
                "{ticker} has zero volatility, Sharpe ratio undefined"
            ))
            .into());
        }
        let sharpe = (profile.annual_return - self.rates.rate()?) / profile.annual_volatility;

        self.cache.save_or_update_profile(
            &key,
            &ProfileUpdate {
                sharpe_ratio: Some(sharpe),
                ..ProfileUpdate::default()
            },
        )?;
        info!(ticker, %method, sharpe, "computed Sharpe ratio");
        Ok(sharpe)
    }

    /// Beta of `ticker` against the configured market proxy.
    ///
    /// β = ρ(ticker, market) · σ_ticker / σ_market, with both volatilities
    /// taken from the full-history profiles over the pair's date range.
    pub fn market_beta(
        &self,
        ticker: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        method: EstimationMethod,
    ) -> Result<f64> {
        let (start, end) = self.market_dates(ticker, start, end)?;
        let market = self.config.market_ticker.as_str();
        if ticker == market {
            return Ok(1.0);
        }

        let key = ProfileKey::new(ticker, start, end, method);
        if let Some(beta) = self.cached_field(&key, ProfileField::AssetBeta) {
            return Ok(beta);
        }

        let correlation = self
            .calculate_correlation(ticker, market, Some(start), Some(end), method)?
            .correlation;
        let asset = self.calculate_risk_return(ticker, Some(start), Some(end), method)?;
        let benchmark = self.calculate_risk_return(market, Some(start), Some(end), method)?;
        if benchmark.annual_volatility <= 0.0 {
            return Err(RiskError::InvalidParameter(format!(
                "market proxy {market} has zero volatility"
            ))
            .into());
        }
        let beta = correlation * asset.annual_volatility / benchmark.annual_volatility;

        self.cache.save_or_update_profile(
            &key,
            &ProfileUpdate {
                asset_beta: Some(beta),
                ..ProfileUpdate::default()
            },
        )?;
        info!(ticker, market, %method, beta, "computed market beta");
        Ok(beta)
    }

    /// CAPM cost of equity: rf + β · (R_market − rf).
    pub fn cost_of_equity(
        &self,
        ticker: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        method: EstimationMethod,
    ) -> Result<f64> {
        let (start, end) = self.market_dates(ticker, start, end)?;
        let key = ProfileKey::new(ticker, start, end, method);
        if let Some(cost) = self.cached_field(&key, ProfileField::EquityCost) {
            return Ok(cost);
        }

        let beta = self.market_beta(ticker, Some(start), Some(end), method)?;
        let market_return = self
            .calculate_risk_return(&self.config.market_ticker, Some(start), Some(end), method)?
            .annual_return;
        let risk_free = self.rates.rate()?;
        let cost = risk_free + beta * (market_return - risk_free);

        self.cache.save_or_update_profile(
            &key,
            &ProfileUpdate {
                equity_cost: Some(cost),
                ..ProfileUpdate::default()
            },
        )?;
        info!(ticker, %method, cost, "computed cost of equity");
        Ok(cost)
    }
}
