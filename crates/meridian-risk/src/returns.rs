//! Annualized log-return samples
//!
//! A [`ReturnSample`] holds one annualized log return per pair of adjacent
//! observations:
//!
//! x_t = ln(P_t / P_{t-1}) / (Δ_t · h)
//!
//! where Δ_t counts the calendar's trading days between the two observations
//! and h is the trading period (1/252 for equities, 1/365 for crypto). Steps
//! spanning a gap therefore carry a larger Δ_t and the same annual scale.

use crate::calendar::TradingCalendar;
use crate::error::{Result, RiskError};
use meridian_data::PriceSeries;
use ndarray::Array1;

/// Annualized log returns with their per-step time deltas.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnSample {
    returns: Array1<f64>,
    steps: Array1<f64>,
    period: f64,
    log_change: f64,
}

impl ReturnSample {
    /// Build the sample of a price history measured on `calendar`.
    pub fn build(series: &PriceSeries, calendar: &TradingCalendar) -> Result<Self> {
        if series.len() < 2 {
            return Err(RiskError::InsufficientData {
                required: 2,
                actual: series.len(),
            });
        }

        let period = calendar.period();
        let mut returns = Vec::with_capacity(series.len() - 1);
        let mut steps = Vec::with_capacity(series.len() - 1);

        let mut points = series.chronological();
        let first = points
            .next()
            .ok_or(RiskError::InsufficientData { required: 2, actual: 0 })?;
        validate_price(series, first.date, first.close)?;

        let mut previous = first;
        for point in points {
            validate_price(series, point.date, point.close)?;
            let delta = calendar.trading_days_between(previous.date, point.date).max(1) as f64;
            returns.push((point.close / previous.close).ln() / (delta * period));
            steps.push(delta);
            previous = point;
        }

        Ok(Self {
            returns: Array1::from(returns),
            steps: Array1::from(steps),
            period,
            log_change: (previous.close / first.close).ln(),
        })
    }

    /// Sample of already-annualized returns on consecutive trading days.
    pub fn from_returns(returns: Vec<f64>, period: f64) -> Result<Self> {
        if returns.is_empty() {
            return Err(RiskError::InsufficientData {
                required: 1,
                actual: 0,
            });
        }
        if !(period > 0.0 && period.is_finite()) {
            return Err(RiskError::InvalidParameter(format!(
                "trading period must be positive, got {period}"
            )));
        }

        let returns = Array1::from(returns);
        let log_change = returns.sum() * period;
        let steps = Array1::ones(returns.len());
        Ok(Self {
            returns,
            steps,
            period,
            log_change,
        })
    }

    /// Element-wise `self + sign · other`, for samples over the same dates.
    pub fn combine(&self, other: &Self, sign: f64) -> Result<Self> {
        if self.len() != other.len() {
            return Err(RiskError::DimensionMismatch {
                expected: self.len(),
                actual: other.len(),
            });
        }
        if self.steps != other.steps || self.period != other.period {
            return Err(RiskError::InvalidParameter(
                "samples are not measured on the same steps".to_string(),
            ));
        }

        let returns = &self.returns + &(&other.returns * sign);
        let log_change = (&returns * &self.steps).sum() * self.period;
        Ok(Self {
            returns,
            steps: self.steps.clone(),
            period: self.period,
            log_change,
        })
    }

    /// Number of returns.
    pub fn len(&self) -> usize {
        self.returns.len()
    }

    /// Whether the sample has no returns.
    pub fn is_empty(&self) -> bool {
        self.returns.is_empty()
    }

    /// Annualized log returns, earliest first.
    pub fn returns(&self) -> &Array1<f64> {
        &self.returns
    }

    /// Trading days spanned by each return.
    pub fn steps(&self) -> &Array1<f64> {
        &self.steps
    }

    /// Trading period (fraction of a year per trading day).
    pub const fn period(&self) -> f64 {
        self.period
    }

    /// Trading days spanned by the whole sample.
    pub fn total_steps(&self) -> f64 {
        self.steps.sum()
    }

    /// Log price change from the first to the last observation.
    pub const fn log_change(&self) -> f64 {
        self.log_change
    }

    /// Mean of the returns weighted by their time deltas.
    pub fn weighted_mean(&self) -> f64 {
        (&self.returns * &self.steps).sum() / self.total_steps()
    }
}

fn validate_price(series: &PriceSeries, date: chrono::NaiveDate, price: f64) -> Result<()> {
    if price > 0.0 && price.is_finite() {
        Ok(())
    } else {
        Err(RiskError::InvalidPrice {
            symbol: series.symbol().to_string(),
            date,
            price,
        })
    }
}
