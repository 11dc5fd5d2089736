//! Return and volatility estimators
//!
//! Each estimator fits a normal distribution to the annualized log returns of
//! a [`ReturnSample`]. The fit is expressed per trading day: `mu` is the drift
//! of the annualized log return and `sigma` the dispersion of a one-day
//! annualized return. [`NormalFit::annualize`] turns it into an annual
//! volatility and an Ito-corrected annual return.

pub mod likelihood;
pub mod moments;
pub(crate) mod optimize;
pub mod percentiles;

pub use likelihood::{LikelihoodConfig, LikelihoodEstimator};
pub use moments::MomentEstimator;
pub use percentiles::{PercentileConfig, PercentileEstimator};

use crate::error::Result;
use crate::returns::ReturnSample;
use meridian_data::EstimationMethod;
use serde::{Deserialize, Serialize};

/// Normal fit of a sample of annualized log returns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalFit {
    /// Drift of the annualized log return
    pub mu: f64,
    /// Dispersion of a one-period annualized log return
    pub sigma: f64,
}

impl NormalFit {
    /// Annual volatility and Ito-corrected annual return.
    ///
    /// annual_volatility = σ·√h, annual_return = μ + ½·annual_volatility²
    pub fn annualize(&self, period: f64) -> AnnualizedMoments {
        let annual_volatility = self.sigma * period.sqrt();
        AnnualizedMoments {
            annual_return: self.mu + 0.5 * annual_volatility.powi(2),
            annual_volatility,
        }
    }
}

/// Annualized return and volatility of one asset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnnualizedMoments {
    /// Expected annual return, Ito-corrected
    pub annual_return: f64,
    /// Annual volatility
    pub annual_volatility: f64,
}

impl AnnualizedMoments {
    /// Drift of the log price.
    pub fn log_drift(&self) -> f64 {
        self.annual_return - 0.5 * self.annual_volatility.powi(2)
    }
}

/// Trait for return distribution estimators
pub trait Estimator: Send + Sync {
    /// Method implemented by this estimator
    fn method(&self) -> EstimationMethod;

    /// Fit a normal distribution to the sample
    fn estimate(&self, sample: &ReturnSample) -> Result<NormalFit>;
}

/// Estimator for a method, with default settings.
pub fn estimator_for(method: EstimationMethod) -> Box<dyn Estimator> {
    match method {
        EstimationMethod::MomentMatching => Box::new(MomentEstimator),
        EstimationMethod::PercentileMatching => Box::new(PercentileEstimator::default()),
        EstimationMethod::MaximumLikelihood => Box::new(LikelihoodEstimator::default()),
    }
}

/// Fit `sample` with the given method.
pub fn estimate(method: EstimationMethod, sample: &ReturnSample) -> Result<NormalFit> {
    estimator_for(method).estimate(sample)
}
