//! Moment matching
//!
//! The drift telescopes to the total log price change over the trading days
//! spanned, so it only depends on the first and last observation. The
//! dispersion is the Bessel-corrected variance of the returns around that
//! drift, each squared deviation weighted by its time delta.

use super::{Estimator, NormalFit};
use crate::error::{Result, RiskError};
use crate::returns::ReturnSample;
use meridian_data::EstimationMethod;

/// Moment-matching estimator.
#[derive(Debug, Clone, Copy, Default)]
pub struct MomentEstimator;

impl Estimator for MomentEstimator {
    fn method(&self) -> EstimationMethod {
        EstimationMethod::MomentMatching
    }

    fn estimate(&self, sample: &ReturnSample) -> Result<NormalFit> {
        let n = sample.len();
        if n < 2 {
            return Err(RiskError::InsufficientData {
                required: 2,
                actual: n,
            });
        }

        let mu = sample.log_change() / (sample.period() * sample.total_steps());
        let weighted_ss: f64 = sample
            .returns()
            .iter()
            .zip(sample.steps())
            .map(|(x, dt)| dt * (x - mu).powi(2))
            .sum();

        Ok(NormalFit {
            mu,
            sigma: (weighted_ss / (n - 1) as f64).sqrt(),
        })
    }
}
