//! Maximum likelihood
//!
//! Each return is treated as an independent draw from N(μ, σ²/Δ_t): a step
//! spanning Δ_t trading days averages Δ_t daily shocks. The negative
//! log-likelihood is minimized over (μ, ln σ) with Nelder-Mead.

use super::optimize::{SimplexSettings, minimize};
use super::{Estimator, NormalFit};
use crate::error::{Result, RiskError};
use crate::returns::ReturnSample;
use meridian_data::EstimationMethod;
use serde::{Deserialize, Serialize};

/// Maximum likelihood estimator configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LikelihoodConfig {
    /// Iteration cap for the simplex search (default: 2000)
    pub max_iters: u64,
    /// Standard deviation of the simplex costs at which to stop (default: 1e-12)
    pub tolerance: f64,
}

impl Default for LikelihoodConfig {
    fn default() -> Self {
        Self {
            max_iters: 2000,
            tolerance: 1e-12,
        }
    }
}

impl LikelihoodConfig {
    pub(crate) const fn settings(&self) -> SimplexSettings {
        SimplexSettings {
            max_iters: self.max_iters,
            sd_tolerance: self.tolerance,
        }
    }
}

/// Maximum likelihood estimator.
#[derive(Debug, Clone, Default)]
pub struct LikelihoodEstimator {
    config: LikelihoodConfig,
}

impl LikelihoodEstimator {
    /// Create an estimator with the given configuration
    pub const fn new(config: LikelihoodConfig) -> Self {
        Self { config }
    }
}

/// Negative log-likelihood of the sample under N(mu, s²/Δ), constants dropped.
pub(crate) fn negative_log_likelihood(sample: &ReturnSample, mu: f64, log_sigma: f64) -> f64 {
    let variance = (2.0 * log_sigma).exp();
    sample
        .returns()
        .iter()
        .zip(sample.steps())
        .map(|(x, dt)| log_sigma - 0.5 * dt.ln() + dt * (x - mu).powi(2) / (2.0 * variance))
        .sum()
}

impl Estimator for LikelihoodEstimator {
    fn method(&self) -> EstimationMethod {
        EstimationMethod::MaximumLikelihood
    }

    fn estimate(&self, sample: &ReturnSample) -> Result<NormalFit> {
        let n = sample.len();
        if n < 2 {
            return Err(RiskError::InsufficientData {
                required: 2,
                actual: n,
            });
        }

        let mean = sample.weighted_mean();
        let spread = (sample
            .returns()
            .iter()
            .zip(sample.steps())
            .map(|(x, dt)| dt * (x - mean).powi(2))
            .sum::<f64>()
            / n as f64)
            .sqrt();
        if !(spread > 0.0 && spread.is_finite()) {
            return Err(RiskError::estimation(
                self.method(),
                "returns have no dispersion",
            ));
        }

        let (best, _) = minimize(
            self.method(),
            |p: &[f64]| negative_log_likelihood(sample, p[0], p[1]),
            vec![mean, spread.ln()],
            &[0.1 * spread, 0.1],
            self.config.settings(),
        )?;

        Ok(NormalFit {
            mu: best[0],
            sigma: best[1].exp(),
        })
    }
}
