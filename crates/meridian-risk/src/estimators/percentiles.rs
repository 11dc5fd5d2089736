//! Percentile matching
//!
//! Finds the normal distribution whose first and third quartiles match the
//! sample's:
//!
//! Φ((q1 − μ)/σ) = 0.25, Φ((q3 − μ)/σ) = 0.75
//!
//! The system is solved numerically by minimizing the squared residuals over
//! (μ, ln σ), seeded at the median and half the interquartile range.

use super::optimize::{SimplexSettings, minimize};
use super::{Estimator, NormalFit};
use crate::error::{Result, RiskError};
use crate::returns::ReturnSample;
use crate::stats::percentile;
use meridian_data::EstimationMethod;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

/// Percentile matching configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PercentileConfig {
    /// Iteration cap for each simplex search (default: 2000)
    pub max_iters: u64,
    /// Simplex searches restarted from the best point so far (default: 3)
    pub restarts: usize,
    /// Largest residual norm accepted as a solution (default: 1e-6)
    pub tolerance: f64,
}

impl Default for PercentileConfig {
    fn default() -> Self {
        Self {
            max_iters: 2000,
            restarts: 3,
            tolerance: 1e-6,
        }
    }
}

/// Percentile-matching estimator.
#[derive(Debug, Clone, Default)]
pub struct PercentileEstimator {
    config: PercentileConfig,
}

impl PercentileEstimator {
    /// Create an estimator with the given configuration
    pub const fn new(config: PercentileConfig) -> Self {
        Self { config }
    }
}

impl Estimator for PercentileEstimator {
    fn method(&self) -> EstimationMethod {
        EstimationMethod::PercentileMatching
    }

    fn estimate(&self, sample: &ReturnSample) -> Result<NormalFit> {
        let method = self.method();
        let n = sample.len();
        if n < 2 {
            return Err(RiskError::InsufficientData {
                required: 2,
                actual: n,
            });
        }

        let values = sample.returns().to_vec();
        let q1 = percentile(&values, 0.25)?;
        let median = percentile(&values, 0.5)?;
        let q3 = percentile(&values, 0.75)?;
        let iqr = q3 - q1;
        if !(iqr > 0.0 && iqr.is_finite()) {
            return Err(RiskError::estimation(
                method,
                format!("degenerate quartiles q1={q1}, q3={q3}"),
            ));
        }

        let standard = Normal::new(0.0, 1.0).map_err(|e| RiskError::estimation(method, e))?;
        let objective = |p: &[f64]| {
            let sigma = p[1].exp();
            let r1 = standard.cdf((q1 - p[0]) / sigma) - 0.25;
            let r3 = standard.cdf((q3 - p[0]) / sigma) - 0.75;
            r1 * r1 + r3 * r3
        };

        let settings = SimplexSettings {
            max_iters: self.config.max_iters,
            sd_tolerance: (self.config.tolerance * self.config.tolerance) * 1e-4,
        };
        let mut best = vec![median, (iqr / 2.0).ln()];
        let mut scale = 0.1;
        let mut residual = objective(best.as_slice()).sqrt();
        for _ in 0..self.config.restarts.max(1) {
            let (point, cost) = minimize(
                method,
                objective,
                best.clone(),
                &[scale * iqr, scale],
                settings,
            )?;
            if cost.sqrt() < residual {
                best = point;
                residual = cost.sqrt();
            }
            if residual < self.config.tolerance {
                break;
            }
            scale *= 0.1;
        }

        if residual >= self.config.tolerance {
            return Err(RiskError::estimation(
                method,
                format!("quartile equations not solved, residual {residual:.3e}"),
            ));
        }

        Ok(NormalFit {
            mu: best[0],
            sigma: best[1].exp(),
        })
    }
}
