//! Nelder-Mead minimization shared by the likelihood and percentile fits.

use crate::error::{Result, RiskError};
use argmin::core::{CostFunction, Executor};
use argmin::solver::neldermead::NelderMead;
use meridian_data::EstimationMethod;

/// Stopping rule for a simplex search.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SimplexSettings {
    pub(crate) max_iters: u64,
    pub(crate) sd_tolerance: f64,
}

struct Objective<F> {
    f: F,
}

impl<F> CostFunction for Objective<F>
where
    F: Fn(&[f64]) -> f64,
{
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, x: &Self::Param) -> std::result::Result<Self::Output, argmin::core::Error> {
        let value = (self.f)(x.as_slice());
        // keep the simplex away from invalid regions
        Ok(if value.is_finite() { value } else { f64::INFINITY })
    }
}

/// Minimize `objective` from `seed`, building the initial simplex from one
/// step along each axis. Returns the best point and its cost.
pub(crate) fn minimize<F>(
    method: EstimationMethod,
    objective: F,
    seed: Vec<f64>,
    steps: &[f64],
    settings: SimplexSettings,
) -> Result<(Vec<f64>, f64)>
where
    F: Fn(&[f64]) -> f64,
{
    if seed.len() != steps.len() {
        return Err(RiskError::DimensionMismatch {
            expected: seed.len(),
            actual: steps.len(),
        });
    }

    let mut simplex = Vec::with_capacity(seed.len() + 1);
    simplex.push(seed.clone());
    for (i, step) in steps.iter().enumerate() {
        let mut vertex = seed.clone();
        vertex[i] += step;
        simplex.push(vertex);
    }

    let solver = NelderMead::new(simplex)
        .with_sd_tolerance(settings.sd_tolerance)
        .map_err(|e| RiskError::estimation(method, e))?;

    let res = Executor::new(Objective { f: objective }, solver)
        .configure(|state| state.max_iters(settings.max_iters))
        .run()
        .map_err(|e| RiskError::estimation(method, e))?;

    let cost = res.state.best_cost;
    let best = res
        .state
        .best_param
        .ok_or_else(|| RiskError::estimation(method, "optimizer returned no solution"))?;
    if !cost.is_finite() {
        return Err(RiskError::estimation(method, "objective is not finite at the optimum"));
    }
    Ok((best, cost))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_minimize_quadratic() {
        let (best, cost) = minimize(
            EstimationMethod::MaximumLikelihood,
            |x: &[f64]| (x[0] - 1.5).powi(2) + 2.0 * (x[1] + 0.5).powi(2),
            vec![0.0, 0.0],
            &[1.0, 1.0],
            SimplexSettings {
                max_iters: 2000,
                sd_tolerance: 1e-14,
            },
        )
        .unwrap();

        assert_relative_eq!(best[0], 1.5, epsilon = 1e-4);
        assert_relative_eq!(best[1], -0.5, epsilon = 1e-4);
        assert!(cost < 1e-8);
    }

    #[test]
    fn test_minimize_rejects_mismatched_steps() {
        let err = minimize(
            EstimationMethod::PercentileMatching,
            |x: &[f64]| x[0].powi(2),
            vec![0.0],
            &[1.0, 1.0],
            SimplexSettings {
                max_iters: 10,
                sd_tolerance: 1e-8,
            },
        )
        .unwrap_err();
        assert!(matches!(err, RiskError::DimensionMismatch { .. }));
    }
}
