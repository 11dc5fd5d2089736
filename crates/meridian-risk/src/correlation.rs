//! Pairwise correlation
//!
//! Three kernels, one per estimation method:
//!
//! - moment matching streams once through an [`AlignedPair`], measuring each
//!   step's de-drifted log price change against the annualized profiles of
//!   both assets;
//! - percentile matching uses the dispersion identity
//!   ρ = (σ²(x+y) − σ²(x−y)) / (4·σx·σy), each σ fitted by quartiles;
//! - maximum likelihood fits ρ = tanh(θ) of a bivariate normal given the
//!   marginal likelihood fits.
//!
//! Every result is bounded to [-1, 1].

use crate::calendar::AlignedPair;
use crate::error::{Result, RiskError};
use crate::estimators::optimize::minimize;
use crate::estimators::{
    AnnualizedMoments, Estimator, LikelihoodConfig, LikelihoodEstimator, PercentileEstimator,
};
use crate::returns::ReturnSample;
use meridian_data::{EstimationMethod, PricePoint, PriceSeries};

/// Clamp a correlation estimate to [-1, 1].
pub fn bound_correlation(rho: f64) -> f64 {
    rho.clamp(-1.0, 1.0)
}

/// Moment-matching correlation of an aligned pair.
///
/// `first` and `second` are the annualized profiles of the two assets over
/// the same sample. Dates observed by the first series but missing from the
/// second drop one observation from the running covariance and fold their
/// step into the next common date.
pub fn moment_correlation(
    pair: &AlignedPair,
    first: &AnnualizedMoments,
    second: &AnnualizedMoments,
) -> Result<f64> {
    let method = EstimationMethod::MomentMatching;
    if first.annual_volatility <= 0.0 || second.annual_volatility <= 0.0 {
        return Err(RiskError::estimation(
            method,
            "correlation with a zero-volatility asset is undefined",
        ));
    }

    let len = pair.first.len();
    if len < 3 {
        return Err(RiskError::InsufficientData {
            required: 3,
            actual: len,
        });
    }

    let calendar = pair.calendar;
    let period = calendar.period();
    let drifts = (first.log_drift(), second.log_drift());

    let mut observations = len - 1;
    let mut covariance = 0.0;
    let mut carried = 0_i64;
    let mut previous_date = None;
    let mut anchor: Option<(f64, f64)> = None;

    for point in pair.first.chronological() {
        if let Some(previous) = previous_date {
            carried += calendar.trading_days_between(previous, point.date).max(1);
        }
        previous_date = Some(point.date);

        let Some(other) = pair.second.get(&point.date) else {
            if observations <= 2 {
                return Err(RiskError::InsufficientData {
                    required: 2,
                    actual: observations - 1,
                });
            }
            covariance *= (observations - 1) as f64 / (observations - 2) as f64;
            observations -= 1;
            continue;
        };

        let prices = (
            positive_close(&pair.first, point)?,
            positive_close(&pair.second, other)?,
        );
        let Some((first_anchor, second_anchor)) = anchor else {
            anchor = Some(prices);
            carried = 0;
            continue;
        };

        let span = carried as f64 * period;
        let d1 = (prices.0 / first_anchor).ln() - drifts.0 * span;
        let d2 = (prices.1 / second_anchor).ln() - drifts.1 * span;
        covariance += d1 * d2 / span / (observations - 1) as f64;

        anchor = Some(prices);
        carried = 0;
    }

    Ok(bound_correlation(
        covariance / (first.annual_volatility * second.annual_volatility),
    ))
}

fn positive_close(series: &PriceSeries, point: &PricePoint) -> Result<f64> {
    if point.close > 0.0 && point.close.is_finite() {
        Ok(point.close)
    } else {
        Err(RiskError::InvalidPrice {
            symbol: series.symbol().to_string(),
            date: point.date,
            price: point.close,
        })
    }
}

/// Percentile-matching correlation of two samples over the same dates.
pub fn percentile_correlation(first: &ReturnSample, second: &ReturnSample) -> Result<f64> {
    let estimator = PercentileEstimator::default();
    let sigma_x = estimator.estimate(first)?.sigma;
    let sigma_y = estimator.estimate(second)?.sigma;
    let sigma_sum = estimator.estimate(&first.combine(second, 1.0)?)?.sigma;
    let sigma_diff = estimator.estimate(&first.combine(second, -1.0)?)?.sigma;

    Ok(bound_correlation(
        (sigma_sum.powi(2) - sigma_diff.powi(2)) / (4.0 * sigma_x * sigma_y),
    ))
}

/// Maximum-likelihood correlation of two samples over the same dates.
pub fn likelihood_correlation(first: &ReturnSample, second: &ReturnSample) -> Result<f64> {
    let method = EstimationMethod::MaximumLikelihood;
    if first.len() != second.len() {
        return Err(RiskError::DimensionMismatch {
            expected: first.len(),
            actual: second.len(),
        });
    }
    if first.steps() != second.steps() {
        return Err(RiskError::InvalidParameter(
            "samples are not measured on the same steps".to_string(),
        ));
    }

    let config = LikelihoodConfig::default();
    let estimator = LikelihoodEstimator::new(config);
    let fit_x = estimator.estimate(first)?;
    let fit_y = estimator.estimate(second)?;

    let standardized: Vec<(f64, f64, f64)> = first
        .returns()
        .iter()
        .zip(second.returns())
        .zip(first.steps())
        .map(|((x, y), dt)| ((x - fit_x.mu) / fit_x.sigma, (y - fit_y.mu) / fit_y.sigma, *dt))
        .collect();

    let total_steps = first.total_steps();
    let seed = standardized
        .iter()
        .map(|(z1, z2, dt)| dt * z1 * z2)
        .sum::<f64>()
        / total_steps;

    let objective = |p: &[f64]| {
        let rho = p[0].tanh();
        let one_minus = 1.0 - rho * rho;
        standardized
            .iter()
            .map(|(z1, z2, dt)| {
                let quadratic = z1 * z1 - 2.0 * rho * z1 * z2 + z2 * z2;
                0.5 * one_minus.ln() + dt * quadratic / (2.0 * one_minus)
            })
            .sum::<f64>()
    };

    let (best, _) = minimize(
        method,
        objective,
        vec![seed.clamp(-0.99, 0.99).atanh()],
        &[0.1],
        config.settings(),
    )?;

    Ok(bound_correlation(best[0].tanh()))
}
