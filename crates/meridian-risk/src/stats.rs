//! Descriptive statistics over plain slices.

use crate::error::{Result, RiskError};

fn ensure_len(values: &[f64], required: usize) -> Result<()> {
    if values.len() < required {
        return Err(RiskError::InsufficientData {
            required,
            actual: values.len(),
        });
    }
    Ok(())
}

fn ensure_paired(x: &[f64], y: &[f64]) -> Result<()> {
    if x.len() != y.len() {
        return Err(RiskError::DimensionMismatch {
            expected: x.len(),
            actual: y.len(),
        });
    }
    Ok(())
}

/// Arithmetic mean.
pub fn sample_mean(values: &[f64]) -> Result<f64> {
    ensure_len(values, 1)?;
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Bessel-corrected variance.
pub fn sample_variance(values: &[f64]) -> Result<f64> {
    ensure_len(values, 2)?;
    let mean = sample_mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    Ok(ss / (values.len() - 1) as f64)
}

/// Bessel-corrected covariance of paired observations.
pub fn sample_covariance(x: &[f64], y: &[f64]) -> Result<f64> {
    ensure_paired(x, y)?;
    ensure_len(x, 2)?;
    let mean_x = sample_mean(x)?;
    let mean_y = sample_mean(y)?;
    let cross: f64 = x
        .iter()
        .zip(y)
        .map(|(a, b)| (a - mean_x) * (b - mean_y))
        .sum();
    Ok(cross / (x.len() - 1) as f64)
}

/// Pearson correlation of paired observations.
pub fn sample_correlation(x: &[f64], y: &[f64]) -> Result<f64> {
    let covariance = sample_covariance(x, y)?;
    let scale = (sample_variance(x)? * sample_variance(y)?).sqrt();
    if scale == 0.0 {
        return Err(RiskError::InvalidParameter(
            "correlation of a constant series is undefined".to_string(),
        ));
    }
    Ok(covariance / scale)
}

/// Least-squares slope of `y` on `x`.
pub fn regression_beta(x: &[f64], y: &[f64]) -> Result<f64> {
    ensure_paired(x, y)?;
    ensure_len(x, 3)?;
    let variance = sample_variance(x)?;
    if variance == 0.0 {
        return Err(RiskError::InvalidParameter(
            "regressor has no variance".to_string(),
        ));
    }
    Ok(sample_covariance(x, y)? / variance)
}

/// Least-squares intercept of `y` on `x`.
pub fn regression_alpha(x: &[f64], y: &[f64]) -> Result<f64> {
    let beta = regression_beta(x, y)?;
    Ok(sample_mean(y)? - beta * sample_mean(x)?)
}

/// Percentile by linear interpolation between closest ranks, `p` in [0, 1].
pub fn percentile(values: &[f64], p: f64) -> Result<f64> {
    ensure_len(values, 1)?;
    if !(0.0..=1.0).contains(&p) {
        return Err(RiskError::InvalidParameter(format!(
            "percentile must be within [0, 1], got {p}"
        )));
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let rank = p * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;
    Ok(sorted[lower] + weight * (sorted[upper] - sorted[lower]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    const X: [f64; 7] = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
    const Y: [f64; 7] = [20.0, 19.0, 23.0, 20.0, 26.0, 22.0, 30.0];

    #[test]
    fn test_regression() {
        assert_relative_eq!(sample_correlation(&X, &Y).unwrap(), 0.764852927, epsilon = 1e-8);
        assert_relative_eq!(regression_beta(&X, &Y).unwrap(), 1.39286, epsilon = 1e-5);
        assert_relative_eq!(regression_alpha(&X, &Y).unwrap(), 17.28571, epsilon = 1e-5);
    }

    #[test]
    fn test_mean_and_variance() {
        assert_relative_eq!(sample_mean(&X).unwrap(), 4.0);
        assert_relative_eq!(sample_variance(&X).unwrap(), 28.0 / 6.0, epsilon = 1e-12);
        assert!(sample_mean(&[]).unwrap_err().is_insufficient_data());
        assert!(sample_variance(&[1.0]).unwrap_err().is_insufficient_data());
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(matches!(
            sample_covariance(&X, &Y[..6]),
            Err(RiskError::DimensionMismatch { .. })
        ));
        assert!(regression_beta(&X[..2], &Y[..2]).unwrap_err().is_insufficient_data());
    }

    #[rstest]
    #[case(0.0, 1.0)]
    #[case(0.25, 2.5)]
    #[case(0.5, 4.0)]
    #[case(1.0, 7.0)]
    fn test_percentile(#[case] p: f64, #[case] expected: f64) {
        let shuffled = [4.0, 7.0, 1.0, 3.0, 6.0, 2.0, 5.0];
        assert_relative_eq!(percentile(&shuffled, p).unwrap(), expected, epsilon = 1e-12);
    }
}
