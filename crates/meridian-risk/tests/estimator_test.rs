//! Integration tests for return distribution estimators

use approx::assert_relative_eq;
use chrono::{Duration, NaiveDate};
use meridian_data::{AssetClass, EstimationMethod, PriceSeries};
use meridian_risk::{ReturnSample, TradingCalendar, estimate};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use rstest::rstest;
use statrs::distribution::{ContinuousCDF, Normal as NormalDistribution};

fn normal_sample(mu: f64, sigma: f64, n: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(mu, sigma).unwrap();
    (0..n).map(|_| normal.sample(&mut rng)).collect()
}

/// Normal quantiles at evenly spaced probabilities.
fn stratified_normal_sample(mu: f64, sigma: f64, n: usize) -> Vec<f64> {
    let normal = NormalDistribution::new(mu, sigma).unwrap();
    (0..n)
        .map(|i| normal.inverse_cdf((i as f64 + 0.5) / n as f64))
        .collect()
}

/// Daily crypto closes following a geometric Brownian motion.
fn gbm_series(symbol: &str, drift: f64, vol: f64, days: usize, seed: u64) -> PriceSeries {
    let dt = 1.0 / 365.0;
    let shocks = normal_sample(0.0, 1.0, days, seed);
    let start = NaiveDate::from_ymd_opt(2010, 1, 1).unwrap();

    let mut price = 100.0;
    let mut closes = vec![(start, price)];
    for (i, z) in shocks.iter().enumerate() {
        price *= ((drift - 0.5 * vol * vol) * dt + vol * dt.sqrt() * z).exp();
        closes.push((start + Duration::days(i as i64 + 1), price));
    }
    PriceSeries::from_closes(symbol, closes).unwrap()
}

#[rstest]
#[case(EstimationMethod::MomentMatching)]
#[case(EstimationMethod::PercentileMatching)]
#[case(EstimationMethod::MaximumLikelihood)]
fn test_recovers_normal_parameters(#[case] method: EstimationMethod) {
    let (mu, sigma) = (2.0, 1.0);
    let sample =
        ReturnSample::from_returns(normal_sample(mu, sigma, 10_000, 42), 1.0 / 252.0).unwrap();

    let fit = estimate(method, &sample).unwrap();
    assert_relative_eq!(fit.mu, mu, max_relative = 0.05);
    assert_relative_eq!(fit.sigma, sigma, max_relative = 0.05);
}

#[rstest]
#[case(EstimationMethod::MomentMatching)]
#[case(EstimationMethod::PercentileMatching)]
#[case(EstimationMethod::MaximumLikelihood)]
fn test_recovers_normal_parameters_from_thousand_returns(#[case] method: EstimationMethod) {
    let (mu, sigma) = (2.0, 1.0);
    let returns = stratified_normal_sample(mu, sigma, 1_000);
    assert_eq!(returns.len(), 1_000);
    let sample = ReturnSample::from_returns(returns, 1.0 / 252.0).unwrap();

    let fit = estimate(method, &sample).unwrap();
    assert_relative_eq!(fit.mu, mu, max_relative = 0.05);
    assert_relative_eq!(fit.sigma, sigma, max_relative = 0.05);
}

#[rstest]
#[case(EstimationMethod::MomentMatching)]
#[case(EstimationMethod::PercentileMatching)]
#[case(EstimationMethod::MaximumLikelihood)]
fn test_recovers_gbm_volatility(#[case] method: EstimationMethod) {
    let series = gbm_series("BTC", 0.3, 0.6, 5_000, 7);
    let calendar = TradingCalendar::new(AssetClass::Crypto);
    let sample = ReturnSample::build(&series, &calendar).unwrap();

    let moments = estimate(method, &sample).unwrap().annualize(calendar.period());
    assert_relative_eq!(moments.annual_volatility, 0.6, max_relative = 0.05);
}

#[test]
fn test_gaps_scale_variance() {
    // Every other day missing: two-day steps still recover the daily dispersion
    let series = gbm_series("ETH", 0.0, 0.5, 8_000, 11);
    let thinned = PriceSeries::from_closes(
        "ETH",
        series
            .chronological()
            .enumerate()
            .filter(|(i, _)| i % 2 == 0)
            .map(|(_, p)| (p.date, p.close)),
    )
    .unwrap();

    let calendar = TradingCalendar::new(AssetClass::Crypto);
    let sample = ReturnSample::build(&thinned, &calendar).unwrap();
    assert!(sample.steps().iter().all(|dt| *dt == 2.0));

    for method in [EstimationMethod::MomentMatching, EstimationMethod::MaximumLikelihood] {
        let moments = estimate(method, &sample).unwrap().annualize(calendar.period());
        assert_relative_eq!(moments.annual_volatility, 0.5, max_relative = 0.05);
    }
}
