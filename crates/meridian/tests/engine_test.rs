//! Integration tests for the risk engine

use approx::assert_relative_eq;
use chrono::{Duration, NaiveDate};
use meridian::data::{
    AssetClass, AssetTypeResolver, DataError, InMemoryProvider, PriceHistoryProvider, PriceSeries,
    ProfileKey, ResultCache, RiskFreeRateProvider,
};
use meridian::risk::{RiskError, TradingCalendar, stats};
use meridian::{EngineConfig, EngineError, EstimationMethod, RiskEngine, RiskProfile};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, StandardNormal};
use rstest::rstest;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Provider that counts price fetches.
#[derive(Debug)]
struct CountingProvider {
    inner: InMemoryProvider,
    fetches: AtomicUsize,
}

impl CountingProvider {
    fn new(inner: InMemoryProvider) -> Arc<Self> {
        Arc::new(Self {
            inner,
            fetches: AtomicUsize::new(0),
        })
    }

    fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl PriceHistoryProvider for CountingProvider {
    fn get(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> meridian::data::Result<PriceSeries> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.inner.get(ticker, start, end)
    }
}

impl AssetTypeResolver for CountingProvider {
    fn resolve(&self, ticker: &str) -> meridian::data::Result<AssetClass> {
        self.inner.resolve(ticker)
    }
}

impl RiskFreeRateProvider for CountingProvider {
    fn rate(&self) -> meridian::data::Result<f64> {
        self.inner.rate()
    }
}

const DAYS: i64 = 420;

fn day(offset: i64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 2).unwrap() + Duration::days(offset)
}

fn start() -> Option<NaiveDate> {
    Some(day(1))
}

fn end() -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(2024, 1, 31)
}

/// Daily shocks of a market factor shared by every synthetic asset.
fn market_shocks(seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..DAYS).map(|_| StandardNormal.sample(&mut rng)).collect()
}

/// Calendar-day GBM path loading `beta` on the market shocks plus its own noise,
/// sampled on the trading days of `class`.
fn asset(symbol: &str, class: AssetClass, market: &[f64], beta: f64, seed: u64) -> PriceSeries {
    let mut rng = StdRng::seed_from_u64(seed);
    let calendar = TradingCalendar::new(class);
    let (drift, vol, dt): (f64, f64, f64) = (0.08, 0.25, 1.0 / 365.0);

    let mut price = 100.0;
    let mut closes = Vec::new();
    for (i, m) in market.iter().enumerate() {
        let own: f64 = StandardNormal.sample(&mut rng);
        let z = beta * m + (1.0 - beta * beta).max(0.0).sqrt() * own;
        price *= ((drift - 0.5 * vol * vol) * dt + vol * dt.sqrt() * z).exp();
        let date = day(i as i64);
        if calendar.is_trading_day(date) {
            closes.push((date, price));
        }
    }
    PriceSeries::from_closes(symbol, closes).unwrap()
}

fn universe() -> InMemoryProvider {
    let market = market_shocks(1);
    InMemoryProvider::new()
        .with_series(asset("SPY", AssetClass::Equity, &market, 1.0, 2), AssetClass::Equity)
        .with_series(asset("AAPL", AssetClass::Equity, &market, 0.8, 3), AssetClass::Equity)
        .with_series(asset("XOM", AssetClass::Equity, &market, 0.5, 4), AssetClass::Equity)
        .with_series(asset("BTC", AssetClass::Crypto, &market, 0.7, 5), AssetClass::Crypto)
        .with_risk_free_rate(0.04)
}

fn config() -> EngineConfig {
    EngineConfig {
        as_of: NaiveDate::from_ymd_opt(2024, 2, 23),
        ..EngineConfig::default()
    }
}

fn engine_with(provider: &Arc<CountingProvider>) -> RiskEngine {
    RiskEngine::with_provider(provider.clone(), ResultCache::in_memory().unwrap(), config())
}

#[rstest]
#[case(EstimationMethod::MomentMatching)]
#[case(EstimationMethod::PercentileMatching)]
#[case(EstimationMethod::MaximumLikelihood)]
fn test_risk_return_is_cached(#[case] method: EstimationMethod) {
    let provider = CountingProvider::new(universe());
    let engine = engine_with(&provider);

    let first = engine.calculate_risk_return("AAPL", start(), end(), method).unwrap();
    assert_eq!(provider.fetches(), 1);
    let second = engine.calculate_risk_return("AAPL", start(), end(), method).unwrap();
    assert_eq!(provider.fetches(), 1);

    assert_eq!(first, second);
    assert!(first.annual_volatility > 0.0);
    assert_eq!(engine.cache().profile_count(method).unwrap(), 1);
}

#[test]
fn test_default_dates_resolve_on_calendar() {
    let provider = CountingProvider::new(universe());
    let engine = engine_with(&provider);

    let profile = engine
        .calculate_risk_return("SPY", None, None, EstimationMethod::MomentMatching)
        .unwrap();
    // 2024-02-23 is a Friday; Presidents' Day falls inside the lookback
    assert_eq!(profile.end_date, NaiveDate::from_ymd_opt(2024, 2, 23).unwrap());
    let calendar = TradingCalendar::new(AssetClass::Equity);
    assert_eq!(
        calendar.trading_days_between(profile.start_date, profile.end_date),
        100
    );
}

#[rstest]
#[case(EstimationMethod::MomentMatching)]
#[case(EstimationMethod::PercentileMatching)]
#[case(EstimationMethod::MaximumLikelihood)]
fn test_correlation_symmetric_and_bounded(#[case] method: EstimationMethod) {
    let provider = CountingProvider::new(universe());
    let engine = engine_with(&provider);

    let forward = engine
        .calculate_correlation("AAPL", "XOM", start(), end(), method)
        .unwrap();
    let fetches = provider.fetches();
    let backward = engine
        .calculate_correlation("XOM", "AAPL", start(), end(), method)
        .unwrap();

    assert_eq!(provider.fetches(), fetches);
    assert_eq!(forward.correlation, backward.correlation);
    assert_eq!(backward.ticker_1, "XOM");
    assert!((-1.0..=1.0).contains(&forward.correlation));
    assert!(forward.correlation > 0.0);
}

#[test]
fn test_self_correlation_is_one() {
    let provider = CountingProvider::new(universe());
    let engine = engine_with(&provider);

    let result = engine
        .calculate_correlation("BTC", "BTC", start(), end(), EstimationMethod::MaximumLikelihood)
        .unwrap();
    assert_eq!(result.correlation, 1.0);
    assert_eq!(provider.fetches(), 0);
}

/// Per-step log price changes net of the profile's log drift, for a history
/// observed on consecutive trading days.
fn dedrifted_changes(series: &PriceSeries, profile: &RiskProfile, period: f64) -> Vec<f64> {
    let drift = profile.annual_return - 0.5 * profile.annual_volatility.powi(2);
    let closes: Vec<f64> = series.chronological().map(|p| p.close).collect();
    closes
        .windows(2)
        .map(|w| (w[1] / w[0]).ln() - drift * period)
        .collect()
}

#[test]
fn test_same_class_correlation_matches_cached_profiles() {
    let method = EstimationMethod::MomentMatching;
    let provider = CountingProvider::new(universe());
    let engine = engine_with(&provider);

    let rho = engine
        .calculate_correlation("SPY", "AAPL", start(), end(), method)
        .unwrap();

    // Both full-history profiles were cached along the way
    let cached = |ticker: &str| {
        let key = ProfileKey::new(ticker, rho.start_date, rho.end_date, method);
        engine.cache().filter_risk_profile(&key).unwrap()
    };
    let (spy, aapl) = (cached("SPY"), cached("AAPL"));
    assert_eq!(engine.cache().profile_count(method).unwrap(), 2);

    let period = TradingCalendar::new(AssetClass::Equity).period();
    let prices = universe();
    let spy_prices = prices.get("SPY", rho.start_date, rho.end_date).unwrap();
    let aapl_prices = prices.get("AAPL", rho.start_date, rho.end_date).unwrap();
    let covariance = stats::sample_covariance(
        &dedrifted_changes(&spy_prices, &spy, period),
        &dedrifted_changes(&aapl_prices, &aapl, period),
    )
    .unwrap();

    assert_relative_eq!(
        rho.correlation,
        covariance / period / (spy.annual_volatility * aapl.annual_volatility),
        epsilon = 1e-9
    );
}

#[test]
fn test_same_class_correlation_with_gaps() {
    let market = market_shocks(9);
    let full = asset("AAA", AssetClass::Equity, &market, 0.9, 10);
    let gapped = asset("BBB", AssetClass::Equity, &market, 0.9, 11);
    // Drop every tenth observation from the second history
    let dates: std::collections::BTreeSet<_> = gapped
        .chronological()
        .enumerate()
        .filter(|(i, _)| i % 10 != 5)
        .map(|(_, p)| p.date)
        .collect();
    let gapped = gapped.restrict_to(&dates).unwrap();

    let provider = CountingProvider::new(
        InMemoryProvider::new()
            .with_series(full, AssetClass::Equity)
            .with_series(gapped, AssetClass::Equity),
    );
    let engine = engine_with(&provider);

    let rho = engine
        .calculate_correlation("AAA", "BBB", start(), end(), EstimationMethod::MomentMatching)
        .unwrap()
        .correlation;
    assert!((-1.0..=1.0).contains(&rho));
    assert!(rho > 0.5);
}

#[rstest]
#[case(EstimationMethod::MomentMatching)]
#[case(EstimationMethod::PercentileMatching)]
#[case(EstimationMethod::MaximumLikelihood)]
fn test_mixed_calendar_correlation(#[case] method: EstimationMethod) {
    let provider = CountingProvider::new(universe());
    let engine = engine_with(&provider);

    let result = engine
        .calculate_correlation("BTC", "SPY", start(), end(), method)
        .unwrap();
    assert!((-1.0..=1.0).contains(&result.correlation));
    assert!(result.correlation > 0.3);

    // Aligned-sample profiles are never cached as full-history profiles
    assert_eq!(engine.cache().get_stats().unwrap().profiles, 0);
}

#[test]
fn test_correlation_matrix() {
    let provider = CountingProvider::new(universe());
    let engine = engine_with(&provider);
    let tickers = ["SPY", "AAPL", "XOM", "BTC"];

    let result = engine
        .correlation_matrix(&tickers, start(), end(), EstimationMethod::MomentMatching)
        .unwrap();
    let matrix = result.matrix();

    assert_eq!(matrix.dim(), (4, 4));
    for i in 0..4 {
        assert_eq!(matrix[[i, i]], 1.0);
        for j in 0..4 {
            assert_eq!(matrix[[i, j]], matrix[[j, i]]);
            assert!((-1.0..=1.0).contains(&matrix[[i, j]]));
        }
    }
    assert_eq!(result.get("XOM", "SPY"), Some(matrix[[2, 0]]));
}

#[test]
fn test_market_statistics() {
    let provider = CountingProvider::new(universe());
    let engine = engine_with(&provider);
    let method = EstimationMethod::MomentMatching;

    let profile = engine.calculate_risk_return("AAPL", start(), end(), method).unwrap();
    let sharpe = engine.sharpe_ratio("AAPL", start(), end(), method).unwrap();
    assert_relative_eq!(
        sharpe,
        (profile.annual_return - 0.04) / profile.annual_volatility,
        epsilon = 1e-12
    );

    assert_eq!(engine.market_beta("SPY", start(), end(), method).unwrap(), 1.0);

    let beta = engine.market_beta("AAPL", start(), end(), method).unwrap();
    let rho = engine
        .calculate_correlation("AAPL", "SPY", start(), end(), method)
        .unwrap()
        .correlation;
    let market = engine.calculate_risk_return("SPY", start(), end(), method).unwrap();
    assert_relative_eq!(
        beta,
        rho * profile.annual_volatility / market.annual_volatility,
        epsilon = 1e-12
    );

    let cost = engine.cost_of_equity("AAPL", start(), end(), method).unwrap();
    assert_relative_eq!(cost, 0.04 + beta * (market.annual_return - 0.04), epsilon = 1e-12);

    // Column-scoped updates leave the stored profile intact
    let fetches = provider.fetches();
    let again = engine.calculate_risk_return("AAPL", start(), end(), method).unwrap();
    assert_eq!(again, profile);
    assert_eq!(engine.sharpe_ratio("AAPL", start(), end(), method).unwrap(), sharpe);
    assert_eq!(engine.cost_of_equity("AAPL", start(), end(), method).unwrap(), cost);
    assert_eq!(provider.fetches(), fetches);
}

fn doubling() -> InMemoryProvider {
    // Every return is exactly ln 2: quartiles coincide
    let closes = (0..30).map(|i| (day(i), 2.0_f64.powi(i as i32)));
    InMemoryProvider::new().with_series(
        PriceSeries::from_closes("DBL", closes).unwrap(),
        AssetClass::Crypto,
    )
}

#[test]
fn test_estimation_failure_propagates() {
    let provider = CountingProvider::new(doubling());
    let engine = engine_with(&provider);

    let err = engine
        .calculate_risk_return(
            "DBL",
            Some(day(0)),
            Some(day(29)),
            EstimationMethod::PercentileMatching,
        )
        .unwrap_err();
    assert!(matches!(err, EngineError::Risk(RiskError::Estimation { .. })));
}

#[test]
fn test_estimation_fallback_to_moments() {
    let provider = CountingProvider::new(doubling());
    let config = EngineConfig {
        fallback_to_moments: true,
        ..config()
    };
    let engine = RiskEngine::with_provider(provider, ResultCache::in_memory().unwrap(), config);

    let profile = engine
        .calculate_risk_return(
            "DBL",
            Some(day(0)),
            Some(day(29)),
            EstimationMethod::PercentileMatching,
        )
        .unwrap();
    assert_relative_eq!(profile.annual_volatility, 0.0, epsilon = 1e-9);
    assert_relative_eq!(profile.annual_return, 2.0_f64.ln() * 365.0, epsilon = 1e-9);
    assert_eq!(profile.method, EstimationMethod::PercentileMatching);
}

#[test]
fn test_input_errors() {
    let provider = CountingProvider::new(universe());
    let engine = engine_with(&provider);

    let err = engine
        .calculate_risk_return("NOPE", start(), end(), EstimationMethod::MomentMatching)
        .unwrap_err();
    assert!(matches!(err, EngineError::Data(DataError::InvalidSymbol(_))));

    let err = engine
        .calculate_risk_return(
            "SPY",
            NaiveDate::from_ymd_opt(2025, 1, 2),
            None,
            EstimationMethod::MomentMatching,
        )
        .unwrap_err();
    assert!(matches!(err, EngineError::FutureStartDate { .. }));
}

#[test]
fn test_file_cache_shared_between_engines() {
    let dir = tempfile::tempdir().unwrap();
    let config = EngineConfig {
        cache_path: Some(dir.path().join("cache").join("meridian.db")),
        ..config()
    };

    let first_provider = CountingProvider::new(universe());
    let first = RiskEngine::open(first_provider.clone(), config.clone()).unwrap();
    let computed = first
        .calculate_correlation("SPY", "BTC", start(), end(), EstimationMethod::PercentileMatching)
        .unwrap();

    let second_provider = CountingProvider::new(universe());
    let second = RiskEngine::open(second_provider.clone(), config).unwrap();
    let cached = second
        .calculate_correlation("BTC", "SPY", start(), end(), EstimationMethod::PercentileMatching)
        .unwrap();

    assert!(first.cache().shares_connection_with(second.cache()));
    assert_eq!(second_provider.fetches(), 0);
    assert_eq!(computed.correlation, cached.correlation);
}
