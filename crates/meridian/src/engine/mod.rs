//! Risk-return and correlation engine
//!
//! [`RiskEngine`] ties the collaborators together: every call resolves its
//! date range on the asset's trading calendar, looks the result up in the
//! [`ResultCache`], and on a miss fetches prices, builds return samples, fits
//! them and writes the result back.

mod market;
mod matrix;

pub use matrix::CorrelationMatrix;

use crate::cache_location::open_cache;
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use chrono::{NaiveDate, Utc};
use meridian_data::{
    AssetClass, AssetTypeResolver, CorrelationKey, CorrelationResult, EstimationMethod,
    PriceHistoryProvider, PriceSeries, ProfileKey, ResultCache, RiskFreeRateProvider, RiskProfile,
};
use meridian_risk::estimators::{AnnualizedMoments, Estimator, MomentEstimator, NormalFit};
use meridian_risk::{
    ReturnSample, RiskError, TradingCalendar, align, common_dates, estimate,
    likelihood_correlation, moment_correlation, percentile_correlation,
};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Orchestrates providers, estimators and the result cache.
pub struct RiskEngine {
    prices: Arc<dyn PriceHistoryProvider>,
    classes: Arc<dyn AssetTypeResolver>,
    rates: Arc<dyn RiskFreeRateProvider>,
    cache: ResultCache,
    config: EngineConfig,
}

impl fmt::Debug for RiskEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RiskEngine")
            .field("cache", &self.cache)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RiskEngine {
    /// Create an engine from its collaborators.
    pub fn new(
        prices: Arc<dyn PriceHistoryProvider>,
        classes: Arc<dyn AssetTypeResolver>,
        rates: Arc<dyn RiskFreeRateProvider>,
        cache: ResultCache,
        config: EngineConfig,
    ) -> Self {
        Self {
            prices,
            classes,
            rates,
            cache,
            config,
        }
    }

    /// Create an engine whose collaborators are all served by one provider.
    pub fn with_provider<P>(provider: Arc<P>, cache: ResultCache, config: EngineConfig) -> Self
    where
        P: PriceHistoryProvider + AssetTypeResolver + RiskFreeRateProvider + 'static,
    {
        Self::new(provider.clone(), provider.clone(), provider, cache, config)
    }

    /// Create an engine backed by the cache at the configured location.
    pub fn open<P>(provider: Arc<P>, config: EngineConfig) -> Result<Self>
    where
        P: PriceHistoryProvider + AssetTypeResolver + RiskFreeRateProvider + 'static,
    {
        let cache = open_cache(&config.resolved_cache_path())?;
        Ok(Self::with_provider(provider, cache, config))
    }

    /// Engine configuration.
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Result cache.
    pub const fn cache(&self) -> &ResultCache {
        &self.cache
    }

    fn today(&self) -> NaiveDate {
        self.config.as_of.unwrap_or_else(|| Utc::now().date_naive())
    }

    /// Resolve an optional date range on a calendar.
    ///
    /// The end defaults to today and never goes past it, then moves back to
    /// the last trading day. The start defaults to `lookback_days` trading
    /// days before the end.
    pub fn resolve_dates(
        &self,
        calendar: &TradingCalendar,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<(NaiveDate, NaiveDate)> {
        let today = self.today();
        let end = calendar.last_trading_date(end.map_or(today, |e| e.min(today)));
        let start = start
            .unwrap_or_else(|| calendar.subtract_trading_days(end, self.config.lookback_days));

        if start > today {
            return Err(EngineError::FutureStartDate { start, today });
        }
        if start > end {
            return Err(EngineError::InvalidDateRange { start, end });
        }
        Ok((start, end))
    }

    /// Annualized return and volatility of `ticker`.
    pub fn calculate_risk_return(
        &self,
        ticker: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        method: EstimationMethod,
    ) -> Result<RiskProfile> {
        let calendar = TradingCalendar::new(self.classes.resolve(ticker)?);
        let (start, end) = self.resolve_dates(&calendar, start, end)?;
        let key = ProfileKey::new(ticker, start, end, method);

        if let Some(profile) = self.cache.filter_risk_profile(&key) {
            debug!(ticker, %start, %end, %method, "risk profile cache hit");
            return Ok(profile);
        }

        let series = self.prices.get(ticker, start, end)?;
        let sample = ReturnSample::build(&series, &calendar)?;
        let moments = self.fit(ticker, method, &sample)?.annualize(calendar.period());

        let profile =
            RiskProfile::from_key(&key, moments.annual_return, moments.annual_volatility);
        self.cache.save_risk_profile(&profile)?;
        info!(
            ticker,
            %start,
            %end,
            %method,
            annual_return = profile.annual_return,
            annual_volatility = profile.annual_volatility,
            "computed risk profile"
        );
        Ok(profile)
    }

    fn fit(
        &self,
        ticker: &str,
        method: EstimationMethod,
        sample: &ReturnSample,
    ) -> Result<NormalFit> {
        match estimate(method, sample) {
            Ok(fit) => Ok(fit),
            Err(e) if self.falls_back(method, &e) => {
                warn!(
                    ticker,
                    %method,
                    error = %e,
                    "estimation failed, falling back to moment matching"
                );
                Ok(MomentEstimator.estimate(sample)?)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn falls_back(&self, method: EstimationMethod, error: &RiskError) -> bool {
        self.config.fallback_to_moments
            && method != EstimationMethod::MomentMatching
            && matches!(error, RiskError::Estimation { .. })
    }

    fn pair_calendar(
        &self,
        first: &str,
        second: &str,
    ) -> Result<(AssetClass, AssetClass, TradingCalendar)> {
        let first_class = self.classes.resolve(first)?;
        let second_class = self.classes.resolve(second)?;
        Ok((
            first_class,
            second_class,
            TradingCalendar::shared(first_class, second_class),
        ))
    }

    /// Correlation between two tickers.
    ///
    /// Results are cached under both orderings. Mixed-calendar pairs are
    /// measured on the business-day calendar over their common dates.
    pub fn calculate_correlation(
        &self,
        first: &str,
        second: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        method: EstimationMethod,
    ) -> Result<CorrelationResult> {
        let (first_class, second_class, calendar) = self.pair_calendar(first, second)?;
        let (start, end) = self.resolve_dates(&calendar, start, end)?;
        let key = CorrelationKey::new(first, second, start, end, method);

        if first == second {
            return Ok(CorrelationResult::from_key(&key, 1.0));
        }

        if let Some(result) = self.cache.filter_correlation(&key) {
            debug!(first, second, %start, %end, %method, "correlation cache hit");
            return Ok(result);
        }

        let first_series = self.prices.get(first, start, end)?;
        let second_series = self.prices.get(second, start, end)?;

        let correlation = match self.pair_correlation(
            method,
            (first, second),
            (first_class, second_class),
            (&first_series, &second_series),
            (start, end),
        ) {
            Ok(rho) => rho,
            Err(EngineError::Risk(e)) if self.falls_back(method, &e) => {
                warn!(
                    first,
                    second,
                    %method,
                    error = %e,
                    "correlation failed, falling back to moment matching"
                );
                self.pair_correlation(
                    EstimationMethod::MomentMatching,
                    (first, second),
                    (first_class, second_class),
                    (&first_series, &second_series),
                    (start, end),
                )?
            }
            Err(e) => return Err(e),
        };

        let result = CorrelationResult::from_key(&key, correlation);
        self.cache.save_correlation(&result)?;
        info!(first, second, %start, %end, %method, correlation, "computed correlation");
        Ok(result)
    }

    fn pair_correlation(
        &self,
        method: EstimationMethod,
        tickers: (&str, &str),
        classes: (AssetClass, AssetClass),
        series: (&PriceSeries, &PriceSeries),
        dates: (NaiveDate, NaiveDate),
    ) -> Result<f64> {
        let calendar = TradingCalendar::shared(classes.0, classes.1);

        let rho = match method {
            EstimationMethod::MomentMatching => {
                let pair = align(classes.0, classes.1, series.0, series.1)?;
                let (first, second) = if classes.0 == classes.1 {
                    // Same calendar: the cached full-history profiles apply
                    (
                        self.moments_of(tickers.0, dates)?,
                        self.moments_of(tickers.1, dates)?,
                    )
                } else {
                    (
                        aligned_moments(&pair.first, &calendar)?,
                        aligned_moments(&pair.second, &calendar)?,
                    )
                };
                moment_correlation(&pair, &first, &second)?
            }
            EstimationMethod::PercentileMatching | EstimationMethod::MaximumLikelihood => {
                let (first, second) = common_dates(series.0, series.1)?;
                let first = ReturnSample::build(&first, &calendar)?;
                let second = ReturnSample::build(&second, &calendar)?;
                if method == EstimationMethod::PercentileMatching {
                    percentile_correlation(&first, &second)?
                } else {
                    likelihood_correlation(&first, &second)?
                }
            }
        };
        Ok(rho)
    }

    fn moments_of(
        &self,
        ticker: &str,
        (start, end): (NaiveDate, NaiveDate),
    ) -> Result<AnnualizedMoments> {
        let profile = self.calculate_risk_return(
            ticker,
            Some(start),
            Some(end),
            EstimationMethod::MomentMatching,
        )?;
        Ok(AnnualizedMoments {
            annual_return: profile.annual_return,
            annual_volatility: profile.annual_volatility,
        })
    }

    /// Pairwise correlations of `tickers`, symmetric with a unit diagonal.
    pub fn correlation_matrix(
        &self,
        tickers: &[&str],
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        method: EstimationMethod,
    ) -> Result<CorrelationMatrix> {
        let mut matrix = CorrelationMatrix::identity(tickers);
        for (i, first) in tickers.iter().enumerate() {
            for (j, second) in tickers.iter().enumerate().skip(i + 1) {
                let result = self.calculate_correlation(first, second, start, end, method)?;
                matrix.set(i, j, result.correlation);
            }
        }
        Ok(matrix)
    }
}

/// Moment-matching profile of a series already restricted to the pair's dates.
fn aligned_moments(series: &PriceSeries, calendar: &TradingCalendar) -> Result<AnnualizedMoments> {
    let sample = ReturnSample::build(series, calendar)?;
    Ok(MomentEstimator.estimate(&sample)?.annualize(calendar.period()))
}
