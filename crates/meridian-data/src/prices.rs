//! Daily price observations.

use crate::error::{DataError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A single trading day's prices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Trading date
    pub date: NaiveDate,
    /// Opening price
    pub open: f64,
    /// Closing price
    pub close: f64,
}

impl PricePoint {
    /// Create a new price point.
    pub const fn new(date: NaiveDate, open: f64, close: f64) -> Self {
        Self { date, open, close }
    }
}

/// Price history for one ticker, one point per trading day.
///
/// Iteration is latest-to-earliest, matching the order in which providers
/// hand histories over. A series is never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    symbol: String,
    points: BTreeMap<NaiveDate, PricePoint>,
}

impl PriceSeries {
    /// Build a series from price points. Later duplicates of a date win.
    pub fn new<I>(symbol: &str, points: I) -> Result<Self>
    where
        I: IntoIterator<Item = PricePoint>,
    {
        let points: BTreeMap<_, _> = points.into_iter().map(|p| (p.date, p)).collect();
        if points.is_empty() {
            return Err(DataError::MissingData {
                symbol: symbol.to_string(),
                reason: "Price history is empty".to_string(),
            });
        }
        Ok(Self {
            symbol: symbol.to_string(),
            points,
        })
    }

    /// Build a series from `(date, close)` pairs, using the close as the open.
    pub fn from_closes<I>(symbol: &str, closes: I) -> Result<Self>
    where
        I: IntoIterator<Item = (NaiveDate, f64)>,
    {
        Self::new(
            symbol,
            closes
                .into_iter()
                .map(|(date, close)| PricePoint::new(date, close, close)),
        )
    }

    /// Ticker the series belongs to.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false for a constructed series.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Price point on a date, if the asset traded that day.
    pub fn get(&self, date: &NaiveDate) -> Option<&PricePoint> {
        self.points.get(date)
    }

    /// Whether the series has an observation on `date`.
    pub fn contains(&self, date: &NaiveDate) -> bool {
        self.points.contains_key(date)
    }

    /// Most recent observation.
    pub fn latest(&self) -> &PricePoint {
        // non-empty by construction
        self.points
            .values()
            .next_back()
            .unwrap_or_else(|| unreachable!("price series is never empty"))
    }

    /// Earliest observation.
    pub fn earliest(&self) -> &PricePoint {
        self.points
            .values()
            .next()
            .unwrap_or_else(|| unreachable!("price series is never empty"))
    }

    /// Observations, latest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &PricePoint> + '_ {
        self.points.values().rev()
    }

    /// Observations, earliest first.
    pub fn chronological(&self) -> impl DoubleEndedIterator<Item = &PricePoint> + '_ {
        self.points.values()
    }

    /// Dates with an observation.
    pub fn date_set(&self) -> BTreeSet<NaiveDate> {
        self.points.keys().copied().collect()
    }

    /// Restrict the series to the given dates.
    pub fn restrict_to(&self, dates: &BTreeSet<NaiveDate>) -> Result<Self> {
        Self::new(
            &self.symbol,
            self.points
                .iter()
                .filter(|(date, _)| dates.contains(date))
                .map(|(_, p)| *p),
        )
    }

    /// Observations within `[start, end]`.
    pub fn between(&self, start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(DataError::MissingData {
                symbol: self.symbol.clone(),
                reason: format!("start {start} is after end {end}"),
            });
        }
        Self::new(
            &self.symbol,
            self.points.range(start..=end).map(|(_, p)| *p),
        )
    }
}
