//! Calendar alignment of two price histories.

use super::TradingCalendar;
use crate::error::{Result, RiskError};
use meridian_data::{AssetClass, PriceSeries};
use std::collections::BTreeSet;
use tracing::debug;

/// Two price histories ready to be iterated together.
#[derive(Debug, Clone)]
pub struct AlignedPair {
    /// First series
    pub first: PriceSeries,
    /// Second series
    pub second: PriceSeries,
    /// Calendar the pair is measured on
    pub calendar: TradingCalendar,
}

impl AlignedPair {
    /// Number of observations in the shorter series.
    pub fn len(&self) -> usize {
        self.first.len().min(self.second.len())
    }

    /// Whether the pair holds no observations.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Align two histories onto a shared calendar.
///
/// Same-class pairs are returned unchanged on their own calendar. Mixed pairs
/// move to the business-day calendar and keep only the dates both series
/// observed, so each iterates an identical date set.
pub fn align(
    first_class: AssetClass,
    second_class: AssetClass,
    first: &PriceSeries,
    second: &PriceSeries,
) -> Result<AlignedPair> {
    let calendar = TradingCalendar::shared(first_class, second_class);

    if first_class == second_class {
        ensure_min_len(first.len().min(second.len()))?;
        return Ok(AlignedPair {
            first: first.clone(),
            second: second.clone(),
            calendar,
        });
    }

    let (first, second) = common_dates(first, second)?;
    debug!(
        first = first.symbol(),
        second = second.symbol(),
        observations = first.len(),
        calendar = %calendar.asset_class(),
        "Aligned mixed-calendar pair"
    );

    Ok(AlignedPair {
        first,
        second,
        calendar,
    })
}

/// Restrict both histories to the dates they have in common.
pub fn common_dates(
    first: &PriceSeries,
    second: &PriceSeries,
) -> Result<(PriceSeries, PriceSeries)> {
    let shared: BTreeSet<_> = first
        .date_set()
        .intersection(&second.date_set())
        .copied()
        .collect();
    ensure_min_len(shared.len())?;

    Ok((first.restrict_to(&shared)?, second.restrict_to(&shared)?))
}

const fn ensure_min_len(actual: usize) -> Result<()> {
    if actual < 2 {
        return Err(RiskError::InsufficientData {
            required: 2,
            actual,
        });
    }
    Ok(())
}
