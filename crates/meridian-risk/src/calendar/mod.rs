//! Trading calendars
//!
//! Equities trade on US exchange business days; crypto trades every calendar
//! day. The calendar decides how many trading periods separate two
//! observations, which is what return annualization divides by.

pub mod align;
pub mod holidays;

pub use align::{AlignedPair, align, common_dates};
pub use holidays::us_market_holidays;

use chrono::{Datelike, NaiveDate, Weekday};
use meridian_data::AssetClass;

/// Day classification and trading-period arithmetic for one asset class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TradingCalendar {
    class: AssetClass,
}

impl TradingCalendar {
    /// Calendar of an asset class.
    pub const fn new(class: AssetClass) -> Self {
        Self { class }
    }

    /// Calendar on which two asset classes can be compared.
    ///
    /// Identical classes keep their own calendar; mixed classes use the
    /// business-day one.
    pub const fn shared(first: AssetClass, second: AssetClass) -> Self {
        if first.is_continuous() {
            Self::new(second)
        } else {
            Self::new(first)
        }
    }

    /// Asset class of the calendar.
    pub const fn asset_class(&self) -> AssetClass {
        self.class
    }

    /// Fraction of a year represented by one observation.
    pub const fn period(&self) -> f64 {
        self.class.period()
    }

    /// Saturday or Sunday.
    pub fn is_weekend(date: NaiveDate) -> bool {
        matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
    }

    /// US exchange holiday (observed date).
    pub fn is_holiday(date: NaiveDate) -> bool {
        us_market_holidays(date.year()).contains(&date)
    }

    /// Whether the asset trades on `date`.
    pub fn is_trading_day(&self, date: NaiveDate) -> bool {
        self.class.is_continuous() || !(Self::is_weekend(date) || Self::is_holiday(date))
    }

    /// Trading days in `(from, to]`. Zero when `to` is not after `from`.
    pub fn trading_days_between(&self, from: NaiveDate, to: NaiveDate) -> i64 {
        if to <= from {
            return 0;
        }
        if self.class.is_continuous() {
            return (to - from).num_days();
        }
        from.iter_days()
            .skip(1)
            .take_while(|d| *d <= to)
            .filter(|d| self.is_trading_day(*d))
            .count() as i64
    }

    /// Latest trading day on or before `date`.
    pub fn last_trading_date(&self, date: NaiveDate) -> NaiveDate {
        let mut current = date;
        while !self.is_trading_day(current) {
            match current.pred_opt() {
                Some(previous) => current = previous,
                None => break,
            }
        }
        current
    }

    /// The trading day `days` trading days before `date`.
    pub fn subtract_trading_days(&self, date: NaiveDate, days: u32) -> NaiveDate {
        let mut current = self.last_trading_date(date);
        let mut remaining = days;
        while remaining > 0 {
            let Some(previous) = current.pred_opt() else {
                break;
            };
            current = previous;
            if self.is_trading_day(current) {
                remaining -= 1;
            }
        }
        current
    }
}
