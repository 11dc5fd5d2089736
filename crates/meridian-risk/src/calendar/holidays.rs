//! US exchange holidays.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Observed US exchange holidays of a year.
///
/// Fixed-date holidays falling on a weekend move to the adjacent weekday,
/// except New Year's Day, which is not observed when it falls on a Saturday.
pub fn us_market_holidays(year: i32) -> Vec<NaiveDate> {
    let nth = |month, weekday, n| NaiveDate::from_weekday_of_month_opt(year, month, weekday, n);

    let mut holidays = vec![
        new_years_day(year),
        nth(1, Weekday::Mon, 3),
        nth(2, Weekday::Mon, 3),
        easter_sunday(year).map(|easter| easter - Duration::days(2)),
        nth(5, Weekday::Mon, 5).or_else(|| nth(5, Weekday::Mon, 4)),
        NaiveDate::from_ymd_opt(year, 7, 4).map(observed),
        nth(9, Weekday::Mon, 1),
        nth(11, Weekday::Thu, 4),
        NaiveDate::from_ymd_opt(year, 12, 25).map(observed),
    ];

    if year >= 2022 {
        holidays.push(NaiveDate::from_ymd_opt(year, 6, 19).map(observed));
    }

    holidays.into_iter().flatten().collect()
}

fn new_years_day(year: i32) -> Option<NaiveDate> {
    let day = NaiveDate::from_ymd_opt(year, 1, 1)?;
    match day.weekday() {
        Weekday::Sat => None,
        Weekday::Sun => day.succ_opt(),
        _ => Some(day),
    }
}

fn observed(day: NaiveDate) -> NaiveDate {
    match day.weekday() {
        Weekday::Sat => day - Duration::days(1),
        Weekday::Sun => day + Duration::days(1),
        _ => day,
    }
}

/// Gregorian Easter Sunday (anonymous computus).
fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
}
