// SPDX-License-Identifier: MIT

use chrono::{Datelike, Days, NaiveDate, Weekday};

/// Advance `start` by `days` business days, skipping Saturdays and Sundays.
/// A start on a weekend first rolls forward to Monday without consuming a
/// business day.
pub fn add_business_days(start: NaiveDate, days: u32) -> NaiveDate {
    let mut date = start;
    let mut remaining = days;
    while is_weekend(date) {
        date = date + Days::new(1);
    }
    while remaining > 0 {
        date = date + Days::new(1);
        if !is_weekend(date) {
            remaining -= 1;
        }
    }
    date
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}
