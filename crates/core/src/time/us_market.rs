use chrono::{Datelike, Duration, NaiveDate, Weekday};
use std::collections::HashSet;

/// First session after `last_session`, skipping weekends and known holidays.
pub fn next_trading_day(last_session: NaiveDate) -> NaiveDate {
    let extra = configured_holidays();
    next_trading_day_with(last_session, &extra)
}

fn next_trading_day_with(last_session: NaiveDate, extra: &HashSet<NaiveDate>) -> NaiveDate {
    let mut date = last_session + Duration::days(1);
    while is_weekend(date) || is_fixed_holiday(date) || extra.contains(&date) {
        date = date + Duration::days(1);
    }
    date
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Fixed-date closures as observed: a Saturday holiday closes the Friday before, a
/// Sunday holiday the Monday after. New Year's Day falling on a Saturday is not moved
/// back into December.
fn is_fixed_holiday(date: NaiveDate) -> bool {
    FIXED_HOLIDAYS.iter().any(|&(m, d)| {
        NaiveDate::from_ymd_opt(date.year(), m, d).and_then(observed) == Some(date)
    })
}

const FIXED_HOLIDAYS: [(u32, u32); 4] = [(1, 1), (6, 19), (7, 4), (12, 25)];

fn observed(holiday: NaiveDate) -> Option<NaiveDate> {
    match holiday.weekday() {
        Weekday::Sat if holiday.month() == 1 && holiday.day() == 1 => None,
        Weekday::Sat => Some(holiday - Duration::days(1)),
        Weekday::Sun => Some(holiday + Duration::days(1)),
        _ => Some(holiday),
    }
}

/// Floating holidays (Thanksgiving, Good Friday, ...) come from
/// US_MARKET_HOLIDAYS="YYYY-MM-DD,YYYY-MM-DD".
fn configured_holidays() -> HashSet<NaiveDate> {
    let mut out = HashSet::new();

    if let Ok(s) = std::env::var("US_MARKET_HOLIDAYS") {
        for part in s.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            if let Ok(d) = NaiveDate::parse_from_str(part, "%Y-%m-%d") {
                out.insert(d);
            } else {
                tracing::warn!(value = %part, "ignoring malformed US_MARKET_HOLIDAYS entry");
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn weekday_rolls_to_next_day() {
        // 2026-03-03 is a Tuesday.
        assert_eq!(next_trading_day_with(d(2026, 3, 3), &HashSet::new()), d(2026, 3, 4));
    }

    #[test]
    fn friday_rolls_over_weekend() {
        // 2026-03-06 is a Friday.
        assert_eq!(next_trading_day_with(d(2026, 3, 6), &HashSet::new()), d(2026, 3, 9));
    }

    #[test]
    fn skips_fixed_holidays() {
        // 2026-12-24 is a Thursday; Christmas falls on Friday.
        assert_eq!(next_trading_day(d(2026, 12, 24)), d(2026, 12, 28));
    }

    #[test]
    fn fixed_holidays_have_no_year_limit() {
        // 2031-12-25 is a Thursday.
        assert_eq!(next_trading_day_with(d(2031, 12, 24), &HashSet::new()), d(2031, 12, 26));
        // 2099-07-04 is a Saturday, observed Friday the 3rd.
        assert_eq!(next_trading_day_with(d(2099, 7, 2), &HashSet::new()), d(2099, 7, 6));
    }

    #[test]
    fn weekend_holidays_shift_to_observed_day() {
        // 2026-07-04 is a Saturday; the market closes Friday 2026-07-03.
        assert_eq!(next_trading_day_with(d(2026, 7, 2), &HashSet::new()), d(2026, 7, 6));
        // 2027-12-25 is a Saturday; observed Friday 2027-12-24.
        assert_eq!(next_trading_day_with(d(2027, 12, 23), &HashSet::new()), d(2027, 12, 27));
        // 2033-06-19 is a Sunday; observed Monday 2033-06-20.
        assert_eq!(next_trading_day_with(d(2033, 6, 17), &HashSet::new()), d(2033, 6, 21));
    }

    #[test]
    fn saturday_new_year_is_not_moved_into_december() {
        // 2028-01-01 is a Saturday; Friday 2027-12-31 stays open.
        assert_eq!(next_trading_day_with(d(2027, 12, 30), &HashSet::new()), d(2027, 12, 31));
    }

    #[test]
    fn skips_extra_holidays() {
        let extra: HashSet<_> = [d(2026, 11, 26)].into_iter().collect();
        assert_eq!(next_trading_day_with(d(2026, 11, 25), &extra), d(2026, 11, 27));
    }
}
