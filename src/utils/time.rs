use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone};

pub const MS_PER_SEC: i64 = 1000;
pub const MS_PER_MIN: i64 = 60 * MS_PER_SEC;
pub const MS_PER_HOUR: i64 = 60 * MS_PER_MIN;
pub const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;
pub const MS_PER_WEEK: i64 = 7 * MS_PER_DAY;

/// Mean length of a Gregorian year.
pub const DAYS_PER_YEAR: f64 = 365.2425;
pub const DAYS_PER_MONTH_AVG: f64 = DAYS_PER_YEAR / 12.;

/// 365.2425 days is a whole number of milliseconds, and so is a twelfth of it.
pub const MS_PER_YEAR: i64 = 31_556_952_000;
pub const MS_PER_MONTH_AVG: i64 = MS_PER_YEAR / 12;

const MAX_GAP_STEPS: i64 = 48;

/// This is the standard way of converting a date to a string in lifeleft.
pub fn date_to_record_name(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Resolves local wall time into an instant of `tz`.
///
/// Ambiguous times (clocks going back) pick the earlier instant. Times that don't exist (clocks
/// going forward) move past the gap, the same way a wall clock would read after the jump.
pub fn resolve_local<Tz: TimeZone>(tz: &Tz, local: NaiveDateTime) -> DateTime<Tz> {
    if let Some(v) = tz.from_local_datetime(&local).earliest() {
        return v;
    }
    // The longest gap on record is a whole skipped day.
    for shift in 1..=MAX_GAP_STEPS {
        if let Some(v) = tz
            .from_local_datetime(&(local + Duration::minutes(30 * shift)))
            .earliest()
        {
            return v;
        }
    }
    tz.from_utc_datetime(&local)
}
