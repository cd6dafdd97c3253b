use std::{fmt::Display, str::FromStr};

use anyhow::anyhow;
use chrono::{DateTime, TimeZone};
use clap::ValueEnum;

use crate::utils::time::{
    MS_PER_DAY, MS_PER_HOUR, MS_PER_MIN, MS_PER_MONTH_AVG, MS_PER_SEC, MS_PER_WEEK, MS_PER_YEAR,
};

/// Width of [format_digits] output.
pub const DIGITS_WIDTH: usize = 14;

const MAX_DIGIT_YEARS: i64 = 9999;

/// Unit a remaining duration is displayed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Unit {
    Seconds,
    Minutes,
    Hours,
    Days,
    Weeks,
    /// Average months, a twelfth of an average year.
    #[value(name = "months_avg", alias = "months-avg", alias = "months")]
    MonthsAvg,
    Years,
    /// Fixed width `YYYYMMDDHHMMSS`-shaped breakdown.
    Digits,
}

impl Unit {
    /// Length of the unit for units rendered as whole numbers.
    pub fn millis(&self) -> Option<i64> {
        match self {
            Unit::Seconds => Some(MS_PER_SEC),
            Unit::Minutes => Some(MS_PER_MIN),
            Unit::Hours => Some(MS_PER_HOUR),
            Unit::Days => Some(MS_PER_DAY),
            Unit::Weeks => Some(MS_PER_WEEK),
            Unit::MonthsAvg => Some(MS_PER_MONTH_AVG),
            Unit::Years | Unit::Digits => None,
        }
    }

    /// Unit word for `count` whole units. Only a count of exactly 1 is singular.
    pub fn label(&self, count: i64) -> &'static str {
        let singular = count == 1;
        match self {
            Unit::Seconds if singular => "second",
            Unit::Seconds => "seconds",
            Unit::Minutes if singular => "minute",
            Unit::Minutes => "minutes",
            Unit::Hours if singular => "hour",
            Unit::Hours => "hours",
            Unit::Days if singular => "day",
            Unit::Days => "days",
            Unit::Weeks if singular => "week",
            Unit::Weeks => "weeks",
            Unit::MonthsAvg if singular => "month",
            Unit::MonthsAvg => "months",
            Unit::Years if singular => "year",
            Unit::Years => "years",
            Unit::Digits => "",
        }
    }
}

impl Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.to_possible_value() {
            Some(v) => write!(f, "{}", v.get_name()),
            None => write!(f, "{self:?}"),
        }
    }
}

impl FromStr for Unit {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <Unit as ValueEnum>::from_str(s, true).map_err(|_| anyhow!("Unknown display unit {s:?}"))
    }
}

/// Renders a remaining duration in `unit`. Whole units are floored and grouped by thousands, years
/// keep two decimals. Negative input is rendered as is.
pub fn format_remaining(remaining_ms: i64, unit: Unit) -> String {
    match (unit, unit.millis()) {
        (Unit::Digits, _) => format_digits(remaining_ms),
        (_, Some(length)) => {
            let count = remaining_ms.div_euclid(length);
            format!("{} {}", group_thousands(count), unit.label(count))
        }
        // Decimal years keep the plural label, "1.00 years".
        (_, None) => format!(
            "{:.2} {}",
            remaining_ms as f64 / MS_PER_YEAR as f64,
            unit.label(0)
        ),
    }
}

/// Odometer view of a duration: years (4 digits), average months, days, hours, minutes and seconds
/// (2 digits each) without separators. Always [DIGITS_WIDTH] characters long. Durations past 9999
/// years saturate to all nines.
pub fn format_digits(ms: i64) -> String {
    let mut rest = ms.max(0);

    let years = rest / MS_PER_YEAR;
    if years > MAX_DIGIT_YEARS {
        return "9".repeat(DIGITS_WIDTH);
    }
    rest -= years * MS_PER_YEAR;

    let months = rest / MS_PER_MONTH_AVG;
    rest -= months * MS_PER_MONTH_AVG;

    let days = rest / MS_PER_DAY;
    rest -= days * MS_PER_DAY;

    let hours = rest / MS_PER_HOUR;
    rest -= hours * MS_PER_HOUR;

    let minutes = rest / MS_PER_MIN;
    rest -= minutes * MS_PER_MIN;

    let seconds = rest / MS_PER_SEC;

    format!("{years:04}{months:02}{days:02}{hours:02}{minutes:02}{seconds:02}")
}

/// `YYYY-MM-DD HH:MM:SS` using the fields of `date` in its own time zone.
pub fn format_date_time<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    date.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// `"{h}h {m}m {s}s"` with unbounded hours.
pub fn format_duration_hms(ms: i64) -> String {
    let total_seconds = ms.max(0) / MS_PER_SEC;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours}h {minutes}m {seconds}s")
}

pub fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        grouped.push('-');
    }
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};

    use super::*;

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1234567), "1,234,567");
        assert_eq!(group_thousands(-1234567), "-1,234,567");
        assert_eq!(group_thousands(i64::MIN), "-9,223,372,036,854,775,808");
    }

    #[test]
    fn test_format_remaining_whole_units() {
        assert_eq!(format_remaining(90_000, Unit::Seconds), "90 seconds");
        assert_eq!(format_remaining(1_234_567_890_999, Unit::Seconds), "1,234,567,890 seconds");
        assert_eq!(format_remaining(MS_PER_HOUR * 25 - 1, Unit::Days), "1 day");
        assert_eq!(format_remaining(MS_PER_WEEK, Unit::Weeks), "1 week");
        assert_eq!(format_remaining(MS_PER_SEC * 2 - 1, Unit::Seconds), "1 second");
        assert_eq!(format_remaining(MS_PER_DAY * 2, Unit::Days), "2 days");
        assert_eq!(format_remaining(0, Unit::Hours), "0 hours");
        assert_eq!(format_remaining(MS_PER_MONTH_AVG * 5, Unit::MonthsAvg), "5 months");
        assert_eq!(format_remaining(MS_PER_WEEK * 3 + MS_PER_DAY, Unit::Weeks), "3 weeks");
        assert_eq!(format_remaining(-5_000, Unit::Seconds), "-5 seconds");
    }

    #[test]
    fn test_format_remaining_years_two_decimals() {
        assert_eq!(format_remaining(MS_PER_YEAR * 3 / 2, Unit::Years), "1.50 years");
        assert_eq!(format_remaining(0, Unit::Years), "0.00 years");
        assert_eq!(format_remaining(MS_PER_YEAR, Unit::Years), "1.00 years");
        let rendered = format_remaining(1_234_567_891_234, Unit::Years);
        let number = rendered.split(' ').next().unwrap();
        assert_eq!(number.split('.').nth(1).unwrap().len(), 2);
    }

    #[test]
    fn test_format_remaining_digits_delegates() {
        let ms = MS_PER_YEAR * 12 + MS_PER_DAY * 3;
        assert_eq!(format_remaining(ms, Unit::Digits), format_digits(ms));
    }

    #[test]
    fn test_digits_decomposition_order() {
        let ms = MS_PER_YEAR + MS_PER_MONTH_AVG + MS_PER_DAY + MS_PER_HOUR + MS_PER_MIN + MS_PER_SEC + 999;
        assert_eq!(format_digits(ms), "00010101010101");
        assert_eq!(format_digits(0), "00000000000000");
        assert_eq!(format_digits(MS_PER_YEAR * 80), "00800000000000");
        assert_eq!(format_digits(MS_PER_YEAR - 1), "00001130102905");
    }

    #[test]
    fn test_digits_fixed_width() {
        for ms in [-1, 0, 1, 59_999, MS_PER_DAY * 400, MS_PER_YEAR * 9999, i64::MAX] {
            let digits = format_digits(ms);
            assert_eq!(digits.len(), DIGITS_WIDTH, "{ms}");
            assert!(digits.bytes().all(|v| v.is_ascii_digit()), "{digits}");
        }
        assert_eq!(format_digits(i64::MAX), "99999999999999");
    }

    #[test]
    fn test_format_date_time() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(7, 8, 9)
            .unwrap()
            .and_utc();
        assert_eq!(format_date_time(&date), "2024-03-05 07:08:09");
        assert_eq!(format_date_time(&Utc.timestamp_millis_opt(0).unwrap()), "1970-01-01 00:00:00");
    }

    #[test]
    fn test_format_duration_hms() {
        assert_eq!(
            format_duration_hms(3 * MS_PER_HOUR + 2 * MS_PER_MIN + MS_PER_SEC + 999),
            "3h 2m 1s"
        );
        assert_eq!(format_duration_hms(100 * MS_PER_HOUR), "100h 0m 0s");
        assert_eq!(format_duration_hms(-10), "0h 0m 0s");
    }

    #[test]
    fn test_unit_parsing() {
        assert_eq!("months_avg".parse::<Unit>().unwrap(), Unit::MonthsAvg);
        assert_eq!("Seconds".parse::<Unit>().unwrap(), Unit::Seconds);
        assert_eq!(Unit::MonthsAvg.to_string(), "months_avg");
        assert!("fortnights".parse::<Unit>().is_err());
    }
}
