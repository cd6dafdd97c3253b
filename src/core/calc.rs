//! Life and active-hours arithmetic. Every function here is a pure function of its arguments, so
//! callers recompute on each tick instead of caching results.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone};

use crate::utils::time::{resolve_local, MS_PER_WEEK, MS_PER_YEAR};

use super::profile::TimeOfDay;

/// Projected end of life: birth plus `life_expectancy_years` average Gregorian years.
///
/// Zero or negative expectancy is not an error, it yields an end that has already been reached.
/// Spans outside of the `i64` range saturate and NaN counts as zero years.
pub fn end_instant_ms(birth_ms: i64, life_expectancy_years: f64) -> i64 {
    birth_ms.saturating_add((life_expectancy_years * MS_PER_YEAR as f64).round() as i64)
}

/// Local midnight of `birth_date` in `tz`.
pub fn birth_instant<Tz: TimeZone>(tz: &Tz, birth_date: NaiveDate) -> DateTime<Tz> {
    resolve_local(tz, birth_date.and_time(NaiveTime::MIN))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LifeProjection {
    pub projected_end_ms: i64,
    pub total_span_ms: i64,
    /// Clamped to `[0, total_span_ms]`.
    pub elapsed_ms: i64,
    /// Never negative. Once the end has passed `elapsed_ms + remaining_ms` stops adding up to the
    /// total span.
    pub remaining_ms: i64,
    /// In `[0, 1]`, 0 when the total span is empty.
    pub fraction_elapsed: f64,
}

impl LifeProjection {
    pub fn compute(now_ms: i64, birth_ms: i64, life_expectancy_years: f64) -> Self {
        let projected_end_ms = end_instant_ms(birth_ms, life_expectancy_years);
        let total_span_ms = projected_end_ms.saturating_sub(birth_ms).max(0);
        let elapsed_ms = now_ms.saturating_sub(birth_ms).clamp(0, total_span_ms);
        let remaining_ms = projected_end_ms.saturating_sub(now_ms).max(0);
        let fraction_elapsed = if total_span_ms == 0 {
            0.
        } else {
            elapsed_ms as f64 / total_span_ms as f64
        };

        Self {
            projected_end_ms,
            total_span_ms,
            elapsed_ms,
            remaining_ms,
            fraction_elapsed,
        }
    }

    /// Projected end as an instant of `tz`. `None` only for ends outside of chrono's range.
    pub fn projected_end<Tz: TimeZone>(&self, tz: &Tz) -> Option<DateTime<Tz>> {
        tz.timestamp_millis_opt(self.projected_end_ms).single()
    }
}

/// Life measured in whole weeks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifeWeeks {
    pub total: i64,
    pub lived: i64,
    pub remaining: i64,
}

impl LifeWeeks {
    pub fn compute(now_ms: i64, birth_ms: i64, life_expectancy_years: f64) -> Self {
        let end_ms = end_instant_ms(birth_ms, life_expectancy_years);
        let total = end_ms.saturating_sub(birth_ms).div_euclid(MS_PER_WEEK);
        let lived = now_ms.saturating_sub(birth_ms).div_euclid(MS_PER_WEEK);
        Self {
            total,
            lived,
            remaining: total.saturating_sub(lived).max(0),
        }
    }
}

/// Bounds of the window that opens on `day`. An end at or before the start is moved forward by
/// exactly 24 hours; the start is never moved.
fn window_on<Tz: TimeZone>(
    tz: &Tz,
    day: NaiveDate,
    start: TimeOfDay,
    end: TimeOfDay,
) -> (DateTime<Tz>, DateTime<Tz>) {
    let window_start = resolve_local(tz, day.and_time(start.as_naive_time()));
    let mut window_end = resolve_local(tz, day.and_time(end.as_naive_time()));
    if window_end <= window_start {
        window_end = window_end + Duration::hours(24);
    }
    (window_start, window_end)
}

/// Milliseconds left in the active window anchored to the calendar day of `now`.
///
/// Before the window opens the whole window length is reported rather than 0. After it closes the
/// result is 0. Windows crossing midnight that opened yesterday stay in effect until today's start,
/// so `23:00-02:00` still counts down at 01:00.
pub fn active_remaining_ms<Tz: TimeZone>(
    now: &DateTime<Tz>,
    start: TimeOfDay,
    end: TimeOfDay,
) -> i64 {
    let tz = now.timezone();
    let today = now.date_naive();
    let (mut window_start, mut window_end) = window_on(&tz, today, start, end);

    let crosses_midnight = window_end.date_naive() != window_start.date_naive();
    if crosses_midnight && *now < window_start {
        if let Some(yesterday) = today.pred_opt() {
            (window_start, window_end) = window_on(&tz, yesterday, start, end);
        }
    }

    if *now < window_start {
        (window_end - window_start).num_milliseconds()
    } else if *now > window_end {
        0
    } else {
        (window_end - now.clone()).num_milliseconds()
    }
}
