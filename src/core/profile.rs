use std::{fmt::Display, str::FromStr};

use anyhow::{anyhow, bail, Result};
use chrono::{NaiveDate, NaiveTime, TimeDelta};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Longest life expectancy that can be saved.
pub const MAX_LIFE_EXPECTANCY_YEARS: f64 = 150.;

/// Shortest active window that can be saved.
pub const MIN_ACTIVE_MINUTES: u32 = 1;
/// Longest active window that can be saved. A full day is not a window.
pub const MAX_ACTIVE_MINUTES: u32 = MINUTES_PER_DAY - 1;

/// Hour and minute of a day, persisted as `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay {
    hour: u32,
    minute: u32,
}

impl TimeOfDay {
    pub fn new_opt(hour: u32, minute: u32) -> Option<TimeOfDay> {
        if hour < 24 && minute < 60 {
            Some(TimeOfDay { hour, minute })
        } else {
            None
        }
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    pub fn minutes_from_midnight(&self) -> u32 {
        self.hour * 60 + self.minute
    }

    pub fn as_naive_time(&self) -> NaiveTime {
        NaiveTime::MIN + TimeDelta::minutes(self.minutes_from_midnight().into())
    }
}

impl Display for TimeOfDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for TimeOfDay {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (hour, minute) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| anyhow!("Expected HH:MM, got {s:?}"))?;
        let hour = hour.parse::<u32>()?;
        let minute = minute.parse::<u32>()?;
        TimeOfDay::new_opt(hour, minute).ok_or_else(|| anyhow!("{s:?} is not a time of day"))
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(value: TimeOfDay) -> Self {
        value.to_string()
    }
}

/// Which note is opened when no scope is given explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteScope {
    #[serde(alias = "today")]
    Day,
    Week,
}

impl Display for NoteScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NoteScope::Day => write!(f, "day"),
            NoteScope::Week => write!(f, "week"),
        }
    }
}

/// User settings. Everything the calculator needs is derived from a snapshot of this record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Interpreted as local midnight.
    pub birth_date: NaiveDate,
    pub life_expectancy_years: f64,
    pub active_window_start: TimeOfDay,
    /// When not after `active_window_start` the window ends on the next day.
    pub active_window_end: TimeOfDay,
    pub default_note_scope: NoteScope,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            birth_date: NaiveDate::from_ymd_opt(2000, 1, 1).expect("Valid constant date"),
            life_expectancy_years: 80.,
            active_window_start: TimeOfDay { hour: 7, minute: 0 },
            active_window_end: TimeOfDay { hour: 23, minute: 0 },
            default_note_scope: NoteScope::Day,
        }
    }
}

impl Profile {
    /// Checks the rules a profile has to satisfy before it's saved.
    pub fn validate(&self) -> Result<()> {
        let years = self.life_expectancy_years;
        if !(years > 0. && years <= MAX_LIFE_EXPECTANCY_YEARS) {
            bail!(
                "Life expectancy has to be more than 0 and at most {MAX_LIFE_EXPECTANCY_YEARS} years, got {years}"
            );
        }
        let minutes = active_window_minutes(self.active_window_start, self.active_window_end);
        if !(MIN_ACTIVE_MINUTES..=MAX_ACTIVE_MINUTES).contains(&minutes) {
            bail!(
                "Active window {}-{} has to last between 1 minute and 23 hours 59 minutes",
                self.active_window_start,
                self.active_window_end
            );
        }
        Ok(())
    }
}

/// Length of the window in minutes. An end at or before the start is treated as the next day, so
/// the result is always in `1..=1440`.
pub fn active_window_minutes(start: TimeOfDay, end: TimeOfDay) -> u32 {
    let start = start.minutes_from_midnight();
    let mut end = end.minutes_from_midnight();
    if end <= start {
        end += MINUTES_PER_DAY;
    }
    end - start
}
