use chrono::{Datelike, NaiveDate, Weekday};

use crate::{core::profile::NoteScope, utils::time::date_to_record_name};

/// Notes are single lines of at most this many characters.
pub const MAX_NOTE_CHARS: usize = 120;

/// `YYYY-MM-DD` of the local calendar date.
pub fn day_id(date: NaiveDate) -> String {
    date_to_record_name(date)
}

/// `YYYY-Www` using the Thursday-anchored week: the week belongs to the year its Thursday is in.
pub fn week_id(date: NaiveDate) -> String {
    let week = date.iso_week();
    format!("{:04}-W{:02}", week.year(), week.week())
}

pub fn period_id(scope: NoteScope, date: NaiveDate) -> String {
    match scope {
        NoteScope::Day => day_id(date),
        NoteScope::Week => week_id(date),
    }
}

/// Monday of a `YYYY-Www` week.
pub fn week_start(week_id: &str) -> Option<NaiveDate> {
    let (year, week) = week_id.split_once("-W")?;
    NaiveDate::from_isoywd_opt(year.parse().ok()?, week.parse().ok()?, Weekday::Mon)
}

/// The date a period identifier starts on.
pub fn period_start(scope: NoteScope, id: &str) -> Option<NaiveDate> {
    match scope {
        NoteScope::Day => NaiveDate::parse_from_str(id, "%Y-%m-%d").ok(),
        NoteScope::Week => week_start(id),
    }
}

/// Line breaks become spaces and the text is cut to [MAX_NOTE_CHARS] characters.
pub fn normalize_one_line(text: &str) -> String {
    text.replace("\r\n", " ")
        .replace('\n', " ")
        .chars()
        .take(MAX_NOTE_CHARS)
        .collect()
}

pub fn label(scope: NoteScope) -> &'static str {
    match scope {
        NoteScope::Day => "Today's note",
        NoteScope::Week => "This week's note",
    }
}
