use std::{cmp::Reverse, fmt::Display, str::FromStr};

use anyhow::{anyhow, Result};
use chrono::{Datelike, NaiveDate};
use clap::ValueEnum;
use futures::{stream, StreamExt};
use tracing::{debug, warn};

use crate::{
    core::profile::NoteScope,
    storage::{
        kv_store::KeyValueStore,
        records::{load_note, notes_table},
    },
};

use super::period::period_start;

/// A saved non-blank note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub scope: NoteScope,
    pub id: String,
    pub text: String,
    /// First day of the period, `None` for identifiers that don't parse.
    pub start: Option<NaiveDate>,
}

impl HistoryEntry {
    pub fn year_month(&self) -> Option<YearMonth> {
        self.start.map(|v| YearMonth {
            year: v.year(),
            month: v.month(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let date = NaiveDate::parse_from_str(&format!("{}-01", s.trim()), "%Y-%m-%d")
            .map_err(|_| anyhow!("Expected YYYY-MM, got {s:?}"))?;
        Ok(YearMonth {
            year: date.year(),
            month: date.month(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ScopeFilter {
    #[default]
    All,
    Day,
    Week,
}

impl ScopeFilter {
    fn accepts(&self, scope: NoteScope) -> bool {
        match self {
            ScopeFilter::All => true,
            ScopeFilter::Day => scope == NoteScope::Day,
            ScopeFilter::Week => scope == NoteScope::Week,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct HistoryQuery {
    pub scope: ScopeFilter,
    /// Week notes belong to the month their Monday is in.
    pub month: Option<YearMonth>,
    /// Case-insensitive substring of the note text or of the period identifier.
    pub search: Option<String>,
}

impl HistoryQuery {
    pub fn matches(&self, entry: &HistoryEntry) -> bool {
        if !self.scope.accepts(entry.scope) {
            return false;
        }
        if let Some(month) = self.month {
            if entry.year_month() != Some(month) {
                return false;
            }
        }
        match self.search.as_deref().map(str::trim) {
            Some(search) if !search.is_empty() => {
                let search = search.to_lowercase();
                entry.text.to_lowercase().contains(&search)
                    || entry.id.to_lowercase().contains(&search)
            }
            _ => true,
        }
    }
}

const PARALLEL_READS: usize = 4;

/// Reads every non-blank note of both scopes, newest period first. Notes that can't be read are
/// logged and skipped so that one broken file doesn't hide the rest.
pub async fn load_history(store: &impl KeyValueStore) -> Result<Vec<HistoryEntry>> {
    let mut keys = Vec::new();
    for scope in [NoteScope::Day, NoteScope::Week] {
        let table_keys = store.list_keys(notes_table(scope)).await?;
        debug!("Found {} {scope} notes", table_keys.len());
        keys.extend(table_keys.into_iter().map(|key| (scope, key)));
    }

    let mut entries = stream::iter(keys)
        .map(|(scope, id)| async move {
            let note = load_note(store, scope, &id).await;
            (scope, id, note)
        })
        .buffered(PARALLEL_READS)
        .filter_map(|(scope, id, note)| async move {
            match note {
                Ok(note) if note.is_blank() => None,
                Ok(note) => Some(HistoryEntry {
                    start: period_start(scope, &id),
                    scope,
                    id,
                    text: note.text,
                }),
                Err(e) => {
                    warn!("Skipping {scope} note {id}: {e:?}");
                    None
                }
            }
        })
        .collect::<Vec<_>>()
        .await;

    entries.sort_by_key(|v| Reverse((v.start, v.id.clone())));
    Ok(entries)
}

/// Distinct months that have at least one note, newest first.
pub fn year_month_options(entries: &[HistoryEntry]) -> Vec<YearMonth> {
    let mut months = entries
        .iter()
        .filter_map(HistoryEntry::year_month)
        .collect::<Vec<_>>();
    months.sort_by(|a, b| b.cmp(a));
    months.dedup();
    months
}
