use anyhow::Result;
use clap::Subcommand;

use crate::{
    core::profile::NoteScope,
    notes::{
        history::{
            load_history, year_month_options, HistoryEntry, HistoryQuery, ScopeFilter, YearMonth,
        },
        period::{label, normalize_one_line, period_id},
    },
    storage::{
        entities::NoteEntity,
        kv_store::KeyValueStore,
        records::{load_note, load_profile, save_note},
    },
};

use super::parse_moment;

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum NoteCommand {
    #[command(about = "Print the note of the current day or week")]
    Show {
        #[arg(long, help = "Defaults to the profile's dashboard note")]
        scope: Option<NoteScope>,
        #[arg(long, help = "Moment inside the day or week, for example \"yesterday\"")]
        at: Option<String>,
    },
    #[command(about = "Replace the note of the current day or week. No text clears it")]
    Set {
        #[arg(long, help = "Defaults to the profile's dashboard note")]
        scope: Option<NoteScope>,
        #[arg(long, help = "Moment inside the day or week, for example \"yesterday\"")]
        at: Option<String>,
        #[arg(help = "Note text. Line breaks are replaced and the text is cut to 120 characters")]
        text: Vec<String>,
    },
}

#[derive(clap::Args, Debug, Clone, PartialEq)]
pub struct HistoryCommand {
    #[arg(long, value_enum, default_value_t = ScopeFilter::All)]
    scope: ScopeFilter,
    #[arg(long, help = "Only notes of a month, as YYYY-MM")]
    month: Option<YearMonth>,
    #[arg(long, help = "Case-insensitive text to look for")]
    search: Option<String>,
    #[arg(long, help = "List the months that have notes instead of the notes")]
    months: bool,
}

async fn resolve_scope(store: &impl KeyValueStore, scope: Option<NoteScope>) -> Result<NoteScope> {
    match scope {
        Some(v) => Ok(v),
        None => Ok(load_profile(store)
            .await?
            .map(|v| v.default_note_scope)
            .unwrap_or(NoteScope::Day)),
    }
}

pub async fn process_note_command(store: &impl KeyValueStore, command: NoteCommand) -> Result<()> {
    match command {
        NoteCommand::Show { scope, at } => {
            let date = parse_moment(at)?.date_naive();
            let scope = resolve_scope(store, scope).await?;
            let id = period_id(scope, date);
            let note = load_note(store, scope, &id).await?;
            println!("{} ({id})", label(scope));
            if note.is_blank() {
                println!("(empty)");
            } else {
                println!("{}", note.text);
            }
        }
        NoteCommand::Set { scope, at, text } => {
            let date = parse_moment(at)?.date_naive();
            let scope = resolve_scope(store, scope).await?;
            let id = period_id(scope, date);
            let note = NoteEntity::new(normalize_one_line(&text.join(" ")));
            save_note(store, scope, &id, &note).await?;
            println!("Saved {scope} note {id}");
        }
    }
    Ok(())
}

pub async fn process_history_command(
    store: &impl KeyValueStore,
    command: HistoryCommand,
) -> Result<()> {
    let history = load_history(store).await?;

    if command.months {
        for month in year_month_options(&history) {
            println!("{month}");
        }
        return Ok(());
    }

    let query = HistoryQuery {
        scope: command.scope,
        month: command.month,
        search: command.search,
    };
    let matched = filter_history(&history, &query);
    if matched.is_empty() {
        println!("No notes found");
    }
    for entry in matched {
        println!("{:<10}  {:<4}  {}", entry.id, entry.scope.to_string(), entry.text);
    }
    Ok(())
}

fn filter_history<'a>(history: &'a [HistoryEntry], query: &HistoryQuery) -> Vec<&'a HistoryEntry> {
    history.iter().filter(|v| query.matches(v)).collect()
}
