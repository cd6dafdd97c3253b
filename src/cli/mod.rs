pub mod dashboard;
pub mod note;
pub mod profile;
pub mod watch;

use std::{fmt::Display, io::IsTerminal, path::PathBuf};

use anyhow::Result;
use chrono::{DateTime, Local};
use chrono_english::{parse_date_string, Dialect};
use clap::{CommandFactory, Parser, Subcommand};
use dashboard::{Dashboard, TerminalSink};
use note::{process_history_command, process_note_command, HistoryCommand, NoteCommand};
use profile::{process_profile_command, ProfileCommand};
use tokio_util::sync::CancellationToken;
use tracing::level_filters::LevelFilter;
use watch::{detect_shutdown, Watcher};

use crate::{
    core::{
        calc::{birth_instant, LifeWeeks},
        format::Unit,
        profile::Profile,
    },
    notes::period::period_id,
    storage::{
        kv_store::{FileStore, KeyValueStore},
        records::{load_note, load_profile},
    },
    utils::{
        clock::DefaultClock,
        dir::{create_application_default_path, create_application_path},
        logging::{enable_logging, CLI_PREFIX, WATCH_PREFIX},
    },
};

#[derive(Parser, Debug)]
#[command(name = "lifeleft", version, long_about = None)]
#[command(about = "Countdown of your estimated remaining lifetime and today's active hours", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, global = true, help = "Print logs to the console")]
    log: bool,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, clap::Args)]
pub struct ViewArgs {
    #[arg(short, long, default_value_t = Unit::Seconds, help = "Unit of the remaining lifetime")]
    unit: Unit,
    #[arg(long = "no-active", help = "Hide today's active hours countdown")]
    hide_active: bool,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Print the dashboard once")]
    Show {
        #[command(flatten)]
        view: ViewArgs,
        #[arg(
            long,
            help = "Moment to compute the dashboard for. Examples are \"tomorrow\", \"15/03/2025\", \"12:00 16/03/2025\""
        )]
        at: Option<String>,
    },
    #[command(about = "Keep the dashboard on screen, refreshing every second or every minute")]
    Watch {
        #[command(flatten)]
        view: ViewArgs,
    },
    #[command(about = "Show your life in weeks")]
    Weeks {
        #[arg(long, help = "Moment to count weeks for")]
        at: Option<String>,
    },
    #[command(about = "Show or change the profile")]
    Profile {
        #[command(subcommand)]
        command: ProfileCommand,
    },
    #[command(about = "Read or write the one-line note of a day or a week")]
    Note {
        #[command(subcommand)]
        command: NoteCommand,
    },
    #[command(about = "List saved notes")]
    History {
        #[command(flatten)]
        command: HistoryCommand,
    },
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let app_dir = args
        .dir
        .map_or_else(create_application_default_path, create_application_path)?;

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    let prefix = match args.commands {
        Commands::Watch { .. } => WATCH_PREFIX,
        _ => CLI_PREFIX,
    };
    enable_logging(prefix, &app_dir.join("logs"), logging_level, args.log)?;

    let store = FileStore::new(app_dir.join("store"))?;

    match args.commands {
        Commands::Show { view, at } => {
            let now = parse_moment(at)?;
            show_dashboard(&store, now, view).await
        }
        Commands::Watch { view } => watch_dashboard(store, view).await,
        Commands::Weeks { at } => {
            let now = parse_moment(at)?;
            show_weeks(&store, now).await
        }
        Commands::Profile { command } => process_profile_command(&store, command).await,
        Commands::Note { command } => process_note_command(&store, command).await,
        Commands::History { command } => process_history_command(&store, command).await,
    }
}

/// Parses a human readable moment, defaulting to now.
pub(crate) fn parse_moment(at: Option<String>) -> Result<DateTime<Local>> {
    let now = Local::now();
    match at.map(|s| parse_date_string(&s, now, Dialect::Uk)) {
        Some(Ok(v)) => Ok(v.with_timezone(&Local)),
        Some(Err(e)) => Err(validation_error(format!("Failed to validate moment {e}"))),
        None => Ok(now),
    }
}

/// Reports a bad argument the same way clap reports its own parsing failures.
pub(crate) fn validation_error(message: impl Display) -> anyhow::Error {
    Args::command()
        .error(clap::error::ErrorKind::ValueValidation, message)
        .into()
}

/// Shown instead of the dashboard until a profile is saved.
fn print_missing_profile() {
    println!("Profile is not set. Create one with `lifeleft profile set --birth YYYY-MM-DD`.");
}

async fn show_dashboard(
    store: &impl KeyValueStore,
    now: DateTime<Local>,
    view: ViewArgs,
) -> Result<()> {
    let Some(profile) = load_profile(store).await? else {
        print_missing_profile();
        return Ok(());
    };

    let scope = profile.default_note_scope;
    let note = load_note(store, scope, &period_id(scope, now.date_naive())).await?;
    let dashboard =
        Dashboard::compute(&now, &profile, view.unit, !view.hide_active).with_note(scope, note.text);
    println!("{}", dashboard.render(std::io::stdout().is_terminal()));
    Ok(())
}

async fn watch_dashboard(store: FileStore, view: ViewArgs) -> Result<()> {
    let Some(profile) = load_profile(&store).await? else {
        print_missing_profile();
        return Ok(());
    };

    let shutdown_token = CancellationToken::new();
    let watcher = Watcher::new(
        store,
        TerminalSink::new(),
        Box::new(DefaultClock),
        shutdown_token.clone(),
        profile,
        view.unit,
        !view.hide_active,
    );

    let (_, result) = tokio::join!(detect_shutdown(shutdown_token.clone()), async {
        let result = watcher.run().await;
        // Lets the signal listener finish when the watcher stops by itself.
        shutdown_token.cancel();
        result
    });
    result
}

async fn show_weeks(store: &impl KeyValueStore, now: DateTime<Local>) -> Result<()> {
    let Some(profile) = load_profile(store).await? else {
        print_missing_profile();
        return Ok(());
    };
    let weeks = life_weeks(&now, &profile);
    println!("Weeks lived:     {}", weeks.lived.max(0));
    println!("Weeks remaining: {}", weeks.remaining);
    println!("Weeks in total:  {}", weeks.total);
    Ok(())
}

fn life_weeks(now: &DateTime<Local>, profile: &Profile) -> LifeWeeks {
    let birth = birth_instant(&Local, profile.birth_date);
    LifeWeeks::compute(
        now.timestamp_millis(),
        birth.timestamp_millis(),
        profile.life_expectancy_years,
    )
}
