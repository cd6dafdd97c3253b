use anyhow::Result;
use chrono::NaiveDate;
use clap::Subcommand;

use crate::{
    core::profile::{active_window_minutes, NoteScope, Profile, TimeOfDay},
    storage::{
        kv_store::KeyValueStore,
        records::{load_profile, save_profile},
    },
};

use super::validation_error;

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum ProfileCommand {
    #[command(about = "Print the saved profile")]
    Show,
    #[command(about = "Change profile fields. Fields that aren't passed keep their saved value")]
    Set {
        #[arg(long, help = "Birth date as YYYY-MM-DD")]
        birth: Option<NaiveDate>,
        #[arg(long, help = "Expected lifespan in years, up to 150. Fractions are allowed")]
        life_expectancy: Option<f64>,
        #[arg(long, help = "Start of the active window as HH:MM")]
        active_start: Option<TimeOfDay>,
        #[arg(
            long,
            help = "End of the active window as HH:MM. An end before the start means the next day"
        )]
        active_end: Option<TimeOfDay>,
        #[arg(long, help = "Scope of the note shown on the dashboard")]
        default_note: Option<NoteScope>,
    },
}

pub async fn process_profile_command(
    store: &impl KeyValueStore,
    command: ProfileCommand,
) -> Result<()> {
    match command {
        ProfileCommand::Show => match load_profile(store).await? {
            Some(profile) => print_profile(&profile),
            None => println!("Profile is not set."),
        },
        ProfileCommand::Set {
            birth,
            life_expectancy,
            active_start,
            active_end,
            default_note,
        } => {
            let mut profile = load_profile(store).await?.unwrap_or_default();
            if let Some(v) = birth {
                profile.birth_date = v;
            }
            if let Some(v) = life_expectancy {
                profile.life_expectancy_years = v;
            }
            if let Some(v) = active_start {
                profile.active_window_start = v;
            }
            if let Some(v) = active_end {
                profile.active_window_end = v;
            }
            if let Some(v) = default_note {
                profile.default_note_scope = v;
            }

            profile.validate().map_err(validation_error)?;
            save_profile(store, &profile).await?;
            print_profile(&profile);
        }
    }
    Ok(())
}

fn print_profile(profile: &Profile) {
    let minutes = active_window_minutes(profile.active_window_start, profile.active_window_end);
    println!("Birth date:        {}", profile.birth_date);
    println!("Life expectancy:   {} years", profile.life_expectancy_years);
    println!(
        "Active window:     {}-{} ({}h {}m)",
        profile.active_window_start,
        profile.active_window_end,
        minutes / 60,
        minutes % 60
    );
    println!("Dashboard note:    {}", profile.default_note_scope);
}
