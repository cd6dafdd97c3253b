use anyhow::{Context, Result};
use tracing::{info, instrument};

use crate::core::profile::{NoteScope, Profile};

use super::{
    entities::NoteEntity,
    kv_store::{KeyValueStore, Table},
};

pub const PROFILE_KEY: &str = "profile";

pub fn notes_table(scope: NoteScope) -> Table {
    match scope {
        NoteScope::Day => Table::DayNotes,
        NoteScope::Week => Table::WeekNotes,
    }
}

/// Returns `None` when the profile was never set up.
pub async fn load_profile(store: &impl KeyValueStore) -> Result<Option<Profile>> {
    store
        .get(Table::Profile, PROFILE_KEY)
        .await?
        .map(serde_json::from_value::<Profile>)
        .transpose()
        .context("Stored profile is malformed")
}

/// Validates `profile` and saves it. Nothing is written when validation fails.
#[instrument(skip(store))]
pub async fn save_profile(store: &impl KeyValueStore, profile: &Profile) -> Result<()> {
    profile.validate()?;
    store
        .set(Table::Profile, PROFILE_KEY, serde_json::to_value(profile)?)
        .await?;
    info!("Saved profile");
    Ok(())
}

pub async fn load_note(store: &impl KeyValueStore, scope: NoteScope, id: &str) -> Result<NoteEntity> {
    let value = store.get(notes_table(scope), id).await?;
    let note = value
        .map(serde_json::from_value::<NoteEntity>)
        .transpose()
        .with_context(|| format!("Stored {scope} note {id} is malformed"))?;
    Ok(note.unwrap_or_default())
}

#[instrument(skip(store, note))]
pub async fn save_note(
    store: &impl KeyValueStore,
    scope: NoteScope,
    id: &str,
    note: &NoteEntity,
) -> Result<()> {
    store
        .set(notes_table(scope), id, serde_json::to_value(note)?)
        .await?;
    info!("Saved {scope} note {id}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use tempfile::tempdir;

    use crate::{
        core::profile::{NoteScope, Profile, TimeOfDay},
        storage::{
            entities::NoteEntity,
            kv_store::{FileStore, KeyValueStore, Table},
        },
    };

    use super::*;

    #[tokio::test]
    async fn test_profile_missing_then_saved() -> Result<()> {
        let dir = tempdir()?;
        let store = FileStore::new(dir.path().to_owned())?;

        assert_eq!(load_profile(&store).await?, None);

        let profile = Profile {
            life_expectancy_years: 84.5,
            ..Profile::default()
        };
        save_profile(&store, &profile).await?;
        assert_eq!(load_profile(&store).await?, Some(profile));
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_profile_is_not_saved() -> Result<()> {
        let dir = tempdir()?;
        let store = FileStore::new(dir.path().to_owned())?;

        let profile = Profile {
            active_window_start: TimeOfDay::new_opt(9, 0).unwrap(),
            active_window_end: TimeOfDay::new_opt(9, 0).unwrap(),
            ..Profile::default()
        };
        assert!(save_profile(&store, &profile).await.is_err());
        assert!(store.list_keys(Table::Profile).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_notes_by_scope() -> Result<()> {
        let dir = tempdir()?;
        let store = FileStore::new(dir.path().to_owned())?;

        save_note(&store, NoteScope::Day, "2024-03-05", &NoteEntity::new("ship it")).await?;
        save_note(&store, NoteScope::Week, "2024-W10", &NoteEntity::new("rest")).await?;

        assert_eq!(load_note(&store, NoteScope::Day, "2024-03-05").await?.text, "ship it");
        assert_eq!(load_note(&store, NoteScope::Week, "2024-W10").await?.text, "rest");
        assert_eq!(load_note(&store, NoteScope::Day, "2024-03-06").await?, NoteEntity::default());
        Ok(())
    }
}
