use std::{
    future::{self, Future},
    io::ErrorKind,
    ops::Deref,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use fs4::tokio::AsyncFileExt;
use futures::StreamExt;
use serde_json::Value;
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt},
};
use tokio_stream::wrappers::ReadDirStream;
use tracing::{debug, warn};

const KEY_EXTENSION: &str = "json";
const MAX_KEY_LENGTH: usize = 64;

/// Logical table of the store. Each table has its own key space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Profile,
    DayNotes,
    WeekNotes,
}

impl Table {
    pub const ALL: [Table; 3] = [Table::Profile, Table::DayNotes, Table::WeekNotes];

    pub fn name(&self) -> &'static str {
        match self {
            Table::Profile => "profile",
            Table::DayNotes => "day_notes",
            Table::WeekNotes => "week_notes",
        }
    }
}

/// Interface for abstracting storage of JSON values.
pub trait KeyValueStore {
    /// Returns `None` when nothing was saved under `key`.
    fn get(
        &self,
        table: Table,
        key: &str,
    ) -> impl Future<Output = Result<Option<Value>>> + Send;

    /// Replaces whatever was saved under `key`.
    fn set(&self, table: Table, key: &str, value: Value) -> impl Future<Output = Result<()>> + Send;

    /// Keys of `table` in ascending order.
    fn list_keys(&self, table: Table) -> impl Future<Output = Result<Vec<String>>> + Send;
}

impl<T: Deref> KeyValueStore for T
where
    T::Target: KeyValueStore,
{
    fn get(
        &self,
        table: Table,
        key: &str,
    ) -> impl Future<Output = Result<Option<Value>>> + Send {
        self.deref().get(table, key)
    }

    fn set(&self, table: Table, key: &str, value: Value) -> impl Future<Output = Result<()>> + Send {
        self.deref().set(table, key, value)
    }

    fn list_keys(&self, table: Table) -> impl Future<Output = Result<Vec<String>>> + Send {
        self.deref().list_keys(table)
    }
}

/// The main realization of [KeyValueStore]. Every table is a directory and every key is a
/// `<key>.json` file inside it. Reads take a shared lock, writes an exclusive one.
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: PathBuf) -> Result<Self, std::io::Error> {
        for table in Table::ALL {
            std::fs::create_dir_all(root.join(table.name()))?;
        }
        Ok(Self { root })
    }

    fn table_dir(&self, table: Table) -> PathBuf {
        self.root.join(table.name())
    }

    fn key_path(&self, table: Table, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.table_dir(table).join(format!("{key}.{KEY_EXTENSION}")))
    }

    async fn read_locked(path: &Path) -> Result<String, std::io::Error> {
        let mut file = File::open(path).await?;
        file.lock_shared()?;
        let mut contents = String::new();
        let result = file.read_to_string(&mut contents).await;
        file.unlock_async().await?;
        result.map(|_| contents)
    }

    async fn overwrite(file: &mut File, contents: &[u8]) -> Result<()> {
        file.set_len(0).await?;
        file.rewind().await?;
        file.write_all(contents).await?;
        file.flush().await?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    async fn get(&self, table: Table, key: &str) -> Result<Option<Value>> {
        let path = self.key_path(table, key)?;
        debug!("Reading {path:?}");
        match Self::read_locked(&path).await {
            Ok(contents) => {
                let value = serde_json::from_str(&contents)
                    .with_context(|| format!("Stored value in {path:?} is not valid json"))?;
                Ok(Some(value))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {path:?}")),
        }
    }

    async fn set(&self, table: Table, key: &str, value: Value) -> Result<()> {
        let path = self.key_path(table, key)?;
        let contents = serde_json::to_vec(&value)?;
        debug!("Writing {} bytes into {path:?}", contents.len());

        let mut file = File::options()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .await?;

        // Truncation happens only after the lock is acquired so readers never see a partial value.
        file.lock_exclusive()?;
        let result = Self::overwrite(&mut file, &contents).await;
        file.unlock_async().await?;
        result
    }

    async fn list_keys(&self, table: Table) -> Result<Vec<String>> {
        let dir = self.table_dir(table);
        let entries = match tokio::fs::read_dir(&dir).await {
            Ok(v) => v,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(e.into()),
        };

        let mut keys = ReadDirStream::new(entries)
            .filter_map(|entry| {
                future::ready(match entry {
                    Ok(entry) => key_from_path(&entry.path()),
                    Err(e) => {
                        warn!("Failed to read an entry of {:?}: {e}", table.name());
                        None
                    }
                })
            })
            .collect::<Vec<_>>()
            .await;
        keys.sort();
        Ok(keys)
    }
}

/// Keys end up as file names, so only a conservative character set is allowed.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() || key.len() > MAX_KEY_LENGTH {
        bail!("Key {key:?} has to be between 1 and {MAX_KEY_LENGTH} characters long");
    }
    if !key
        .bytes()
        .all(|v| v.is_ascii_alphanumeric() || v == b'-' || v == b'_')
    {
        bail!("Key {key:?} may only contain ascii letters, digits, '-' and '_'");
    }
    Ok(())
}

fn key_from_path(path: &Path) -> Option<String> {
    if path.extension()? != KEY_EXTENSION {
        return None;
    }
    let key = path.file_stem()?.to_str()?;
    validate_key(key).ok()?;
    Some(key.to_string())
}
