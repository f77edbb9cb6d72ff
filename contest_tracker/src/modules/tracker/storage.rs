use std::{
    collections::BTreeMap,
    io,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tokio::fs;

type Result<T> = std::result::Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to access registration store")]
    IoError(#[from] io::Error),
    #[error("registration store is not a JSON object of strings")]
    FormatError(#[from] serde_json::Error),
}

/// Answer recorded after the user came back from a registration page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationFlag {
    Yes,
    No,
}

impl RegistrationFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationFlag::Yes => "yes",
            RegistrationFlag::No => "no",
        }
    }
}

/// String key-value store kept in a JSON file, written through on every change.
///
/// Registration flags live under `contest_<id>`. Entries are never pruned.
#[derive(Debug, Default)]
pub struct LocalStorage {
    path: Option<PathBuf>,
    entries: BTreeMap<String, String>,
}

impl LocalStorage {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open the store at `path`. A missing file is an empty store.
    pub async fn open(path: &Path) -> Result<Self> {
        let entries = match fs::read(path).await {
            Ok(content) if content.is_empty() => BTreeMap::new(),
            Ok(content) => serde_json::from_slice(&content)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path: Some(path.to_owned()),
            entries,
        })
    }

    pub fn get_item(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// The entry becomes visible only once it is on disk.
    pub async fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.clone();
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries).await?;
        self.entries = entries;
        Ok(())
    }

    /// Stored values other than `yes` and `no` read as unset.
    pub fn flag(&self, contest_id: i64) -> Option<RegistrationFlag> {
        match self.get_item(&flag_key(contest_id)) {
            Some("yes") => Some(RegistrationFlag::Yes),
            Some("no") => Some(RegistrationFlag::No),
            _ => None,
        }
    }

    pub async fn set_flag(&mut self, contest_id: i64, flag: RegistrationFlag) -> Result<()> {
        self.set_item(&flag_key(contest_id), flag.as_str()).await
    }

    async fn flush(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(path) = &self.path {
            let content = serde_json::to_vec_pretty(entries)?;
            fs::write(path, content).await?;
        }
        Ok(())
    }
}

pub fn flag_key(contest_id: i64) -> String {
    format!("contest_{}", contest_id)
}
