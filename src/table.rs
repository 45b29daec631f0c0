//! Command table: maps scanned codes to playback actions
//!
//! The table is a flat JSON object (code string → action string) written
//! by the card-association tool. Action strings are classified once at
//! load time so dispatch never re-parses prefixes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;

/// On-disk shape of the table: a flat JSON object of code → action string.
#[derive(Debug, Deserialize)]
#[serde(transparent)]
struct RawTable(HashMap<String, String>);

/// A playback action decoded from a table entry.
///
/// `cmd:` and `spotify:` prefixes are recognized explicitly; everything
/// else is treated as a library reference, with a `lib:` prefix stripped
/// when present. Bare values therefore still dispatch as library items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Built-in command, e.g. `cmd:playpause`
    Command(String),
    /// Local music library item hash
    Library(String),
    /// Spotify item reference
    Spotify(String),
}

impl Action {
    fn classify(raw: &str) -> Self {
        if let Some(name) = raw.strip_prefix("cmd:") {
            Action::Command(name.to_string())
        } else if let Some(id) = raw.strip_prefix("spotify:") {
            Action::Spotify(id.to_string())
        } else {
            let id = raw.strip_prefix("lib:").unwrap_or(raw);
            Action::Library(id.to_string())
        }
    }
}

/// Errors raised while loading the command table
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("command table {0} not found; run the card association step to create it")]
    Missing(PathBuf),

    #[error("failed to read command table: {0}")]
    Io(#[from] std::io::Error),

    #[error("command table is not a JSON object of strings: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Immutable code → action mapping, loaded once at startup
#[derive(Debug)]
pub struct CommandTable {
    entries: HashMap<String, Action>,
}

impl CommandTable {
    /// Load the table from disk. A missing file is fatal to the caller:
    /// no scanned code can ever be handled without it.
    pub fn load(path: &Path) -> Result<Self, TableError> {
        if !path.exists() {
            return Err(TableError::Missing(path.to_owned()));
        }

        let contents = std::fs::read_to_string(path)?;
        let table = Self::from_json(&contents)?;
        info!(entries = table.len(), ?path, "command table loaded");
        Ok(table)
    }

    /// Build a table from raw JSON (object of string → string).
    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        let raw: RawTable = serde_json::from_str(contents)?;
        Ok(Self::from_entries(raw.0))
    }

    /// Build a table from already-parsed entries.
    pub fn from_entries(raw: HashMap<String, String>) -> Self {
        let entries = raw
            .into_iter()
            .map(|(code, value)| (code, Action::classify(&value)))
            .collect();
        Self { entries }
    }

    /// Look up the action for a scanned code.
    pub fn lookup(&self, code: &str) -> Option<&Action> {
        self.entries.get(code)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
