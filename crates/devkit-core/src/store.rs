//! Persistent store: one JSON document holding every snippet and the full
//! command history.
//!
//! Layout:
//!   <data_dir>/store.json
//!
//! ```json
//! { "version": 1,
//!   "snippets": { "build": { "command": "...", "tags": [], "created_at": "..." } },
//!   "history":  [ { "command": "...", "timestamp": "...", "success": true, ... } ] }
//! ```
//!
//! Older installs wrote a bare `{ name: command }` mapping, and later a
//! `{ name: { command, tags, created } }` mapping. Both are upgraded on load;
//! nothing outside this module ever sees those shapes.

use crate::error::{DevkitError, Result};
use crate::io;
use crate::types::{normalize_tags, parse_timestamp, HistoryRecord, Snippet};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const STORE_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Store (canonical in-memory shape)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Store {
    /// Keyed by snippet name, so iteration is always name-sorted.
    pub snippets: BTreeMap<String, Snippet>,
    /// Chronological; insertion order is canonical.
    pub history: Vec<HistoryRecord>,
}

impl Store {
    /// Parse a store document, upgrading legacy snippet shapes.
    ///
    /// Returns the store and the number of snippets that were upgraded.
    pub fn from_json(data: &str) -> std::result::Result<(Store, usize), serde_json::Error> {
        let on_disk: OnDisk = serde_json::from_str(data)?;
        let (raw_snippets, history) = match on_disk {
            OnDisk::Current(doc) => (doc.snippets, doc.history),
            OnDisk::Legacy(map) => (map, Vec::new()),
        };

        let mut migrated = 0;
        let snippets = raw_snippets
            .into_iter()
            .map(|(name, raw)| {
                let (snippet, upgraded) = raw.into_snippet(name.clone());
                if upgraded {
                    migrated += 1;
                }
                (name, snippet)
            })
            .collect();

        Ok((Store { snippets, history }, migrated))
    }

    pub fn to_json(&self) -> Result<String> {
        let doc = StoreDocument {
            version: STORE_VERSION,
            snippets: self
                .snippets
                .iter()
                .map(|(name, s)| (name.clone(), StoredSnippet::from(s)))
                .collect(),
            history: self.history.clone(),
        };
        Ok(serde_json::to_string_pretty(&doc)?)
    }
}

// ---------------------------------------------------------------------------
// On-disk shapes
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(untagged)]
enum OnDisk {
    Current(StoreDocument),
    Legacy(BTreeMap<String, StoredSnippet>),
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct StoreDocument {
    version: u32,
    #[serde(default)]
    snippets: BTreeMap<String, StoredSnippet>,
    #[serde(default)]
    history: Vec<HistoryRecord>,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum StoredSnippet {
    Record(SnippetRecord),
    /// Pre-tags format: the value is the command itself.
    Legacy(String),
}

#[derive(Serialize, Deserialize)]
struct SnippetRecord {
    command: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default, alias = "created", skip_serializing_if = "Option::is_none")]
    created_at: Option<String>,
}

impl StoredSnippet {
    /// Resolve to the canonical shape. The flag reports whether anything had
    /// to be synthesized.
    fn into_snippet(self, name: String) -> (Snippet, bool) {
        match self {
            StoredSnippet::Legacy(command) => (
                Snippet {
                    name,
                    command,
                    tags: Default::default(),
                    created_at: Utc::now(),
                },
                true,
            ),
            StoredSnippet::Record(rec) => {
                let parsed = rec.created_at.as_deref().and_then(parse_timestamp);
                let upgraded = parsed.is_none();
                (
                    Snippet {
                        name,
                        command: rec.command,
                        tags: normalize_tags(&rec.tags),
                        created_at: parsed.unwrap_or_else(Utc::now),
                    },
                    upgraded,
                )
            }
        }
    }
}

impl From<&Snippet> for StoredSnippet {
    fn from(s: &Snippet) -> Self {
        StoredSnippet::Record(SnippetRecord {
            command: s.command.clone(),
            tags: s.tags.iter().cloned().collect(),
            created_at: Some(s.created_at.to_rfc3339()),
        })
    }
}

// ---------------------------------------------------------------------------
// FileStore
// ---------------------------------------------------------------------------

/// File-backed store. Every mutation is a full read, in-memory change and
/// full write-back. Concurrent writers are not detected (last one wins).
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the store. A missing or empty file is an empty store.
    pub fn load(&self) -> Result<Store> {
        let Some(data) = io::read_if_exists(&self.path)? else {
            tracing::debug!(path = %self.path.display(), "store file missing, starting empty");
            return Ok(Store::default());
        };
        if data.trim().is_empty() {
            return Ok(Store::default());
        }
        let (store, migrated) = Store::from_json(&data).map_err(|source| DevkitError::CorruptData {
            path: self.path.clone(),
            source,
        })?;
        if migrated > 0 {
            tracing::warn!(
                path = %self.path.display(),
                migrated,
                "upgraded legacy snippet entries"
            );
        }
        tracing::debug!(
            snippets = store.snippets.len(),
            history = store.history.len(),
            "store loaded"
        );
        Ok(store)
    }

    /// Overwrite the backing file with `store`.
    pub fn save(&self, store: &Store) -> Result<()> {
        let data = store.to_json()?;
        io::atomic_write(&self.path, data.as_bytes())?;
        tracing::debug!(path = %self.path.display(), "store saved");
        Ok(())
    }

    /// Load, apply `f`, and save. If `f` fails nothing is written.
    pub fn update<T>(&self, f: impl FnOnce(&mut Store) -> Result<T>) -> Result<T> {
        let mut store = self.load()?;
        let out = f(&mut store)?;
        self.save(&store)?;
        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CommandSource, ExitStatus};
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> FileStore {
        FileStore::new(dir.path().join("store.json"))
    }

    #[test]
    fn missing_file_is_empty_store() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir).load().unwrap();
        assert!(store.snippets.is_empty());
        assert!(store.history.is_empty());
    }

    #[test]
    fn empty_file_is_empty_store() {
        let dir = TempDir::new().unwrap();
        let fs = store_in(&dir);
        std::fs::write(fs.path(), "  \n").unwrap();
        assert_eq!(fs.load().unwrap(), Store::default());
    }

    #[test]
    fn unparseable_file_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let fs = store_in(&dir);
        std::fs::write(fs.path(), "{ not json").unwrap();
        let err = fs.load().unwrap_err();
        assert!(matches!(err, DevkitError::CorruptData { .. }));
    }

    #[test]
    fn wrong_structure_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let fs = store_in(&dir);
        std::fs::write(fs.path(), "[1, 2, 3]").unwrap();
        assert!(matches!(fs.load(), Err(DevkitError::CorruptData { .. })));
    }

    #[test]
    fn legacy_name_to_command_is_upgraded() {
        let dir = TempDir::new().unwrap();
        let fs = store_in(&dir);
        std::fs::write(fs.path(), r#"{"build": "npm run build"}"#).unwrap();

        let store = fs.load().unwrap();
        assert_eq!(store.snippets.len(), 1);
        let s = &store.snippets["build"];
        assert_eq!(s.name, "build");
        assert_eq!(s.command, "npm run build");
        assert!(s.tags.is_empty());
        assert!(store.history.is_empty());
    }

    #[test]
    fn legacy_record_shape_with_naive_created_is_upgraded() {
        let dir = TempDir::new().unwrap();
        let fs = store_in(&dir);
        std::fs::write(
            fs.path(),
            r#"{
                "clean": {"command": "docker system prune -a", "tags": ["Docker"], "created": "2024-01-02T03:04:05.678901"},
                "ls": "ls -la"
            }"#,
        )
        .unwrap();

        let store = fs.load().unwrap();
        let clean = &store.snippets["clean"];
        assert!(clean.has_tag("docker"));
        assert_eq!(clean.created_at.to_rfc3339(), "2024-01-02T03:04:05.678901+00:00");
        assert_eq!(store.snippets["ls"].command, "ls -la");
    }

    #[test]
    fn upgrade_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let fs = store_in(&dir);
        std::fs::write(fs.path(), r#"{"build": "npm run build"}"#).unwrap();

        let first = fs.load().unwrap();
        fs.save(&first).unwrap();
        let second = fs.load().unwrap();
        assert_eq!(first, second);

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(fs.path()).unwrap()).unwrap();
        assert_eq!(raw["version"], 1);
        assert_eq!(raw["snippets"]["build"]["command"], "npm run build");
    }

    #[test]
    fn snippet_named_version_stays_legacy() {
        let (store, migrated) = Store::from_json(r#"{"version": "git --version"}"#).unwrap();
        assert_eq!(migrated, 1);
        assert_eq!(store.snippets["version"].command, "git --version");
    }

    #[test]
    fn save_and_reload_roundtrip() {
        let dir = TempDir::new().unwrap();
        let fs = store_in(&dir);
        let mut store = Store::default();
        store.snippets.insert(
            "up".to_string(),
            Snippet {
                name: "up".to_string(),
                command: "docker compose up -d".to_string(),
                tags: normalize_tags(["docker"]),
                created_at: Utc::now(),
            },
        );
        store.history.push(HistoryRecord {
            command: "docker compose up -d".to_string(),
            timestamp: Utc::now(),
            status: ExitStatus::from_code(0),
            source: CommandSource::Snippet {
                name: "up".to_string(),
            },
            output: Some("started".to_string()),
        });
        fs.save(&store).unwrap();
        assert_eq!(fs.load().unwrap(), store);
    }

    #[test]
    fn update_error_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let fs = store_in(&dir);
        let res: Result<()> = fs.update(|s| {
            s.history.clear();
            Err(DevkitError::validation("nope"))
        });
        assert!(res.is_err());
        assert!(!fs.path().exists());
    }
}
