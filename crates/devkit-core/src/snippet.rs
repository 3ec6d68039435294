//! Snippet repository: CRUD, tag filter, search and export/import on top of
//! the [`FileStore`].
//!
//! Listing and search results are always sorted by snippet name.

use crate::error::{DevkitError, Result};
use crate::exchange::{self, ExportFormat};
use crate::io;
use crate::store::FileStore;
use crate::types::{normalize_tags, Snippet};
use chrono::Utc;
use serde::Serialize;
use std::path::Path;

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

pub fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(DevkitError::validation("snippet name must not be empty"));
    }
    if name.chars().any(char::is_control) {
        return Err(DevkitError::validation(format!(
            "snippet name {name:?} contains control characters"
        )));
    }
    Ok(())
}

pub fn validate_command(command: &str) -> Result<()> {
    if command.trim().is_empty() {
        return Err(DevkitError::validation("snippet command must not be empty"));
    }
    Ok(())
}

/// Tags are single words: no whitespace and no commas (the text export
/// separates tags with commas).
pub fn validate_tags<S: AsRef<str>>(tags: &[S]) -> Result<()> {
    for tag in tags {
        let t = tag.as_ref().trim();
        if t.contains(',') || t.chars().any(char::is_whitespace) {
            return Err(DevkitError::validation(format!("malformed tag {t:?}")));
        }
    }
    Ok(())
}

/// Split a comma-separated `--tags` argument.
pub fn parse_tag_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

// ---------------------------------------------------------------------------
// ImportReport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
    /// Names that already existed and were left untouched.
    pub conflicts: Vec<String>,
}

// ---------------------------------------------------------------------------
// SnippetRepository
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SnippetRepository {
    store: FileStore,
}

impl SnippetRepository {
    pub fn new(store: FileStore) -> Self {
        Self { store }
    }

    /// Create or replace the snippet called `name`.
    pub fn save<S: AsRef<str>>(&self, name: &str, command: &str, tags: &[S]) -> Result<Snippet> {
        validate_name(name)?;
        validate_command(command)?;
        validate_tags(tags)?;

        let snippet = Snippet {
            name: name.trim().to_string(),
            command: command.to_string(),
            tags: normalize_tags(tags),
            created_at: Utc::now(),
        };
        self.store.update(|store| {
            let replaced = store
                .snippets
                .insert(snippet.name.clone(), snippet.clone())
                .is_some();
            tracing::debug!(name = %snippet.name, replaced, "snippet saved");
            Ok(())
        })?;
        Ok(snippet)
    }

    pub fn get(&self, name: &str) -> Result<Snippet> {
        self.store
            .load()?
            .snippets
            .remove(name)
            .ok_or_else(|| DevkitError::NotFound(name.to_string()))
    }

    pub fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.store.load()?.snippets.contains_key(name))
    }

    /// Remove a snippet. The store is left untouched if it does not exist.
    pub fn delete(&self, name: &str) -> Result<Snippet> {
        self.store.update(|store| {
            store
                .snippets
                .remove(name)
                .ok_or_else(|| DevkitError::NotFound(name.to_string()))
        })
    }

    /// All snippets, optionally only those carrying `tag` (case-insensitive).
    pub fn list(&self, tag: Option<&str>) -> Result<Vec<Snippet>> {
        let store = self.store.load()?;
        Ok(store
            .snippets
            .into_values()
            .filter(|s| tag.map_or(true, |t| s.has_tag(t)))
            .collect())
    }

    pub fn search(&self, query: &str) -> Result<Vec<Snippet>> {
        let store = self.store.load()?;
        Ok(store
            .snippets
            .into_values()
            .filter(|s| s.matches(query))
            .collect())
    }

    pub fn count(&self) -> Result<usize> {
        Ok(self.store.load()?.snippets.len())
    }

    /// Names containing `name` (case-insensitive), for "did you mean" hints.
    pub fn similar(&self, name: &str) -> Result<Vec<String>> {
        let needle = name.to_lowercase();
        Ok(self
            .store
            .load()?
            .snippets
            .into_keys()
            .filter(|n| {
                let n = n.to_lowercase();
                n.contains(&needle) || needle.contains(&n)
            })
            .collect())
    }

    /// Write every snippet to `path`. Returns how many were written.
    pub fn export(&self, path: &Path, format: ExportFormat) -> Result<usize> {
        let store = self.store.load()?;
        let data = exchange::render(store.snippets.values(), format)?;
        io::atomic_write(path, data.as_bytes())?;
        tracing::debug!(path = %path.display(), %format, count = store.snippets.len(), "snippets exported");
        Ok(store.snippets.len())
    }

    /// Read snippets from `path`. Existing names are only replaced when
    /// `overwrite` is set; otherwise they are skipped and reported.
    ///
    /// The file is fully parsed and validated before anything is written.
    pub fn import(&self, path: &Path, overwrite: bool) -> Result<ImportReport> {
        let content = std::fs::read_to_string(path)?;
        let format = ExportFormat::detect(path, &content);
        let mut incoming = exchange::parse(&content, format)?;
        for s in &mut incoming {
            s.name = s.name.trim().to_string();
            validate_name(&s.name)?;
            validate_command(&s.command)?;
            validate_tags(&s.tags)?;
        }

        self.store.update(|store| {
            let mut report = ImportReport::default();
            for s in incoming {
                if !overwrite && store.snippets.contains_key(&s.name) {
                    report.skipped += 1;
                    report.conflicts.push(s.name);
                    continue;
                }
                let snippet = s.into_snippet();
                store.snippets.insert(snippet.name.clone(), snippet);
                report.imported += 1;
            }
            tracing::debug!(
                path = %path.display(),
                %format,
                imported = report.imported,
                skipped = report.skipped,
                "snippets imported"
            );
            Ok(report)
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
