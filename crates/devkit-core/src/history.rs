//! Command history ("rewind"). Records are append-only and only ever
//! removed all at once by [`HistoryRecorder::clear`].

use crate::error::Result;
use crate::store::FileStore;
use crate::types::{CommandSource, ExitStatus, HistoryRecord};
use chrono::Utc;
use serde::Serialize;

/// Captured output is cut to this many characters before it is stored.
pub const MAX_OUTPUT_CHARS: usize = 1000;

pub const DEFAULT_LIMIT: i64 = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HistorySummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

#[derive(Debug, Clone)]
pub struct HistoryRecorder {
    store: FileStore,
}

impl HistoryRecorder {
    pub fn new(store: FileStore) -> Self {
        Self { store }
    }

    pub fn record(
        &self,
        command: &str,
        status: ExitStatus,
        source: CommandSource,
    ) -> Result<HistoryRecord> {
        self.record_with_output(command, status, source, None)
    }

    pub fn record_with_output(
        &self,
        command: &str,
        status: ExitStatus,
        source: CommandSource,
        output: Option<&str>,
    ) -> Result<HistoryRecord> {
        let record = HistoryRecord {
            command: command.to_string(),
            timestamp: Utc::now(),
            status,
            source,
            output: output
                .filter(|o| !o.trim().is_empty())
                .map(|o| o.chars().take(MAX_OUTPUT_CHARS).collect()),
        };
        self.store.update(|store| {
            store.history.push(record.clone());
            Ok(())
        })?;
        tracing::debug!(command, %status, "command recorded");
        Ok(record)
    }

    /// The most recent `limit` records, newest first. `limit <= 0` means all.
    pub fn list(&self, limit: i64, failures_only: bool) -> Result<Vec<HistoryRecord>> {
        let history = self.store.load()?.history;
        let take = usize::try_from(limit)
            .ok()
            .filter(|n| *n > 0)
            .unwrap_or(usize::MAX);
        Ok(history
            .into_iter()
            .rev()
            .filter(|r| !failures_only || r.status.is_failure())
            .take(take)
            .collect())
    }

    /// Every record, oldest first.
    pub fn all(&self) -> Result<Vec<HistoryRecord>> {
        Ok(self.store.load()?.history)
    }

    pub fn summary(&self) -> Result<HistorySummary> {
        let history = self.store.load()?.history;
        let failed = history.iter().filter(|r| r.status.is_failure()).count();
        Ok(HistorySummary {
            total: history.len(),
            succeeded: history.len() - failed,
            failed,
        })
    }

    /// Irreversibly drop every record. Snippets are untouched.
    pub fn clear(&self) -> Result<usize> {
        let removed = self.store.update(|store| {
            let n = store.history.len();
            store.history.clear();
            Ok(n)
        })?;
        tracing::debug!(removed, "history cleared");
        Ok(removed)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
