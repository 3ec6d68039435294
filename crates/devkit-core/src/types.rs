use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// ---------------------------------------------------------------------------
// Snippet
// ---------------------------------------------------------------------------

/// A named, reusable shell command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snippet {
    pub name: String,
    pub command: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
}

impl Snippet {
    pub fn has_tag(&self, tag: &str) -> bool {
        let tag = tag.trim().to_lowercase();
        self.tags.contains(&tag)
    }

    /// Case-insensitive substring match over name, command and tags.
    pub fn matches(&self, query: &str) -> bool {
        let q = query.to_lowercase();
        self.name.to_lowercase().contains(&q)
            || self.command.to_lowercase().contains(&q)
            || self.tags.iter().any(|t| t.contains(&q))
    }

    pub fn tag_list(&self) -> String {
        self.tags.iter().cloned().collect::<Vec<_>>().join(", ")
    }
}

/// Lowercase, trim and de-duplicate tags, dropping empty ones.
///
/// No validation happens here; see [`crate::snippet::validate_tags`].
pub fn normalize_tags<I, S>(tags: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|t| t.as_ref().trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

/// Where an executed command came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommandSource {
    Snippet { name: String },
    AdHoc,
}

impl fmt::Display for CommandSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandSource::Snippet { name } => write!(f, "snippet:{name}"),
            CommandSource::AdHoc => f.write_str("ad_hoc"),
        }
    }
}

/// Outcome of an executed command. `exit_code` is absent when the process
/// was killed by a signal or the status was not reported by a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitStatus {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
}

impl ExitStatus {
    pub fn from_code(code: i32) -> Self {
        Self {
            success: code == 0,
            exit_code: Some(code),
        }
    }

    pub fn succeeded() -> Self {
        Self::from_code(0)
    }

    pub fn failed(exit_code: Option<i32>) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }

    pub fn is_failure(&self) -> bool {
        !self.success
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.success, self.exit_code) {
            (true, _) => f.write_str("ok"),
            (false, Some(code)) => write!(f, "failed ({code})"),
            (false, None) => f.write_str("failed"),
        }
    }
}

/// One executed command. Never mutated after it is appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub command: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub status: ExitStatus,
    pub source: CommandSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

// ---------------------------------------------------------------------------
// Timestamps
// ---------------------------------------------------------------------------

/// Parse an RFC 3339 timestamp, or a naive ISO-8601 one (treated as UTC).
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn snippet(name: &str, command: &str, tags: &[&str]) -> Snippet {
        Snippet {
            name: name.to_string(),
            command: command.to_string(),
            tags: normalize_tags(tags),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn normalize_tags_lowercases_and_dedupes() {
        let tags = normalize_tags(["Docker", " docker ", "", "CI"]);
        assert_eq!(tags.into_iter().collect::<Vec<_>>(), vec!["ci", "docker"]);
    }

    #[test]
    fn matches_checks_tags() {
        let s = snippet("clean", "system prune -a", &["docker"]);
        assert!(s.matches("DOCK"));
        assert!(s.matches("prune"));
        assert!(!s.matches("kubectl"));
    }

    #[test]
    fn has_tag_is_case_insensitive() {
        let s = snippet("clean", "x", &["docker"]);
        assert!(s.has_tag("Docker"));
        assert!(!s.has_tag("dock"));
    }

    #[test]
    fn exit_status_display() {
        assert_eq!(ExitStatus::succeeded().to_string(), "ok");
        assert_eq!(ExitStatus::from_code(2).to_string(), "failed (2)");
        assert_eq!(ExitStatus::failed(None).to_string(), "failed");
    }

    #[test]
    fn history_record_json_shape() {
        let rec = HistoryRecord {
            command: "make".to_string(),
            timestamp: Utc::now(),
            status: ExitStatus::from_code(1),
            source: CommandSource::Snippet {
                name: "build".to_string(),
            },
            output: None,
        };
        let v = serde_json::to_value(&rec).unwrap();
        assert_eq!(v["success"], false);
        assert_eq!(v["exit_code"], 1);
        assert_eq!(v["source"]["kind"], "snippet");
        assert_eq!(v["source"]["name"], "build");
        assert!(v.get("output").is_none());

        let back: HistoryRecord = serde_json::from_value(v).unwrap();
        assert_eq!(back, rec);
    }

    #[test]
    fn parse_timestamp_accepts_naive_iso() {
        let dt = parse_timestamp("2024-03-05T14:30:00.123456").unwrap();
        assert_eq!(dt.year(), 2024);
        assert_eq!(dt.hour(), 14);
    }

    #[test]
    fn parse_timestamp_accepts_rfc3339() {
        let dt = parse_timestamp("2024-03-05T14:30:00+02:00").unwrap();
        assert_eq!(dt.hour(), 12);
    }

    #[test]
    fn parse_timestamp_rejects_garbage() {
        assert!(parse_timestamp("yesterday").is_none());
    }
}
