//! Snippet export/import formats.
//!
//! JSON is lossless: an array of `{name, command, tags, created_at}` objects.
//! On import a `{ name: snippet | command }` mapping is also accepted, which
//! covers files exported by older versions.
//!
//! Text is one block per snippet, blank-line separated. Every command line
//! is indented by four spaces so that blank lines and `#` lines inside a
//! command cannot be mistaken for block structure:
//!
//! ```text
//! # docker-clean
//! # tags: docker, cleanup
//! # created: 2024-01-02T03:04:05+00:00
//!     docker system prune -a
//! ```
//!
//! Unindented command lines from older exports are still accepted.

use crate::error::{DevkitError, Result};
use crate::types::{normalize_tags, parse_timestamp, Snippet};
use chrono::Utc;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

const TAGS_PREFIX: &str = "tags:";
const CREATED_PREFIX: &str = "created:";
const COMMAND_INDENT: &str = "    ";

// ---------------------------------------------------------------------------
// ExportFormat
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Text,
}

impl ExportFormat {
    /// `.json` or `.txt`/`.text`, case-insensitive.
    pub fn from_extension(path: &Path) -> Option<Self> {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("json") => Some(ExportFormat::Json),
            Some("txt") | Some("text") => Some(ExportFormat::Text),
            _ => None,
        }
    }

    /// Pick a format from the file extension, falling back to the content.
    pub fn detect(path: &Path, content: &str) -> Self {
        Self::from_extension(path).unwrap_or_else(|| {
            match content.trim_start().chars().next() {
                Some('[') | Some('{') => ExportFormat::Json,
                _ => ExportFormat::Text,
            }
        })
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Json => f.write_str("json"),
            ExportFormat::Text => f.write_str("text"),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = DevkitError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "text" | "txt" => Ok(ExportFormat::Text),
            other => Err(DevkitError::validation(format!(
                "unknown export format '{other}' (expected json or text)"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

pub fn render<'a>(
    snippets: impl IntoIterator<Item = &'a Snippet>,
    format: ExportFormat,
) -> Result<String> {
    match format {
        ExportFormat::Json => {
            let all: Vec<&Snippet> = snippets.into_iter().collect();
            Ok(serde_json::to_string_pretty(&all)?)
        }
        ExportFormat::Text => Ok(render_text(snippets)),
    }
}

fn render_text<'a>(snippets: impl IntoIterator<Item = &'a Snippet>) -> String {
    let mut out = String::new();
    for s in snippets {
        out.push_str(&format!("# {}\n", s.name));
        if !s.tags.is_empty() {
            out.push_str(&format!("# {TAGS_PREFIX} {}\n", s.tag_list()));
        }
        out.push_str(&format!("# {CREATED_PREFIX} {}\n", s.created_at.to_rfc3339()));
        for line in s.command.split('\n') {
            out.push_str(COMMAND_INDENT);
            out.push_str(line);
            out.push('\n');
        }
        out.push('\n');
    }
    out
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// A snippet as read from an import file, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingSnippet {
    pub name: String,
    pub command: String,
    pub tags: Vec<String>,
    pub created_at: Option<chrono::DateTime<Utc>>,
}

impl IncomingSnippet {
    pub fn into_snippet(self) -> Snippet {
        Snippet {
            name: self.name,
            command: self.command,
            tags: normalize_tags(&self.tags),
            created_at: self.created_at.unwrap_or_else(Utc::now),
        }
    }
}

pub fn parse(content: &str, format: ExportFormat) -> Result<Vec<IncomingSnippet>> {
    match format {
        ExportFormat::Json => parse_json(content),
        ExportFormat::Text => parse_text(content),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonCollection {
    List(Vec<JsonSnippet>),
    Map(BTreeMap<String, JsonEntry>),
}

#[derive(Deserialize)]
struct JsonSnippet {
    name: String,
    command: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default, alias = "created")]
    created_at: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonEntry {
    Record {
        command: String,
        #[serde(default)]
        tags: Vec<String>,
        #[serde(default, alias = "created")]
        created_at: Option<String>,
    },
    Command(String),
}

fn parse_json(content: &str) -> Result<Vec<IncomingSnippet>> {
    let collection: JsonCollection = serde_json::from_str(content).map_err(|e| {
        DevkitError::validation(format!("not a snippet collection: {e}"))
    })?;
    let out = match collection {
        JsonCollection::List(items) => items
            .into_iter()
            .map(|s| IncomingSnippet {
                name: s.name,
                command: s.command,
                tags: s.tags,
                created_at: s.created_at.as_deref().and_then(parse_timestamp),
            })
            .collect(),
        JsonCollection::Map(map) => map
            .into_iter()
            .map(|(name, entry)| match entry {
                JsonEntry::Record {
                    command,
                    tags,
                    created_at,
                } => IncomingSnippet {
                    name,
                    command,
                    tags,
                    created_at: created_at.as_deref().and_then(parse_timestamp),
                },
                JsonEntry::Command(command) => IncomingSnippet {
                    name,
                    command,
                    tags: Vec::new(),
                    created_at: None,
                },
            })
            .collect(),
    };
    Ok(out)
}

fn parse_text(content: &str) -> Result<Vec<IncomingSnippet>> {
    let mut out = Vec::new();
    let mut current: Option<IncomingSnippet> = None;
    // Command lines seen in the current block. Header lines (tags/created)
    // are only recognised before the first one.
    let mut command_lines: Vec<&str> = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        let command_line = line
            .strip_prefix(COMMAND_INDENT)
            .or_else(|| (!line.trim().is_empty() && !line.starts_with("# ")).then_some(line));

        if let Some(text) = command_line {
            if current.is_none() {
                return Err(DevkitError::validation(format!(
                    "line {}: expected a '# <name>' header, found {:?}",
                    idx + 1,
                    line
                )));
            }
            command_lines.push(text);
            continue;
        }

        if line.trim().is_empty() {
            if let Some(block) = current.take() {
                out.push(finish_block(block, &mut command_lines, idx)?);
            }
            continue;
        }

        // A "# " line outside a command.
        let header = line[2..].trim();
        if let Some(block) = current.as_mut().filter(|_| command_lines.is_empty()) {
            if let Some(tags) = strip_prefix_ci(header, TAGS_PREFIX) {
                block.tags = tags.split(',').map(|t| t.trim().to_string()).collect();
                continue;
            }
            if let Some(created) = strip_prefix_ci(header, CREATED_PREFIX) {
                block.created_at = parse_timestamp(created);
                continue;
            }
        }
        if let Some(block) = current.take() {
            out.push(finish_block(block, &mut command_lines, idx)?);
        }
        current = Some(IncomingSnippet {
            name: header.to_string(),
            command: String::new(),
            tags: Vec::new(),
            created_at: None,
        });
    }

    if let Some(block) = current.take() {
        out.push(finish_block(block, &mut command_lines, content.lines().count())?);
    }
    Ok(out)
}

fn finish_block(
    mut block: IncomingSnippet,
    command_lines: &mut Vec<&str>,
    line: usize,
) -> Result<IncomingSnippet> {
    block.command = command_lines.join("\n");
    command_lines.clear();
    if block.command.trim().is_empty() {
        return Err(DevkitError::validation(format!(
            "snippet '{}' ending at line {} has no command",
            block.name, line
        )));
    }
    Ok(block)
}

fn strip_prefix_ci<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(s[prefix.len()..].trim())
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn snippet(name: &str, command: &str, tags: &[&str]) -> Snippet {
        Snippet {
            name: name.to_string(),
            command: command.to_string(),
            tags: normalize_tags(tags),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn detect_by_extension_then_content() {
        assert_eq!(ExportFormat::detect(Path::new("a.json"), "# x"), ExportFormat::Json);
        assert_eq!(ExportFormat::detect(Path::new("a.TXT"), "[]"), ExportFormat::Text);
        assert_eq!(ExportFormat::detect(Path::new("a.bak"), "  [ ]"), ExportFormat::Json);
        assert_eq!(ExportFormat::detect(Path::new("snips"), "# x\nls"), ExportFormat::Text);
    }

    #[test]
    fn format_from_str() {
        assert_eq!("JSON".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert_eq!("txt".parse::<ExportFormat>().unwrap(), ExportFormat::Text);
        assert!("yaml".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn text_layout() {
        let s = snippet("clean", "docker system prune -a", &["docker", "cleanup"]);
        let text = render([&s], ExportFormat::Text).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("# clean"));
        assert_eq!(lines.next(), Some("# tags: cleanup, docker"));
        assert!(lines.next().unwrap().starts_with("# created: "));
        assert_eq!(lines.next(), Some("    docker system prune -a"));
        assert_eq!(lines.next(), Some(""));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn text_roundtrip_keeps_multiline_command_and_tags() {
        let a = snippet("deploy", "cargo build --release\n./deploy.sh", &["ci"]);
        let b = snippet("ls", "ls -la", &[]);
        let text = render([&a, &b], ExportFormat::Text).unwrap();

        let parsed = parse(&text, ExportFormat::Text).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].name, "deploy");
        assert_eq!(parsed[0].command, "cargo build --release\n./deploy.sh");
        assert_eq!(parsed[0].tags, vec!["ci"]);
        assert_eq!(parsed[0].created_at, Some(a.created_at));
        assert_eq!(parsed[1].name, "ls");
        assert!(parsed[1].tags.is_empty());
    }

    #[test]
    fn text_roundtrip_keeps_awkward_commands_verbatim() {
        let commands = [
            "cd app\n\nmake",
            "make\n# then deploy\n./deploy.sh",
            "# tags: not-a-header\nls",
            "# created: 2024-01-01T00:00:00Z\necho x",
            "echo trailing\n",
            "echo two\n\n",
            "    already indented",
            "#!/bin/sh\necho hi",
        ];
        let snippets: Vec<Snippet> = commands
            .iter()
            .enumerate()
            .map(|(i, c)| snippet(&format!("s{i}"), c, &["t"]))
            .collect();
        let text = render(&snippets, ExportFormat::Text).unwrap();

        let parsed = parse(&text, ExportFormat::Text).unwrap();
        assert_eq!(parsed.len(), commands.len());
        for (got, want) in parsed.iter().zip(&snippets) {
            assert_eq!(got.name, want.name);
            assert_eq!(got.command, want.command);
            assert_eq!(got.tags, vec!["t"]);
        }
    }

    #[test]
    fn text_unindented_commands_from_older_exports() {
        let parsed = parse("# a\necho a\nls\n\n# b\necho b\n", ExportFormat::Text).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].command, "echo a\nls");
        assert_eq!(parsed[1].command, "echo b");
    }

    #[test]
    fn text_without_created_line_is_accepted() {
        let parsed = parse("# hello\n# Tags: Greeting\necho hi\n", ExportFormat::Text).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].tags, vec!["Greeting"]);
        assert!(parsed[0].created_at.is_none());
    }

    #[test]
    fn text_header_after_command_starts_new_block() {
        let parsed = parse("# a\necho a\n# b\necho b\n", ExportFormat::Text).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1].command, "echo b");
    }

    #[test]
    fn text_without_header_is_invalid() {
        let err = parse("echo orphan\n", ExportFormat::Text).unwrap_err();
        assert!(matches!(err, DevkitError::Validation(_)));
    }

    #[test]
    fn text_block_without_command_is_invalid() {
        assert!(parse("# empty\n\n", ExportFormat::Text).is_err());
    }

    #[test]
    fn json_array_and_mapping_are_accepted() {
        let list = parse(
            r#"[{"name": "a", "command": "echo a", "tags": ["x"], "created_at": "2024-01-01T00:00:00Z"}]"#,
            ExportFormat::Json,
        )
        .unwrap();
        assert_eq!(list[0].name, "a");
        assert!(list[0].created_at.is_some());

        let map = parse(
            r#"{"b": {"command": "echo b", "tags": [], "created": "2024-01-01T00:00:00"}, "c": "echo c"}"#,
            ExportFormat::Json,
        )
        .unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map[1].command, "echo c");
    }

    #[test]
    fn json_of_wrong_shape_is_invalid() {
        let err = parse(r#"{"a": 1}"#, ExportFormat::Json).unwrap_err();
        assert!(matches!(err, DevkitError::Validation(_)));
        assert!(parse("not json", ExportFormat::Json).is_err());
    }
}
