//! Log excerpting for `devkit logs analyze`.

use serde::Serialize;

pub const MAX_LINES: usize = 500;
pub const TRUNCATION_MARKER: &str = "... (truncated) ...";

/// Cut `log` down to `max_lines` lines when it is longer: the first fifth
/// and the last four fifths, joined by [`TRUNCATION_MARKER`]. With the
/// default of 500 that is 100 head and 400 tail lines. Returns the text and
/// whether anything was dropped.
pub fn truncate(log: &str, max_lines: usize) -> (String, bool) {
    let lines: Vec<&str> = log.split('\n').collect();
    if lines.len() <= max_lines {
        return (log.to_string(), false);
    }
    let head = max_lines / 5;
    let tail = max_lines - head;
    let mut kept: Vec<&str> = lines[..head].to_vec();
    kept.push(TRUNCATION_MARKER);
    kept.extend_from_slice(&lines[lines.len() - tail..]);
    (kept.join("\n"), true)
}

// ---------------------------------------------------------------------------
// Pattern extraction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogLine {
    /// 1-based.
    pub line: usize,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LogFindings {
    pub exceptions: Vec<LogLine>,
    pub errors: Vec<LogLine>,
    pub warnings: Vec<LogLine>,
    /// Each trace starts with the exception line that opened it.
    pub stack_traces: Vec<Vec<String>>,
}

impl LogFindings {
    pub fn is_empty(&self) -> bool {
        self.exceptions.is_empty() && self.errors.is_empty() && self.warnings.is_empty()
    }
}

/// Classify each line. A line is counted once, with exceptions taking
/// priority over errors and errors over warnings. `at ...` and `File ...`
/// lines directly after an exception are collected as its stack trace.
pub fn extract(log: &str) -> LogFindings {
    let mut findings = LogFindings::default();
    let mut trace: Option<Vec<String>> = None;

    for (idx, raw) in log.lines().enumerate() {
        let text = raw.trim();
        let lower = text.to_lowercase();
        let entry = || LogLine {
            line: idx + 1,
            text: text.to_string(),
        };

        if lower.contains("exception") || lower.contains("error:") {
            flush(&mut findings, trace.take());
            findings.exceptions.push(entry());
            trace = Some(vec![text.to_string()]);
        } else if trace.is_some() && (text.starts_with("at ") || text.starts_with("File ")) {
            if let Some(t) = trace.as_mut() {
                t.push(text.to_string());
            }
        } else {
            flush(&mut findings, trace.take());
            if lower.contains("error") {
                findings.errors.push(entry());
            } else if lower.contains("warn") {
                findings.warnings.push(entry());
            }
        }
    }
    flush(&mut findings, trace);
    findings
}

fn flush(findings: &mut LogFindings, trace: Option<Vec<String>>) {
    if let Some(t) = trace {
        if t.len() > 1 {
            findings.stack_traces.push(t);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
