//! Prompt construction for each assistant feature.
//!
//! Each method formats a prompt, sends it through the [`TextGenerator`] and
//! returns the raw reply. Nothing is retried and nothing is cached.

use devkit_core::logscan;
use devkit_core::risk::RiskMatch;
use devkit_core::types::HistoryRecord;

use crate::client::TextGenerator;
use crate::error::AiError;

/// Diffs longer than this are cut before being sent.
pub const MAX_DIFF_CHARS: usize = 3000;

/// How many of the most recent history records `analyze_history` looks at.
pub const HISTORY_WINDOW: usize = 10;

pub struct Assistant<G> {
    generator: G,
}

impl<G: TextGenerator> Assistant<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    /// Suggest a shell command for a natural-language request. The reply
    /// carries a `COMMAND:` line, see [`parse_suggested_command`].
    pub fn ask_command(&self, query: &str) -> Result<String, AiError> {
        self.generator.generate(&format!(
            "You are a terminal command expert. The user wants to: {query}\n\n\
             Respond with ONLY the command they should run, followed by a brief explanation.\n\n\
             Format:\n\
             COMMAND: <the actual command>\n\
             EXPLANATION: <brief 1-line explanation>\n\n\
             Be concise and practical. Assume a Unix-like system (Linux/macOS)."
        ))
    }

    pub fn explain_command(&self, command: &str) -> Result<String, AiError> {
        self.generator.generate(&format!(
            "Explain this terminal command in simple terms:\n\n{command}\n\n\
             Break it down part by part and explain what each part does. Be concise but clear.\n\
             If there are any potential risks or important notes, mention them."
        ))
    }

    /// Conventional-commit style message for a staged diff.
    pub fn commit_message(&self, diff: &str) -> Result<String, AiError> {
        let diff: String = diff.chars().take(MAX_DIFF_CHARS).collect();
        let reply = self.generator.generate(&format!(
            "You are a git commit message expert. Analyze this git diff and generate a \
             conventional commit message.\n\n\
             Git diff:\n{diff}\n\n\
             Generate a commit message in this format:\n\
             <type>(<scope>): <description>\n\n\
             Types: feat, fix, docs, style, refactor, test, chore\n\
             Keep the description concise (under 50 chars).\n\n\
             Respond with ONLY the commit message, nothing else."
        ))?;
        Ok(reply.trim().to_string())
    }

    /// `records` is oldest first; only the last [`HISTORY_WINDOW`] are sent.
    pub fn analyze_history(&self, records: &[HistoryRecord]) -> Result<String, AiError> {
        let start = records.len().saturating_sub(HISTORY_WINDOW);
        let listing = records[start..]
            .iter()
            .enumerate()
            .map(|(i, r)| {
                let code = r
                    .status
                    .exit_code
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "none".to_string());
                format!("{}. {} (exit code: {code})", i + 1, r.command)
            })
            .collect::<Vec<_>>()
            .join("\n");

        self.generator.generate(&format!(
            "You are debugging a terminal session. Here are the last commands run:\n\n\
             {listing}\n\n\
             Analyze this sequence and:\n\
             1. Identify any failed commands (non-zero exit codes)\n\
             2. Explain what likely went wrong\n\
             3. Suggest how to fix it\n\
             4. Point out if earlier commands caused the issue\n\n\
             Be concise and actionable."
        ))
    }

    pub fn suggest_rollback(&self, matches: &[RiskMatch<'_>]) -> Result<String, AiError> {
        let listing = matches
            .iter()
            .map(|m| {
                format!(
                    "- {} ({}, {})",
                    m.record.command,
                    m.category,
                    m.record.timestamp.to_rfc3339()
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        self.generator.generate(&format!(
            "These potentially dangerous commands were just run:\n\n{listing}\n\n\
             For each command, suggest how to rollback/undo it safely.\n\
             Be specific with exact commands to run.\n\n\
             Format your response as:\n\
             ROLLBACK STEPS:\n\
             1. <command> - <explanation>\n\
             2. <command> - <explanation>\n\n\
             Be practical and safe. If rollback is risky, warn about it."
        ))
    }

    /// Diagnose a log. Long logs are cut with [`logscan::truncate`] first.
    pub fn analyze_log(&self, log: &str, project_context: &str) -> Result<String, AiError> {
        let (excerpt, truncated) = logscan::truncate(log, logscan::MAX_LINES);
        let note = if truncated {
            "\n(Note: the log was truncated to fit the context window)"
        } else {
            ""
        };

        self.generator.generate(&format!(
            "You are a senior software engineer debugging an application crash.\n\n\
             {project_context}\n\
             Analyze this log file and provide:\n\n\
             1. Critical Errors: the main errors or exceptions\n\
             2. Root Cause: what likely caused the crash\n\
             3. Stack Trace: the relevant stack trace lines\n\
             4. Suggested Fix: what the developer should do\n\
             5. Prevention: how to avoid this in the future\n\n\
             Log content:\n```\n{excerpt}\n```{note}\n\n\
             Format your response clearly with sections. Be specific and actionable."
        ))
    }
}

/// The command from a `COMMAND: ...` line, without surrounding backticks.
pub fn parse_suggested_command(reply: &str) -> Option<String> {
    reply.lines().find_map(|line| {
        let line = line.trim().trim_start_matches(['*', '-', ' ']);
        let rest = line
            .get(..8)
            .filter(|p| p.eq_ignore_ascii_case("command:"))
            .map(|_| &line[8..])?;
        let cmd = rest.trim().trim_start_matches('*').trim().trim_matches('`').trim();
        (!cmd.is_empty()).then(|| cmd.to_string())
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
