use crate::cmd::assistant;
use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use devkit_core::{logscan, workspace};
use std::io::{IsTerminal, Read};
use std::path::{Path, PathBuf};

/// Exceptions shown in the text summary.
const KEY_EXCEPTIONS: usize = 5;

#[derive(Subcommand)]
pub enum LogsSubcommand {
    /// Find errors in a log file (or stdin) and ask the AI for a diagnosis
    Analyze {
        /// Log file; reads stdin when omitted
        file: Option<PathBuf>,
        /// Only run the local pattern scan
        #[arg(long)]
        no_ai: bool,
    },
}

pub fn run(
    data_dir: &Path,
    project_root: &Path,
    subcmd: LogsSubcommand,
    json: bool,
) -> anyhow::Result<()> {
    match subcmd {
        LogsSubcommand::Analyze { file, no_ai } => {
            analyze(data_dir, project_root, file.as_deref(), no_ai, json)
        }
    }
}

fn read_log(file: Option<&Path>) -> anyhow::Result<String> {
    match file {
        Some(path) => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
        None => {
            let mut stdin = std::io::stdin();
            if stdin.is_terminal() {
                anyhow::bail!("no input: pass a file or pipe a log, e.g. `cat app.log | devkit logs analyze`");
            }
            let mut buf = String::new();
            stdin.read_to_string(&mut buf).context("failed to read stdin")?;
            Ok(buf)
        }
    }
}

fn analyze(
    data_dir: &Path,
    project_root: &Path,
    file: Option<&Path>,
    no_ai: bool,
    json: bool,
) -> anyhow::Result<()> {
    let log = read_log(file)?;
    if log.trim().is_empty() {
        anyhow::bail!("the log is empty");
    }

    let findings = logscan::extract(&log);
    let analysis = if no_ai {
        None
    } else {
        let context = workspace::project_context(project_root);
        Some(assistant(data_dir)?.analyze_log(&log, &context)?)
    };

    if json {
        return print_json(&serde_json::json!({
            "findings": findings,
            "analysis": analysis,
        }));
    }

    println!("Exceptions:   {}", findings.exceptions.len());
    println!("Errors:       {}", findings.errors.len());
    println!("Warnings:     {}", findings.warnings.len());
    println!("Stack traces: {}", findings.stack_traces.len());
    if !findings.exceptions.is_empty() {
        println!("\nKey exceptions:");
        for e in findings.exceptions.iter().take(KEY_EXCEPTIONS) {
            let text: String = e.text.chars().take(100).collect();
            println!("  line {}: {text}", e.line);
        }
    }
    if let Some(analysis) = analysis {
        println!("\nAI analysis:\n{}", analysis.trim_end());
    }
    Ok(())
}
