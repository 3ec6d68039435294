use crate::cmd::{file_store, load_config};
use crate::output::print_json;
use anyhow::Context;
use devkit_core::{
    history::HistoryRecorder, risk::RiskScanner, runner, types::CommandSource,
};
use std::path::Path;

pub fn run(data_dir: &Path, command: &[String], json: bool) -> anyhow::Result<()> {
    execute(data_dir, &command.join(" "), CommandSource::AdHoc, json)
}

/// Run `command` through the shell, print its output and append it to the
/// history. A non-zero exit becomes an error once it has been recorded.
pub(crate) fn execute(
    data_dir: &Path,
    command: &str,
    source: CommandSource,
    json: bool,
) -> anyhow::Result<()> {
    let config = load_config(data_dir)?;

    if !json {
        println!("Running: {command}");
    }
    let outcome = runner::run_shell(command, true)
        .with_context(|| format!("failed to run '{command}'"))?;

    if config.history_enabled {
        HistoryRecorder::new(file_store(data_dir))
            .record_with_output(command, outcome.status, source, outcome.output.as_deref())
            .context("failed to record command in history")?;
    }

    let risks: Vec<_> = RiskScanner::builtin()
        .classify(command)
        .into_iter()
        .map(|(category, _)| category)
        .collect();

    if json {
        print_json(&serde_json::json!({
            "command": command,
            "success": outcome.success(),
            "exit_code": outcome.exit_code(),
            "output": outcome.output,
            "risks": risks,
        }))?;
    } else {
        if let Some(out) = outcome.output.as_deref() {
            print!("{out}");
        }
        for category in &risks {
            eprintln!("warning: this looks like a {category} command; `devkit panic` shows rollback steps");
        }
    }

    if !outcome.success() {
        anyhow::bail!("'{command}' {}", outcome.status);
    }
    if !json {
        println!("Command completed successfully");
    }
    Ok(())
}
