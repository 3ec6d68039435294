use crate::cmd::{assistant, file_store, load_config};
use crate::output::print_json;
use anyhow::Context;
use devkit_core::{
    history::HistoryRecorder,
    types::{CommandSource, ExitStatus},
};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

const DEFAULT_EDITOR: &str = "nano";

pub struct CommitArgs {
    pub ai: bool,
    pub message: Option<String>,
    pub edit: bool,
    pub dry_run: bool,
}

pub fn run(data_dir: &Path, args: CommitArgs, json: bool) -> anyhow::Result<()> {
    let git = which::which("git").context("git not found on PATH")?;

    let in_repo = Command::new(&git)
        .args(["rev-parse", "--git-dir"])
        .output()
        .context("failed to run git")?
        .status
        .success();
    if !in_repo {
        anyhow::bail!("not in a git repository");
    }

    let staged = git_stdout(&git, &["diff", "--staged", "--name-status"])?;
    if staged.trim().is_empty() {
        anyhow::bail!("no staged changes; run `git add <files>` first");
    }

    let mut message = match (args.message, args.ai) {
        (Some(m), _) => m,
        (None, true) => {
            let diff = git_stdout(&git, &["diff", "--staged"])?;
            assistant(data_dir)?.commit_message(&diff)?
        }
        (None, false) => anyhow::bail!("provide a message with -m or generate one with --ai"),
    };
    if args.edit {
        message = edit_message(&message)?;
    }
    let message = message.trim().to_string();
    if message.is_empty() {
        anyhow::bail!("empty commit message");
    }

    let files: Vec<(&str, &str)> = staged
        .lines()
        .filter_map(|l| l.split_once('\t'))
        .collect();

    if args.dry_run {
        if json {
            return print_json(&serde_json::json!({
                "message": message,
                "staged": files
                    .iter()
                    .map(|(s, f)| serde_json::json!({ "status": s, "file": f }))
                    .collect::<Vec<_>>(),
                "committed": false,
            }));
        }
        print_preview(&message, &files);
        return Ok(());
    }

    if !json {
        print_preview(&message, &files);
        println!();
    }
    let mut commit = Command::new(&git);
    commit.args(["commit", "-m", message.as_str()]);
    if json {
        commit.stdout(Stdio::null());
    }
    let status = commit.status().context("failed to run git commit")?;
    let exit = status
        .code()
        .map(ExitStatus::from_code)
        .unwrap_or(ExitStatus::failed(None));

    if load_config(data_dir)?.history_enabled {
        HistoryRecorder::new(file_store(data_dir))
            .record(
                &format!("git commit -m {message:?}"),
                exit,
                CommandSource::AdHoc,
            )
            .context("failed to record commit in history")?;
    }

    if !status.success() {
        anyhow::bail!("git commit {exit}");
    }
    if json {
        print_json(&serde_json::json!({ "message": message, "committed": true }))?;
    } else {
        println!("Committed: {message}");
    }
    Ok(())
}

fn git_stdout(git: &Path, args: &[&str]) -> anyhow::Result<String> {
    let out = Command::new(git)
        .args(args)
        .output()
        .with_context(|| format!("failed to run git {}", args.join(" ")))?;
    if !out.status.success() {
        anyhow::bail!(
            "git {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&out.stderr).trim()
        );
    }
    Ok(String::from_utf8_lossy(&out.stdout).into_owned())
}

fn print_preview(message: &str, files: &[(&str, &str)]) {
    println!("Message: {message}");
    println!("\nStaged files:");
    for (status, file) in files {
        println!("  {status} {file}");
    }
}

/// `$EDITOR`, or nano, resolved on PATH.
fn editor() -> anyhow::Result<PathBuf> {
    let name = std::env::var("EDITOR")
        .ok()
        .filter(|e| !e.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_EDITOR.to_string());
    which::which(&name).with_context(|| format!("editor '{name}' not found; set $EDITOR"))
}

fn edit_message(message: &str) -> anyhow::Result<String> {
    let editor = editor()?;
    let mut file = tempfile::Builder::new()
        .prefix("devkit-commit-")
        .suffix(".txt")
        .tempfile()
        .context("failed to create temp file")?;
    file.write_all(message.as_bytes())?;
    file.flush()?;

    let status = Command::new(&editor)
        .arg(file.path())
        .status()
        .with_context(|| format!("failed to launch {}", editor.display()))?;
    if !status.success() {
        anyhow::bail!("editor exited with {status}");
    }
    std::fs::read_to_string(file.path()).context("failed to read edited message")
}
