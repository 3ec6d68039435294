//! Shell subprocess invocation for `devkit run` and `devkit snippet run`.
//!
//! Commands are handed to `sh -c` verbatim. With `capture` set, stdout and
//! stderr are collected (stdout first) instead of flowing to the terminal.

use std::process::{Command, Stdio};

use serde::Serialize;

use crate::error::{DevkitError, Result};
use crate::types::ExitStatus;

pub const SHELL: &str = "sh";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunOutcome {
    #[serde(flatten)]
    pub status: ExitStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl RunOutcome {
    pub fn success(&self) -> bool {
        self.status.success
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.status.exit_code
    }
}

/// Run `command` through the shell and wait for it.
///
/// A non-zero exit is a normal outcome, not an error. Only a failure to
/// start the shell returns `Err`.
pub fn run_shell(command: &str, capture: bool) -> Result<RunOutcome> {
    let mut cmd = Command::new(SHELL);
    cmd.arg("-c").arg(command).stdin(Stdio::inherit());

    if capture {
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
    } else {
        cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
    }

    tracing::debug!(command, capture, "spawning shell");
    let out = cmd
        .output()
        .map_err(|e| DevkitError::Spawn(format!("{SHELL}: {e}")))?;

    let status = match out.status.code() {
        Some(code) => ExitStatus::from_code(code),
        // Killed by a signal.
        None => ExitStatus::failed(None),
    };

    let output = capture.then(|| {
        let mut text = String::from_utf8_lossy(&out.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&out.stderr));
        text
    });

    Ok(RunOutcome { status, output })
}
