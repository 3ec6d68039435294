use anyhow::Context;
use devkit_core::{paths, workspace};
use std::path::{Path, PathBuf};

/// Resolve the devkit data directory.
///
/// Priority:
/// 1. `--data-dir` flag / `DEVKIT_HOME` env var (passed in as `explicit`)
/// 2. `$HOME/.devkit`
pub fn resolve_data_dir(explicit: Option<&Path>) -> anyhow::Result<PathBuf> {
    paths::data_dir(explicit).context("cannot locate the devkit data directory")
}

/// Resolve the project root for workspace commands.
///
/// Priority:
/// 1. Walk upward from `cwd` looking for a project marker
/// 2. Fall back to `cwd`
pub fn resolve_project_root() -> PathBuf {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    workspace::find_project_root(&cwd).unwrap_or(cwd)
}
