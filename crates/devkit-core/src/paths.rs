use crate::error::{DevkitError, Result};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

/// Per-user data directory under `$HOME`, and per-project workspace dir.
pub const DEVKIT_DIR: &str = ".devkit";

pub const STORE_FILE: &str = "store.json";
pub const CONFIG_FILE: &str = "config.yaml";
pub const PROJECT_FILE: &str = "project.yaml";

pub const DEVKIT_HOME_ENV: &str = "DEVKIT_HOME";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

/// Resolve the data directory.
///
/// Priority:
/// 1. `explicit` (the `--data-dir` flag or `DEVKIT_HOME`, resolved by clap)
/// 2. `$HOME/.devkit`
pub fn data_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(p) = explicit {
        return Ok(p.to_path_buf());
    }
    let home = home::home_dir().ok_or(DevkitError::HomeNotFound)?;
    Ok(home.join(DEVKIT_DIR))
}

pub fn store_path(data_dir: &Path) -> PathBuf {
    data_dir.join(STORE_FILE)
}

pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CONFIG_FILE)
}

pub fn project_dir(project_root: &Path) -> PathBuf {
    project_root.join(DEVKIT_DIR)
}

pub fn project_file(project_root: &Path) -> PathBuf {
    project_dir(project_root).join(PROJECT_FILE)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
