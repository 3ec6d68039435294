//! Project workspace detection.
//!
//! A project root is the nearest ancestor directory holding one of
//! [`PROJECT_MARKERS`]. `devkit init` records what was detected in
//! `<root>/.devkit/project.yaml`; AI prompts pick it up through
//! [`project_context`].

use crate::error::{DevkitError, Result};
use crate::io;
use crate::paths;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

pub const PROJECT_MARKERS: &[&str] = &[
    ".devkit",
    ".git",
    "package.json",
    "Cargo.toml",
    "pyproject.toml",
    "setup.py",
    "go.mod",
    "pom.xml",
    "build.gradle",
];

// ---------------------------------------------------------------------------
// ProjectType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectType {
    Nodejs,
    Python,
    Rust,
    Go,
    JavaMaven,
    JavaGradle,
    GitRepo,
    Unknown,
}

impl ProjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectType::Nodejs => "nodejs",
            ProjectType::Python => "python",
            ProjectType::Rust => "rust",
            ProjectType::Go => "go",
            ProjectType::JavaMaven => "java-maven",
            ProjectType::JavaGradle => "java-gradle",
            ProjectType::GitRepo => "git-repo",
            ProjectType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ProjectInfo (persisted as .devkit/project.yaml)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub name: String,
    pub project_type: ProjectType,
    pub root: PathBuf,
    pub initialized_at: DateTime<Utc>,
}

impl ProjectInfo {
    pub fn load(root: &Path) -> Result<Option<Self>> {
        let Some(data) = io::read_if_exists(&paths::project_file(root))? else {
            return Ok(None);
        };
        Ok(Some(serde_yaml::from_str(&data)?))
    }

    pub fn save(&self) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        io::atomic_write(&paths::project_file(&self.root), data.as_bytes())
    }
}

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

/// Walk up from `start` to the first directory containing a project marker.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| PROJECT_MARKERS.iter().any(|m| dir.join(m).exists()))
        .map(Path::to_path_buf)
}

pub fn detect_project_type(root: &Path) -> ProjectType {
    let has = |f: &str| root.join(f).exists();
    if has("package.json") {
        ProjectType::Nodejs
    } else if has("setup.py") || has("pyproject.toml") {
        ProjectType::Python
    } else if has("Cargo.toml") {
        ProjectType::Rust
    } else if has("go.mod") {
        ProjectType::Go
    } else if has("pom.xml") {
        ProjectType::JavaMaven
    } else if has("build.gradle") {
        ProjectType::JavaGradle
    } else if has(".git") {
        ProjectType::GitRepo
    } else {
        ProjectType::Unknown
    }
}

/// Name from the project manifest, falling back to the directory name.
pub fn project_name(root: &Path, project_type: ProjectType) -> String {
    let from_manifest = match project_type {
        ProjectType::Nodejs => read(root, "package.json").and_then(|s| {
            let v: serde_json::Value = serde_json::from_str(&s).ok()?;
            v.get("name")?.as_str().map(str::to_string)
        }),
        ProjectType::Rust => {
            read(root, "Cargo.toml").and_then(|s| toml_section_name(&s, "package"))
        }
        ProjectType::Python => {
            read(root, "pyproject.toml").and_then(|s| toml_section_name(&s, "project"))
        }
        _ => None,
    };
    from_manifest
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| dir_name(root))
}

fn read(root: &Path, file: &str) -> Option<String> {
    std::fs::read_to_string(root.join(file)).ok()
}

fn dir_name(root: &Path) -> String {
    root.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "project".to_string())
}

/// `name = "..."` inside `[section]` of a TOML manifest. Line based; only
/// handles the plain string form manifests use in practice.
fn toml_section_name(content: &str, section: &str) -> Option<String> {
    let header = format!("[{section}]");
    let mut in_section = false;
    for line in content.lines() {
        let line = line.trim();
        if line.starts_with('[') {
            in_section = line == header;
            continue;
        }
        if !in_section {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        if key.trim() == "name" {
            let value = value.trim();
            return value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                .map(str::to_string);
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Init / context
// ---------------------------------------------------------------------------

/// Create `<root>/.devkit/project.yaml`. Refuses to overwrite unless `force`.
/// In a git repo `.devkit/` is also added to `.gitignore`.
pub fn init(root: &Path, force: bool) -> Result<ProjectInfo> {
    let file = paths::project_file(root);
    if file.exists() && !force {
        return Err(DevkitError::AlreadyInitialized(root.to_path_buf()));
    }

    let project_type = detect_project_type(root);
    let info = ProjectInfo {
        name: project_name(root, project_type),
        project_type,
        root: root.to_path_buf(),
        initialized_at: Utc::now(),
    };
    info.save()?;

    if root.join(".git").exists() {
        io::ensure_gitignore_entry(root, &format!("{}/", paths::DEVKIT_DIR))?;
    }

    tracing::debug!(root = %root.display(), kind = %project_type, "project initialized");
    Ok(info)
}

/// Short description of the surrounding project for AI prompts. Empty when
/// `start` is not inside an initialized workspace.
pub fn project_context(start: &Path) -> String {
    let Some(root) = find_project_root(start) else {
        return String::new();
    };
    match ProjectInfo::load(&root) {
        Ok(Some(info)) => format!(
            "Project Context:\n- Name: {}\n- Type: {}\n",
            info.name, info.project_type
        ),
        Ok(None) => String::new(),
        Err(e) => {
            tracing::warn!(root = %root.display(), error = %e, "unreadable project file");
            String::new()
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
