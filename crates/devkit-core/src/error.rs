use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DevkitError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("snippet not found: {0}")]
    NotFound(String),

    #[error("corrupt data in {}: {source}", path.display())]
    CorruptData {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("project workspace already initialized at {}", .0.display())]
    AlreadyInitialized(PathBuf),

    #[error("failed to spawn command: {0}")]
    Spawn(String),

    #[error("home directory not found: set HOME or DEVKIT_HOME")]
    HomeNotFound,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl DevkitError {
    pub fn validation(msg: impl Into<String>) -> Self {
        DevkitError::Validation(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, DevkitError>;
