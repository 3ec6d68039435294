pub mod ai;
pub mod clear;
pub mod commit;
pub mod config;
pub mod init;
pub mod logs;
pub mod panic;
pub mod rewind;
pub mod run;
pub mod snippet;
pub mod status;

use anyhow::Context;
use devkit_ai::{Assistant, GeminiClient};
use devkit_core::{config::Config, paths, store::FileStore};
use std::path::Path;

pub(crate) fn file_store(data_dir: &Path) -> FileStore {
    FileStore::new(paths::store_path(data_dir))
}

pub(crate) fn load_config(data_dir: &Path) -> anyhow::Result<Config> {
    Config::load(data_dir).context("failed to load config.yaml")
}

/// The Gemini-backed assistant. Fails with `AiError::NotConfigured` when
/// there is no API key.
pub(crate) fn assistant(data_dir: &Path) -> anyhow::Result<Assistant<GeminiClient>> {
    let config = load_config(data_dir)?;
    let client = GeminiClient::from_config(&config)?;
    Ok(Assistant::new(client))
}
