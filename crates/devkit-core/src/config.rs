use crate::error::Result;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Takes precedence over the key stored in `config.yaml`.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_true")]
    pub history_enabled: bool,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            history_enabled: true,
            base_url: default_base_url(),
        }
    }
}

impl Config {
    /// Load `<data_dir>/config.yaml`. A missing file yields the defaults.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = paths::config_path(data_dir);
        let Some(data) = crate::io::read_if_exists(&path)? else {
            return Ok(Self::default());
        };
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, data_dir: &Path) -> Result<()> {
        let path = paths::config_path(data_dir);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    /// The API key to use: `GEMINI_API_KEY` first, then `api_key`.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key_with_env(std::env::var(API_KEY_ENV).ok())
    }

    fn api_key_with_env(&self, env: Option<String>) -> Option<String> {
        env.into_iter()
            .chain(self.api_key.clone())
            .map(|k| k.trim().to_string())
            .find(|k| !k.is_empty())
    }

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.model.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "model is empty".to_string(),
            });
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!("base_url '{}' is not an http(s) URL", self.base_url),
            });
        }
        if self.resolve_api_key().is_none() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!("no API key: set {API_KEY_ENV} or run `devkit config set-key`"),
            });
        }

        warnings
    }
}

/// `abcd...wxyz` for display. Short secrets are fully hidden.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
