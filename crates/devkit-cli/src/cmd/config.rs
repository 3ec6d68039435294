use crate::cmd::load_config;
use crate::output::print_json;
use anyhow::Context;
use clap::{Subcommand, ValueEnum};
use devkit_core::config::{mask_secret, Config, WarnLevel, API_KEY_ENV};
use devkit_core::paths;
use std::path::Path;

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show the current configuration (the API key is masked)
    Show,
    /// Store the Gemini API key in config.yaml
    SetKey { key: String },
    /// Set the Gemini model name
    SetModel { model: String },
    /// Turn command history recording on or off
    History {
        #[arg(value_enum)]
        state: Toggle,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

pub fn run(data_dir: &Path, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Show => show(data_dir, json),
        ConfigSubcommand::SetKey { key } => {
            let key = key.trim().to_string();
            if key.is_empty() {
                anyhow::bail!("API key cannot be empty");
            }
            update(data_dir, json, |c| c.api_key = Some(key))
        }
        ConfigSubcommand::SetModel { model } => {
            let model = model.trim().to_string();
            if model.is_empty() {
                anyhow::bail!("model cannot be empty");
            }
            update(data_dir, json, |c| c.model = model)
        }
        ConfigSubcommand::History { state } => update(data_dir, json, |c| {
            c.history_enabled = matches!(state, Toggle::On)
        }),
    }
}

fn update(data_dir: &Path, json: bool, f: impl FnOnce(&mut Config)) -> anyhow::Result<()> {
    let mut config = load_config(data_dir)?;
    f(&mut config);
    config.save(data_dir).context("failed to write config.yaml")?;
    if json {
        return print_json(&view(&config));
    }
    println!("Updated {}", paths::config_path(data_dir).display());
    Ok(())
}

/// Config as shown to the user: never the raw key.
fn view(config: &Config) -> serde_json::Value {
    let key_source = if std::env::var(API_KEY_ENV).map_or(false, |v| !v.trim().is_empty()) {
        "env"
    } else if config.api_key.is_some() {
        "config"
    } else {
        "none"
    };
    serde_json::json!({
        "api_key": config.resolve_api_key().map(|k| mask_secret(&k)),
        "api_key_source": key_source,
        "model": config.model,
        "base_url": config.base_url,
        "history_enabled": config.history_enabled,
    })
}

fn show(data_dir: &Path, json: bool) -> anyhow::Result<()> {
    let config = load_config(data_dir)?;
    let warnings = config.validate();

    if json {
        let mut value = view(&config);
        value["warnings"] = serde_json::to_value(&warnings)?;
        return print_json(&value);
    }

    let key = match config.resolve_api_key() {
        Some(k) if config.api_key.as_deref() == Some(k.as_str()) => {
            format!("{} (config)", mask_secret(&k))
        }
        Some(k) => format!("{} ({API_KEY_ENV})", mask_secret(&k)),
        None => "not set".to_string(),
    };
    println!("config:   {}", paths::config_path(data_dir).display());
    println!("api key:  {key}");
    println!("model:    {}", config.model);
    println!("base url: {}", config.base_url);
    println!(
        "history:  {}",
        if config.history_enabled { "on" } else { "off" }
    );
    for w in &warnings {
        let level = match w.level {
            WarnLevel::Warning => "warning",
            WarnLevel::Error => "error",
        };
        println!("{level}: {}", w.message);
    }
    Ok(())
}
