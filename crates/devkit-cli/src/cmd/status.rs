use crate::cmd::{file_store, load_config};
use crate::output::print_json;
use devkit_core::{
    history::HistoryRecorder,
    paths,
    risk::{RiskScanner, RULESET_VERSION},
    snippet::SnippetRepository,
    workspace::{self, ProjectInfo},
};
use std::path::Path;

pub fn run(data_dir: &Path, project_root: &Path, json: bool) -> anyhow::Result<()> {
    let config = load_config(data_dir)?;
    let store = file_store(data_dir);
    let snippets = SnippetRepository::new(store.clone()).count()?;
    let history = HistoryRecorder::new(store.clone());
    let summary = history.summary()?;
    let dangerous = RiskScanner::builtin().summary(&history.all()?).dangerous;
    let project = ProjectInfo::load(project_root)?;
    let ai_configured = config.resolve_api_key().is_some();

    if json {
        return print_json(&serde_json::json!({
            "data_dir": data_dir,
            "store": store.path(),
            "snippets": snippets,
            "history": summary,
            "history_enabled": config.history_enabled,
            "dangerous_commands": dangerous,
            "risk_ruleset_version": RULESET_VERSION,
            "ai_configured": ai_configured,
            "model": config.model,
            "project": project,
        }));
    }

    println!("data dir:  {}", data_dir.display());
    println!("snippets:  {snippets}");
    println!(
        "history:   {} commands ({} failed){}",
        summary.total,
        summary.failed,
        if config.history_enabled { "" } else { ", recording off" }
    );
    println!("dangerous: {dangerous} (rules v{RULESET_VERSION})");
    println!(
        "ai:        {}",
        if ai_configured {
            config.model.as_str()
        } else {
            "not configured"
        }
    );
    match project {
        Some(p) => println!(
            "project:   {} ({}) at {}",
            p.name,
            p.project_type,
            p.root.display()
        ),
        None => {
            let kind = workspace::detect_project_type(project_root);
            println!(
                "project:   {} ({kind}), no {} yet; run `devkit init`",
                project_root.display(),
                paths::DEVKIT_DIR
            );
        }
    }
    Ok(())
}
