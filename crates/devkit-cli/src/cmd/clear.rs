use crate::cmd::file_store;
use crate::output::print_json;
use devkit_core::history::HistoryRecorder;
use std::path::Path;

pub fn run(data_dir: &Path, yes: bool, json: bool) -> anyhow::Result<()> {
    if !yes {
        anyhow::bail!("this deletes the whole command history; re-run with --yes to confirm");
    }
    let removed = HistoryRecorder::new(file_store(data_dir)).clear()?;
    if json {
        print_json(&serde_json::json!({ "cleared": removed }))?;
    } else {
        println!("Cleared {removed} history entries.");
    }
    Ok(())
}
