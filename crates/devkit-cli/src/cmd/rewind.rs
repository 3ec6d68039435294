use crate::cmd::{assistant, file_store};
use crate::output::{one_line, print_json, print_table};
use devkit_core::{history::HistoryRecorder, types::HistoryRecord};
use std::path::Path;

pub fn run(
    data_dir: &Path,
    limit: i64,
    failures: bool,
    analyze: bool,
    json: bool,
) -> anyhow::Result<()> {
    let history = HistoryRecorder::new(file_store(data_dir));

    if analyze {
        let records = history.all()?;
        if records.is_empty() {
            anyhow::bail!("no command history to analyze yet");
        }
        let analysis = assistant(data_dir)?.analyze_history(&records)?;
        if json {
            return print_json(&serde_json::json!({ "analysis": analysis }));
        }
        println!("{analysis}");
        return Ok(());
    }

    let records = history.list(limit, failures)?;
    if json {
        return print_json(&records);
    }
    if records.is_empty() {
        if failures {
            println!("No failed commands in history.");
        } else {
            println!("No command history yet.");
        }
        return Ok(());
    }
    print_history(&records);
    Ok(())
}

/// Newest first, numbered from 1.
fn print_history(records: &[HistoryRecord]) {
    let rows = records
        .iter()
        .enumerate()
        .map(|(i, r)| {
            vec![
                (i + 1).to_string(),
                r.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                r.status.to_string(),
                r.source.to_string(),
                one_line(&r.command, 60),
            ]
        })
        .collect();
    print_table(&["#", "TIME (UTC)", "STATUS", "SOURCE", "COMMAND"], rows);
}
