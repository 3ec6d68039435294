use crate::cmd::{assistant, file_store};
use crate::output::{one_line, print_json, print_table};
use devkit_core::{
    history::HistoryRecorder,
    risk::{RiskCategory, RiskScanner, RULESET_VERSION},
};
use std::collections::BTreeSet;
use std::path::Path;

pub const DEFAULT_WINDOW: usize = 20;

pub fn run(data_dir: &Path, stats: bool, window: usize, ai: bool, json: bool) -> anyhow::Result<()> {
    let records = HistoryRecorder::new(file_store(data_dir)).all()?;
    let scanner = RiskScanner::builtin();

    if stats {
        let summary = scanner.summary(&records);
        if json {
            return print_json(&summary);
        }
        println!(
            "{} of {} recorded commands look dangerous ({:.1}%), rules v{RULESET_VERSION}",
            summary.dangerous,
            summary.total,
            summary.dangerous_percent()
        );
        if !summary.by_category.is_empty() {
            println!();
            let rows = summary
                .by_category
                .iter()
                .map(|(c, n)| vec![c.to_string(), n.to_string()])
                .collect();
            print_table(&["CATEGORY", "COUNT"], rows);
        }
        return Ok(());
    }

    let matches = scanner.recent(&records, window);
    if matches.is_empty() {
        if json {
            return print_json(&serde_json::json!({ "window": window, "matches": [] }));
        }
        println!("No dangerous commands in the last {window} commands.");
        return Ok(());
    }

    let rollback = if ai {
        Some(assistant(data_dir)?.suggest_rollback(&matches)?)
    } else {
        None
    };

    if json {
        return print_json(&serde_json::json!({
            "window": window,
            "matches": matches,
            "rollback": rollback,
        }));
    }

    println!("Dangerous commands in the last {window}:");
    let rows = matches
        .iter()
        .map(|m| {
            vec![
                m.record.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                m.category.to_string(),
                m.record.status.to_string(),
                one_line(&m.record.command, 60),
            ]
        })
        .collect();
    print_table(&["TIME (UTC)", "CATEGORY", "STATUS", "COMMAND"], rows);
    println!();

    match rollback {
        Some(text) => println!("{text}"),
        None => {
            let categories: BTreeSet<RiskCategory> = matches.iter().map(|m| m.category).collect();
            println!("Rollback hints:");
            for category in categories {
                println!("  {category}:");
                for hint in category.rollback_hints() {
                    println!("    {hint}");
                }
            }
            println!("\nFor tailored steps run `devkit panic --ai`.");
        }
    }
    Ok(())
}
