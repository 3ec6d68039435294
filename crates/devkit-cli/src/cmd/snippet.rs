use crate::cmd::{file_store, run};
use crate::output::{one_line, print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use devkit_core::{
    exchange::ExportFormat,
    snippet::{parse_tag_list, SnippetRepository},
    types::{CommandSource, Snippet},
    DevkitError,
};
use std::path::{Path, PathBuf};

#[derive(Subcommand)]
pub enum SnippetSubcommand {
    /// Save a command under a name
    Save {
        name: String,
        /// The command (quote it if it has spaces)
        command: String,
        /// Comma-separated tags (e.g. docker,cleanup)
        #[arg(long)]
        tags: Option<String>,
        /// Replace an existing snippet with the same name
        #[arg(long)]
        force: bool,
    },
    /// Show a single snippet
    Get { name: String },
    /// List snippets, optionally filtered by tag
    List {
        #[arg(long)]
        tag: Option<String>,
    },
    /// Search snippets by name, command text or tag
    Search { query: String },
    /// Delete a snippet
    Delete { name: String },
    /// Run a saved snippet and record it in history
    Run { name: String },
    /// Export every snippet to a file
    Export {
        file: PathBuf,
        /// json or text (default: from the file extension, else json)
        #[arg(long)]
        format: Option<String>,
    },
    /// Import snippets from a JSON or text export
    Import {
        file: PathBuf,
        /// Replace existing snippets with the same names
        #[arg(long)]
        overwrite: bool,
    },
}

pub fn run(data_dir: &Path, subcmd: SnippetSubcommand, json: bool) -> anyhow::Result<()> {
    let repo = SnippetRepository::new(file_store(data_dir));
    match subcmd {
        SnippetSubcommand::Save {
            name,
            command,
            tags,
            force,
        } => save(&repo, &name, &command, tags.as_deref(), force, json),
        SnippetSubcommand::Get { name } => get(&repo, &name, json),
        SnippetSubcommand::List { tag } => list(&repo, tag.as_deref(), json),
        SnippetSubcommand::Search { query } => search(&repo, &query, json),
        SnippetSubcommand::Delete { name } => delete(&repo, &name, json),
        SnippetSubcommand::Run { name } => run_snippet(data_dir, &repo, &name, json),
        SnippetSubcommand::Export { file, format } => export(&repo, &file, format.as_deref(), json),
        SnippetSubcommand::Import { file, overwrite } => import(&repo, &file, overwrite, json),
    }
}

fn save(
    repo: &SnippetRepository,
    name: &str,
    command: &str,
    tags: Option<&str>,
    force: bool,
    json: bool,
) -> anyhow::Result<()> {
    if !force && repo.exists(name.trim())? {
        anyhow::bail!("snippet '{}' already exists; use --force to overwrite", name.trim());
    }
    let tags = tags.map(parse_tag_list).unwrap_or_default();
    let snippet = repo.save(name, command, &tags)?;

    if json {
        print_json(&snippet)?;
    } else if snippet.tags.is_empty() {
        println!("Saved snippet: {}", snippet.name);
    } else {
        println!("Saved snippet: {} (tags: {})", snippet.name, snippet.tag_list());
    }
    Ok(())
}

/// Load a snippet, turning "not found" into a message with close matches.
fn find(repo: &SnippetRepository, name: &str) -> anyhow::Result<Snippet> {
    match repo.get(name) {
        Ok(s) => Ok(s),
        Err(DevkitError::NotFound(_)) => {
            let similar = repo.similar(name)?;
            if similar.is_empty() {
                anyhow::bail!("snippet '{name}' not found");
            }
            anyhow::bail!(
                "snippet '{name}' not found (did you mean: {}?)",
                similar.join(", ")
            )
        }
        Err(e) => Err(e.into()),
    }
}

fn get(repo: &SnippetRepository, name: &str, json: bool) -> anyhow::Result<()> {
    let snippet = find(repo, name)?;
    if json {
        return print_json(&snippet);
    }
    println!("Snippet: {}", snippet.name);
    println!("Command: {}", snippet.command);
    if !snippet.tags.is_empty() {
        println!("Tags:    {}", snippet.tag_list());
    }
    println!(
        "Created: {}",
        snippet.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    Ok(())
}

fn print_snippets(snippets: &[Snippet]) {
    let rows = snippets
        .iter()
        .map(|s| vec![s.name.clone(), one_line(&s.command, 60), s.tag_list()])
        .collect();
    print_table(&["NAME", "COMMAND", "TAGS"], rows);
}

fn list(repo: &SnippetRepository, tag: Option<&str>, json: bool) -> anyhow::Result<()> {
    let snippets = repo.list(tag)?;
    if json {
        return print_json(&snippets);
    }
    if snippets.is_empty() {
        match tag {
            Some(t) => println!("No snippets tagged '{t}'."),
            None => println!("No snippets saved yet."),
        }
        return Ok(());
    }
    print_snippets(&snippets);
    Ok(())
}

fn search(repo: &SnippetRepository, query: &str, json: bool) -> anyhow::Result<()> {
    let results = repo.search(query)?;
    if json {
        return print_json(&results);
    }
    if results.is_empty() {
        println!("No snippets match '{query}'.");
        return Ok(());
    }
    print_snippets(&results);
    Ok(())
}

fn delete(repo: &SnippetRepository, name: &str, json: bool) -> anyhow::Result<()> {
    let removed = match repo.delete(name) {
        Ok(s) => s,
        Err(DevkitError::NotFound(_)) => anyhow::bail!("snippet '{name}' not found"),
        Err(e) => return Err(e.into()),
    };
    if json {
        print_json(&serde_json::json!({ "deleted": removed.name }))?;
    } else {
        println!("Deleted snippet: {}", removed.name);
    }
    Ok(())
}

fn run_snippet(
    data_dir: &Path,
    repo: &SnippetRepository,
    name: &str,
    json: bool,
) -> anyhow::Result<()> {
    let snippet = find(repo, name)?;
    run::execute(
        data_dir,
        &snippet.command,
        CommandSource::Snippet { name: snippet.name },
        json,
    )
}

fn export(
    repo: &SnippetRepository,
    file: &Path,
    format: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let format = match format {
        Some(f) => f.parse::<ExportFormat>()?,
        None => ExportFormat::from_extension(file).unwrap_or(ExportFormat::Json),
    };
    let count = repo
        .export(file, format)
        .with_context(|| format!("failed to export to {}", file.display()))?;

    if json {
        print_json(&serde_json::json!({
            "file": file,
            "format": format.to_string(),
            "exported": count,
        }))?;
    } else {
        println!("Exported {count} snippets to {} ({format})", file.display());
    }
    Ok(())
}

fn import(repo: &SnippetRepository, file: &Path, overwrite: bool, json: bool) -> anyhow::Result<()> {
    let report = repo
        .import(file, overwrite)
        .with_context(|| format!("failed to import {}", file.display()))?;

    if json {
        return print_json(&report);
    }
    println!("Imported {} snippets from {}", report.imported, file.display());
    if !report.conflicts.is_empty() {
        println!(
            "Skipped {} existing (use --overwrite to replace): {}",
            report.skipped,
            report.conflicts.join(", ")
        );
    }
    Ok(())
}
