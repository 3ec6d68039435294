use crate::cmd::{assistant, file_store};
use crate::output::print_json;
use devkit_ai::parse_suggested_command;
use devkit_core::snippet::SnippetRepository;
use std::path::Path;

/// `devkit ask`: suggest a command, optionally saving it as a snippet.
pub fn ask(data_dir: &Path, query: &[String], save_as: Option<&str>, json: bool) -> anyhow::Result<()> {
    let query = query.join(" ");
    let reply = assistant(data_dir)?.ask_command(&query)?;
    let suggested = parse_suggested_command(&reply);

    let saved = match save_as {
        Some(name) => {
            let Some(command) = suggested.as_deref() else {
                anyhow::bail!("the reply has no COMMAND: line, nothing to save");
            };
            let repo = SnippetRepository::new(file_store(data_dir));
            if repo.exists(name.trim())? {
                anyhow::bail!("snippet '{}' already exists", name.trim());
            }
            let no_tags: [&str; 0] = [];
            Some(repo.save(name, command, &no_tags)?)
        }
        None => None,
    };

    if json {
        return print_json(&serde_json::json!({
            "query": query,
            "reply": reply,
            "command": suggested,
            "saved": saved.map(|s| s.name),
        }));
    }
    println!("{}", reply.trim_end());
    if let Some(s) = saved {
        println!("\nSaved as snippet '{}'", s.name);
    }
    Ok(())
}

pub fn explain(data_dir: &Path, command: &[String], json: bool) -> anyhow::Result<()> {
    let command = command.join(" ");
    let explanation = assistant(data_dir)?.explain_command(&command)?;
    if json {
        return print_json(&serde_json::json!({
            "command": command,
            "explanation": explanation,
        }));
    }
    println!("{}", explanation.trim_end());
    Ok(())
}
