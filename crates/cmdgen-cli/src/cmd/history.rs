use crate::output::{print_json, print_table};
use crate::project::Project;
use anyhow::Context;
use clap::Subcommand;
use cmdgen_core::history::HistoryStore;
use std::path::Path;

#[derive(Subcommand)]
pub enum HistorySubcommand {
    /// List generated commands, newest first
    List {
        /// Only entries for this command
        #[arg(long)]
        command: Option<String>,
        /// Show at most this many entries
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// Print one entry's command text
    Show { id: String },
    /// Delete an entry
    Remove { id: String },
}

pub fn run(root: &Path, subcmd: HistorySubcommand, json: bool) -> anyhow::Result<()> {
    let project = Project::open(root)?;
    let store = HistoryStore::new(&project.store);

    match subcmd {
        HistorySubcommand::List { command, limit } => {
            let entries: Vec<_> = store
                .load()
                .into_iter()
                .rev()
                .filter(|e| command.as_deref().map_or(true, |c| e.command_id == c))
                .take(limit)
                .collect();
            if json {
                return print_json(&entries);
            }
            if entries.is_empty() {
                println!("No history.");
                return Ok(());
            }
            let rows = entries
                .iter()
                .map(|e| {
                    vec![
                        e.id.clone(),
                        e.command_id.clone(),
                        e.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                    ]
                })
                .collect();
            print_table(&["ID", "COMMAND", "CREATED (UTC)"], rows);
        }
        HistorySubcommand::Show { id } => {
            let entry = store.get(&id)?;
            if json {
                return print_json(&entry);
            }
            println!("{}", entry.command_text);
        }
        HistorySubcommand::Remove { id } => {
            let left = store
                .remove(&id)
                .with_context(|| format!("failed to remove history entry '{id}'"))?;
            if json {
                return print_json(&serde_json::json!({ "removed": id, "remaining": left.len() }));
            }
            println!("Removed {id}.");
        }
    }
    Ok(())
}
