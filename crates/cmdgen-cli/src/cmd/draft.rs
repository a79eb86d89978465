use crate::output::print_json;
use crate::project::Project;
use anyhow::Context;
use clap::Subcommand;
use cmdgen_core::{draft::DraftStore, render::Preview};
use std::path::Path;

#[derive(Subcommand)]
pub enum DraftSubcommand {
    /// Show the saved draft and its preview
    Show,
    /// Discard the saved draft
    Clear,
}

pub fn run(root: &Path, subcmd: DraftSubcommand, json: bool) -> anyhow::Result<()> {
    let project = Project::open(root)?;
    let store = DraftStore::new(&project.store);

    match subcmd {
        DraftSubcommand::Show => {
            let Some(draft) = store.load() else {
                if json {
                    return print_json(&serde_json::Value::Null);
                }
                println!("No draft.");
                return Ok(());
            };
            if json {
                return print_json(&draft);
            }
            println!("Command:  {}", draft.selected_command_id);
            println!("Saved:    {}", draft.saved_at.format("%Y-%m-%d %H:%M:%S UTC"));
            for (id, value) in draft.form_state.iter() {
                println!("  {id:<16} {}", serde_json::to_string(value)?);
            }
            for (k, v) in &draft.variables {
                println!("  {{{k}}} = {v}");
            }
            for a in &draft.attachments {
                println!("  attachment: {}", a.name);
            }
            match project.catalog.command(&draft.selected_command_id) {
                Some(cmd) => {
                    let preview = Preview::build(cmd, &draft.form_state, &draft.variables);
                    let text = preview.display_text(draft.preview_override.as_deref());
                    println!("\n{text}");
                }
                None => eprintln!(
                    "warning: draft command '{}' is no longer in the catalog",
                    draft.selected_command_id
                ),
            }
        }
        DraftSubcommand::Clear => {
            store.clear().context("failed to clear draft")?;
            if !json {
                println!("Draft cleared.");
            }
        }
    }
    Ok(())
}
