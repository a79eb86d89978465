use crate::args::FormArgs;
use crate::output::print_json;
use crate::project::Project;
use chrono::Utc;
use cmdgen_core::{
    form::missing_required,
    history::{HistoryEntry, HistoryStore},
    render::Preview,
    store::GuidanceStore,
    CmdgenError,
};
use std::path::Path;

pub fn run(
    root: &Path,
    args: &FormArgs,
    workflow: Option<&str>,
    strict: bool,
    json: bool,
) -> anyhow::Result<()> {
    let project = Project::open(root)?;
    let mut filled = args.fill(&project)?;
    let command = filled.command;

    let missing: Vec<&str> = missing_required(command, &filled.form)
        .into_iter()
        .map(|f| f.id.as_str())
        .collect();
    if !missing.is_empty() {
        if strict {
            return Err(CmdgenError::MissingRequired {
                command: command.id.clone(),
                fields: missing.join(", "),
            }
            .into());
        }
        eprintln!("warning: missing required fields: {}", missing.join(", "));
    }

    let guidance_store = GuidanceStore::new(&project.store);
    // Judged on entry to the stage, before this run completes it.
    let out_of_order = guidance_store.load().is_out_of_order(command.stage);

    let preview = Preview::build(command, &filled.form, &filled.variables);
    let now = Utc::now();
    let entry = HistoryEntry::new(&command.id, filled.form.clone(), preview.text.clone(), now);
    if let Err(e) = HistoryStore::new(&project.store).add(entry.clone()) {
        tracing::warn!(command = %command.id, error = %e, "failed to record history");
    }
    let guidance = guidance_store.record_success(&command.id, command.stage, now);
    filled.save_draft(&project);

    let context = workflow.map(|w| project.guidance_context(w));
    let next = project.recommender().recommend(&guidance, context.as_ref());

    if json {
        let value = serde_json::json!({
            "id": entry.id,
            "command": command.id,
            "stage": command.stage,
            "text": preview.text,
            "missing_variables": preview.missing,
            "out_of_order": out_of_order,
            "next": next,
        });
        print_json(&value)?;
        return Ok(());
    }

    println!("{}", preview.text);
    if !preview.missing.is_empty() {
        eprintln!("missing variables: {}", preview.missing.join(", "));
    }
    if out_of_order {
        eprintln!(
            "note: {} was started while an earlier stage is still to do",
            command.stage.label()
        );
    }
    eprintln!("saved: {}", entry.id);
    eprintln!("next:  {} ({})", next.command, next.reason);
    Ok(())
}
