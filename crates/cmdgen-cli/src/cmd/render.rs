use crate::args::FormArgs;
use crate::output::print_json;
use crate::project::Project;
use cmdgen_core::{form::missing_required, render::Preview, store::GuidanceStore};
use std::path::Path;

pub fn run(root: &Path, args: &FormArgs, json: bool) -> anyhow::Result<()> {
    let project = Project::open(root)?;
    let mut filled = args.fill(&project)?;
    let preview = Preview::build(filled.command, &filled.form, &filled.variables);
    let missing_fields: Vec<&str> = missing_required(filled.command, &filled.form)
        .into_iter()
        .map(|f| f.id.as_str())
        .collect();
    let out_of_order = GuidanceStore::new(&project.store)
        .load()
        .is_out_of_order(filled.command.stage);
    filled.save_draft(&project);

    if json {
        let value = serde_json::json!({
            "command": filled.command.id,
            "text": preview.text,
            "missing_variables": preview.missing,
            "missing_required": missing_fields,
            "out_of_order": out_of_order,
        });
        print_json(&value)?;
        return Ok(());
    }

    println!("{}", preview.text);
    if !preview.missing.is_empty() {
        eprintln!("missing variables: {}", preview.missing.join(", "));
    }
    if !missing_fields.is_empty() {
        eprintln!("missing required fields: {}", missing_fields.join(", "));
    }
    if out_of_order {
        eprintln!(
            "note: {} comes before an earlier stage that is still to do",
            filled.command.stage.label()
        );
    }
    Ok(())
}
