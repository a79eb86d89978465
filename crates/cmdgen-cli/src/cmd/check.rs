use crate::args::FormArgs;
use crate::output::print_json;
use crate::project::Project;
use cmdgen_core::{
    catalog::Catalog,
    form::{can_generate, missing_required},
    quality::{QualityReport, QualityStatus},
    store::GuidanceStore,
};
use std::path::Path;

pub fn run(root: &Path, args: &FormArgs, json: bool) -> anyhow::Result<()> {
    let project = Project::open(root)?;
    let filled = args.fill(&project)?;
    let command = filled.command;
    let missing: Vec<&str> = missing_required(command, &filled.form)
        .into_iter()
        .map(|f| f.id.as_str())
        .collect();
    let quality = QualityReport::for_command(command, &filled.form);
    let workflow = suggested_workflow(&project.catalog, &command.id);
    let out_of_order = GuidanceStore::new(&project.store)
        .load()
        .is_out_of_order(command.stage);

    if json {
        let value = serde_json::json!({
            "command": command.id,
            "ready": can_generate(command, &filled.form),
            "missing_required": missing,
            "quality": quality,
            "workflow": workflow,
            "out_of_order": out_of_order,
        });
        print_json(&value)?;
        return Ok(());
    }

    if missing.is_empty() {
        println!("Ready: all required fields are filled.");
    } else {
        println!("Missing required: {}", missing.join(", "));
    }
    for (name, fb) in quality.iter() {
        let marker = match fb.status {
            QualityStatus::Ok => "ok",
            QualityStatus::Warning => "!!",
            QualityStatus::Weak => "--",
        };
        println!("  [{marker}] {name:<12} {}", fb.message);
    }
    if out_of_order {
        println!(
            "Note: {} comes before an earlier stage that is still to do.",
            command.stage.label()
        );
    }
    if let Some(wf) = workflow {
        println!("Tip: '{}' is part of workflow '{wf}'.", command.id);
    }
    Ok(())
}

fn suggested_workflow<'a>(catalog: &'a Catalog, command_id: &str) -> Option<&'a str> {
    catalog.workflow_suggestion(command_id).map(|wf| wf.title())
}
