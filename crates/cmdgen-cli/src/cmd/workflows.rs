use crate::output::print_json;
use crate::project::Project;
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let project = Project::open(root)?;
    let workflows = &project.catalog.workflows;

    if json {
        print_json(workflows)?;
        return Ok(());
    }

    if workflows.is_empty() {
        println!("No workflows.");
        return Ok(());
    }

    for wf in workflows {
        println!("{}  {}", wf.id, wf.title());
        for (i, step) in wf.steps.iter().enumerate() {
            let optional = if step.optional { " (optional)" } else { "" };
            println!("  {}. {:<12} {}{optional}", i + 1, step.step_id, step.command_id);
            for b in &step.auto_bindings {
                println!("       {} -> {} [{}]", b.from_var, b.to_field_id, b.mode);
            }
        }
    }
    Ok(())
}
