use crate::output::print_json;
use crate::project::Project;
use cmdgen_core::store::GuidanceStore;
use std::path::Path;

pub fn run(root: &Path, workflow: Option<&str>, json: bool) -> anyhow::Result<()> {
    let project = Project::open(root)?;
    let state = GuidanceStore::new(&project.store).load();

    let context = workflow.map(|w| project.guidance_context(w));
    let rec = project.recommender().recommend(&state, context.as_ref());

    if json {
        print_json(&rec)?;
        return Ok(());
    }

    println!("Stage:    {}", rec.stage.label());
    println!("Command:  {}", rec.command);
    println!("Reason:   {}", rec.reason);
    if rec.severity.is_some() {
        println!("Note:     reviews are easy to skip; consider running one before implementing.");
    }
    if project.catalog.command(&rec.command).is_none() {
        eprintln!("warning: '{}' is not in the catalog", rec.command);
    }
    Ok(())
}
