use crate::output::{print_json, print_table};
use crate::project::Project;
use cmdgen_core::types::StageKey;
use std::path::Path;

pub fn run(root: &Path, stage: Option<&str>, json: bool) -> anyhow::Result<()> {
    let project = Project::open(root)?;
    let stage = stage.map(str::parse::<StageKey>).transpose()?;

    let commands: Vec<_> = project
        .catalog
        .sorted_commands()
        .into_iter()
        .filter(|c| stage.map_or(true, |s| c.stage == s))
        .collect();

    if json {
        #[derive(serde::Serialize)]
        struct CommandSummary<'a> {
            id: &'a str,
            display_name: &'a str,
            stage: StageKey,
            constraint_level: String,
            fields: Vec<&'a str>,
            required: Vec<&'a str>,
        }

        let out: Vec<CommandSummary> = commands
            .iter()
            .map(|c| CommandSummary {
                id: &c.id,
                display_name: &c.display_name,
                stage: c.stage,
                constraint_level: c.constraint_level.to_string(),
                fields: c.fields.iter().map(|f| f.id.as_str()).collect(),
                required: c
                    .fields
                    .iter()
                    .filter(|f| f.required)
                    .map(|f| f.id.as_str())
                    .collect(),
            })
            .collect();
        print_json(&out)?;
        return Ok(());
    }

    if commands.is_empty() {
        println!("No commands.");
        return Ok(());
    }

    let rows = commands
        .iter()
        .map(|c| {
            vec![
                c.id.clone(),
                c.stage.to_string(),
                c.constraint_level.to_string(),
                c.display_name.clone(),
            ]
        })
        .collect();
    print_table(&["ID", "STAGE", "LEVEL", "NAME"], rows);
    Ok(())
}
