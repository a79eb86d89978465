use crate::output::{print_json, print_table};
use crate::project::Project;
use anyhow::Context;
use cmdgen_core::{history::HistoryStore, store::GuidanceStore, types::StageKey};
use std::path::Path;

pub fn run(root: &Path, reset: bool, json: bool) -> anyhow::Result<()> {
    let project = Project::open(root)?;
    let guidance = GuidanceStore::new(&project.store);

    if reset {
        guidance.reset().context("failed to reset guidance state")?;
        println!("Guidance state reset.");
        return Ok(());
    }

    let state = guidance.load();
    let generated = HistoryStore::new(&project.store).load().len();

    if json {
        let value = serde_json::json!({
            "stage_status": state.stage_status,
            "done": state.stage_status.done_count(),
            "total": StageKey::COUNT,
            "last": state.last,
            "recent": state.history.iter().take(10).collect::<Vec<_>>(),
            "generated": generated,
        });
        print_json(&value)?;
        return Ok(());
    }

    let rows = state
        .stage_status
        .iter()
        .map(|(stage, status)| vec![stage.label().to_string(), status.to_string()])
        .collect();
    print_table(&["STAGE", "STATUS"], rows);

    println!(
        "\n{}/{} stages done, {generated} command(s) generated",
        state.stage_status.done_count(),
        StageKey::COUNT
    );
    if let Some(last) = &state.last {
        println!(
            "Last:  {} ({}) at {}",
            last.command,
            last.stage,
            last.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }
    Ok(())
}
