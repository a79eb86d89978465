use crate::output::print_json;
use crate::project::Project;
use anyhow::Context;
use cmdgen_core::{
    export::{export_payload, ExportKind},
    history::HistoryStore,
    io,
};
use std::path::{Path, PathBuf};

pub fn run(
    root: &Path,
    id: &str,
    format: &str,
    out: Option<PathBuf>,
    stdout: bool,
    json: bool,
) -> anyhow::Result<()> {
    let project = Project::open(root)?;
    let entry = HistoryStore::new(&project.store).get(id)?;
    let command = project.catalog.require_command(&entry.command_id)?;
    let kind: ExportKind = format.parse()?;
    let payload = export_payload(
        command,
        &entry.fields,
        &entry.command_text,
        kind,
        entry.created_at,
    )?;

    if stdout {
        print!("{}", payload.content);
        return Ok(());
    }

    let dir = out.unwrap_or_else(|| root.to_path_buf());
    let path = dir.join(&payload.filename);
    io::atomic_write(&path, payload.content.as_bytes())
        .with_context(|| format!("failed to write {}", path.display()))?;

    if json {
        return print_json(&serde_json::json!({
            "path": path,
            "filename": payload.filename,
            "mime": payload.mime,
        }));
    }
    println!("Exported {}", path.display());
    Ok(())
}
