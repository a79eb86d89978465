use crate::args::{apply_fields, apply_vars, split_assignment};
use crate::output::print_json;
use crate::project::Project;
use chrono::Utc;
use clap::Subcommand;
use cmdgen_core::{
    form::{missing_required, VariableMap},
    workflow::{StepStatus, WorkflowRun},
    CmdgenError,
};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum WorkflowSubcommand {
    /// Run a workflow start to finish, generating each step in order
    Run {
        /// Workflow id
        id: String,

        /// Step field, STEP.FIELD=VALUE (repeatable)
        #[arg(long = "field", short = 'f', value_name = "STEP.FIELD=VALUE")]
        fields: Vec<String>,

        /// Shared variable, NAME=VALUE (repeatable)
        #[arg(long = "var", value_name = "NAME=VALUE")]
        vars: Vec<String>,

        /// Step to skip (repeatable)
        #[arg(long = "skip", value_name = "STEP")]
        skip: Vec<String>,
    },
}

#[derive(Serialize)]
struct StepReport {
    step: String,
    command: String,
    status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    missing_variables: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    history_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(root: &Path, subcmd: WorkflowSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        WorkflowSubcommand::Run {
            id,
            fields,
            vars,
            skip,
        } => run_workflow(root, &id, &fields, &vars, &skip, json),
    }
}

fn run_workflow(
    root: &Path,
    id: &str,
    fields: &[String],
    vars: &[String],
    skip: &[String],
    json: bool,
) -> anyhow::Result<()> {
    let project = Project::open(root)?;
    let mut shared = VariableMap::new();
    apply_vars(&mut shared, vars)?;
    let mut run = WorkflowRun::start_with(&project.catalog, id, shared)?;

    let by_step = group_by_step(fields)?;
    for step_id in by_step.keys().chain(skip) {
        if run.workflow().step(step_id).is_none() {
            return Err(CmdgenError::StepNotFound(step_id.clone()).into());
        }
    }

    let mut reports = Vec::new();
    loop {
        let Some(step) = run.current_step() else { break };
        let index = run.index();

        if skip.contains(&step.step_id) {
            reports.push(skipped(&step.step_id, &step.command_id));
            run.skip()?;
        } else {
            if let Some(assignments) = by_step.get(step.step_id.as_str()) {
                let (command, form) = run.edit_form()?;
                apply_fields(command, form, assignments)?;
            }
            let (command, form) = run.edit_form()?;
            let missing: Vec<String> = missing_required(command, form)
                .into_iter()
                .map(|f| f.id.clone())
                .collect();

            if missing.is_empty() {
                let preview = run.preview()?;
                let generated = run.generate(&project.store, Utc::now())?;
                reports.push(StepReport {
                    step: step.step_id.clone(),
                    command: step.command_id.clone(),
                    status: StepStatus::Done,
                    text: Some(generated.entry.command_text),
                    missing_variables: preview.missing,
                    history_id: Some(generated.entry.id),
                });
            } else if step.optional {
                tracing::info!(step = %step.step_id, "skipping optional step with missing fields");
                reports.push(skipped(&step.step_id, &step.command_id));
                run.skip()?;
            } else {
                print_reports(&reports, json)?;
                return Err(CmdgenError::MissingRequired {
                    command: format!("{} (step '{}')", step.command_id, step.step_id),
                    fields: missing.join(", "),
                }
                .into());
            }
            if run.index() == index {
                run.next_step();
            }
        }

        if run.index() == index {
            break;
        }
    }

    print_reports(&reports, json)
}

fn skipped(step: &str, command: &str) -> StepReport {
    StepReport {
        step: step.to_string(),
        command: command.to_string(),
        status: StepStatus::Skipped,
        text: None,
        missing_variables: Vec::new(),
        history_id: None,
    }
}

/// `STEP.FIELD=VALUE` assignments regrouped as `FIELD=VALUE` per step.
fn group_by_step(fields: &[String]) -> anyhow::Result<HashMap<String, Vec<String>>> {
    let mut by_step: HashMap<String, Vec<String>> = HashMap::new();
    for raw in fields {
        let (key, value) = split_assignment(raw)?;
        let Some((step, field)) = key.split_once('.') else {
            anyhow::bail!("expected STEP.FIELD=VALUE, got '{raw}'");
        };
        by_step
            .entry(step.trim().to_string())
            .or_default()
            .push(format!("{}={value}", field.trim()));
    }
    Ok(by_step)
}

fn print_reports(reports: &[StepReport], json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(&reports);
    }
    for r in reports {
        println!("== {} ({}) [{}]", r.step, r.command, r.status);
        if let Some(text) = &r.text {
            println!("{text}");
        }
        if !r.missing_variables.is_empty() {
            println!("missing variables: {}", r.missing_variables.join(", "));
        }
        println!();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_assignments_by_step() {
        let grouped = group_by_step(&[
            "explore.INTENT=map it".to_string(),
            "plan.PLAN_PATH=docs/plan.md".to_string(),
            "explore.CONTEXT=a=b".to_string(),
        ])
        .unwrap();
        assert_eq!(grouped["explore"], vec!["INTENT=map it", "CONTEXT=a=b"]);
        assert_eq!(grouped["plan"], vec!["PLAN_PATH=docs/plan.md"]);
        assert!(group_by_step(&["INTENT=x".to_string()]).is_err());
    }
}
