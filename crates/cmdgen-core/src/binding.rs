//! Value propagation between workflow steps.

use crate::catalog::{CommandDefinition, WorkflowStep};
use crate::form::{FieldValue, FormState, VariableMap};
use crate::types::BindingMode;

/// Apply `step`'s auto-bindings to `fields`, which belong to `command`.
///
/// Returns whether any field changed. Running it a second time with the
/// same inputs changes nothing.
pub fn apply_bindings(
    step: &WorkflowStep,
    command: &CommandDefinition,
    fields: &mut FormState,
    variables: &VariableMap,
) -> bool {
    let mut changed = false;
    for binding in &step.auto_bindings {
        let Some(value) = variables.get(&binding.from_var).filter(|v| !v.is_empty()) else {
            continue;
        };
        let Some(field) = command.field(&binding.to_field_id) else {
            continue;
        };

        if field.field_type.is_list() {
            let current = fields.list(&field.id);
            if current.iter().any(|item| item == value) {
                continue;
            }
            let mut items = current.to_vec();
            items.push(value.clone());
            fields.set(field.id.clone(), items);
            changed = true;
            continue;
        }

        let write = match binding.mode {
            BindingMode::Set => true,
            BindingMode::FillIfEmpty => fields.get(&field.id).map_or(true, scalar_is_empty),
        };
        if write && fields.get(&field.id) != Some(&FieldValue::Text(value.clone())) {
            fields.set(field.id.clone(), value.clone());
            changed = true;
        }
    }
    changed
}

fn scalar_is_empty(value: &FieldValue) -> bool {
    match value {
        FieldValue::Text(s) => s.trim().is_empty(),
        FieldValue::List(items) => items.is_empty(),
        FieldValue::Bool(_) => false,
    }
}

/// Values `command` exports for later steps: each declared output whose
/// source field holds non-blank text, trimmed.
pub fn capture_outputs(command: &CommandDefinition, fields: &FormState) -> Vec<(String, String)> {
    command
        .outputs
        .iter()
        .filter_map(|output| {
            let value = fields.get(&output.source_field_id)?.as_text()?.trim();
            (!value.is_empty()).then(|| (output.id.clone(), value.to_string()))
        })
        .collect()
}

/// Merge captured outputs into `variables`. Returns how many were written.
pub fn store_outputs(
    command: &CommandDefinition,
    fields: &FormState,
    variables: &mut VariableMap,
) -> usize {
    let updates = capture_outputs(command, fields);
    let count = updates.len();
    variables.extend(updates);
    count
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{AutoBinding, Catalog};

    fn setup(step_id: &str) -> (Catalog, WorkflowStep, CommandDefinition) {
        let catalog = Catalog::starter();
        let step = catalog
            .workflow("workflow-a")
            .unwrap()
            .step(step_id)
            .cloned()
            .unwrap();
        let command = catalog.command(&step.command_id).cloned().unwrap();
        (catalog, step, command)
    }

    fn vars(pairs: &[(&str, &str)]) -> VariableMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn list_target_appends_once() {
        let (_, step, cmd) = setup("plan");
        let mut form = FormState::init(&cmd);
        let v = vars(&[("EXPLORE_SUMMARY", "auth flow notes")]);

        assert!(apply_bindings(&step, &cmd, &mut form, &v));
        assert_eq!(form.list("INPUTS"), &["auth flow notes".to_string()]);

        let snapshot = form.clone();
        assert!(!apply_bindings(&step, &cmd, &mut form, &v));
        assert_eq!(form, snapshot);
    }

    #[test]
    fn fill_if_empty_respects_existing_value() {
        let (_, step, cmd) = setup("review");
        let v = vars(&[("PLAN_PATH", "docs/plan.md")]);

        let mut form = FormState::init(&cmd);
        form.set("TARGET", "src/lib.rs");
        assert!(!apply_bindings(&step, &cmd, &mut form, &v));
        assert_eq!(form.text("TARGET"), "src/lib.rs");

        form.set("TARGET", "   ");
        assert!(apply_bindings(&step, &cmd, &mut form, &v));
        assert_eq!(form.text("TARGET"), "docs/plan.md");
    }

    #[test]
    fn set_mode_overwrites() {
        let catalog = Catalog::starter();
        let step = catalog
            .workflow("workflow-d")
            .unwrap()
            .step("implement")
            .cloned()
            .unwrap();
        let cmd = catalog.command(&step.command_id).unwrap();
        let mut form = FormState::init(cmd);
        form.set("PLAN_PATH", "old.md");
        let v = vars(&[("PLAN_PATH", "new.md")]);

        assert!(apply_bindings(&step, cmd, &mut form, &v));
        assert_eq!(form.text("PLAN_PATH"), "new.md");
        // Same value again: nothing to change.
        assert!(!apply_bindings(&step, cmd, &mut form, &v));
    }

    #[test]
    fn absent_or_empty_variable_is_noop() {
        let (_, step, cmd) = setup("review");
        let mut form = FormState::init(&cmd);
        let before = form.clone();
        assert!(!apply_bindings(&step, &cmd, &mut form, &VariableMap::new()));
        assert!(!apply_bindings(&step, &cmd, &mut form, &vars(&[("PLAN_PATH", "")])));
        assert_eq!(form, before);
    }

    #[test]
    fn unknown_target_field_is_skipped() {
        let (_, mut step, cmd) = setup("review");
        step.auto_bindings = vec![AutoBinding {
            from_var: "PLAN_PATH".to_string(),
            to_field_id: "NOT_A_FIELD".to_string(),
            mode: BindingMode::Set,
        }];
        let mut form = FormState::init(&cmd);
        assert!(!apply_bindings(&step, &cmd, &mut form, &vars(&[("PLAN_PATH", "x")])));
        assert!(form.get("NOT_A_FIELD").is_none());
    }

    #[test]
    fn capture_trims_and_skips_blank() {
        let catalog = Catalog::starter();
        let cmd = catalog.command("plan-lite").unwrap();
        let mut form = FormState::init(cmd);
        assert!(capture_outputs(cmd, &form).is_empty());

        form.set("PLAN_PATH", "  docs/plan.md \n");
        assert_eq!(
            capture_outputs(cmd, &form),
            vec![("PLAN_PATH".to_string(), "docs/plan.md".to_string())]
        );
    }

    #[test]
    fn capture_ignores_non_text_sources() {
        let catalog = Catalog::starter();
        let mut cmd = catalog.command("senior-explore").cloned().unwrap();
        cmd.outputs[0].source_field_id = "FOCUS_AREAS".to_string();
        let mut form = FormState::init(&cmd);
        form.set("FOCUS_AREAS", vec!["a".to_string()]);
        assert!(capture_outputs(&cmd, &form).is_empty());
    }

    #[test]
    fn store_outputs_merges_into_variables() {
        let catalog = Catalog::starter();
        let cmd = catalog.command("senior-explore").unwrap();
        let mut form = FormState::init(cmd);
        form.set("INTENT", "Map the billing service");
        let mut v = vars(&[("PROJECT", "acme")]);
        assert_eq!(store_outputs(cmd, &form, &mut v), 1);
        assert_eq!(v["EXPLORE_SUMMARY"], "Map the billing service");
        assert_eq!(v["PROJECT"], "acme");
    }
}
