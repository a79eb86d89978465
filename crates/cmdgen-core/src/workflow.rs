//! Driver for one run through a workflow.
//!
//! Each step owns its own form. Outputs captured when a step is generated
//! land in the run's shared variable map, and a step's auto-bindings pull
//! from that map the first time the step is entered.

use crate::binding::{apply_bindings, store_outputs};
use crate::catalog::{Catalog, CommandDefinition, WorkflowDefinition, WorkflowStep};
use crate::error::{CmdgenError, Result};
use crate::form::{add_variable, FieldValue, FormState, VariableMap};
use crate::guidance::{GuidanceContext, GuidanceState};
use crate::history::{HistoryEntry, HistoryStore};
use crate::render::Preview;
use crate::store::{GuidanceStore, KvStore};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    #[default]
    Pending,
    Done,
    Skipped,
}

impl StepStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StepStatus::Pending => "pending",
            StepStatus::Done => "done",
            StepStatus::Skipped => "skipped",
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a successful step generation produced.
#[derive(Debug, Clone)]
pub struct GeneratedStep {
    pub entry: HistoryEntry,
    pub guidance: GuidanceState,
    pub captured: usize,
}

// ---------------------------------------------------------------------------
// WorkflowRun
// ---------------------------------------------------------------------------

pub struct WorkflowRun<'c> {
    catalog: &'c Catalog,
    workflow: &'c WorkflowDefinition,
    index: usize,
    forms: BTreeMap<String, FormState>,
    variables: VariableMap,
    status: BTreeMap<String, StepStatus>,
    bindings_applied: BTreeSet<String>,
    preview_overrides: BTreeMap<String, String>,
}

impl<'c> WorkflowRun<'c> {
    /// Start a fresh run at the first step. Every step command must exist.
    pub fn start(catalog: &'c Catalog, workflow_id: &str) -> Result<Self> {
        Self::start_with(catalog, workflow_id, VariableMap::new())
    }

    /// Like [`WorkflowRun::start`], with the shared variables seeded before
    /// the first step's bindings run.
    pub fn start_with(
        catalog: &'c Catalog,
        workflow_id: &str,
        variables: VariableMap,
    ) -> Result<Self> {
        let workflow = catalog.require_workflow(workflow_id)?;
        for step in &workflow.steps {
            catalog.require_command(&step.command_id)?;
        }
        let mut run = Self {
            catalog,
            workflow,
            index: 0,
            forms: BTreeMap::new(),
            variables,
            status: BTreeMap::new(),
            bindings_applied: BTreeSet::new(),
            preview_overrides: BTreeMap::new(),
        };
        run.enter_step();
        Ok(run)
    }

    pub fn workflow(&self) -> &WorkflowDefinition {
        self.workflow
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_last_step(&self) -> bool {
        self.index + 1 >= self.workflow.steps.len()
    }

    pub fn current_step(&self) -> Option<&'c WorkflowStep> {
        self.workflow.steps.get(self.index)
    }

    pub fn current_command(&self) -> Option<&'c CommandDefinition> {
        self.current_step()
            .and_then(|s| self.catalog.command(&s.command_id))
    }

    pub fn variables(&self) -> &VariableMap {
        &self.variables
    }

    pub fn status(&self, step_id: &str) -> StepStatus {
        self.status.get(step_id).copied().unwrap_or_default()
    }

    pub fn form(&self, step_id: &str) -> Option<&FormState> {
        self.forms.get(step_id)
    }

    pub fn current_form(&self) -> Option<&FormState> {
        self.current_step().and_then(|s| self.forms.get(&s.step_id))
    }

    /// Context for guidance recommendations made during this run.
    pub fn guidance_context(&self) -> GuidanceContext {
        GuidanceContext::workflow(self.workflow.title())
    }

    /// Make sure the current step has a form and that its bindings have
    /// been applied exactly once. Returns whether bindings changed a field.
    pub fn enter_step(&mut self) -> bool {
        let (Some(step), Some(command)) = (self.current_step(), self.current_command()) else {
            return false;
        };
        let form = self
            .forms
            .entry(step.step_id.clone())
            .or_insert_with(|| FormState::init(command));
        if !self.bindings_applied.insert(step.step_id.clone()) {
            return false;
        }
        let changed = apply_bindings(step, command, form, &self.variables);
        if changed {
            tracing::debug!(step = %step.step_id, "applied auto-bindings");
        }
        changed
    }

    /// Re-run the current step's bindings against the current variables,
    /// whether or not they already ran on entry.
    pub fn apply_bindings(&mut self) -> bool {
        let (Some(step), Some(command)) = (self.current_step(), self.current_command()) else {
            return false;
        };
        self.bindings_applied.insert(step.step_id.clone());
        let form = self
            .forms
            .entry(step.step_id.clone())
            .or_insert_with(|| FormState::init(command));
        let changed = apply_bindings(step, command, form, &self.variables);
        if changed {
            self.preview_overrides.remove(&step.step_id);
            tracing::debug!(step = %step.step_id, "re-applied auto-bindings");
        }
        changed
    }

    /// Move to `index` and enter that step.
    pub fn go_to(&mut self, index: usize) -> Result<()> {
        if index >= self.workflow.steps.len() {
            return Err(CmdgenError::StepNotFound(format!(
                "{}#{index}",
                self.workflow.id
            )));
        }
        self.index = index;
        self.enter_step();
        Ok(())
    }

    pub fn go_to_step(&mut self, step_id: &str) -> Result<()> {
        let index = self
            .workflow
            .step_index(step_id)
            .ok_or_else(|| CmdgenError::StepNotFound(step_id.to_string()))?;
        self.go_to(index)
    }

    /// Advance one step; stays put on the last step.
    pub fn next_step(&mut self) -> bool {
        if self.is_last_step() {
            return false;
        }
        self.index += 1;
        self.enter_step();
        true
    }

    pub fn prev_step(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.index -= 1;
        self.enter_step();
        true
    }

    pub fn set_field(&mut self, field_id: &str, value: impl Into<FieldValue>) -> Result<()> {
        let (step, command) = self.current()?;
        command.require_field(field_id)?;
        self.forms
            .entry(step.step_id.clone())
            .or_insert_with(|| FormState::init(command))
            .set(field_id, value);
        self.preview_overrides.remove(&step.step_id);
        Ok(())
    }

    /// Mutable access to the current step's form for bulk edits. Drops any
    /// preview override, like `set_field`.
    pub fn edit_form(&mut self) -> Result<(&'c CommandDefinition, &mut FormState)> {
        let (step, command) = self.current()?;
        self.preview_overrides.remove(&step.step_id);
        let form = self
            .forms
            .entry(step.step_id.clone())
            .or_insert_with(|| FormState::init(command));
        Ok((command, form))
    }

    pub fn add_variable(&mut self, key: &str, value: &str) -> bool {
        add_variable(&mut self.variables, key, value)
    }

    /// Replace the rendered text of the current step with hand-edited text.
    pub fn set_preview_override(&mut self, text: impl Into<String>) -> Result<()> {
        let (step, _) = self.current()?;
        self.preview_overrides
            .insert(step.step_id.clone(), text.into());
        Ok(())
    }

    pub fn preview(&self) -> Result<Preview> {
        let (step, command) = self.current()?;
        let empty = FormState::new();
        let form = self.forms.get(&step.step_id).unwrap_or(&empty);
        Ok(Preview::build(command, form, &self.variables))
    }

    /// Text that would be generated for the current step.
    pub fn preview_text(&self) -> Result<String> {
        let (step, _) = self.current()?;
        let preview = self.preview()?;
        let override_text = self.preview_overrides.get(&step.step_id).map(String::as_str);
        Ok(preview.display_text(override_text).to_string())
    }

    /// Record the current step: history entry, guidance completion and
    /// captured outputs. The step is marked done; the cursor does not move.
    /// Storage failures are logged and never stop the run.
    pub fn generate(&mut self, kv: &dyn KvStore, now: DateTime<Utc>) -> Result<GeneratedStep> {
        let (step, command) = self.current()?;
        let text = self.preview_text()?;
        let form = self.forms.get(&step.step_id).cloned().unwrap_or_default();

        let entry = HistoryEntry::new(&command.id, form.clone(), text, now);
        if let Err(e) = HistoryStore::new(kv).add(entry.clone()) {
            tracing::warn!(step = %step.step_id, command = %command.id, error = %e, "failed to record history");
        }
        let guidance = GuidanceStore::new(kv).record_success(&command.id, command.stage, now);
        let captured = store_outputs(command, &form, &mut self.variables);
        self.status.insert(step.step_id.clone(), StepStatus::Done);

        tracing::debug!(step = %step.step_id, command = %command.id, captured, "step generated");
        Ok(GeneratedStep {
            entry,
            guidance,
            captured,
        })
    }

    /// Mark the current step skipped and advance when a later step exists.
    pub fn skip(&mut self) -> Result<()> {
        let (step, _) = self.current()?;
        self.status.insert(step.step_id.clone(), StepStatus::Skipped);
        self.next_step();
        Ok(())
    }

    /// Status of every step in order.
    pub fn progress(&self) -> Vec<(&'c WorkflowStep, StepStatus)> {
        self.workflow
            .steps
            .iter()
            .map(|s| (s, self.status(&s.step_id)))
            .collect()
    }

    fn current(&self) -> Result<(&'c WorkflowStep, &'c CommandDefinition)> {
        let step = self
            .current_step()
            .ok_or_else(|| CmdgenError::StepNotFound(format!("{}#{}", self.workflow.id, self.index)))?;
        let command = self.catalog.require_command(&step.command_id)?;
        Ok((step, command))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
