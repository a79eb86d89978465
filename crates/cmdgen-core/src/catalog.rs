use crate::error::{CmdgenError, Result};
use crate::form::FieldValue;
use crate::types::{BindingMode, ConstraintLevel, FieldType, StageKey};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

const STARTER_CATALOG: &str = include_str!("starter_catalog.yaml");

// ---------------------------------------------------------------------------
// Field / command definitions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl FieldDefinition {
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputDefinition {
    pub id: String,
    pub source_field_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandDefinition {
    pub id: String,
    pub display_name: String,
    pub stage: StageKey,
    pub constraint_level: ConstraintLevel,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
    pub template: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<OutputDefinition>,
}

impl CommandDefinition {
    pub fn field(&self, id: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.id == id)
    }

    pub fn require_field(&self, id: &str) -> Result<&FieldDefinition> {
        self.field(id).ok_or_else(|| CmdgenError::FieldNotFound {
            command: self.id.clone(),
            field: id.to_string(),
        })
    }

    /// First field whose id contains `needle`, ignoring case.
    pub fn field_matching(&self, needle: &str) -> Option<&FieldDefinition> {
        let needle = needle.to_ascii_uppercase();
        self.fields
            .iter()
            .find(|f| f.id.to_ascii_uppercase().contains(&needle))
    }

    /// Where attachments go when the user has not picked a field.
    pub fn default_attachment_target(&self) -> Option<&FieldDefinition> {
        self.field("CONTEXT").or_else(|| self.fields.first())
    }
}

// ---------------------------------------------------------------------------
// Workflow definitions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoBinding {
    pub from_var: String,
    pub to_field_id: String,
    #[serde(default)]
    pub mode: BindingMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub step_id: String,
    pub command_id: String,
    #[serde(default)]
    pub optional: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub auto_bindings: Vec<AutoBinding>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub steps: Vec<WorkflowStep>,
}

impl WorkflowDefinition {
    pub fn title(&self) -> &str {
        if self.title.is_empty() {
            &self.id
        } else {
            &self.title
        }
    }

    pub fn step(&self, step_id: &str) -> Option<&WorkflowStep> {
        self.steps.iter().find(|s| s.step_id == step_id)
    }

    pub fn step_index(&self, step_id: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.step_id == step_id)
    }

    pub fn uses_command(&self, command_id: &str) -> bool {
        self.steps.iter().any(|s| s.command_id == command_id)
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub commands: Vec<CommandDefinition>,
    #[serde(default)]
    pub workflows: Vec<WorkflowDefinition>,
}

impl Catalog {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CmdgenError::NotInitialized);
        }
        let data = std::fs::read_to_string(path)?;
        Self::from_yaml(&data)
    }

    pub fn from_yaml(data: &str) -> Result<Self> {
        let catalog: Catalog = serde_yaml::from_str(data)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// The catalog shipped with `cmdgen init`.
    pub fn starter() -> Self {
        // Covered by `starter_catalog_is_valid`.
        serde_yaml::from_str(STARTER_CATALOG).unwrap()
    }

    pub fn starter_yaml() -> &'static str {
        STARTER_CATALOG
    }

    pub fn validate(&self) -> Result<()> {
        let mut command_ids = HashSet::new();
        for cmd in &self.commands {
            if !command_ids.insert(cmd.id.as_str()) {
                return Err(invalid(format!("duplicate command id '{}'", cmd.id)));
            }
            let mut field_ids = HashSet::new();
            for field in &cmd.fields {
                if !field_ids.insert(field.id.as_str()) {
                    return Err(invalid(format!(
                        "duplicate field '{}' on command '{}'",
                        field.id, cmd.id
                    )));
                }
                if field.field_type == FieldType::Select {
                    if let Some(FieldValue::Text(default)) = &field.default_value {
                        if !field.options.contains(default) {
                            return Err(invalid(format!(
                                "default '{default}' of '{}.{}' is not one of its options",
                                cmd.id, field.id
                            )));
                        }
                    }
                }
            }
            for output in &cmd.outputs {
                if cmd.field(&output.source_field_id).is_none() {
                    return Err(invalid(format!(
                        "output '{}' of '{}' reads unknown field '{}'",
                        output.id, cmd.id, output.source_field_id
                    )));
                }
            }
        }

        let mut workflow_ids = HashSet::new();
        for wf in &self.workflows {
            if !workflow_ids.insert(wf.id.as_str()) {
                return Err(invalid(format!("duplicate workflow id '{}'", wf.id)));
            }
            let mut step_ids = HashSet::new();
            for step in &wf.steps {
                if !step_ids.insert(step.step_id.as_str()) {
                    return Err(invalid(format!(
                        "duplicate step '{}' in workflow '{}'",
                        step.step_id, wf.id
                    )));
                }
                let Some(cmd) = self.command(&step.command_id) else {
                    return Err(invalid(format!(
                        "step '{}.{}' references unknown command '{}'",
                        wf.id, step.step_id, step.command_id
                    )));
                };
                for binding in &step.auto_bindings {
                    if cmd.field(&binding.to_field_id).is_none() {
                        return Err(invalid(format!(
                            "binding in '{}.{}' targets unknown field '{}'",
                            wf.id, step.step_id, binding.to_field_id
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    pub fn command(&self, id: &str) -> Option<&CommandDefinition> {
        self.commands.iter().find(|c| c.id == id)
    }

    pub fn require_command(&self, id: &str) -> Result<&CommandDefinition> {
        self.command(id)
            .ok_or_else(|| CmdgenError::CommandNotFound(id.to_string()))
    }

    pub fn workflow(&self, id: &str) -> Option<&WorkflowDefinition> {
        self.workflows.iter().find(|w| w.id == id)
    }

    pub fn require_workflow(&self, id: &str) -> Result<&WorkflowDefinition> {
        self.workflow(id)
            .ok_or_else(|| CmdgenError::WorkflowNotFound(id.to_string()))
    }

    pub fn command_stage_map(&self) -> HashMap<&str, StageKey> {
        self.commands
            .iter()
            .map(|c| (c.id.as_str(), c.stage))
            .collect()
    }

    /// Commands ordered by stage, then constraint level, then display name.
    pub fn sorted_commands(&self) -> Vec<&CommandDefinition> {
        let mut sorted: Vec<&CommandDefinition> = self.commands.iter().collect();
        sorted.sort_by(|a, b| {
            a.stage
                .cmp(&b.stage)
                .then(a.constraint_level.cmp(&b.constraint_level))
                .then_with(|| a.display_name.cmp(&b.display_name))
        });
        sorted
    }

    pub fn grouped_by_stage(&self) -> Vec<(StageKey, Vec<&CommandDefinition>)> {
        let sorted = self.sorted_commands();
        StageKey::all()
            .iter()
            .map(|stage| {
                let cmds: Vec<&CommandDefinition> =
                    sorted.iter().copied().filter(|c| c.stage == *stage).collect();
                (*stage, cmds)
            })
            .filter(|(_, cmds)| !cmds.is_empty())
            .collect()
    }

    /// First workflow that includes `command_id` as one of its steps.
    pub fn workflow_suggestion(&self, command_id: &str) -> Option<&WorkflowDefinition> {
        self.workflows.iter().find(|w| w.uses_command(command_id))
    }
}

fn invalid(msg: String) -> CmdgenError {
    CmdgenError::InvalidCatalog(msg)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn starter_catalog_is_valid() {
        let catalog = Catalog::from_yaml(Catalog::starter_yaml()).unwrap();
        assert!(catalog.commands.len() >= 10);
        assert!(catalog.workflow("workflow-d").is_some());
    }

    #[test]
    fn maps_known_commands_to_stages() {
        let catalog = Catalog::starter();
        let map = catalog.command_stage_map();
        assert_eq!(map["senior-explore"], StageKey::Explore);
        assert_eq!(map["plan-lite"], StageKey::Plan);
        assert_eq!(map["review-strict"], StageKey::Review);
        assert_eq!(map["implement-plan"], StageKey::Implement);
        assert_eq!(map["finalize-work"], StageKey::Finalize);
    }

    #[test]
    fn sorted_by_stage_then_constraint() {
        let catalog = Catalog::starter();
        let ids: Vec<&str> = catalog
            .sorted_commands()
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(ids[0], "explore-lite");
        assert_eq!(ids[1], "senior-explore");
        assert_eq!(ids.last(), Some(&"finalize-work"));
    }

    #[test]
    fn groups_follow_stage_order() {
        let catalog = Catalog::starter();
        let stages: Vec<StageKey> = catalog
            .grouped_by_stage()
            .into_iter()
            .map(|(s, _)| s)
            .collect();
        assert_eq!(stages, StageKey::all().to_vec());
    }

    #[test]
    fn workflow_suggestion_finds_first_user() {
        let catalog = Catalog::starter();
        assert_eq!(
            catalog.workflow_suggestion("senior-explore").map(|w| w.id.as_str()),
            Some("workflow-a")
        );
        assert_eq!(
            catalog.workflow_suggestion("backend-plan").map(|w| w.id.as_str()),
            Some("workflow-d")
        );
        assert!(catalog.workflow_suggestion("finalize-lite").is_none());
    }

    #[test]
    fn rejects_step_with_unknown_command() {
        let yaml = r#"
commands: []
workflows:
  - id: wf
    steps:
      - step_id: one
        command_id: ghost
"#;
        let err = Catalog::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, CmdgenError::InvalidCatalog(_)));
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn rejects_binding_to_unknown_field() {
        let yaml = r#"
commands:
  - id: a
    display_name: A
    stage: plan
    constraint_level: lite
    template: "{{X}}"
    fields:
      - id: X
        type: short_text
workflows:
  - id: wf
    steps:
      - step_id: one
        command_id: a
        auto_bindings:
          - from_var: V
            to_field_id: Y
"#;
        let err = Catalog::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("unknown field 'Y'"));
    }

    #[test]
    fn rejects_select_default_outside_options() {
        let yaml = r#"
commands:
  - id: a
    display_name: A
    stage: plan
    constraint_level: lite
    template: ""
    fields:
      - id: MODE
        type: select
        options: [one, two]
        default_value: three
"#;
        assert!(Catalog::from_yaml(yaml).is_err());
    }

    #[test]
    fn load_missing_file_is_not_initialized() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Catalog::load(&dir.path().join("catalog.yaml")),
            Err(CmdgenError::NotInitialized)
        ));
    }

    #[test]
    fn load_from_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.yaml");
        std::fs::write(&path, Catalog::starter_yaml()).unwrap();
        let catalog = Catalog::load(&path).unwrap();
        assert!(catalog.command("review-only").is_some());
    }
}
