use crate::project::Project;
use anyhow::Context;
use chrono::Utc;
use cmdgen_core::{
    catalog::{CommandDefinition, FieldDefinition},
    draft::{DraftAutosave, DraftStore, GeneratorDraft},
    form::{add_variable, parse_list, Attachment, FieldValue, FormState, VariableMap},
    types::{AttachmentMode, FieldType},
};
use std::path::{Path, PathBuf};

/// Split `KEY=VALUE`. The value may itself contain `=`.
pub fn split_assignment(raw: &str) -> anyhow::Result<(&str, &str)> {
    raw.split_once('=')
        .filter(|(k, _)| !k.trim().is_empty())
        .with_context(|| format!("expected KEY=VALUE, got '{raw}'"))
}

/// Parse a user-typed value for `field`. List values arrive one item per
/// flag and are appended by the caller.
pub fn parse_value(field: &FieldDefinition, raw: &str) -> anyhow::Result<FieldValue> {
    match field.field_type {
        FieldType::Boolean => match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "y" | "1" | "on" => Ok(FieldValue::Bool(true)),
            "false" | "no" | "n" | "0" | "off" | "" => Ok(FieldValue::Bool(false)),
            other => anyhow::bail!("field '{}' expects yes or no, got '{other}'", field.id),
        },
        FieldType::Select if !field.options.is_empty() => {
            if !field.options.iter().any(|o| o == raw) {
                anyhow::bail!(
                    "field '{}' must be one of: {}",
                    field.id,
                    field.options.join(", ")
                );
            }
            Ok(FieldValue::Text(raw.to_string()))
        }
        _ => Ok(FieldValue::Text(raw.to_string())),
    }
}

/// Apply `--field KEY=VALUE` assignments to `form`. Assignments to a list
/// field add items after the ones already present.
pub fn apply_fields(
    command: &CommandDefinition,
    form: &mut FormState,
    assignments: &[String],
) -> anyhow::Result<()> {
    for raw in assignments {
        let (key, value) = split_assignment(raw)?;
        let field = command.require_field(key.trim())?;
        if field.field_type.is_list() {
            let mut items = form.list(&field.id).to_vec();
            items.extend(parse_list(value));
            form.set(field.id.clone(), items);
        } else {
            form.set(field.id.clone(), parse_value(field, value)?);
        }
    }
    Ok(())
}

pub fn apply_vars(variables: &mut VariableMap, assignments: &[String]) -> anyhow::Result<()> {
    for raw in assignments {
        let (key, value) = split_assignment(raw)?;
        if !add_variable(variables, key, value) {
            tracing::warn!(variable = key, "ignoring blank variable");
        }
    }
    Ok(())
}

/// Options shared by commands that accept file attachments.
#[derive(clap::Args, Debug, Default)]
pub struct AttachArgs {
    /// Attach a file (repeatable)
    #[arg(long = "attach", value_name = "PATH")]
    pub files: Vec<PathBuf>,

    /// Field that receives attachments (default: CONTEXT or the first field)
    #[arg(long = "attach-to", value_name = "FIELD")]
    pub target: Option<String>,

    /// How attachments are inserted: path, snippet or full
    #[arg(long = "attach-mode", default_value = "snippet")]
    pub mode: String,
}

impl AttachArgs {
    pub fn load(&self) -> anyhow::Result<Vec<Attachment>> {
        self.files.iter().map(|p| read_attachment(p)).collect()
    }

    /// Read the attachments and insert them into `form`. Returns the ones
    /// that were inserted.
    pub fn apply(
        &self,
        command: &CommandDefinition,
        form: &mut FormState,
    ) -> anyhow::Result<Vec<Attachment>> {
        if self.files.is_empty() {
            return Ok(Vec::new());
        }
        let mode: AttachmentMode = self.mode.parse()?;
        let field = match &self.target {
            Some(id) => command.require_field(id)?,
            None => command
                .default_attachment_target()
                .with_context(|| format!("command '{}' has no fields", command.id))?,
        };
        let attachments = self.load()?;
        form.insert_attachments(field, &attachments, mode);
        Ok(attachments)
    }
}

// ---------------------------------------------------------------------------
// FormArgs
// ---------------------------------------------------------------------------

/// Options for commands that fill in one command's form.
#[derive(clap::Args, Debug)]
pub struct FormArgs {
    /// Command id
    pub command: String,

    /// Field value, KEY=VALUE (repeatable; each list assignment adds an item)
    #[arg(long = "field", short = 'f', value_name = "KEY=VALUE")]
    pub fields: Vec<String>,

    /// Template variable, NAME=VALUE (repeatable)
    #[arg(long = "var", value_name = "NAME=VALUE")]
    pub vars: Vec<String>,

    #[command(flatten)]
    pub attach: AttachArgs,

    /// Start from the saved draft when it is for the same command
    #[arg(long)]
    pub resume: bool,
}

/// A filled-in form for one command.
pub struct FilledForm<'p> {
    pub command: &'p CommandDefinition,
    pub form: FormState,
    pub variables: VariableMap,
    pub attachments: Vec<Attachment>,
    pub attachment_mode: AttachmentMode,
    pub attachment_target: String,
    edits: DraftAutosave,
}

impl FormArgs {
    pub fn fill<'p>(&self, project: &'p Project) -> anyhow::Result<FilledForm<'p>> {
        let command = project.catalog.require_command(&self.command)?;
        let mut filled = FilledForm {
            command,
            form: FormState::init(command),
            variables: VariableMap::new(),
            attachments: Vec::new(),
            attachment_mode: self.attach.mode.parse()?,
            attachment_target: command
                .default_attachment_target()
                .map(|f| f.id.clone())
                .unwrap_or_default(),
            edits: DraftAutosave::new(project.config.draft.debounce_ms),
        };

        if self.resume {
            match DraftStore::new(&project.store).load() {
                Some(draft) if draft.selected_command_id == command.id => {
                    tracing::debug!(saved_at = %draft.saved_at, "resuming draft");
                    filled.form = draft.form_state;
                    filled.variables = draft.variables;
                    filled.attachments = draft.attachments;
                    filled.attachment_mode = draft.attachment_mode;
                    if !draft.attachment_target.is_empty() {
                        filled.attachment_target = draft.attachment_target;
                    }
                }
                Some(draft) => tracing::warn!(
                    draft = %draft.selected_command_id,
                    "saved draft is for another command; starting fresh"
                ),
                None => tracing::debug!("no draft to resume"),
            }
        }

        let now = Utc::now();
        if !self.fields.is_empty() {
            apply_fields(command, &mut filled.form, &self.fields)?;
            filled.edits.touch(now);
        }
        if !self.vars.is_empty() {
            apply_vars(&mut filled.variables, &self.vars)?;
            filled.edits.touch(now);
        }
        let attached = self.attach.apply(command, &mut filled.form)?;
        if !attached.is_empty() {
            if let Some(target) = &self.attach.target {
                filled.attachment_target = target.clone();
            }
            filled.attachment_mode = self.attach.mode.parse()?;
            filled.attachments.extend(attached);
            filled.edits.touch(now);
        }
        Ok(filled)
    }
}

impl FilledForm<'_> {
    /// Persist the form as the draft if anything was edited. A failed write
    /// is logged and otherwise ignored.
    pub fn save_draft(&mut self, project: &Project) {
        if !self.edits.flush() {
            return;
        }
        let draft = GeneratorDraft {
            selected_command_id: self.command.id.clone(),
            form_state: self.form.clone(),
            variables: self.variables.clone(),
            attachments: self.attachments.clone(),
            attachment_target: self.attachment_target.clone(),
            attachment_mode: self.attachment_mode,
            preview_override: None,
            saved_at: Utc::now(),
        };
        if let Err(e) = DraftStore::new(&project.store).save(&draft) {
            tracing::warn!(error = %e, "failed to save draft");
        }
    }
}

fn read_attachment(path: &Path) -> anyhow::Result<Attachment> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read attachment {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(Attachment::capture(name, &text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmdgen_core::catalog::Catalog;

    #[test]
    fn split_keeps_equals_in_value() {
        assert_eq!(split_assignment("A=b=c").unwrap(), ("A", "b=c"));
        assert!(split_assignment("novalue").is_err());
        assert!(split_assignment("=x").is_err());
    }

    #[test]
    fn list_assignments_append() {
        let catalog = Catalog::starter();
        let cmd = catalog.command("senior-explore").unwrap();
        let mut form = FormState::init(cmd);
        form.set("FOCUS_AREAS", vec!["bound".to_string()]);
        apply_fields(
            cmd,
            &mut form,
            &["FOCUS_AREAS=auth".to_string(), "FOCUS_AREAS=billing".to_string()],
        )
        .unwrap();
        assert_eq!(
            form.list("FOCUS_AREAS"),
            ["bound".to_string(), "auth".to_string(), "billing".to_string()]
        );
    }

    #[test]
    fn select_and_bool_are_checked() {
        let catalog = Catalog::starter();
        let cmd = catalog.command("senior-explore").unwrap();
        let mut form = FormState::init(cmd);
        apply_fields(cmd, &mut form, &["DEPTH=deep".to_string(), "INCLUDE_RISKS=yes".to_string()])
            .unwrap();
        assert_eq!(form.text("DEPTH"), "deep");
        assert_eq!(form.get("INCLUDE_RISKS"), Some(&FieldValue::Bool(true)));
        assert!(apply_fields(cmd, &mut form, &["DEPTH=extreme".to_string()]).is_err());
        assert!(apply_fields(cmd, &mut form, &["NOPE=1".to_string()]).is_err());
    }
}
