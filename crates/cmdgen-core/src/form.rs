use crate::catalog::{CommandDefinition, FieldDefinition};
use crate::types::{AttachmentMode, FieldType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Captured attachment text is cut to this many characters.
pub const ATTACHMENT_CAPTURE_LIMIT: usize = 2000;

/// Named string values substituted into `{NAME}` placeholders.
pub type VariableMap = BTreeMap<String, String>;

// ---------------------------------------------------------------------------
// FieldValue
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    pub fn empty_for(field_type: FieldType) -> Self {
        match field_type {
            FieldType::List => FieldValue::List(Vec::new()),
            FieldType::Boolean => FieldValue::Bool(false),
            _ => FieldValue::Text(String::new()),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// True for blank text and empty lists. Booleans are never blank.
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Bool(_) => false,
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::List(items) => items.is_empty(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(items: Vec<String>) -> Self {
        FieldValue::List(items)
    }
}

// ---------------------------------------------------------------------------
// Attachment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub content: String,
}

impl Attachment {
    pub fn capture(name: impl Into<String>, text: &str) -> Self {
        Self {
            name: name.into(),
            content: text.chars().take(ATTACHMENT_CAPTURE_LIMIT).collect(),
        }
    }

    fn render(&self, mode: AttachmentMode) -> String {
        match mode {
            AttachmentMode::Path => format!("- File: {}", self.name),
            AttachmentMode::Snippet | AttachmentMode::Full => {
                format!("- File: {}\n  ---\n  {}\n  ---", self.name, self.content)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// FormState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormState {
    values: BTreeMap<String, FieldValue>,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh form for `command`: every field gets its default, or the
    /// empty value for its type.
    pub fn init(command: &CommandDefinition) -> Self {
        let values = command
            .fields
            .iter()
            .map(|f| {
                let value = f
                    .default_value
                    .clone()
                    .unwrap_or_else(|| FieldValue::empty_for(f.field_type));
                (f.id.clone(), value)
            })
            .collect();
        Self { values }
    }

    pub fn get(&self, field_id: &str) -> Option<&FieldValue> {
        self.values.get(field_id)
    }

    pub fn set(&mut self, field_id: impl Into<String>, value: impl Into<FieldValue>) {
        self.values.insert(field_id.into(), value.into());
    }

    pub fn clear_field(&mut self, field: &FieldDefinition) {
        self.values
            .insert(field.id.clone(), FieldValue::empty_for(field.field_type));
    }

    /// Text value of a field, or "" when absent or not text.
    pub fn text(&self, field_id: &str) -> &str {
        self.get(field_id).and_then(FieldValue::as_text).unwrap_or("")
    }

    pub fn list(&self, field_id: &str) -> &[String] {
        self.get(field_id).and_then(FieldValue::as_list).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.values.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Append attachment references to `field`. List fields get one
    /// `File: name` entry per attachment; text fields get a block appended
    /// after the existing text.
    pub fn insert_attachments(
        &mut self,
        field: &FieldDefinition,
        attachments: &[Attachment],
        mode: AttachmentMode,
    ) {
        if attachments.is_empty() || !field.field_type.accepts_attachments() {
            return;
        }
        if field.field_type.is_list() {
            let mut items = self.list(&field.id).to_vec();
            items.extend(attachments.iter().map(|a| format!("File: {}", a.name)));
            self.set(field.id.clone(), items);
            return;
        }
        let joined = attachments
            .iter()
            .map(|a| a.render(mode))
            .collect::<Vec<_>>()
            .join("\n");
        let combined = format!("{}\n{}", self.text(&field.id), joined);
        self.set(field.id.clone(), combined.trim().to_string());
    }
}

// ---------------------------------------------------------------------------
// Completeness
// ---------------------------------------------------------------------------

pub fn is_field_filled(field: &FieldDefinition, value: Option<&FieldValue>) -> bool {
    match (field.field_type, value) {
        (_, None) => false,
        (FieldType::List, Some(v)) => v.as_list().is_some_and(|items| !items.is_empty()),
        (FieldType::Boolean, Some(v)) => matches!(v, FieldValue::Bool(true)),
        (_, Some(v)) => !v.is_blank(),
    }
}

pub fn missing_required<'a>(
    command: &'a CommandDefinition,
    form: &FormState,
) -> Vec<&'a FieldDefinition> {
    command
        .fields
        .iter()
        .filter(|f| f.required && !is_field_filled(f, form.get(&f.id)))
        .collect()
}

/// Advisory: whether every required field is filled.
pub fn can_generate(command: &CommandDefinition, form: &FormState) -> bool {
    missing_required(command, form).is_empty()
}

/// Split raw multi-line input into trimmed, non-blank list items.
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Insert a user-entered variable. Blank keys or values are ignored.
pub fn add_variable(vars: &mut VariableMap, key: &str, value: &str) -> bool {
    let (key, value) = (key.trim(), value.trim());
    if key.is_empty() || value.is_empty() {
        return false;
    }
    vars.insert(key.to_string(), value.to_string());
    true
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    fn command(id: &str) -> CommandDefinition {
        Catalog::starter().command(id).cloned().unwrap()
    }

    #[test]
    fn init_uses_defaults_and_type_empties() {
        let cmd = command("senior-explore");
        let form = FormState::init(&cmd);
        assert_eq!(form.text("INTENT"), "");
        assert_eq!(form.list("FOCUS_AREAS"), &[] as &[String]);
        assert_eq!(form.get("DEPTH"), Some(&FieldValue::from("standard")));
        assert_eq!(form.get("INCLUDE_RISKS"), Some(&FieldValue::Bool(false)));
    }

    #[test]
    fn required_fields_gate_generation() {
        let cmd = command("senior-explore");
        let mut form = FormState::init(&cmd);
        assert!(!can_generate(&cmd, &form));
        let missing: Vec<_> = missing_required(&cmd, &form)
            .iter()
            .map(|f| f.id.as_str())
            .collect();
        assert_eq!(missing, vec!["INTENT"]);

        form.set("INTENT", "   ");
        assert!(!can_generate(&cmd, &form));
        form.set("INTENT", "Map the auth module");
        assert!(can_generate(&cmd, &form));
    }

    #[test]
    fn boolean_filled_only_when_true() {
        let cmd = command("senior-explore");
        let field = cmd.field("INCLUDE_RISKS").unwrap();
        assert!(!is_field_filled(field, Some(&FieldValue::Bool(false))));
        assert!(is_field_filled(field, Some(&FieldValue::Bool(true))));
        assert!(!is_field_filled(field, None));
    }

    #[test]
    fn parse_list_drops_blank_lines() {
        assert_eq!(
            parse_list("  a \n\n b\n   \n"),
            vec!["a".to_string(), "b".to_string()]
        );
    }

    #[test]
    fn add_variable_trims_and_rejects_blanks() {
        let mut vars = VariableMap::new();
        assert!(add_variable(&mut vars, " PLAN ", " docs/plan.md "));
        assert!(!add_variable(&mut vars, "EMPTY", "  "));
        assert!(!add_variable(&mut vars, " ", "x"));
        assert_eq!(vars.get("PLAN").map(String::as_str), Some("docs/plan.md"));
        assert_eq!(vars.len(), 1);
    }

    #[test]
    fn attachments_into_list_field() {
        let cmd = command("senior-explore");
        let mut form = FormState::init(&cmd);
        let field = cmd.field("FOCUS_AREAS").unwrap();
        let files = vec![Attachment::capture("main.rs", "fn main() {}")];
        form.insert_attachments(field, &files, AttachmentMode::Snippet);
        assert_eq!(form.list("FOCUS_AREAS"), &["File: main.rs".to_string()]);
    }

    #[test]
    fn attachments_into_text_field() {
        let cmd = command("senior-explore");
        let mut form = FormState::init(&cmd);
        form.set("CONTEXT", "Existing notes");
        let field = cmd.field("CONTEXT").unwrap();
        let files = vec![Attachment::capture("a.txt", "hello")];

        form.insert_attachments(field, &files, AttachmentMode::Path);
        assert_eq!(form.text("CONTEXT"), "Existing notes\n- File: a.txt");

        form.insert_attachments(field, &files, AttachmentMode::Snippet);
        assert!(form.text("CONTEXT").ends_with("- File: a.txt\n  ---\n  hello\n  ---"));
    }

    #[test]
    fn attachment_capture_is_capped() {
        let big = "x".repeat(ATTACHMENT_CAPTURE_LIMIT + 50);
        let a = Attachment::capture("big.log", &big);
        assert_eq!(a.content.chars().count(), ATTACHMENT_CAPTURE_LIMIT);
    }

    #[test]
    fn form_state_json_shape() {
        let mut form = FormState::new();
        form.set("A", "text");
        form.set("B", true);
        form.set("C", vec!["x".to_string()]);
        let json = serde_json::to_string(&form).unwrap();
        assert_eq!(json, r#"{"A":"text","B":true,"C":["x"]}"#);
        let back: FormState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, form);
    }
}
