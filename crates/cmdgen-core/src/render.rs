//! Template rendering.
//!
//! Templates reference fields as `{{FIELD_ID}}` and variables as `{NAME}`.
//! Unresolved variables are emitted as `<<MISSING:NAME>>` so callers can list
//! them with [`find_missing`] without parsing the template again.

use crate::catalog::CommandDefinition;
use crate::form::{FieldValue, FormState, VariableMap};
use regex::{Captures, Regex};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::OnceLock;

pub const BOOL_TRUE: &str = "yes";
pub const BOOL_FALSE: &str = "no";
pub const LIST_BULLET: &str = "- ";

static PLACEHOLDER_RE: OnceLock<Regex> = OnceLock::new();
static MISSING_RE: OnceLock<Regex> = OnceLock::new();

fn placeholder_re() -> &'static Regex {
    PLACEHOLDER_RE.get_or_init(|| {
        Regex::new(
            r"\{\{\s*([A-Za-z_][A-Za-z0-9_.\-]*)\s*\}\}|\{([A-Za-z_][A-Za-z0-9_.\-]*)\}",
        )
        .unwrap()
    })
}

fn missing_re() -> &'static Regex {
    MISSING_RE.get_or_init(|| Regex::new(r"<<MISSING:([A-Za-z_][A-Za-z0-9_.\-]*)>>").unwrap())
}

pub fn missing_sentinel(name: &str) -> String {
    format!("<<MISSING:{name}>>")
}

/// Render `command`'s template. Pure; never fails.
pub fn render(command: &CommandDefinition, fields: &FormState, variables: &VariableMap) -> String {
    placeholder_re()
        .replace_all(&command.template, |caps: &Captures| {
            if let Some(field_id) = caps.get(1) {
                return render_field(command, fields, field_id.as_str());
            }
            let name = &caps[2];
            match variables.get(name) {
                Some(value) => value.clone(),
                None => missing_sentinel(name),
            }
        })
        .into_owned()
}

fn render_field(command: &CommandDefinition, fields: &FormState, field_id: &str) -> String {
    if command.field(field_id).is_none() {
        return String::new();
    }
    match fields.get(field_id) {
        None => String::new(),
        Some(FieldValue::Text(s)) => s.clone(),
        Some(FieldValue::Bool(b)) => (if *b { BOOL_TRUE } else { BOOL_FALSE }).to_string(),
        Some(FieldValue::List(items)) => items
            .iter()
            .map(|item| format!("{LIST_BULLET}{item}"))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

/// Unique sentinel names in `text`, in first-seen order.
pub fn find_missing(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    missing_re()
        .captures_iter(text)
        .map(|c| c[1].to_string())
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

// ---------------------------------------------------------------------------
// Preview
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Preview {
    pub text: String,
    pub missing: Vec<String>,
}

impl Preview {
    pub fn build(command: &CommandDefinition, fields: &FormState, variables: &VariableMap) -> Self {
        let text = render(command, fields, variables);
        let missing = find_missing(&text);
        Self { text, missing }
    }

    /// A user-edited override replaces the displayed text. Missing variables
    /// are still reported from the computed text.
    pub fn display_text<'a>(&'a self, override_text: Option<&'a str>) -> &'a str {
        override_text.unwrap_or(&self.text)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
