use crate::catalog::CommandDefinition;
use crate::error::{CmdgenError, Result};
use crate::form::FormState;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportKind {
    #[default]
    Markdown,
    Text,
    Json,
}

impl ExportKind {
    pub fn extension(self) -> &'static str {
        match self {
            ExportKind::Markdown => "md",
            ExportKind::Text => "txt",
            ExportKind::Json => "json",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            ExportKind::Markdown => "text/markdown",
            ExportKind::Text => "text/plain",
            ExportKind::Json => "application/json",
        }
    }
}

impl fmt::Display for ExportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportKind {
    type Err = CmdgenError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "md" | "markdown" => Ok(ExportKind::Markdown),
            "txt" | "text" => Ok(ExportKind::Text),
            "json" => Ok(ExportKind::Json),
            other => Err(CmdgenError::InvalidValue {
                kind: "export kind",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportPayload {
    pub filename: String,
    pub content: String,
    pub mime: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FieldSnapshot<'a> {
    command_id: &'a str,
    fields: &'a FormState,
}

/// Filesystem-safe rendering of `timestamp`: ISO-8601 with `:` and `.`
/// replaced by `-`.
pub fn file_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-")
}

/// Build the downloadable form of a rendered command. Nothing is written.
pub fn export_payload(
    command: &CommandDefinition,
    fields: &FormState,
    text: &str,
    kind: ExportKind,
    timestamp: DateTime<Utc>,
) -> Result<ExportPayload> {
    let ts = file_timestamp(timestamp);
    let filename = format!("{}-{ts}.{}", command.id, kind.extension());
    let content = match kind {
        ExportKind::Text => text.to_string(),
        ExportKind::Json => serde_json::to_string_pretty(&FieldSnapshot {
            command_id: &command.id,
            fields,
        })?,
        ExportKind::Markdown => {
            let snapshot = serde_json::to_string_pretty(fields)?;
            format!(
                "# {}\n\nGenerated: {ts}\n\n## Fields\n```json\n{snapshot}\n```\n\n## Command\n```\n{text}\n```\n",
                command.display_name
            )
        }
    };
    Ok(ExportPayload {
        filename,
        content,
        mime: kind.mime(),
    })
}
