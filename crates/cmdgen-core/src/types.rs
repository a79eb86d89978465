use crate::error::CmdgenError;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// StageKey
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKey {
    Explore,
    Plan,
    Review,
    Implement,
    Finalize,
}

impl StageKey {
    pub const COUNT: usize = 5;

    pub fn all() -> &'static [StageKey] {
        &[
            StageKey::Explore,
            StageKey::Plan,
            StageKey::Review,
            StageKey::Implement,
            StageKey::Finalize,
        ]
    }

    pub fn first() -> StageKey {
        StageKey::Explore
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn next(self) -> Option<StageKey> {
        StageKey::all().get(self.index() + 1).copied()
    }

    /// Stages strictly earlier than `self` in the fixed order.
    pub fn predecessors(self) -> &'static [StageKey] {
        &StageKey::all()[..self.index()]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StageKey::Explore => "explore",
            StageKey::Plan => "plan",
            StageKey::Review => "review",
            StageKey::Implement => "implement",
            StageKey::Finalize => "finalize",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StageKey::Explore => "Explore",
            StageKey::Plan => "Plan",
            StageKey::Review => "Review",
            StageKey::Implement => "Implement",
            StageKey::Finalize => "Finalize",
        }
    }
}

impl fmt::Display for StageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StageKey {
    type Err = CmdgenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "explore" => Ok(StageKey::Explore),
            "plan" => Ok(StageKey::Plan),
            "review" => Ok(StageKey::Review),
            "implement" => Ok(StageKey::Implement),
            "finalize" => Ok(StageKey::Finalize),
            _ => Err(CmdgenError::InvalidStage(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// StageStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    #[default]
    Todo,
    Active,
    Done,
}

impl StageStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StageStatus::Todo => "todo",
            StageStatus::Active => "active",
            StageStatus::Done => "done",
        }
    }
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ConstraintLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintLevel {
    Lite,
    Medium,
    Strong,
}

impl ConstraintLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            ConstraintLevel::Lite => "lite",
            ConstraintLevel::Medium => "medium",
            ConstraintLevel::Strong => "strong",
        }
    }
}

impl fmt::Display for ConstraintLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// FieldType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    #[serde(alias = "text")]
    ShortText,
    #[serde(alias = "multiline", alias = "textarea")]
    MultilineText,
    #[serde(alias = "list_of_strings")]
    List,
    Boolean,
    #[serde(alias = "single_select")]
    Select,
    Path,
}

impl FieldType {
    pub fn is_list(self) -> bool {
        matches!(self, FieldType::List)
    }

    /// Attachments can be inserted into every free-form field.
    pub fn accepts_attachments(self) -> bool {
        !matches!(self, FieldType::Select | FieldType::Boolean)
    }
}

// ---------------------------------------------------------------------------
// BindingMode
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingMode {
    Set,
    #[default]
    #[serde(alias = "fill-if-empty", alias = "fillIfEmpty")]
    FillIfEmpty,
}

impl BindingMode {
    pub fn as_str(self) -> &'static str {
        match self {
            BindingMode::Set => "set",
            BindingMode::FillIfEmpty => "fill_if_empty",
        }
    }
}

impl fmt::Display for BindingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
}

// ---------------------------------------------------------------------------
// AttachmentMode
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentMode {
    Path,
    #[default]
    Snippet,
    Full,
}

impl std::str::FromStr for AttachmentMode {
    type Err = CmdgenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "path" => Ok(AttachmentMode::Path),
            "snippet" => Ok(AttachmentMode::Snippet),
            "full" => Ok(AttachmentMode::Full),
            _ => Err(CmdgenError::InvalidValue {
                kind: "attachment mode",
                value: s.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
