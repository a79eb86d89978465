//! Advisory hints on how well intent, context and constraints are written.
//!
//! Never blocks generation.

use crate::catalog::CommandDefinition;
use crate::form::{FieldValue, FormState};
use serde::{Deserialize, Serialize};
use std::fmt;

const INTENT_MIN_CHARS: usize = 12;
const CONTEXT_MIN_CHARS: usize = 16;
const CONSTRAINTS_MIN_CHARS: usize = 8;

const ACTION_VERBS: &[&str] = &[
    "build", "create", "design", "implement", "analyze", "summarize", "fix", "refactor", "test",
    "review", "generate", "plan", "optimize", "improve", "draft", "translate", "write", "make",
    "derive", "explain", "compare", "debug", "investigate", "实现", "生成", "分析", "设计",
    "编写", "优化", "修复", "整理", "总结", "评审", "规划", "制作", "对比", "排查", "重构",
];

const CONTEXT_HINTS: &[&str] = &[
    "system", "scope", "environment", "context", "background", "module", "service", "api",
    "database", "限制", "范围", "上下文", "背景", "系统", "环境", "模块", "服务", "接口",
    "数据库",
];

// ---------------------------------------------------------------------------
// QualityFeedback
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityStatus {
    Ok,
    Warning,
    Weak,
}

impl QualityStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            QualityStatus::Ok => "ok",
            QualityStatus::Warning => "warning",
            QualityStatus::Weak => "weak",
        }
    }
}

impl fmt::Display for QualityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QualityFeedback {
    pub status: QualityStatus,
    pub message: &'static str,
}

fn feedback(status: QualityStatus, message: &'static str) -> QualityFeedback {
    QualityFeedback { status, message }
}

fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn contains_any(text: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| text.contains(n))
}

// ---------------------------------------------------------------------------
// Evaluators
// ---------------------------------------------------------------------------

pub fn evaluate_intent(raw: &str) -> QualityFeedback {
    let text = normalize(raw);
    if text.is_empty() {
        return feedback(QualityStatus::Weak, "Intent is empty; describe the goal.");
    }
    let has_verb = contains_any(&text, ACTION_VERBS);
    let long_enough = text.chars().count() >= INTENT_MIN_CHARS;
    match (has_verb, long_enough) {
        (true, true) => feedback(QualityStatus::Ok, "Intent states a clear goal."),
        (false, _) => feedback(
            QualityStatus::Warning,
            "Add an action verb so the task is easy to locate.",
        ),
        (true, false) => feedback(
            QualityStatus::Warning,
            "Intent is short; add detail about the goal.",
        ),
    }
}

pub fn evaluate_context(raw: &str) -> QualityFeedback {
    let text = normalize(raw);
    if text.is_empty() {
        return feedback(
            QualityStatus::Weak,
            "Context is empty; output quality may suffer.",
        );
    }
    let has_hint = contains_any(&text, CONTEXT_HINTS);
    let long_enough = text.chars().count() >= CONTEXT_MIN_CHARS;
    match (has_hint, long_enough) {
        (true, true) => feedback(QualityStatus::Ok, "Context covers system or scope."),
        (false, _) => feedback(
            QualityStatus::Warning,
            "Context is thin; mention the scope or system background.",
        ),
        (true, false) => feedback(
            QualityStatus::Warning,
            "Context could be more specific.",
        ),
    }
}

pub fn evaluate_constraints(raw: &str) -> QualityFeedback {
    let text = normalize(raw);
    if text.is_empty() {
        return feedback(
            QualityStatus::Warning,
            "Constraints are empty; limits make the output easier to control.",
        );
    }
    if text.chars().count() < CONSTRAINTS_MIN_CHARS {
        return feedback(
            QualityStatus::Warning,
            "Constraints are short; add the limiting details.",
        );
    }
    feedback(QualityStatus::Ok, "Constraints list the key limits.")
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QualityReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<QualityFeedback>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<QualityFeedback>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraints: Option<QualityFeedback>,
}

impl QualityReport {
    /// Evaluate whichever of the intent, context and constraints fields the
    /// command declares. A command without such fields gets an empty report.
    pub fn for_command(command: &CommandDefinition, form: &FormState) -> Self {
        let eval = |needle: &str, f: fn(&str) -> QualityFeedback| {
            command
                .field_matching(needle)
                .map(|field| f(&flatten(form.get(&field.id))))
        };
        Self {
            intent: eval("INTENT", evaluate_intent),
            context: eval("CONTEXT", evaluate_context),
            constraints: eval("CONSTRAINTS", evaluate_constraints),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &QualityFeedback)> {
        [
            ("intent", self.intent.as_ref()),
            ("context", self.context.as_ref()),
            ("constraints", self.constraints.as_ref()),
        ]
        .into_iter()
        .filter_map(|(name, fb)| fb.map(|fb| (name, fb)))
    }
}

fn flatten(value: Option<&FieldValue>) -> String {
    match value {
        None => String::new(),
        Some(FieldValue::Text(s)) => s.clone(),
        Some(FieldValue::List(items)) => items.join("\n"),
        Some(FieldValue::Bool(b)) => b.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    #[test]
    fn intent_rules() {
        assert_eq!(evaluate_intent("   ").status, QualityStatus::Weak);
        assert_eq!(evaluate_intent("the thing").status, QualityStatus::Warning);
        assert_eq!(evaluate_intent("fix it").status, QualityStatus::Warning);
        assert_eq!(
            evaluate_intent("Refactor the session cache layer").status,
            QualityStatus::Ok
        );
        assert_eq!(evaluate_intent("重构用户登录模块的缓存逻辑").status, QualityStatus::Ok);
    }

    #[test]
    fn intent_length_is_counted_in_chars() {
        assert_eq!(evaluate_intent("重构缓存").status, QualityStatus::Warning);
    }

    #[test]
    fn context_rules() {
        assert_eq!(evaluate_context("").status, QualityStatus::Weak);
        assert_eq!(
            evaluate_context("just some words here").status,
            QualityStatus::Warning
        );
        assert_eq!(evaluate_context("api v2").status, QualityStatus::Warning);
        assert_eq!(
            evaluate_context("Billing service talks to the ledger database").status,
            QualityStatus::Ok
        );
    }

    #[test]
    fn constraint_rules() {
        assert_eq!(evaluate_constraints("").status, QualityStatus::Warning);
        assert_eq!(evaluate_constraints("no io").status, QualityStatus::Warning);
        assert_eq!(
            evaluate_constraints("no new dependencies").status,
            QualityStatus::Ok
        );
    }

    #[test]
    fn report_covers_declared_fields_only() {
        let catalog = Catalog::starter();
        let cmd = catalog.command("senior-explore").unwrap();
        let mut form = FormState::init(cmd);
        form.set("INTENT", "Investigate slow checkout requests");

        let report = QualityReport::for_command(cmd, &form);
        assert_eq!(report.intent.as_ref().unwrap().status, QualityStatus::Ok);
        assert_eq!(report.context.as_ref().unwrap().status, QualityStatus::Weak);
        assert!(report.constraints.is_none());
        assert_eq!(report.iter().count(), 2);
    }
}
