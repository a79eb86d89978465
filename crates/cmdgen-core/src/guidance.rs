//! Stage-progression guidance.
//!
//! Tracks which of the five stages are done, which single stage is active,
//! and recommends the next command. Completion events are the only input.

use crate::types::{Severity, StageKey, StageStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

pub const HISTORY_CAPACITY: usize = 100;

// ---------------------------------------------------------------------------
// StageStatuses
// ---------------------------------------------------------------------------

/// Status of every stage. At most one stage is `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StageStatusRecord", into = "StageStatusRecord")]
pub struct StageStatuses([StageStatus; StageKey::COUNT]);

impl StageStatuses {
    pub fn initial() -> Self {
        let mut statuses = [StageStatus::Todo; StageKey::COUNT];
        statuses[StageKey::first().index()] = StageStatus::Active;
        Self(statuses)
    }

    /// Checked constructor: `None` if more than one stage is active.
    pub fn new(statuses: [StageStatus; StageKey::COUNT]) -> Option<Self> {
        let active = statuses
            .iter()
            .filter(|s| **s == StageStatus::Active)
            .count();
        (active <= 1).then_some(Self(statuses))
    }

    /// Lenient constructor: keeps the earliest active stage and demotes the
    /// rest to `Todo`.
    pub fn normalized(mut statuses: [StageStatus; StageKey::COUNT]) -> Self {
        let mut seen_active = false;
        for status in statuses.iter_mut() {
            if *status == StageStatus::Active {
                if seen_active {
                    *status = StageStatus::Todo;
                }
                seen_active = true;
            }
        }
        Self(statuses)
    }

    pub fn get(&self, stage: StageKey) -> StageStatus {
        self.0[stage.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (StageKey, StageStatus)> + '_ {
        StageKey::all().iter().map(|s| (*s, self.get(*s)))
    }

    pub fn active(&self) -> Option<StageKey> {
        self.iter()
            .find(|(_, status)| *status == StageStatus::Active)
            .map(|(stage, _)| stage)
    }

    pub fn first_not_done(&self) -> Option<StageKey> {
        self.iter()
            .find(|(_, status)| *status != StageStatus::Done)
            .map(|(stage, _)| stage)
    }

    pub fn done_count(&self) -> usize {
        self.0.iter().filter(|s| **s == StageStatus::Done).count()
    }

    /// Marks `stage` done and moves the single active marker forward.
    fn complete(&mut self, stage: StageKey) {
        self.0[stage.index()] = StageStatus::Done;
        for status in self.0.iter_mut() {
            if *status == StageStatus::Active {
                *status = StageStatus::Todo;
            }
        }
        let promote = match stage.next() {
            Some(next) if self.get(next) != StageStatus::Done => Some(next),
            _ => self.first_not_done(),
        };
        if let Some(next) = promote {
            self.0[next.index()] = StageStatus::Active;
        }
    }
}

impl Default for StageStatuses {
    fn default() -> Self {
        Self::initial()
    }
}

/// Wire shape of [`StageStatuses`]: one optional key per stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StageStatusRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    explore: Option<StageStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    plan: Option<StageStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    review: Option<StageStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    implement: Option<StageStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    finalize: Option<StageStatus>,
}

impl From<StageStatusRecord> for StageStatuses {
    fn from(r: StageStatusRecord) -> Self {
        let rest = [r.plan, r.review, r.implement, r.finalize];
        // A missing explore key defaults to active unless another stage
        // already holds the active marker.
        let explore = r.explore.unwrap_or_else(|| {
            if rest.contains(&Some(StageStatus::Active)) {
                StageStatus::Todo
            } else {
                StageStatus::Active
            }
        });
        let [plan, review, implement, finalize] = rest.map(Option::unwrap_or_default);
        Self::normalized([explore, plan, review, implement, finalize])
    }
}

impl From<StageStatuses> for StageStatusRecord {
    fn from(s: StageStatuses) -> Self {
        Self {
            explore: Some(s.get(StageKey::Explore)),
            plan: Some(s.get(StageKey::Plan)),
            review: Some(s.get(StageKey::Review)),
            implement: Some(s.get(StageKey::Implement)),
            finalize: Some(s.get(StageKey::Finalize)),
        }
    }
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionEvent {
    pub command: String,
    pub stage: StageKey,
    pub timestamp: DateTime<Utc>,
}

/// Newest-first completion log holding at most [`HISTORY_CAPACITY`] events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<CompletionEvent>", into = "Vec<CompletionEvent>")]
pub struct CompletionHistory {
    entries: VecDeque<CompletionEvent>,
}

impl CompletionHistory {
    pub fn push_front(&mut self, event: CompletionEvent) {
        self.entries.push_front(event);
        self.entries.truncate(HISTORY_CAPACITY);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn latest(&self) -> Option<&CompletionEvent> {
        self.entries.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompletionEvent> {
        self.entries.iter()
    }
}

impl From<Vec<CompletionEvent>> for CompletionHistory {
    fn from(mut events: Vec<CompletionEvent>) -> Self {
        events.truncate(HISTORY_CAPACITY);
        Self {
            entries: events.into(),
        }
    }
}

impl From<CompletionHistory> for Vec<CompletionEvent> {
    fn from(h: CompletionHistory) -> Self {
        h.entries.into()
    }
}

// ---------------------------------------------------------------------------
// GuidanceState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuidanceState {
    #[serde(default)]
    pub stage_status: StageStatuses,
    #[serde(default)]
    pub history: CompletionHistory,
    #[serde(default)]
    pub last: Option<CompletionEvent>,
}

impl GuidanceState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a completion event. The command is not checked against the
    /// stage.
    pub fn complete(&self, command: &str, stage: StageKey, timestamp: DateTime<Utc>) -> Self {
        let mut next = self.clone();
        next.stage_status.complete(stage);
        let event = CompletionEvent {
            command: command.to_string(),
            stage,
            timestamp,
        };
        next.history.push_front(event.clone());
        next.last = Some(event);
        next
    }

    /// True when an earlier stage than `stage` is still `Todo`. Advisory.
    pub fn is_out_of_order(&self, stage: StageKey) -> bool {
        stage
            .predecessors()
            .iter()
            .any(|s| self.stage_status.get(*s) == StageStatus::Todo)
    }

    pub fn target_stage(&self) -> (StageKey, bool) {
        match self.stage_status.active() {
            Some(stage) => (stage, true),
            None => (
                self.stage_status
                    .first_not_done()
                    .unwrap_or(StageKey::Finalize),
                false,
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Recommendation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuidanceContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_template: Option<String>,
}

impl GuidanceContext {
    pub fn workflow(template: impl Into<String>) -> Self {
        Self {
            workflow_template: Some(template.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub stage: StageKey,
    pub command: String,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
}

/// Default commands per stage, highest priority first.
pub const DEFAULT_COMMANDS: [(StageKey, &[&str]); StageKey::COUNT] = [
    (StageKey::Explore, &["senior-explore", "explore-lite"]),
    (StageKey::Plan, &["plan-lite", "produce-plan"]),
    (StageKey::Review, &["review-lite", "review-only", "review-strict"]),
    (
        StageKey::Implement,
        &["implement-standard", "implement-plan", "implement-lite"],
    ),
    (StageKey::Finalize, &["finalize-work", "finalize-lite"]),
];

/// Stage × workflow-template → command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuidanceOverride {
    pub stage: StageKey,
    pub workflow: String,
    pub command: String,
}

/// Built-in overrides. The backend workflow is matched by id or by title.
pub fn builtin_overrides() -> Vec<GuidanceOverride> {
    ["workflow-d", "Java backend"]
        .into_iter()
        .map(|workflow| GuidanceOverride {
            stage: StageKey::Plan,
            workflow: workflow.to_string(),
            command: "backend-plan".to_string(),
        })
        .collect()
}

pub struct Recommender {
    overrides: Vec<GuidanceOverride>,
}

impl Default for Recommender {
    fn default() -> Self {
        Self::new(builtin_overrides())
    }
}

impl Recommender {
    pub fn new(overrides: Vec<GuidanceOverride>) -> Self {
        Self { overrides }
    }

    /// Built-in table followed by `extra` rows.
    pub fn with_extra(extra: &[GuidanceOverride]) -> Self {
        let mut overrides = builtin_overrides();
        overrides.extend_from_slice(extra);
        Self::new(overrides)
    }

    pub fn default_command(stage: StageKey) -> &'static str {
        DEFAULT_COMMANDS[stage.index()].1[0]
    }

    pub fn command_for(&self, stage: StageKey, context: Option<&GuidanceContext>) -> String {
        let template = context.and_then(|c| c.workflow_template.as_deref());
        template
            .and_then(|t| {
                self.overrides
                    .iter()
                    .find(|o| o.stage == stage && o.workflow == t)
            })
            .map(|o| o.command.clone())
            .unwrap_or_else(|| Self::default_command(stage).to_string())
    }

    pub fn recommend(
        &self,
        state: &GuidanceState,
        context: Option<&GuidanceContext>,
    ) -> Recommendation {
        let (stage, continuing) = state.target_stage();
        let reason = if continuing {
            format!("Continue the stage in progress: {}.", stage.label())
        } else {
            format!("Next, move on to {}.", stage.label())
        };
        Recommendation {
            stage,
            command: self.command_for(stage, context),
            reason,
            severity: (stage == StageKey::Review).then_some(Severity::Warning),
        }
    }
}

/// Recommend with the built-in override table.
pub fn recommend(state: &GuidanceState, context: Option<&GuidanceContext>) -> Recommendation {
    Recommender::default().recommend(state, context)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
