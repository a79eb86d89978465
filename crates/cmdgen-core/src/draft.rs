use crate::error::Result;
use crate::form::{Attachment, FormState, VariableMap};
use crate::store::{read_json, write_json, KvStore, DRAFT_KEY};
use crate::types::AttachmentMode;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_DEBOUNCE_MS: u64 = 400;

// ---------------------------------------------------------------------------
// GeneratorDraft
// ---------------------------------------------------------------------------

/// Snapshot of an in-progress standalone session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorDraft {
    pub selected_command_id: String,
    #[serde(default)]
    pub form_state: FormState,
    #[serde(default)]
    pub variables: VariableMap,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub attachment_target: String,
    #[serde(default)]
    pub attachment_mode: AttachmentMode,
    #[serde(default)]
    pub preview_override: Option<String>,
    pub saved_at: DateTime<Utc>,
}

pub struct DraftStore<'a> {
    kv: &'a dyn KvStore,
}

impl<'a> DraftStore<'a> {
    pub fn new(kv: &'a dyn KvStore) -> Self {
        Self { kv }
    }

    /// `None` when nothing was saved or the slot does not hold a draft.
    pub fn load(&self) -> Option<GeneratorDraft> {
        let value = read_json(self.kv, DRAFT_KEY)?;
        match serde_json::from_value(value) {
            Ok(draft) => Some(draft),
            Err(e) => {
                tracing::debug!(error = %e, "discarding unreadable draft");
                None
            }
        }
    }

    pub fn save(&self, draft: &GeneratorDraft) -> Result<()> {
        write_json(self.kv, DRAFT_KEY, draft)
    }

    pub fn clear(&self) -> Result<()> {
        self.kv.remove(DRAFT_KEY)
    }
}

// ---------------------------------------------------------------------------
// DraftAutosave
// ---------------------------------------------------------------------------

/// Coalesces edits so a burst produces one draft write after an idle delay.
#[derive(Debug, Clone)]
pub struct DraftAutosave {
    delay: Duration,
    due_at: Option<DateTime<Utc>>,
}

impl DraftAutosave {
    /// Delays past `i64::MAX` milliseconds saturate.
    pub fn new(debounce_ms: u64) -> Self {
        let ms = i64::try_from(debounce_ms).unwrap_or(i64::MAX);
        Self {
            delay: Duration::milliseconds(ms),
            due_at: None,
        }
    }

    /// Record an edit; restarts the idle timer. A deadline past the end of
    /// representable time is clamped to it.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        let due = now
            .checked_add_signed(self.delay)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.due_at = Some(due);
    }

    pub fn is_pending(&self) -> bool {
        self.due_at.is_some()
    }

    /// True once per burst, when the idle delay has passed.
    pub fn poll(&mut self, now: DateTime<Utc>) -> bool {
        match self.due_at {
            Some(due) if now >= due => {
                self.due_at = None;
                true
            }
            _ => false,
        }
    }

    /// Force the pending write, e.g. on exit.
    pub fn flush(&mut self) -> bool {
        self.due_at.take().is_some()
    }
}

impl Default for DraftAutosave {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_MS)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::TimeZone;

    fn at_ms(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_700_000_000_000 + ms).unwrap()
    }

    fn draft() -> GeneratorDraft {
        let mut form = FormState::new();
        form.set("INTENT", "refactor the parser");
        let mut variables = VariableMap::new();
        variables.insert("PROJECT".to_string(), "acme".to_string());
        GeneratorDraft {
            selected_command_id: "senior-explore".to_string(),
            form_state: form,
            variables,
            attachments: vec![Attachment::capture("notes.md", "todo")],
            attachment_target: "CONTEXT".to_string(),
            attachment_mode: AttachmentMode::Path,
            preview_override: Some("edited".to_string()),
            saved_at: at_ms(0),
        }
    }

    #[test]
    fn empty_store_has_no_draft() {
        let kv = MemoryStore::new();
        assert!(DraftStore::new(&kv).load().is_none());
    }

    #[test]
    fn save_overwrites_wholesale() {
        let kv = MemoryStore::new();
        let store = DraftStore::new(&kv);
        store.save(&draft()).unwrap();
        let mut second = draft();
        second.selected_command_id = "plan-lite".to_string();
        second.attachments.clear();
        store.save(&second).unwrap();
        assert_eq!(store.load(), Some(second));
    }

    #[test]
    fn malformed_draft_is_ignored() {
        let kv = MemoryStore::new();
        kv.set(DRAFT_KEY, r#"{"formState":{}}"#).unwrap();
        assert!(DraftStore::new(&kv).load().is_none());
        kv.set(DRAFT_KEY, "{{{").unwrap();
        assert!(DraftStore::new(&kv).load().is_none());
    }

    #[test]
    fn sparse_draft_fills_defaults() {
        let kv = MemoryStore::new();
        kv.set(
            DRAFT_KEY,
            r#"{"selectedCommandId":"plan-lite","savedAt":"2024-05-01T10:00:00Z"}"#,
        )
        .unwrap();
        let d = DraftStore::new(&kv).load().unwrap();
        assert_eq!(d.selected_command_id, "plan-lite");
        assert!(d.form_state.is_empty());
        assert_eq!(d.attachment_mode, AttachmentMode::Snippet);
        assert!(d.preview_override.is_none());
    }

    #[test]
    fn clear_removes_draft() {
        let kv = MemoryStore::new();
        let store = DraftStore::new(&kv);
        store.save(&draft()).unwrap();
        store.clear().unwrap();
        assert!(store.load().is_none());
    }

    #[test]
    fn autosave_coalesces_bursts() {
        let mut autosave = DraftAutosave::new(400);
        assert!(!autosave.poll(at_ms(0)));

        autosave.touch(at_ms(0));
        autosave.touch(at_ms(100));
        autosave.touch(at_ms(300));
        assert!(!autosave.poll(at_ms(500)));
        assert!(autosave.poll(at_ms(700)));
        assert!(!autosave.poll(at_ms(900)));
    }

    #[test]
    fn oversized_debounce_saturates() {
        let mut autosave = DraftAutosave::new(u64::MAX);
        autosave.touch(at_ms(0));
        assert!(autosave.is_pending());
        assert!(!autosave.poll(at_ms(1_000_000)));
        assert!(autosave.flush());

        let mut autosave = DraftAutosave::new(i64::MAX as u64);
        autosave.touch(at_ms(0));
        assert!(!autosave.poll(at_ms(1_000_000)));
    }

    #[test]
    fn autosave_flush() {
        let mut autosave = DraftAutosave::default();
        assert!(!autosave.flush());
        autosave.touch(at_ms(0));
        assert!(autosave.is_pending());
        assert!(autosave.flush());
        assert!(!autosave.is_pending());
    }
}
