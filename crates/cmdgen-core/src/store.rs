//! Whole-value key-value persistence.
//!
//! Every persisted record lives in one named slot and is replaced wholesale
//! on save. Loads never fail: missing or malformed content degrades to the
//! record's default.

use crate::error::Result;
use crate::guidance::{CompletionEvent, GuidanceState, StageStatuses, HISTORY_CAPACITY};
use crate::io;
use crate::types::StageKey;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const GUIDANCE_KEY: &str = "command-generator-guidance";
pub const DRAFT_KEY: &str = "command-generator-draft";
pub const HISTORY_KEY: &str = "command-generator-history";

// ---------------------------------------------------------------------------
// KvStore
// ---------------------------------------------------------------------------

pub trait KvStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// In-process store, used as the test double.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.slots.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.slots
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.slots.borrow_mut().remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per slot under `dir`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn slot_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.slot_path(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(std::fs::read_to_string(path)?))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        io::atomic_write(&self.slot_path(key), value.as_bytes())
    }

    fn remove(&self, key: &str) -> Result<()> {
        io::remove_if_exists(&self.slot_path(key))?;
        Ok(())
    }
}

/// Read a slot as JSON. Any failure is logged and reported as `None`.
pub(crate) fn read_json(kv: &dyn KvStore, key: &str) -> Option<Value> {
    let raw = match kv.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(key, error = %e, "store read failed");
            return None;
        }
    };
    if raw.trim().is_empty() {
        return None;
    }
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!(key, error = %e, "ignoring malformed store slot");
            None
        }
    }
}

pub(crate) fn write_json<T: serde::Serialize>(kv: &dyn KvStore, key: &str, value: &T) -> Result<()> {
    let data = serde_json::to_string(value)?;
    kv.set(key, &data)
}

// ---------------------------------------------------------------------------
// GuidanceStore
// ---------------------------------------------------------------------------

pub struct GuidanceStore<'a> {
    kv: &'a dyn KvStore,
}

impl<'a> GuidanceStore<'a> {
    pub fn new(kv: &'a dyn KvStore) -> Self {
        Self { kv }
    }

    /// Load the guidance record, filling each missing or malformed part
    /// with its default.
    pub fn load(&self) -> GuidanceState {
        let Some(Value::Object(obj)) = read_json(self.kv, GUIDANCE_KEY) else {
            return GuidanceState::new();
        };

        let stage_status = obj
            .get("stageStatus")
            .and_then(|v| serde_json::from_value::<StageStatuses>(v.clone()).ok())
            .unwrap_or_default();

        let history: Vec<CompletionEvent> = match obj.get("history") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .take(HISTORY_CAPACITY)
                .collect(),
            _ => Vec::new(),
        };

        let last = obj
            .get("last")
            .and_then(|v| serde_json::from_value::<CompletionEvent>(v.clone()).ok());

        GuidanceState {
            stage_status,
            history: history.into(),
            last,
        }
    }

    pub fn save(&self, state: &GuidanceState) -> Result<()> {
        write_json(self.kv, GUIDANCE_KEY, state)
    }

    /// Load, apply a completion event and save. A failed save is logged;
    /// the updated state is returned either way.
    pub fn record_success(
        &self,
        command: &str,
        stage: StageKey,
        timestamp: DateTime<Utc>,
    ) -> GuidanceState {
        let next = self.load().complete(command, stage, timestamp);
        if let Err(e) = self.save(&next) {
            tracing::warn!(command, stage = %stage, error = %e, "failed to persist guidance state");
        }
        next
    }

    pub fn reset(&self) -> Result<()> {
        self.kv.remove(GUIDANCE_KEY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
