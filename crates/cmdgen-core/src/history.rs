use crate::error::{CmdgenError, Result};
use crate::form::FormState;
use crate::store::{read_json, write_json, KvStore, HISTORY_KEY};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A generated command, kept for later reuse and export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub command_id: String,
    pub created_at: DateTime<Utc>,
    pub fields: FormState,
    pub command_text: String,
}

impl HistoryEntry {
    pub fn new(
        command_id: &str,
        fields: FormState,
        command_text: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: format!("{command_id}-{}", created_at.timestamp_millis()),
            command_id: command_id.to_string(),
            created_at,
            fields,
            command_text: command_text.into(),
        }
    }
}

pub struct HistoryStore<'a> {
    kv: &'a dyn KvStore,
}

impl<'a> HistoryStore<'a> {
    pub fn new(kv: &'a dyn KvStore) -> Self {
        Self { kv }
    }

    /// Entries in insertion order. Unreadable entries are skipped.
    pub fn load(&self) -> Vec<HistoryEntry> {
        match read_json(self.kv, HISTORY_KEY) {
            Some(Value::Array(items)) => items
                .into_iter()
                .filter_map(|item| serde_json::from_value(item).ok())
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn save(&self, entries: &[HistoryEntry]) -> Result<()> {
        write_json(self.kv, HISTORY_KEY, &entries)
    }

    pub fn add(&self, entry: HistoryEntry) -> Result<Vec<HistoryEntry>> {
        let mut entries = self.load();
        entries.push(entry);
        self.save(&entries)?;
        Ok(entries)
    }

    pub fn get(&self, id: &str) -> Result<HistoryEntry> {
        self.load()
            .into_iter()
            .find(|e| e.id == id)
            .ok_or_else(|| CmdgenError::HistoryNotFound(id.to_string()))
    }

    pub fn remove(&self, id: &str) -> Result<Vec<HistoryEntry>> {
        let mut entries = self.load();
        let before = entries.len();
        entries.retain(|e| e.id != id);
        if entries.len() == before {
            return Err(CmdgenError::HistoryNotFound(id.to_string()));
        }
        self.save(&entries)?;
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::TimeZone;

    fn entry(cmd: &str, ms: i64) -> HistoryEntry {
        let mut fields = FormState::new();
        fields.set("INTENT", "x");
        let at = Utc.timestamp_millis_opt(1_700_000_000_000 + ms).unwrap();
        HistoryEntry::new(cmd, fields, format!("text for {cmd}"), at)
    }

    #[test]
    fn id_combines_command_and_millis() {
        let e = entry("plan-lite", 42);
        assert_eq!(e.id, "plan-lite-1700000000042");
    }

    #[test]
    fn add_get_remove() {
        let kv = MemoryStore::new();
        let store = HistoryStore::new(&kv);
        store.add(entry("a", 1)).unwrap();
        let all = store.add(entry("b", 2)).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(store.get(&all[1].id).unwrap().command_id, "b");

        let left = store.remove(&all[0].id).unwrap();
        assert_eq!(left.len(), 1);
        assert!(matches!(
            store.remove("missing"),
            Err(CmdgenError::HistoryNotFound(_))
        ));
    }

    #[test]
    fn corrupt_history_loads_empty() {
        let kv = MemoryStore::new();
        kv.set(HISTORY_KEY, "{\"not\":\"a list\"}").unwrap();
        assert!(HistoryStore::new(&kv).load().is_empty());
    }

    #[test]
    fn json_uses_camel_case() {
        let json = serde_json::to_value(entry("a", 1)).unwrap();
        assert!(json.get("commandId").is_some());
        assert!(json.get("commandText").is_some());
        assert!(json.get("createdAt").is_some());
    }
}
