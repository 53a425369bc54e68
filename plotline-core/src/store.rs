//! Document-store persistence interface.
//!
//! The core treats persistence as a keyed document store with partial-field
//! updates. No transactions across documents are assumed: concurrent writers
//! on the same record (main turn path writing occupancy, background tasks
//! writing scene context) stay safe by setting only the fields they own.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{Map, Value};

use crate::error::{CoreError, Result};
use crate::types::SessionId;

/// Collection name for session records.
pub const SESSIONS: &str = "sessions";
/// Collection name for location records.
pub const LOCATIONS: &str = "locations";

/// Keyed document persistence with `$set`-style partial updates.
///
/// Field paths in [`set_fields`](DocumentStore::set_fields) may be dotted
/// (`"scene_context.tension"`), creating intermediate objects as needed.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one document, `None` when absent.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>>;

    /// Insert or wholesale-replace one document.
    async fn put(&self, collection: &str, id: &str, doc: Value) -> Result<()>;

    /// Set individual fields on one document without touching the rest.
    ///
    /// Missing documents are created. This is the only write background
    /// tasks are allowed to use.
    async fn set_fields(&self, collection: &str, id: &str, fields: Map<String, Value>)
    -> Result<()>;

    /// Append one entry to a session's event log.
    async fn append_log(&self, session: SessionId, entry: Value) -> Result<()>;
}

/// Apply one dotted-path assignment into a JSON object tree.
///
/// Intermediate segments that are missing or not objects are replaced with
/// fresh objects, matching document-store `$set` semantics.
pub fn set_path(doc: &mut Value, path: &str, value: Value) {
    if !doc.is_object() {
        *doc = Value::Object(Map::new());
    }
    let mut node = doc;
    let mut segments = path.split('.').peekable();
    while let Some(segment) = segments.next() {
        let obj = match node.as_object_mut() {
            Some(obj) => obj,
            None => break,
        };
        if segments.peek().is_none() {
            obj.insert(segment.to_string(), value);
            return;
        }
        let child = obj
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !child.is_object() {
            *child = Value::Object(Map::new());
        }
        node = child;
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Process-local store used by tests and single-process deployments.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    docs: RwLock<HashMap<(String, String), Value>>,
    logs: RwLock<HashMap<SessionId, Vec<Value>>>,
}

impl InMemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a session's log entries, oldest first.
    #[must_use]
    pub fn log_entries(&self, session: SessionId) -> Vec<Value> {
        self.logs.read().get(&session).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        let key = (collection.to_string(), id.to_string());
        Ok(self.docs.read().get(&key).cloned())
    }

    async fn put(&self, collection: &str, id: &str, doc: Value) -> Result<()> {
        let key = (collection.to_string(), id.to_string());
        self.docs.write().insert(key, doc);
        Ok(())
    }

    async fn set_fields(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<()> {
        let key = (collection.to_string(), id.to_string());
        let mut docs = self.docs.write();
        let doc = docs.entry(key).or_insert_with(|| Value::Object(Map::new()));
        for (path, value) in fields {
            set_path(doc, &path, value);
        }
        Ok(())
    }

    async fn append_log(&self, session: SessionId, entry: Value) -> Result<()> {
        self.logs.write().entry(session).or_default().push(entry);
        Ok(())
    }
}

/// Fetch and deserialize one document, erroring when absent.
pub async fn require<T: serde::de::DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: &str,
    id: &str,
) -> Result<T> {
    let doc = store
        .get(collection, id)
        .await?
        .ok_or_else(|| CoreError::Store(format!("missing {collection}/{id}")))?;
    Ok(serde_json::from_value(doc)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let store = InMemoryStore::new();
        store
            .put(SESSIONS, "s1", json!({"turn": 3}))
            .await
            .expect("put");
        let doc = store.get(SESSIONS, "s1").await.expect("get");
        assert_eq!(doc, Some(json!({"turn": 3})));
        assert_eq!(store.get(SESSIONS, "absent").await.expect("get"), None);
    }

    #[tokio::test]
    async fn set_fields_leaves_unrelated_fields_alone() {
        let store = InMemoryStore::new();
        store
            .put(SESSIONS, "s1", json!({"turn": 3, "positions": {"player": {"x": 1, "y": 1}}}))
            .await
            .expect("put");

        let mut fields = Map::new();
        fields.insert("scene_context.tension".into(), json!("tense"));
        store.set_fields(SESSIONS, "s1", fields).await.expect("set");

        let doc = store.get(SESSIONS, "s1").await.expect("get").expect("doc");
        // The concurrent occupancy write survives a scene-context write.
        assert_eq!(doc["positions"]["player"], json!({"x": 1, "y": 1}));
        assert_eq!(doc["scene_context"]["tension"], json!("tense"));
        assert_eq!(doc["turn"], json!(3));
    }

    #[tokio::test]
    async fn set_fields_creates_missing_documents() {
        let store = InMemoryStore::new();
        let mut fields = Map::new();
        fields.insert("name".into(), json!("The Gilded Eel"));
        store
            .set_fields(LOCATIONS, "l1", fields)
            .await
            .expect("set");
        let doc = store.get(LOCATIONS, "l1").await.expect("get").expect("doc");
        assert_eq!(doc["name"], json!("The Gilded Eel"));
    }

    #[tokio::test]
    async fn log_appends_preserve_order() {
        let store = InMemoryStore::new();
        let session = SessionId::new();
        for i in 0..3 {
            store
                .append_log(session, json!({"seq": i}))
                .await
                .expect("append");
        }
        let entries = store.log_entries(session);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[2]["seq"], json!(2));
    }

    #[test]
    fn set_path_replaces_non_object_intermediates() {
        let mut doc = json!({"scene": "a string"});
        set_path(&mut doc, "scene.tension", json!("calm"));
        assert_eq!(doc["scene"]["tension"], json!("calm"));
    }
}
