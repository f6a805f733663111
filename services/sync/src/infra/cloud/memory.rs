use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

use crate::domain::repository::CloudStore;
use crate::domain::types::RemoteDocument;
use crate::error::SyncServiceError;

/// In-process document store with a monotonic server clock.
///
/// Used for offline development (`CLOUD_BACKEND=memory`) and tests. Clones
/// share the same documents.
#[derive(Clone, Default)]
pub struct MemoryCloudStore {
    inner: Arc<Mutex<MemoryState>>,
}

#[derive(Default)]
struct MemoryState {
    collections: HashMap<String, BTreeMap<String, RemoteDocument>>,
    last_stamp_ms: i64,
    offline: bool,
}

impl MemoryState {
    /// Strictly increasing, so two writes never share a `synced_at`.
    fn next_stamp(&mut self) -> i64 {
        let stamp = Utc::now().timestamp_millis().max(self.last_stamp_ms + 1);
        self.last_stamp_ms = stamp;
        stamp
    }

    fn put(&mut self, collection: &str, id: &str, mut data: Value, synced_at_ms: i64) {
        if let Value::Object(map) = &mut data {
            map.insert("synced_at".to_owned(), Value::String(rfc3339(synced_at_ms)));
        }
        self.collections
            .entry(collection.to_owned())
            .or_default()
            .insert(
                id.to_owned(),
                RemoteDocument {
                    id: id.to_owned(),
                    data,
                    synced_at_ms,
                },
            );
    }
}

impl MemoryCloudStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn document(&self, collection: &str, id: &str) -> Option<RemoteDocument> {
        self.lock()
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned()
    }

    pub fn len(&self, collection: &str) -> usize {
        self.lock().collections.get(collection).map_or(0, BTreeMap::len)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    /// Store a document as if another client had written it at `synced_at_ms`.
    pub fn insert_remote(&self, collection: &str, id: &str, data: Value, synced_at_ms: i64) {
        let mut state = self.lock();
        state.last_stamp_ms = state.last_stamp_ms.max(synced_at_ms);
        state.put(collection, id, data, synced_at_ms);
    }

    /// While offline every call fails as a transient network error.
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        // A poisoned lock only means a test thread panicked mid-write.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl CloudStore for MemoryCloudStore {
    async fn upsert_document(
        &self,
        collection: &str,
        id: &str,
        data: &Value,
    ) -> Result<(), SyncServiceError> {
        let mut state = self.lock();
        if state.offline {
            return Err(SyncServiceError::Unavailable(anyhow!(
                "memory cloud store is offline"
            )));
        }
        let stamp = state.next_stamp();
        state.put(collection, id, data.clone(), stamp);
        Ok(())
    }

    async fn changed_since(
        &self,
        collection: &str,
        since_ms: i64,
    ) -> Result<Vec<RemoteDocument>, SyncServiceError> {
        let state = self.lock();
        if state.offline {
            return Err(SyncServiceError::Unavailable(anyhow!(
                "memory cloud store is offline"
            )));
        }
        let mut docs: Vec<RemoteDocument> = state
            .collections
            .get(collection)
            .map(|docs| {
                docs.values()
                    .filter(|doc| doc.synced_at_ms > since_ms)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        docs.sort_by_key(|doc| doc.synced_at_ms);
        Ok(docs)
    }
}

fn rfc3339(ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}
