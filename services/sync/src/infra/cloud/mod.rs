pub mod codec;
pub mod firestore;
pub mod memory;

use serde_json::Value;

use crate::domain::repository::CloudStore;
use crate::domain::types::RemoteDocument;
use crate::error::SyncServiceError;

pub use firestore::FirestoreCloudStore;
pub use memory::MemoryCloudStore;

/// Cloud store selected by `CLOUD_BACKEND`.
#[derive(Clone)]
pub enum Cloud {
    Firestore(FirestoreCloudStore),
    Memory(MemoryCloudStore),
}

impl Cloud {
    pub fn backend(&self) -> &'static str {
        match self {
            Self::Firestore(_) => "firestore",
            Self::Memory(_) => "memory",
        }
    }
}

impl CloudStore for Cloud {
    async fn upsert_document(
        &self,
        collection: &str,
        id: &str,
        data: &Value,
    ) -> Result<(), SyncServiceError> {
        match self {
            Self::Firestore(store) => store.upsert_document(collection, id, data).await,
            Self::Memory(store) => store.upsert_document(collection, id, data).await,
        }
    }

    async fn changed_since(
        &self,
        collection: &str,
        since_ms: i64,
    ) -> Result<Vec<RemoteDocument>, SyncServiceError> {
        match self {
            Self::Firestore(store) => store.changed_since(collection, since_ms).await,
            Self::Memory(store) => store.changed_since(collection, since_ms).await,
        }
    }
}
