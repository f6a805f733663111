use chrono::Utc;
use serde_json::Value;
use tracing::{error, info, warn};

use roadwatch_domain::sync::EntityKind;

use crate::domain::repository::{CloudStore, WatermarkRepository};
use crate::domain::types::{RemoteIssue, SyncSummary, synced_at_millis};
use crate::error::SyncServiceError;

/// One pull cycle for the `road_issues` collection.
pub struct PullUseCase<W, C>
where
    W: WatermarkRepository,
    C: CloudStore,
{
    pub watermarks: W,
    pub cloud: C,
}

impl<W, C> PullUseCase<W, C>
where
    W: WatermarkRepository,
    C: CloudStore,
{
    /// Apply remote changes newer than the watermark, oldest first.
    ///
    /// An invalid document is skipped and the watermark moves past it. A
    /// storage failure ends the cycle so the rest are fetched again next time.
    pub async fn execute(&self) -> Result<SyncSummary, SyncServiceError> {
        let collection = EntityKind::RoadIssue.collection();
        let since = self.watermarks.get(collection).await?;
        let mut docs = self.cloud.changed_since(collection, since).await?;
        docs.sort_by_key(|doc| doc.synced_at_ms);

        let mut summary = SyncSummary::default();
        for doc in docs {
            summary.processed += 1;
            let applied = match RemoteIssue::from_document(&doc.id, &doc.data) {
                Ok(issue) => self
                    .watermarks
                    .apply_remote(collection, &issue, doc.synced_at_ms)
                    .await
                    .map(|_| true),
                Err(e) => {
                    warn!(doc_id = %doc.id, error = %e, "skipping invalid remote document");
                    self.watermarks
                        .advance(collection, doc.synced_at_ms)
                        .await
                        .map(|_| false)
                }
            };
            match applied {
                Ok(true) => summary.succeeded += 1,
                Ok(false) => summary.failed += 1,
                Err(e) => {
                    error!(doc_id = %doc.id, error = %e.detail(), "pull cycle stopped");
                    summary.failed += 1;
                    break;
                }
            }
        }
        if summary.processed > 0 {
            info!(
                processed = summary.processed,
                succeeded = summary.succeeded,
                failed = summary.failed,
                "pull cycle finished"
            );
        }
        Ok(summary)
    }
}

// ── ApplyRemote ───────────────────────────────────────────────────────────────

pub struct ApplyRemoteInput {
    pub entity: String,
    pub entity_id: String,
    pub data: Value,
}

/// Apply a single remote document pushed by a client that read it from the cloud.
pub struct ApplyRemoteUseCase<W: WatermarkRepository> {
    pub watermarks: W,
}

impl<W: WatermarkRepository> ApplyRemoteUseCase<W> {
    /// Returns the stored watermark after applying.
    pub async fn execute(&self, input: ApplyRemoteInput) -> Result<i64, SyncServiceError> {
        let kind = input
            .entity
            .parse::<EntityKind>()
            .map_err(SyncServiceError::validation)?;
        if kind != EntityKind::RoadIssue {
            return Err(SyncServiceError::validation(format!(
                "remote documents of kind {kind} cannot be applied"
            )));
        }
        let issue = RemoteIssue::from_document(&input.entity_id, &input.data)?;
        let synced_at_ms = input
            .data
            .get("synced_at")
            .and_then(synced_at_millis)
            .unwrap_or_else(|| Utc::now().timestamp_millis());
        self.watermarks
            .apply_remote(kind.collection(), &issue, synced_at_ms)
            .await
    }
}
