use roadwatch_domain::id::OutboxEntryId;
use roadwatch_domain::sync::{EntityKind, SyncStatus};

use crate::domain::repository::{OutboxRepository, WatermarkRepository};
use crate::domain::types::{DeliveryOutcome, OutboxEntry};
use crate::error::SyncServiceError;

fn parse_kind(raw: Option<&str>) -> Result<Option<EntityKind>, SyncServiceError> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<EntityKind>().map_err(SyncServiceError::validation))
        .transpose()
}

// ── ListSyncLogs ──────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct ListSyncLogsInput {
    pub status: Option<String>,
    pub entity: Option<String>,
}

pub struct ListSyncLogsUseCase<O: OutboxRepository> {
    pub outbox: O,
}

impl<O: OutboxRepository> ListSyncLogsUseCase<O> {
    pub async fn execute(
        &self,
        input: ListSyncLogsInput,
    ) -> Result<Vec<OutboxEntry>, SyncServiceError> {
        let status = input
            .status
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<SyncStatus>().map_err(SyncServiceError::validation))
            .transpose()?;
        let kind = parse_kind(input.entity.as_deref())?;
        self.outbox.list(status, kind).await
    }
}

// ── MarkSyncLog ───────────────────────────────────────────────────────────────

pub struct MarkSyncLogInput {
    pub id: String,
    pub status: String,
    pub error: Option<String>,
}

pub struct MarkSyncLogUseCase<O: OutboxRepository> {
    pub outbox: O,
}

impl<O: OutboxRepository> MarkSyncLogUseCase<O> {
    /// Record a delivery outcome reported by an external pusher.
    pub async fn execute(&self, input: MarkSyncLogInput) -> Result<(), SyncServiceError> {
        let id = input
            .id
            .parse::<OutboxEntryId>()
            .map_err(|_| SyncServiceError::validation(format!("invalid sync log id {:?}", input.id)))?;
        let outcome = match input
            .status
            .parse::<SyncStatus>()
            .map_err(SyncServiceError::validation)?
        {
            SyncStatus::Success => DeliveryOutcome::Success,
            SyncStatus::Failed => DeliveryOutcome::Failed(
                input
                    .error
                    .filter(|e| !e.trim().is_empty())
                    .unwrap_or_else(|| "delivery failed".to_owned()),
            ),
            SyncStatus::Pending => {
                return Err(SyncServiceError::validation(
                    "status must be SUCCESS or FAILED",
                ));
            }
        };
        self.outbox.mark_result(id, &outcome).await
    }
}

// ── GetWatermark ──────────────────────────────────────────────────────────────

pub struct GetWatermarkUseCase<W: WatermarkRepository> {
    pub watermarks: W,
}

impl<W: WatermarkRepository> GetWatermarkUseCase<W> {
    /// Pull watermark for an entity kind or collection name; 0 before the first pull.
    pub async fn execute(&self, entity: &str) -> Result<i64, SyncServiceError> {
        let kind = parse_kind(Some(entity))?
            .ok_or_else(|| SyncServiceError::validation("entity must not be empty"))?;
        self.watermarks.get(kind.collection()).await
    }
}
