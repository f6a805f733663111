#![allow(async_fn_in_trait)]

use chrono::{DateTime, Utc};
use serde_json::Value;

use roadwatch_domain::id::{IssueId, OutboxEntryId, UserId};
use roadwatch_domain::issue::IssueStatus;
use roadwatch_domain::sync::{EntityKind, SyncStatus};

use crate::domain::types::{
    DeliveryOutcome, NewIssue, OutboxEntry, RemoteDocument, RemoteIssue, RoadIssue, User,
    UserWithStatus,
};
use crate::error::SyncServiceError;

/// Repository for road issues. Every mutation also enqueues its outbox entry
/// in the same transaction.
pub trait IssueRepository: Send + Sync {
    /// All issues, newest first, with the reporter name when known.
    async fn list(&self) -> Result<Vec<RoadIssue>, SyncServiceError>;

    async fn find_by_id(&self, id: &IssueId) -> Result<Option<RoadIssue>, SyncServiceError>;

    /// Insert a new `EN_ATTENTE` issue together with its `PUSH` entry.
    async fn create_with_outbox(
        &self,
        id: &IssueId,
        issue: &NewIssue,
        now: DateTime<Utc>,
    ) -> Result<RoadIssue, SyncServiceError>;

    /// Load, validate and apply a status transition, then enqueue an
    /// `UPDATE` entry carrying the persisted snapshot.
    async fn transition_with_outbox(
        &self,
        id: &IssueId,
        target: IssueStatus,
        now: DateTime<Utc>,
    ) -> Result<RoadIssue, SyncServiceError>;
}

/// Durable log of local mutations awaiting replication.
pub trait OutboxRepository: Send + Sync {
    /// Deliverable entries (`PENDING` or `FAILED`) in creation order.
    async fn list_pending(
        &self,
        kind: Option<EntityKind>,
    ) -> Result<Vec<OutboxEntry>, SyncServiceError>;

    /// Entries matching an exact status and/or kind, in creation order.
    async fn list(
        &self,
        status: Option<SyncStatus>,
        kind: Option<EntityKind>,
    ) -> Result<Vec<OutboxEntry>, SyncServiceError>;

    async fn mark_result(
        &self,
        id: OutboxEntryId,
        outcome: &DeliveryOutcome,
    ) -> Result<(), SyncServiceError>;
}

/// Per-collection pull cursor (`sync_meta`).
pub trait WatermarkRepository: Send + Sync {
    /// Current watermark in epoch milliseconds; 0 before the first pull.
    async fn get(&self, collection: &str) -> Result<i64, SyncServiceError>;

    /// Move the watermark forward to `synced_at_ms`. Never regresses.
    /// Returns the stored value.
    async fn advance(&self, collection: &str, synced_at_ms: i64) -> Result<i64, SyncServiceError>;

    /// Upsert a remote issue and advance the watermark in one transaction.
    async fn apply_remote(
        &self,
        collection: &str,
        issue: &RemoteIssue,
        synced_at_ms: i64,
    ) -> Result<i64, SyncServiceError>;
}

/// Repository for local accounts and their block records.
pub trait UserRepository: Send + Sync {
    async fn list_with_status(&self) -> Result<Vec<UserWithStatus>, SyncServiceError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, SyncServiceError>;

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, SyncServiceError>;

    async fn find_with_status(
        &self,
        id: &UserId,
    ) -> Result<Option<UserWithStatus>, SyncServiceError>;

    /// Record (or keep) a block and enqueue its `user_blocked` entry.
    async fn block_with_outbox(
        &self,
        user: &User,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<(), SyncServiceError>;

    /// Remove the block record, if any, and enqueue its `user_blocked` entry.
    async fn unblock_with_outbox(&self, user: &User) -> Result<(), SyncServiceError>;
}

/// Remote document store the platform replicates with.
pub trait CloudStore: Send + Sync {
    /// Write `data` as the full document `collection/id`. The store stamps a
    /// server-side `synced_at`. Replays overwrite with the same content.
    async fn upsert_document(
        &self,
        collection: &str,
        id: &str,
        data: &Value,
    ) -> Result<(), SyncServiceError>;

    /// Documents whose `synced_at` is strictly after `since_ms`, oldest first.
    async fn changed_since(
        &self,
        collection: &str,
        since_ms: i64,
    ) -> Result<Vec<RemoteDocument>, SyncServiceError>;
}
