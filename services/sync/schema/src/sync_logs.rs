use sea_orm::entity::prelude::*;

/// Outbox entry: one local mutation awaiting (or done with) replication to the cloud.
/// Append-only; rows are never deleted.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "sync_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Entity kind (`road_issue`, `user_blocked`).
    pub entity: String,
    pub entity_id: String,
    /// `PUSH` or `UPDATE`.
    pub action: String,
    /// Snapshot of the entity as persisted by the accompanying mutation.
    pub data: Json,
    /// `PENDING`, `SUCCESS` or `FAILED`.
    pub status: String,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub synced_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
