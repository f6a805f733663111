use std::future::Future;
use std::pin::Pin;

use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, DbErr, EntityTrait, QueryFilter, QueryOrder, TransactionError,
    TransactionTrait,
    sea_query::{Expr, OnConflict},
};
use serde_json::json;

use roadwatch_domain::id::{IssueId, OutboxEntryId, UserId};
use roadwatch_domain::issue::{DangerLevel, IssueStatus};
use roadwatch_domain::sync::{EntityKind, SyncAction, SyncStatus};
use roadwatch_sync_schema::{block_user, road_issues, sync_logs, sync_meta, users};

use crate::domain::repository::{
    IssueRepository, OutboxRepository, UserRepository, WatermarkRepository,
};
use crate::domain::types::{
    DeliveryOutcome, NewIssue, OutboxEntry, RemoteIssue, RoadIssue, User, UserWithStatus,
};
use crate::error::SyncServiceError;

// ── Outbox-backed mutation ───────────────────────────────────────────────────

/// Future returned by the local-write half of an outbox mutation: the value
/// handed back to the caller plus the entry describing the write.
pub type MutationFuture<'c, T> =
    Pin<Box<dyn Future<Output = Result<(T, OutboxEntry), SyncServiceError>> + Send + 'c>>;

/// Run `write` and enqueue the outbox entry it returns in one transaction.
///
/// Either both the mutation and its entry commit, or neither does.
pub async fn run_outbox_mutation<T, F>(
    db: &DatabaseConnection,
    context: &'static str,
    write: F,
) -> Result<T, SyncServiceError>
where
    T: Send + 'static,
    F: for<'c> FnOnce(&'c DatabaseTransaction) -> MutationFuture<'c, T> + Send + 'static,
{
    db.transaction::<_, T, SyncServiceError>(|txn| {
        Box::pin(async move {
            let (output, entry) = write(txn).await?;
            enqueue(txn, &entry)
                .await
                .with_context(|| format!("{context}: enqueue {} entry", entry.entity))?;
            Ok(output)
        })
    })
    .await
    .map_err(|e| match e {
        TransactionError::Connection(e) => {
            SyncServiceError::Internal(anyhow::Error::new(e).context(context))
        }
        TransactionError::Transaction(e) => e,
    })
}

/// Insert a `PENDING` outbox entry on the caller's connection or transaction.
pub async fn enqueue<C>(conn: &C, entry: &OutboxEntry) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    sync_logs::ActiveModel {
        id: Set(entry.id.0),
        entity: Set(entry.entity.as_str().to_owned()),
        entity_id: Set(entry.entity_id.clone()),
        action: Set(entry.action.as_str().to_owned()),
        data: Set(entry.payload.clone()),
        status: Set(SyncStatus::Pending.as_str().to_owned()),
        attempts: Set(0),
        last_error: Set(None),
        created_at: Set(entry.created_at),
        synced_at: Set(None),
    }
    .insert(conn)
    .await?;
    Ok(())
}

// ── Issue repository ─────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbIssueRepository {
    pub db: DatabaseConnection,
}

impl IssueRepository for DbIssueRepository {
    async fn list(&self) -> Result<Vec<RoadIssue>, SyncServiceError> {
        let rows = road_issues::Entity::find()
            .find_also_related(users::Entity)
            .order_by_desc(road_issues::Column::CreatedAt)
            .order_by_desc(road_issues::Column::Id)
            .all(&self.db)
            .await
            .context("list road issues")?;
        rows.into_iter()
            .map(|(issue, user)| issue_from_model(issue, user))
            .collect()
    }

    async fn find_by_id(&self, id: &IssueId) -> Result<Option<RoadIssue>, SyncServiceError> {
        let row = road_issues::Entity::find_by_id(id.as_str().to_owned())
            .find_also_related(users::Entity)
            .one(&self.db)
            .await
            .context("find road issue by id")?;
        row.map(|(issue, user)| issue_from_model(issue, user))
            .transpose()
    }

    async fn create_with_outbox(
        &self,
        id: &IssueId,
        issue: &NewIssue,
        now: DateTime<Utc>,
    ) -> Result<RoadIssue, SyncServiceError> {
        let id = id.clone();
        let issue = issue.clone();
        run_outbox_mutation(&self.db, "create road issue", move |txn| {
            Box::pin(async move {
                let model = road_issues::ActiveModel {
                    id: Set(id.0),
                    title: Set(issue.title),
                    description: Set(issue.description),
                    latitude: Set(issue.latitude),
                    longitude: Set(issue.longitude),
                    niveau_danger: Set(issue.danger_level.as_str().to_owned()),
                    status: Set(IssueStatus::Pending.as_str().to_owned()),
                    surface: Set(issue.surface),
                    budget: Set(issue.budget),
                    user_id: Set(issue.user_id),
                    created_at: Set(now),
                    updated_at: Set(now),
                    started_at: Set(None),
                    resolved_at: Set(None),
                }
                .insert(txn)
                .await
                .context("insert road issue")?;
                let reporter = find_reporter(txn, model.user_id.as_deref()).await?;
                let created = issue_from_model(model, reporter)?;
                let entry = OutboxEntry::pending(
                    EntityKind::RoadIssue,
                    created.id.as_str(),
                    SyncAction::Push,
                    created.snapshot()?,
                );
                Ok((created, entry))
            })
        })
        .await
    }

    async fn transition_with_outbox(
        &self,
        id: &IssueId,
        target: IssueStatus,
        now: DateTime<Utc>,
    ) -> Result<RoadIssue, SyncServiceError> {
        let id = id.clone();
        run_outbox_mutation(&self.db, "transition road issue status", move |txn| {
            Box::pin(async move {
                let (model, reporter) = road_issues::Entity::find_by_id(id.0.clone())
                    .find_also_related(users::Entity)
                    .one(txn)
                    .await
                    .context("load road issue")?
                    .ok_or(SyncServiceError::IssueNotFound)?;
                let mut issue = issue_from_model(model, reporter)?;
                issue.transition(target, now)?;

                road_issues::ActiveModel {
                    id: Set(id.0),
                    status: Set(issue.status.as_str().to_owned()),
                    updated_at: Set(issue.updated_at),
                    started_at: Set(issue.started_at),
                    resolved_at: Set(issue.resolved_at),
                    ..Default::default()
                }
                .update(txn)
                .await
                .context("update road issue status")?;

                let entry = OutboxEntry::pending(
                    EntityKind::RoadIssue,
                    issue.id.as_str(),
                    SyncAction::Update,
                    issue.snapshot()?,
                );
                Ok((issue, entry))
            })
        })
        .await
    }
}

async fn find_reporter<C>(
    conn: &C,
    user_id: Option<&str>,
) -> Result<Option<users::Model>, SyncServiceError>
where
    C: ConnectionTrait,
{
    let Some(user_id) = user_id else {
        return Ok(None);
    };
    let user = users::Entity::find_by_id(user_id.to_owned())
        .one(conn)
        .await
        .context("find reporter")?;
    Ok(user)
}

fn issue_from_model(
    model: road_issues::Model,
    reporter: Option<users::Model>,
) -> Result<RoadIssue, SyncServiceError> {
    let status = model
        .status
        .parse::<IssueStatus>()
        .with_context(|| format!("road issue {} has a corrupt status", model.id))?;
    let danger_level = model
        .niveau_danger
        .parse::<DangerLevel>()
        .with_context(|| format!("road issue {} has a corrupt danger level", model.id))?;
    Ok(RoadIssue {
        id: IssueId(model.id),
        title: model.title,
        description: model.description,
        latitude: model.latitude,
        longitude: model.longitude,
        danger_level,
        status,
        surface: model.surface,
        budget: model.budget,
        user_id: model.user_id,
        user_name: reporter.map(|u| u.name),
        created_at: model.created_at,
        updated_at: model.updated_at,
        started_at: model.started_at,
        resolved_at: model.resolved_at,
    })
}

// ── Outbox repository ────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbOutboxRepository {
    pub db: DatabaseConnection,
}

impl OutboxRepository for DbOutboxRepository {
    async fn list_pending(
        &self,
        kind: Option<EntityKind>,
    ) -> Result<Vec<OutboxEntry>, SyncServiceError> {
        let deliverable = [SyncStatus::Pending, SyncStatus::Failed].map(|s| s.as_str());
        let mut query =
            sync_logs::Entity::find().filter(sync_logs::Column::Status.is_in(deliverable));
        if let Some(kind) = kind {
            query = query.filter(sync_logs::Column::Entity.eq(kind.as_str()));
        }
        let models = query
            .order_by_asc(sync_logs::Column::CreatedAt)
            .order_by_asc(sync_logs::Column::Id)
            .all(&self.db)
            .await
            .context("list pending sync logs")?;
        models.into_iter().map(entry_from_model).collect()
    }

    async fn list(
        &self,
        status: Option<SyncStatus>,
        kind: Option<EntityKind>,
    ) -> Result<Vec<OutboxEntry>, SyncServiceError> {
        let mut query = sync_logs::Entity::find();
        if let Some(status) = status {
            query = query.filter(sync_logs::Column::Status.eq(status.as_str()));
        }
        if let Some(kind) = kind {
            query = query.filter(sync_logs::Column::Entity.eq(kind.as_str()));
        }
        let models = query
            .order_by_asc(sync_logs::Column::CreatedAt)
            .order_by_asc(sync_logs::Column::Id)
            .all(&self.db)
            .await
            .context("list sync logs")?;
        models.into_iter().map(entry_from_model).collect()
    }

    async fn mark_result(
        &self,
        id: OutboxEntryId,
        outcome: &DeliveryOutcome,
    ) -> Result<(), SyncServiceError> {
        let update = sync_logs::Entity::update_many()
            .filter(sync_logs::Column::Id.eq(id.0))
            .col_expr(
                sync_logs::Column::Status,
                Expr::value(outcome.status().as_str()),
            );
        let update = match outcome {
            DeliveryOutcome::Success => {
                update.col_expr(sync_logs::Column::SyncedAt, Expr::value(Some(Utc::now())))
            }
            DeliveryOutcome::Failed(error) => update
                .col_expr(
                    sync_logs::Column::SyncedAt,
                    Expr::value(Option::<DateTime<Utc>>::None),
                )
                .col_expr(
                    sync_logs::Column::Attempts,
                    Expr::col(sync_logs::Column::Attempts).add(1),
                )
                .col_expr(sync_logs::Column::LastError, Expr::value(error.clone())),
        };
        let result = update
            .exec(&self.db)
            .await
            .context("mark sync log result")?;
        if result.rows_affected == 0 {
            return Err(SyncServiceError::OutboxEntryNotFound);
        }
        Ok(())
    }
}

fn entry_from_model(model: sync_logs::Model) -> Result<OutboxEntry, SyncServiceError> {
    let entity = model
        .entity
        .parse::<EntityKind>()
        .with_context(|| format!("sync log {} has a corrupt entity kind", model.id))?;
    let action = model
        .action
        .parse::<SyncAction>()
        .with_context(|| format!("sync log {} has a corrupt action", model.id))?;
    let status = model
        .status
        .parse::<SyncStatus>()
        .with_context(|| format!("sync log {} has a corrupt status", model.id))?;
    Ok(OutboxEntry {
        id: OutboxEntryId(model.id),
        entity,
        entity_id: model.entity_id,
        action,
        payload: model.data,
        status,
        attempts: model.attempts,
        last_error: model.last_error,
        created_at: model.created_at,
        synced_at: model.synced_at,
    })
}

// ── Watermark repository ─────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbWatermarkRepository {
    pub db: DatabaseConnection,
}

impl WatermarkRepository for DbWatermarkRepository {
    async fn get(&self, collection: &str) -> Result<i64, SyncServiceError> {
        let model = sync_meta::Entity::find_by_id(collection.to_owned())
            .one(&self.db)
            .await
            .context("get sync watermark")?;
        Ok(model.map_or(0, |m| m.last_firebase_log))
    }

    async fn advance(&self, collection: &str, synced_at_ms: i64) -> Result<i64, SyncServiceError> {
        let collection = collection.to_owned();
        let stored = self
            .db
            .transaction::<_, i64, DbErr>(|txn| {
                Box::pin(async move { advance_watermark(txn, &collection, synced_at_ms).await })
            })
            .await
            .context("advance sync watermark")?;
        Ok(stored)
    }

    async fn apply_remote(
        &self,
        collection: &str,
        issue: &RemoteIssue,
        synced_at_ms: i64,
    ) -> Result<i64, SyncServiceError> {
        let collection = collection.to_owned();
        let issue = issue.clone();
        let stored = self
            .db
            .transaction::<_, i64, DbErr>(|txn| {
                Box::pin(async move {
                    upsert_remote_issue(txn, &issue, Utc::now()).await?;
                    advance_watermark(txn, &collection, synced_at_ms).await
                })
            })
            .await
            .context("apply remote road issue")?;
        Ok(stored)
    }
}

/// Remote content wins on conflict. Local-only columns (reporter, creation
/// time) are kept, lifecycle stamps never regress, and a document that matches
/// the local row (our own push read back) leaves it untouched.
async fn upsert_remote_issue(
    txn: &DatabaseTransaction,
    issue: &RemoteIssue,
    now: DateTime<Utc>,
) -> Result<(), DbErr> {
    let existing = road_issues::Entity::find_by_id(issue.id.as_str().to_owned())
        .one(txn)
        .await?;
    let Some(existing) = existing else {
        let (started_at, resolved_at) = issue.lifecycle_stamps((None, None), now);
        road_issues::ActiveModel {
            id: Set(issue.id.as_str().to_owned()),
            title: Set(issue.title.clone()),
            description: Set(issue.description.clone()),
            latitude: Set(issue.latitude),
            longitude: Set(issue.longitude),
            niveau_danger: Set(issue.danger_level.as_str().to_owned()),
            status: Set(issue.status.as_str().to_owned()),
            surface: Set(issue.surface),
            budget: Set(issue.budget),
            user_id: Set(issue.user_id.clone()),
            created_at: Set(now),
            updated_at: Set(now),
            started_at: Set(started_at),
            resolved_at: Set(resolved_at),
        }
        .insert(txn)
        .await?;
        return Ok(());
    };
    let (started_at, resolved_at) =
        issue.lifecycle_stamps((existing.started_at, existing.resolved_at), now);
    if matches_remote(&existing, issue)
        && started_at == existing.started_at
        && resolved_at == existing.resolved_at
    {
        return Ok(());
    }
    road_issues::ActiveModel {
        id: Set(existing.id),
        title: Set(issue.title.clone()),
        description: Set(issue.description.clone()),
        latitude: Set(issue.latitude),
        longitude: Set(issue.longitude),
        niveau_danger: Set(issue.danger_level.as_str().to_owned()),
        status: Set(issue.status.as_str().to_owned()),
        surface: Set(issue.surface),
        budget: Set(issue.budget),
        updated_at: Set(now),
        started_at: Set(started_at),
        resolved_at: Set(resolved_at),
        ..Default::default()
    }
    .update(txn)
    .await?;
    Ok(())
}

fn matches_remote(local: &road_issues::Model, remote: &RemoteIssue) -> bool {
    local.title == remote.title
        && local.description == remote.description
        && local.latitude == remote.latitude
        && local.longitude == remote.longitude
        && local.niveau_danger == remote.danger_level.as_str()
        && local.status == remote.status.as_str()
        && local.surface == remote.surface
        && local.budget == remote.budget
}

async fn advance_watermark<C>(conn: &C, collection: &str, synced_at_ms: i64) -> Result<i64, DbErr>
where
    C: ConnectionTrait,
{
    let current = sync_meta::Entity::find_by_id(collection.to_owned())
        .one(conn)
        .await?
        .map(|m| m.last_firebase_log);
    if let Some(current) = current.filter(|c| *c >= synced_at_ms) {
        return Ok(current);
    }
    sync_meta::Entity::insert(sync_meta::ActiveModel {
        entity: Set(collection.to_owned()),
        last_firebase_log: Set(synced_at_ms),
        updated_at: Set(Utc::now()),
    })
    .on_conflict(
        OnConflict::column(sync_meta::Column::Entity)
            .update_columns([
                sync_meta::Column::LastFirebaseLog,
                sync_meta::Column::UpdatedAt,
            ])
            .to_owned(),
    )
    .exec_without_returning(conn)
    .await?;
    Ok(synced_at_ms)
}

// ── User repository ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbUserRepository {
    pub db: DatabaseConnection,
}

impl UserRepository for DbUserRepository {
    async fn list_with_status(&self) -> Result<Vec<UserWithStatus>, SyncServiceError> {
        let rows = users::Entity::find()
            .find_also_related(block_user::Entity)
            .order_by_asc(users::Column::Name)
            .order_by_asc(users::Column::Id)
            .all(&self.db)
            .await
            .context("list users with block status")?;
        Ok(rows
            .into_iter()
            .map(|(user, block)| user_with_status(user, block))
            .collect())
    }

    async fn find_with_status(
        &self,
        id: &UserId,
    ) -> Result<Option<UserWithStatus>, SyncServiceError> {
        let row = users::Entity::find_by_id(id.0.clone())
            .find_also_related(block_user::Entity)
            .one(&self.db)
            .await
            .context("find user with block status")?;
        Ok(row.map(|(user, block)| user_with_status(user, block)))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, SyncServiceError> {
        let model = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
            .context("find user by email")?;
        Ok(model.map(user_from_model))
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, SyncServiceError> {
        let model = users::Entity::find_by_id(id.0.clone())
            .one(&self.db)
            .await
            .context("find user by id")?;
        Ok(model.map(user_from_model))
    }

    async fn block_with_outbox(
        &self,
        user: &User,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<(), SyncServiceError> {
        let user_id = user.id.0.clone();
        let reason = reason.to_owned();
        run_outbox_mutation(&self.db, "block user", move |txn| {
            Box::pin(async move {
                block_user::Entity::insert(block_user::ActiveModel {
                    user_id: Set(user_id.clone()),
                    reason: Set(reason),
                    blocked_at: Set(now),
                })
                .on_conflict(
                    OnConflict::column(block_user::Column::UserId)
                        .do_nothing()
                        .to_owned(),
                )
                .exec_without_returning(txn)
                .await
                .context("insert block record")?;
                // An earlier block keeps its reason.
                let stored = block_user::Entity::find_by_id(user_id.clone())
                    .one(txn)
                    .await
                    .context("read block record")?
                    .map(|b| b.reason);
                let entry = OutboxEntry::pending(
                    EntityKind::UserBlocked,
                    user_id.clone(),
                    SyncAction::Update,
                    json!({ "user_id": user_id, "is_blocked": true, "reason": stored }),
                );
                Ok(((), entry))
            })
        })
        .await
    }

    async fn unblock_with_outbox(&self, user: &User) -> Result<(), SyncServiceError> {
        let user_id = user.id.0.clone();
        run_outbox_mutation(&self.db, "unblock user", move |txn| {
            Box::pin(async move {
                block_user::Entity::delete_many()
                    .filter(block_user::Column::UserId.eq(user_id.clone()))
                    .exec(txn)
                    .await
                    .context("delete block record")?;
                let entry = OutboxEntry::pending(
                    EntityKind::UserBlocked,
                    user_id.clone(),
                    SyncAction::Update,
                    json!({ "user_id": user_id, "is_blocked": false }),
                );
                Ok(((), entry))
            })
        })
        .await
    }
}

fn user_with_status(user: users::Model, block: Option<block_user::Model>) -> UserWithStatus {
    UserWithStatus {
        id: UserId(user.id),
        email: user.email,
        name: user.name,
        role_id: user.role_id,
        is_blocked: block.is_some(),
        block_reason: block.map(|b| b.reason),
    }
}

fn user_from_model(model: users::Model) -> User {
    User {
        id: UserId(model.id),
        email: model.email,
        name: model.name,
    }
}
