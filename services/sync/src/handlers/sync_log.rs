use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::types::OutboxEntry;
use crate::error::SyncServiceError;
use crate::state::AppState;
use crate::usecase::outbox::{
    GetWatermarkUseCase, ListSyncLogsInput, ListSyncLogsUseCase, MarkSyncLogInput,
    MarkSyncLogUseCase,
};
use crate::usecase::pull::{ApplyRemoteInput, ApplyRemoteUseCase};

// ── GET /sync_logs ───────────────────────────────────────────────────────────

#[derive(Deserialize, Default)]
pub struct SyncLogQuery {
    pub status: Option<String>,
    pub entity: Option<String>,
}

pub async fn list_sync_logs(
    State(state): State<AppState>,
    Query(query): Query<SyncLogQuery>,
) -> Result<Json<Vec<OutboxEntry>>, SyncServiceError> {
    let usecase = ListSyncLogsUseCase {
        outbox: state.outbox_repo(),
    };
    let entries = usecase
        .execute(ListSyncLogsInput {
            status: query.status,
            entity: query.entity,
        })
        .await?;
    Ok(Json(entries))
}

// ── PATCH /sync_logs/{id} ────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct MarkSyncLogRequest {
    pub status: String,
    pub error: Option<String>,
}

#[derive(Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

pub async fn mark_sync_log(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<MarkSyncLogRequest>,
) -> Result<Json<SuccessResponse>, SyncServiceError> {
    let usecase = MarkSyncLogUseCase {
        outbox: state.outbox_repo(),
    };
    usecase
        .execute(MarkSyncLogInput {
            id,
            status: body.status,
            error: body.error,
        })
        .await?;
    Ok(Json(SuccessResponse { success: true }))
}

// ── GET /sync_meta/{entity} ──────────────────────────────────────────────────

#[derive(Serialize)]
pub struct WatermarkResponse {
    pub last_firebase_log: i64,
}

pub async fn get_sync_meta(
    State(state): State<AppState>,
    Path(entity): Path<String>,
) -> Result<Json<WatermarkResponse>, SyncServiceError> {
    let usecase = GetWatermarkUseCase {
        watermarks: state.watermark_repo(),
    };
    let last_firebase_log = usecase.execute(&entity).await?;
    Ok(Json(WatermarkResponse { last_firebase_log }))
}

// ── POST /sync_pull ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ApplyRemoteRequest {
    pub entity: String,
    pub entity_id: String,
    pub data: Value,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyRemoteResponse {
    pub success: bool,
    pub new_index: i64,
}

pub async fn apply_remote(
    State(state): State<AppState>,
    Json(body): Json<ApplyRemoteRequest>,
) -> Result<Json<ApplyRemoteResponse>, SyncServiceError> {
    let usecase = ApplyRemoteUseCase {
        watermarks: state.watermark_repo(),
    };
    let new_index = usecase
        .execute(ApplyRemoteInput {
            entity: body.entity,
            entity_id: body.entity_id,
            data: body.data,
        })
        .await?;
    Ok(Json(ApplyRemoteResponse {
        success: true,
        new_index,
    }))
}
