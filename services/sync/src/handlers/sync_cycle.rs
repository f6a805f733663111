use axum::{Json, extract::State};

use crate::domain::types::SyncSummary;
use crate::error::SyncServiceError;
use crate::state::AppState;

/// `POST /sync/push`: drain the outbox with the configured retry budget.
pub async fn push(State(state): State<AppState>) -> Result<Json<SyncSummary>, SyncServiceError> {
    Ok(Json(state.driver().drain_push().await?))
}

/// `POST /sync/pull`
pub async fn pull(State(state): State<AppState>) -> Result<Json<SyncSummary>, SyncServiceError> {
    Ok(Json(state.driver().drain_pull().await?))
}
