use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;

use roadwatch_domain::id::UserId;

use crate::domain::types::UserWithStatus;
use crate::error::SyncServiceError;
use crate::state::AppState;
use crate::usecase::user::{
    BlockUserInput, BlockUserUseCase, GetActiveUserUseCase, ListUsersWithStatusUseCase,
    UnblockUserUseCase,
};

// ── GET /users_with_status ───────────────────────────────────────────────────

pub async fn list_users_with_status(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserWithStatus>>, SyncServiceError> {
    let usecase = ListUsersWithStatusUseCase {
        users: state.user_repo(),
    };
    Ok(Json(usecase.execute().await?))
}

// ── GET /users/{id} ──────────────────────────────────────────────────────────

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserWithStatus>, SyncServiceError> {
    let usecase = GetActiveUserUseCase {
        users: state.user_repo(),
    };
    Ok(Json(usecase.execute(UserId(id)).await?))
}

// ── POST /users/block ────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct BlockUserRequest {
    pub email: String,
    pub reason: Option<String>,
}

pub async fn block_user(
    State(state): State<AppState>,
    Json(body): Json<BlockUserRequest>,
) -> Result<StatusCode, SyncServiceError> {
    let usecase = BlockUserUseCase {
        users: state.user_repo(),
    };
    usecase
        .execute(BlockUserInput {
            email: body.email,
            reason: body.reason,
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── DELETE /users/unblock/{id} ───────────────────────────────────────────────

pub async fn unblock_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, SyncServiceError> {
    let usecase = UnblockUserUseCase {
        users: state.user_repo(),
    };
    usecase.execute(UserId(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
