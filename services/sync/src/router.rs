use axum::{
    Router,
    routing::{delete, get, patch, post},
};
use tower::ServiceBuilder;

use roadwatch_core::health::healthz;
use roadwatch_core::middleware::{propagate_request_id_layer, request_id_layer, trace_layer};

use crate::handlers::{
    health::readyz,
    road_issue::{create_issue, list_issues, update_issue_status},
    sync_cycle,
    sync_log::{apply_remote, get_sync_meta, list_sync_logs, mark_sync_log},
    user::{block_user, get_user, list_users_with_status, unblock_user},
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Road issues
        .route("/road_issues", get(list_issues).post(create_issue))
        .route("/road_issues/{id}/status", patch(update_issue_status))
        // Outbox and watermark
        .route("/sync_logs", get(list_sync_logs))
        .route("/sync_logs/{id}", patch(mark_sync_log))
        .route("/sync_meta/{entity}", get(get_sync_meta))
        .route("/sync_pull", post(apply_remote))
        // Sync cycles
        .route("/sync/push", post(sync_cycle::push))
        .route("/sync/pull", post(sync_cycle::pull))
        // Users
        .route("/users_with_status", get(list_users_with_status))
        .route("/users/{id}", get(get_user))
        .route("/users/block", post(block_user))
        .route("/users/unblock/{id}", delete(unblock_user))
        .layer(
            ServiceBuilder::new()
                .layer(request_id_layer())
                .layer(trace_layer())
                .layer(propagate_request_id_layer()),
        )
        .with_state(state)
}
