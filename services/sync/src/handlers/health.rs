use axum::{Json, extract::State, http::StatusCode};

use roadwatch_core::health::{Check, Readiness, readiness};

use crate::state::AppState;

/// `GET /readyz`: 503 until the database answers a ping.
///
/// The cloud store is not probed; an unreachable cloud only delays sync.
pub async fn readyz(State(state): State<AppState>) -> (StatusCode, Json<Readiness>) {
    let database = match state.db.ping().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "database ping failed");
            false
        }
    };
    readiness(vec![Check {
        name: "database",
        ok: database,
    }])
}
