use axum::Json;
use axum::http::StatusCode;
use serde::Serialize;

/// Liveness probe for `GET /healthz`. Never touches dependencies.
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// Outcome of a single dependency probe reported by `GET /readyz`.
#[derive(Debug, Clone, Serialize)]
pub struct Check {
    pub name: &'static str,
    pub ok: bool,
}

#[derive(Debug, Serialize)]
pub struct Readiness {
    pub ready: bool,
    pub checks: Vec<Check>,
}

/// Fold dependency probes into a readiness response: 200 when every check
/// passed, 503 otherwise.
pub fn readiness(checks: Vec<Check>) -> (StatusCode, Json<Readiness>) {
    let ready = checks.iter().all(|c| c.ok);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(Readiness { ready, checks }))
}
