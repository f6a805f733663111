use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;

use roadwatch_domain::id::IssueId;

use crate::domain::types::RoadIssue;
use crate::error::SyncServiceError;
use crate::state::AppState;
use crate::usecase::road_issue::{
    CreateIssueInput, CreateIssueUseCase, ListIssuesUseCase, UpdateIssueStatusInput,
    UpdateIssueStatusUseCase,
};

// ── GET /road_issues ─────────────────────────────────────────────────────────

pub async fn list_issues(
    State(state): State<AppState>,
) -> Result<Json<Vec<RoadIssue>>, SyncServiceError> {
    let usecase = ListIssuesUseCase {
        issues: state.issue_repo(),
    };
    Ok(Json(usecase.execute().await?))
}

// ── POST /road_issues ────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateIssueRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub user_id: Option<String>,
    pub surface: Option<f64>,
    pub budget: Option<f64>,
    pub niveau_danger: Option<String>,
}

pub async fn create_issue(
    State(state): State<AppState>,
    Json(body): Json<CreateIssueRequest>,
) -> Result<(StatusCode, Json<RoadIssue>), SyncServiceError> {
    let (Some(latitude), Some(longitude)) = (body.latitude, body.longitude) else {
        return Err(SyncServiceError::validation(
            "latitude and longitude are required",
        ));
    };
    let usecase = CreateIssueUseCase {
        issues: state.issue_repo(),
    };
    let issue = usecase
        .execute(CreateIssueInput {
            title: body.title.unwrap_or_default(),
            description: body.description,
            latitude,
            longitude,
            user_id: body.user_id,
            surface: body.surface,
            budget: body.budget,
            niveau_danger: body.niveau_danger,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(issue)))
}

// ── PATCH /road_issues/{id}/status ───────────────────────────────────────────

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

pub async fn update_issue_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<Json<RoadIssue>, SyncServiceError> {
    let usecase = UpdateIssueStatusUseCase {
        issues: state.issue_repo(),
    };
    let issue = usecase
        .execute(UpdateIssueStatusInput {
            id: IssueId::from(id),
            status: body.status,
        })
        .await?;
    Ok(Json(issue))
}
