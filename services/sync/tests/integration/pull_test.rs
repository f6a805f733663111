use chrono::{TimeZone, Utc};
use sea_orm::{EntityTrait, PaginatorTrait, QueryOrder};
use serde_json::json;

use roadwatch_domain::id::IssueId;
use roadwatch_domain::issue::{DangerLevel, IssueStatus};
use roadwatch_sync::domain::repository::{IssueRepository, WatermarkRepository};
use roadwatch_sync::domain::types::SyncSummary;
use roadwatch_sync::usecase::road_issue::{
    CreateIssueInput, CreateIssueUseCase, UpdateIssueStatusInput, UpdateIssueStatusUseCase,
};
use roadwatch_sync_schema::road_issues;

use crate::helpers::{remote_issue, test_state};

#[tokio::test]
async fn should_apply_in_synced_at_order_and_end_on_highest_watermark() {
    let (state, cloud) = test_state().await;
    for (id, ms) in [("a", 5), ("b", 2), ("c", 9)] {
        cloud.insert_remote("road_issues", id, remote_issue(id, "NOUVEAU"), ms);
    }

    let summary = state.driver().pull.execute().await.unwrap();

    assert_eq!(
        summary,
        SyncSummary {
            processed: 3,
            succeeded: 3,
            failed: 0
        }
    );
    assert_eq!(state.watermark_repo().get("road_issues").await.unwrap(), 9);
    let rows = road_issues::Entity::find()
        .order_by_asc(road_issues::Column::Id)
        .all(&state.db)
        .await
        .unwrap();
    let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["a", "b", "c"]);
    assert_eq!(rows[0].niveau_danger, DangerLevel::High.as_str());
    assert_eq!(rows[0].status, IssueStatus::New.as_str());
}

#[tokio::test]
async fn should_leave_rows_and_watermark_unchanged_when_nothing_is_new() {
    let (state, cloud) = test_state().await;
    cloud.insert_remote("road_issues", "a", remote_issue("a", "NOUVEAU"), 7);
    let pull = state.driver().pull;
    pull.execute().await.unwrap();
    let before = road_issues::Entity::find().all(&state.db).await.unwrap();

    let summary = pull.execute().await.unwrap();

    assert_eq!(summary, SyncSummary::default());
    assert_eq!(state.watermark_repo().get("road_issues").await.unwrap(), 7);
    assert_eq!(road_issues::Entity::find().all(&state.db).await.unwrap(), before);
}

#[tokio::test]
async fn should_skip_invalid_document_but_move_past_it() {
    let (state, cloud) = test_state().await;
    cloud.insert_remote("road_issues", "ok", remote_issue("ok", "NOUVEAU"), 3);
    cloud.insert_remote(
        "road_issues",
        "bad",
        json!({ "title": "Fissure", "latitude": 120.0, "longitude": 0.0 }),
        4,
    );

    let summary = state.driver().drain_pull().await.unwrap();

    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(state.watermark_repo().get("road_issues").await.unwrap(), 4);
    assert_eq!(road_issues::Entity::find().count(&state.db).await.unwrap(), 1);
}

#[tokio::test]
async fn should_overwrite_local_fields_with_remote_but_keep_lifecycle_stamps() {
    let (state, cloud) = test_state().await;
    let created = CreateIssueUseCase {
        issues: state.issue_repo(),
    }
    .execute(CreateIssueInput {
        title: "Nid de poule".to_owned(),
        latitude: -18.9,
        longitude: 47.5,
        ..Default::default()
    })
    .await
    .unwrap();
    let started = UpdateIssueStatusUseCase {
        issues: state.issue_repo(),
    }
    .execute(UpdateIssueStatusInput {
        id: created.id.clone(),
        status: "EN_COURS".to_owned(),
    })
    .await
    .unwrap();

    let remote_ms = chrono::Utc::now().timestamp_millis() + 60_000;
    cloud.insert_remote(
        "road_issues",
        created.id.as_str(),
        remote_issue("Nid de poule (agrandi)", "RESOLU"),
        remote_ms,
    );
    state.driver().pull.execute().await.unwrap();

    let issue = state
        .issue_repo()
        .find_by_id(&created.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(issue.title, "Nid de poule (agrandi)");
    assert_eq!(issue.status, IssueStatus::Resolved);
    assert_eq!(issue.budget, 3000.0);
    assert_eq!(issue.started_at, started.started_at);
    assert!(issue.resolved_at.is_some(), "pulled RESOLU must be stamped");
    assert_eq!(issue.created_at, created.created_at);
    assert_eq!(
        state.watermark_repo().get("road_issues").await.unwrap(),
        remote_ms
    );
}

#[tokio::test]
async fn should_never_move_watermark_backwards() {
    let (state, _cloud) = test_state().await;
    let watermarks = state.watermark_repo();

    assert_eq!(watermarks.get("road_issues").await.unwrap(), 0);
    assert_eq!(watermarks.advance("road_issues", 10).await.unwrap(), 10);
    assert_eq!(watermarks.advance("road_issues", 4).await.unwrap(), 10);
    assert_eq!(watermarks.get("road_issues").await.unwrap(), 10);
    assert_eq!(watermarks.get("blocked_users").await.unwrap(), 0);
}

#[tokio::test]
async fn should_insert_unknown_remote_issue_with_reporter() {
    let (state, cloud) = test_state().await;
    let mut data = remote_issue("Affaissement", "EN_ATTENTE");
    data["user_id"] = json!("uid-9");
    cloud.insert_remote("road_issues", "remote-1", data, 11);

    state.driver().drain_pull().await.unwrap();

    let issue = state
        .issue_repo()
        .find_by_id(&IssueId::from("remote-1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(issue.user_id.as_deref(), Some("uid-9"));
    assert_eq!(issue.user_name, None);
    assert_eq!(issue.status, IssueStatus::Pending);
}

#[tokio::test]
async fn should_take_lifecycle_stamps_from_remote_document() {
    let (state, cloud) = test_state().await;
    let mut data = remote_issue("Affaissement", "RESOLU");
    data["started_at"] = json!("2026-01-01T08:00:00.000Z");
    data["resolved_at"] = json!("2026-01-02T08:00:00.000Z");
    cloud.insert_remote("road_issues", "remote-2", data, 5);

    state.driver().pull.execute().await.unwrap();

    let issue = state
        .issue_repo()
        .find_by_id(&IssueId::from("remote-2"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(issue.status, IssueStatus::Resolved);
    assert_eq!(
        issue.started_at,
        Some(Utc.with_ymd_and_hms(2026, 1, 1, 8, 0, 0).unwrap())
    );
    assert_eq!(
        issue.resolved_at,
        Some(Utc.with_ymd_and_hms(2026, 1, 2, 8, 0, 0).unwrap())
    );
}

#[tokio::test]
async fn should_stamp_remote_status_change_and_keep_existing_stamps() {
    let (state, cloud) = test_state().await;
    cloud.insert_remote("road_issues", "remote-3", remote_issue("Fissure", "EN_COURS"), 5);
    state.driver().pull.execute().await.unwrap();
    let started = state
        .issue_repo()
        .find_by_id(&IssueId::from("remote-3"))
        .await
        .unwrap()
        .unwrap()
        .started_at;
    assert!(started.is_some());

    let mut data = remote_issue("Fissure", "RESOLU");
    data["started_at"] = json!("2020-01-01T00:00:00.000Z");
    cloud.insert_remote("road_issues", "remote-3", data, 6);
    state.driver().pull.execute().await.unwrap();

    let issue = state
        .issue_repo()
        .find_by_id(&IssueId::from("remote-3"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(issue.started_at, started);
    assert!(issue.resolved_at.is_some());
}
