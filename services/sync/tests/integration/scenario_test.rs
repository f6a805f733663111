use sea_orm::EntityTrait;

use roadwatch_domain::issue::IssueStatus;
use roadwatch_domain::sync::{SyncAction, SyncStatus};
use roadwatch_sync::domain::repository::{OutboxRepository, WatermarkRepository};
use roadwatch_sync::domain::types::SyncSummary;
use roadwatch_sync::usecase::road_issue::{
    CreateIssueInput, CreateIssueUseCase, UpdateIssueStatusInput, UpdateIssueStatusUseCase,
};
use roadwatch_sync_schema::road_issues;

use crate::helpers::test_state;

#[tokio::test]
async fn should_replicate_issue_through_full_lifecycle() {
    let (state, cloud) = test_state().await;
    let driver = state.driver();

    // Create locally.
    let issue = CreateIssueUseCase {
        issues: state.issue_repo(),
    }
    .execute(CreateIssueInput {
        title: "Nid de poule RN7".to_owned(),
        latitude: -19.87,
        longitude: 47.03,
        ..Default::default()
    })
    .await
    .unwrap();
    assert_eq!(issue.status, IssueStatus::Pending);

    // Push: entry delivered, cloud document stamped.
    let pushed = driver.drain_push().await.unwrap();
    assert_eq!(pushed.succeeded, 1);
    let entries = state.outbox_repo().list(None, None).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].status, SyncStatus::Success);
    let doc = cloud.document("road_issues", issue.id.as_str()).unwrap();
    assert!(doc.synced_at_ms > 0);
    assert!(doc.data["synced_at"].is_string());
    assert_eq!(doc.data["title"], "Nid de poule RN7");

    // Pull reads back our own write without changing anything locally.
    let before = road_issues::Entity::find().all(&state.db).await.unwrap();
    driver.drain_pull().await.unwrap();
    assert_eq!(road_issues::Entity::find().all(&state.db).await.unwrap(), before);
    assert_eq!(
        state.watermark_repo().get("road_issues").await.unwrap(),
        doc.synced_at_ms
    );
    assert_eq!(
        driver.pull.execute().await.unwrap(),
        SyncSummary::default(),
        "nothing new remains after the watermark"
    );

    // Resolve: stamped locally, UPDATE entry enqueued.
    let resolved = UpdateIssueStatusUseCase {
        issues: state.issue_repo(),
    }
    .execute(UpdateIssueStatusInput {
        id: issue.id.clone(),
        status: "RESOLU".to_owned(),
    })
    .await
    .unwrap();
    assert!(resolved.resolved_at.is_some());
    assert!(resolved.started_at.is_none());

    let pending = state.outbox_repo().list_pending(None).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].action, SyncAction::Update);
    assert_eq!(pending[0].payload["status"], "RESOLU");
    assert!(pending[0].payload["resolved_at"].is_string());

    // The next push carries the stamped snapshot to the cloud.
    driver.drain_push().await.unwrap();
    let doc = cloud.document("road_issues", issue.id.as_str()).unwrap();
    assert_eq!(doc.data["status"], "RESOLU");
    assert_eq!(doc.data["resolved_at"], pending[0].payload["resolved_at"]);
}
