use serde_json::json;

use roadwatch_domain::sync::{EntityKind, SyncAction, SyncStatus};
use roadwatch_sync::domain::repository::OutboxRepository;
use roadwatch_sync::domain::types::{OutboxEntry, SyncSummary};
use roadwatch_sync::infra::db::enqueue;
use roadwatch_sync::usecase::push::PushUseCase;

use crate::helpers::test_state;

#[tokio::test]
async fn should_upsert_replayed_payload_into_one_document() {
    let (state, cloud) = test_state().await;
    let payload = json!({ "id": "issue-1", "title": "Nid de poule", "status": "EN_ATTENTE" });
    for _ in 0..2 {
        let entry = OutboxEntry::pending(
            EntityKind::RoadIssue,
            "issue-1",
            SyncAction::Push,
            payload.clone(),
        );
        enqueue(&state.db, &entry).await.unwrap();
    }

    let uc = PushUseCase {
        outbox: state.outbox_repo(),
        cloud: state.cloud.clone(),
    };
    let summary = uc.execute().await.unwrap();

    assert_eq!(summary.succeeded, 2);
    assert_eq!(cloud.len("road_issues"), 1);
    let mut stored = cloud.document("road_issues", "issue-1").unwrap().data;
    assert!(
        stored.as_object_mut().unwrap().remove("synced_at").is_some(),
        "cloud must stamp synced_at"
    );
    assert_eq!(stored, payload);
}

#[tokio::test]
async fn should_mark_failed_when_cloud_is_unreachable_and_recover_on_drain() {
    let (state, cloud) = test_state().await;
    let entry = OutboxEntry::pending(
        EntityKind::UserBlocked,
        "uid-1",
        SyncAction::Update,
        json!({ "user_id": "uid-1", "is_blocked": true, "reason": "spam" }),
    );
    enqueue(&state.db, &entry).await.unwrap();

    cloud.set_offline(true);
    let summary = state.driver().drain_push().await.unwrap();
    assert_eq!(
        summary,
        SyncSummary {
            processed: 2,
            succeeded: 0,
            failed: 1
        }
    );
    let failed = state
        .outbox_repo()
        .list(Some(SyncStatus::Failed), None)
        .await
        .unwrap();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].attempts, 2);
    assert!(
        failed[0]
            .last_error
            .as_deref()
            .unwrap()
            .contains("offline")
    );

    cloud.set_offline(false);
    let summary = state.driver().drain_push().await.unwrap();
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(
        cloud.document("blocked_users", "uid-1").unwrap().data["is_blocked"],
        true
    );
}

#[tokio::test]
async fn should_do_nothing_when_outbox_is_drained() {
    let (state, cloud) = test_state().await;
    let summary = state.driver().drain_push().await.unwrap();
    assert_eq!(summary, SyncSummary::default());
    assert!(cloud.is_empty("road_issues"));
}
