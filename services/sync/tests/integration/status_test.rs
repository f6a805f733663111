use chrono::{Duration, Utc};

use roadwatch_domain::id::IssueId;
use roadwatch_domain::issue::{DangerLevel, IssueStatus};
use roadwatch_domain::sync::SyncAction;
use roadwatch_sync::domain::repository::{IssueRepository, OutboxRepository};
use roadwatch_sync::domain::types::{NewIssue, RoadIssue};
use roadwatch_sync::error::SyncServiceError;
use roadwatch_sync::infra::db::DbIssueRepository;
use roadwatch_sync::state::AppState;

use crate::helpers::{seed_user, test_state};

fn new_issue(user_id: Option<&str>) -> NewIssue {
    NewIssue {
        title: "Nid de poule".to_owned(),
        description: "Route d'Ivato".to_owned(),
        latitude: -18.8,
        longitude: 47.48,
        danger_level: DangerLevel::High,
        surface: 4.0,
        budget: 150_000.0,
        user_id: user_id.map(str::to_owned),
    }
}

async fn created(state: &AppState) -> (DbIssueRepository, RoadIssue) {
    let repo = state.issue_repo();
    let issue = repo
        .create_with_outbox(&IssueId::generate(), &new_issue(None), Utc::now())
        .await
        .unwrap();
    (repo, issue)
}

#[tokio::test]
async fn should_stamp_started_at_once() {
    let (state, _cloud) = test_state().await;
    let (repo, issue) = created(&state).await;
    let first_at = Utc::now();

    let first = repo
        .transition_with_outbox(&issue.id, IssueStatus::InProgress, first_at)
        .await
        .unwrap();
    let second = repo
        .transition_with_outbox(
            &issue.id,
            IssueStatus::InProgress,
            first_at + Duration::minutes(5),
        )
        .await
        .unwrap();

    assert_eq!(first.started_at, Some(first_at));
    assert_eq!(second.started_at, Some(first_at));
    assert_eq!(second.updated_at, first_at + Duration::minutes(5));
    assert!(second.resolved_at.is_none());

    let stored = repo.find_by_id(&issue.id).await.unwrap().unwrap();
    assert_eq!(stored.started_at, Some(first_at));
}

#[tokio::test]
async fn should_enqueue_update_carrying_persisted_snapshot() {
    let (state, _cloud) = test_state().await;
    seed_user(&state.db, "uid-1", "rakoto@example.mg", "Rakoto").await;
    let repo = state.issue_repo();
    let issue = repo
        .create_with_outbox(&IssueId::generate(), &new_issue(Some("uid-1")), Utc::now())
        .await
        .unwrap();
    assert_eq!(issue.user_name.as_deref(), Some("Rakoto"));

    let resolved = repo
        .transition_with_outbox(&issue.id, IssueStatus::Resolved, Utc::now())
        .await
        .unwrap();

    let entries = state.outbox_repo().list(None, None).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].action, SyncAction::Push);
    assert_eq!(entries[1].action, SyncAction::Update);
    assert_eq!(entries[1].entity_id, issue.id.as_str());

    let stored = repo.find_by_id(&issue.id).await.unwrap().unwrap();
    assert!(stored.resolved_at.is_some());
    assert_eq!(stored, resolved);
    assert_eq!(entries[1].payload, serde_json::to_value(&stored).unwrap());
    assert_eq!(entries[1].payload["status"], "RESOLU");
}

#[tokio::test]
async fn should_reject_reopening_and_leave_no_trace() {
    let (state, _cloud) = test_state().await;
    let (repo, issue) = created(&state).await;
    let cancelled = repo
        .transition_with_outbox(&issue.id, IssueStatus::Cancelled, Utc::now())
        .await
        .unwrap();

    let result = repo
        .transition_with_outbox(&issue.id, IssueStatus::New, Utc::now())
        .await;

    assert!(
        matches!(
            result,
            Err(SyncServiceError::InvalidTransition {
                from: IssueStatus::Cancelled,
                to: IssueStatus::New
            })
        ),
        "expected InvalidTransition, got {result:?}"
    );
    assert_eq!(repo.find_by_id(&issue.id).await.unwrap().unwrap(), cancelled);
    assert_eq!(state.outbox_repo().list(None, None).await.unwrap().len(), 2);
}

#[tokio::test]
async fn should_return_not_found_without_enqueueing() {
    let (state, _cloud) = test_state().await;
    let result = state
        .issue_repo()
        .transition_with_outbox(&IssueId::from("missing"), IssueStatus::Resolved, Utc::now())
        .await;

    assert!(matches!(result, Err(SyncServiceError::IssueNotFound)));
    assert!(state.outbox_repo().list(None, None).await.unwrap().is_empty());
}
