use axum::http::StatusCode;
use serde_json::{Value, json};

use crate::helpers::{remote_issue, seed_user, test_server, test_state};

fn issue_body(title: &str) -> Value {
    json!({
        "title": title,
        "latitude": -18.91,
        "longitude": 47.52,
        "surface": 3.5,
        "niveau_danger": "faible",
    })
}

#[tokio::test]
async fn should_report_health_and_readiness() {
    let (state, _cloud) = test_state().await;
    let server = test_server(state);

    server.get("/healthz").await.assert_status_ok();
    let ready = server.get("/readyz").await;
    ready.assert_status_ok();
    assert_eq!(ready.json::<Value>()["ready"], true);
}

#[tokio::test]
async fn should_create_issue_and_list_newest_first() {
    let (state, _cloud) = test_state().await;
    let server = test_server(state);

    let created = server.post("/road_issues").json(&issue_body("Premier")).await;
    created.assert_status(StatusCode::CREATED);
    assert!(created.headers().contains_key("x-request-id"));
    let created: Value = created.json();
    assert_eq!(created["status"], "EN_ATTENTE");
    assert_eq!(created["niveau_danger"], "FAIBLE");
    assert_eq!(created["budget"], 0.0);
    assert_eq!(created["started_at"], Value::Null);
    server
        .post("/road_issues")
        .json(&issue_body("Second"))
        .await
        .assert_status(StatusCode::CREATED);

    let listed: Value = server.get("/road_issues").await.json();
    let titles: Vec<&str> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["Second", "Premier"]);
}

#[tokio::test]
async fn should_reject_invalid_issue_with_validation_kind() {
    let (state, _cloud) = test_state().await;
    let server = test_server(state);

    let response = server
        .post("/road_issues")
        .json(&json!({ "title": "Fissure", "latitude": 95.0, "longitude": 0.0 }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["kind"], "VALIDATION_ERROR");

    server
        .post("/road_issues")
        .json(&json!({ "title": "Fissure" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn should_map_status_update_outcomes_to_http() {
    let (state, _cloud) = test_state().await;
    let server = test_server(state);
    let created: Value = server.post("/road_issues").json(&issue_body("A")).await.json();
    let path = format!("/road_issues/{}/status", created["id"].as_str().unwrap());

    let resolved = server.patch(&path).json(&json!({ "status": "TERMINÉ" })).await;
    resolved.assert_status_ok();
    let resolved: Value = resolved.json();
    assert_eq!(resolved["status"], "RESOLU");
    assert!(resolved["resolved_at"].is_string());

    let reopened = server.patch(&path).json(&json!({ "status": "EN_COURS" })).await;
    reopened.assert_status(StatusCode::CONFLICT);
    assert_eq!(reopened.json::<Value>()["kind"], "INVALID_TRANSITION");

    server
        .patch(&path)
        .json(&json!({ "status": "FINI" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    server
        .patch("/road_issues/missing/status")
        .json(&json!({ "status": "RESOLU" }))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn should_list_and_mark_sync_logs() {
    let (state, _cloud) = test_state().await;
    let server = test_server(state);
    server.post("/road_issues").json(&issue_body("A")).await;

    let pending: Value = server
        .get("/sync_logs")
        .add_query_param("status", "PENDING")
        .await
        .json();
    let pending = pending.as_array().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0]["action"], "PUSH");
    assert_eq!(pending[0]["entity"], "road_issue");
    assert_eq!(pending[0]["data"]["title"], "A");
    let id = pending[0]["id"].as_str().unwrap();

    let marked = server
        .patch(&format!("/sync_logs/{id}"))
        .json(&json!({ "status": "SUCCESS" }))
        .await;
    marked.assert_status_ok();
    assert_eq!(marked.json::<Value>(), json!({ "success": true }));

    let success: Value = server
        .get("/sync_logs")
        .add_query_param("status", "SUCCESS")
        .await
        .json();
    assert_eq!(success[0]["id"], id);
    assert!(success[0]["synced_at"].is_string());

    server
        .patch("/sync_logs/0190a5a0-0000-7000-8000-000000000000")
        .json(&json!({ "status": "FAILED" }))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    server
        .get("/sync_logs")
        .add_query_param("status", "DONE")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn should_apply_remote_document_and_report_new_index() {
    let (state, _cloud) = test_state().await;
    let server = test_server(state);

    let meta: Value = server.get("/sync_meta/road_issues").await.json();
    assert_eq!(meta, json!({ "last_firebase_log": 0 }));

    let mut data = remote_issue("Affaissement", "NOUVEAU");
    data["synced_at"] = json!({ "seconds": 1_760_000_000, "nanoseconds": 250_000_000 });
    let applied = server
        .post("/sync_pull")
        .json(&json!({ "entity": "road_issues", "entity_id": "remote-1", "data": data }))
        .await;
    applied.assert_status_ok();
    assert_eq!(
        applied.json::<Value>(),
        json!({ "success": true, "newIndex": 1_760_000_000_250_i64 })
    );

    let meta: Value = server.get("/sync_meta/road_issue").await.json();
    assert_eq!(meta["last_firebase_log"], 1_760_000_000_250_i64);
    let listed: Value = server.get("/road_issues").await.json();
    assert_eq!(listed[0]["id"], "remote-1");
    assert_eq!(listed[0]["status"], "NOUVEAU");
}

#[tokio::test]
async fn should_drain_sync_cycles_over_http() {
    let (state, cloud) = test_state().await;
    let server = test_server(state);
    let created: Value = server.post("/road_issues").json(&issue_body("A")).await.json();

    let pushed: Value = server.post("/sync/push").await.json();
    assert_eq!(
        pushed,
        json!({ "processed": 1, "succeeded": 1, "failed": 0 })
    );
    assert!(
        cloud
            .document("road_issues", created["id"].as_str().unwrap())
            .is_some()
    );

    let pulled = server.post("/sync/pull").await;
    pulled.assert_status_ok();
    assert_eq!(pulled.json::<Value>()["failed"], 0);

    cloud.set_offline(true);
    let offline = server.post("/sync/pull").await;
    offline.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(offline.json::<Value>()["kind"], "TRANSIENT_NETWORK_ERROR");
}

#[tokio::test]
async fn should_block_and_unblock_users() {
    let (state, cloud) = test_state().await;
    seed_user(&state.db, "uid-1", "rakoto@example.mg", "Rakoto").await;
    seed_user(&state.db, "uid-2", "andry@example.mg", "Andry").await;
    let server = test_server(state);

    server
        .post("/users/block")
        .json(&json!({ "email": "rakoto@example.mg" }))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let users: Value = server.get("/users_with_status").await.json();
    assert_eq!(users[0]["name"], "Andry");
    assert_eq!(users[0]["is_blocked"], false);
    assert_eq!(users[1]["is_blocked"], true);
    assert_eq!(users[1]["block_reason"], "too many failed sign-in attempts");

    server
        .delete("/users/unblock/uid-1")
        .await
        .assert_status(StatusCode::NO_CONTENT);
    let users: Value = server.get("/users_with_status").await.json();
    assert_eq!(users[1]["is_blocked"], false);

    server.post("/sync/push").await.assert_status_ok();
    let doc = cloud.document("blocked_users", "uid-1").unwrap();
    assert_eq!(doc.data["is_blocked"], false);

    server
        .post("/users/block")
        .json(&json!({ "email": "nobody@example.mg" }))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    server
        .delete("/users/unblock/ghost")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn should_refuse_blocked_account_lookup() {
    let (state, _cloud) = test_state().await;
    seed_user(&state.db, "uid-1", "rakoto@example.mg", "Rakoto").await;
    let server = test_server(state);

    let user = server.get("/users/uid-1").await;
    user.assert_status_ok();
    let user: Value = user.json();
    assert_eq!(user["email"], "rakoto@example.mg");
    assert_eq!(user["is_blocked"], false);

    server
        .post("/users/block")
        .json(&json!({ "email": "rakoto@example.mg" }))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    let blocked = server.get("/users/uid-1").await;
    blocked.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(blocked.json::<Value>()["kind"], "USER_BLOCKED");

    server
        .get("/users/ghost")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}
