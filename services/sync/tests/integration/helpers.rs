use std::time::Duration;

use axum_test::TestServer;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, ConnectOptions, Database, DatabaseConnection};

use roadwatch_sync::infra::cloud::{Cloud, MemoryCloudStore};
use roadwatch_sync::router::build_router;
use roadwatch_sync::state::AppState;
use roadwatch_sync::usecase::driver::RetryPolicy;
use roadwatch_sync_migration::{Migrator, MigratorTrait};
use roadwatch_sync_schema::users;

/// Fresh in-memory database with every migration applied.
///
/// A single pooled connection keeps every query on the same memory database.
pub async fn test_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    db
}

/// State over a fresh database and an in-memory cloud. The returned store
/// shares its contents with the one inside the state.
pub async fn test_state() -> (AppState, MemoryCloudStore) {
    let cloud = MemoryCloudStore::new();
    let state = AppState::new(
        test_db().await,
        Cloud::Memory(cloud.clone()),
        RetryPolicy {
            max_rounds: 2,
            backoff: Duration::ZERO,
        },
    );
    (state, cloud)
}

pub fn test_server(state: AppState) -> TestServer {
    TestServer::new(build_router(state)).unwrap()
}

pub async fn seed_user(db: &DatabaseConnection, id: &str, email: &str, name: &str) {
    users::ActiveModel {
        id: Set(id.to_owned()),
        email: Set(email.to_owned()),
        name: Set(name.to_owned()),
        role_id: Set(1),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .unwrap();
}

/// Valid remote issue document body.
pub fn remote_issue(title: &str, status: &str) -> serde_json::Value {
    serde_json::json!({
        "title": title,
        "description": "",
        "latitude": -18.9,
        "longitude": 47.5,
        "niveau_danger": "ELEVE",
        "status": status,
        "surface": 12.5,
        "budget": 3000.0,
    })
}
