use std::sync::Arc;

use sea_orm::DatabaseConnection;
use tokio::sync::Mutex;

use crate::infra::cloud::Cloud;
use crate::infra::db::{
    DbIssueRepository, DbOutboxRepository, DbUserRepository, DbWatermarkRepository,
};
use crate::usecase::driver::{RetryPolicy, SyncDriver};
use crate::usecase::pull::PullUseCase;
use crate::usecase::push::PushUseCase;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub cloud: Cloud,
    pub retry: RetryPolicy,
    /// Serializes sync cycles across handlers, the CLI and the scheduler.
    pub sync_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, cloud: Cloud, retry: RetryPolicy) -> Self {
        Self {
            db,
            cloud,
            retry,
            sync_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn issue_repo(&self) -> DbIssueRepository {
        DbIssueRepository {
            db: self.db.clone(),
        }
    }

    pub fn outbox_repo(&self) -> DbOutboxRepository {
        DbOutboxRepository {
            db: self.db.clone(),
        }
    }

    pub fn watermark_repo(&self) -> DbWatermarkRepository {
        DbWatermarkRepository {
            db: self.db.clone(),
        }
    }

    pub fn user_repo(&self) -> DbUserRepository {
        DbUserRepository {
            db: self.db.clone(),
        }
    }

    pub fn driver(&self) -> SyncDriver<DbOutboxRepository, DbWatermarkRepository, Cloud> {
        SyncDriver {
            push: PushUseCase {
                outbox: self.outbox_repo(),
                cloud: self.cloud.clone(),
            },
            pull: PullUseCase {
                watermarks: self.watermark_repo(),
                cloud: self.cloud.clone(),
            },
            policy: self.retry,
            lock: Arc::clone(&self.sync_lock),
        }
    }
}
