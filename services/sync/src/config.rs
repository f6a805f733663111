use std::time::Duration;

use crate::usecase::driver::RetryPolicy;

/// Which cloud store the service replicates with. Env var: `CLOUD_BACKEND`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloudBackend {
    Firestore,
    /// Process-local store; nothing leaves the machine.
    Memory,
}

impl CloudBackend {
    /// Delivering outbox entries marks them SUCCESS for good, so a one-shot
    /// `command` must not deliver to a store that vanishes when the process exits.
    pub fn ensure_durable(self, command: &str) -> anyhow::Result<()> {
        if self == Self::Memory {
            anyhow::bail!(
                "`{command}` would mark outbox entries delivered to a process-local store; \
                 set CLOUD_BACKEND=firestore or use `serve`"
            );
        }
        Ok(())
    }
}

/// Firestore REST endpoint and credentials.
#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    /// Env var: `FIRESTORE_BASE_URL` (default `https://firestore.googleapis.com/v1`).
    pub base_url: String,
    /// Env var: `FIRESTORE_PROJECT_ID`.
    pub project_id: String,
    /// Env var: `FIRESTORE_DATABASE` (default `(default)`).
    pub database: String,
    /// OAuth2 bearer token. Env var: `FIRESTORE_ACCESS_TOKEN`. Unset for the emulator.
    pub access_token: Option<String>,
}

/// Sync service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// TCP port for the HTTP server (default 3000). Env var: `SYNC_PORT`.
    pub sync_port: u16,
    pub cloud_backend: CloudBackend,
    /// Present when `cloud_backend` is `Firestore`.
    pub firestore: Option<FirestoreConfig>,
    /// Per-request cloud timeout (default 10s). Env var: `CLOUD_TIMEOUT_SECS`.
    pub cloud_timeout: Duration,
    /// Background push/pull period. Env var: `SYNC_INTERVAL_SECS`; unset disables the scheduler.
    pub sync_interval: Option<Duration>,
    /// Env vars: `SYNC_MAX_ROUNDS` (default 3), `SYNC_BACKOFF_MS` (default 500).
    pub retry: RetryPolicy,
}

impl SyncConfig {
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let parsed = |key: &str| var(key).and_then(|v| v.trim().parse::<u64>().ok());

        let cloud_backend = match var("CLOUD_BACKEND").as_deref().map(str::trim) {
            None | Some("") | Some("firestore") => CloudBackend::Firestore,
            Some("memory") => CloudBackend::Memory,
            Some(other) => panic!("CLOUD_BACKEND must be firestore or memory, got {other:?}"),
        };
        let firestore = (cloud_backend == CloudBackend::Firestore).then(|| FirestoreConfig {
            base_url: var("FIRESTORE_BASE_URL")
                .unwrap_or_else(|| "https://firestore.googleapis.com/v1".to_owned()),
            project_id: var("FIRESTORE_PROJECT_ID").expect("FIRESTORE_PROJECT_ID"),
            database: var("FIRESTORE_DATABASE").unwrap_or_else(|| "(default)".to_owned()),
            access_token: var("FIRESTORE_ACCESS_TOKEN").filter(|t| !t.is_empty()),
        });

        Self {
            database_url: var("DATABASE_URL").expect("DATABASE_URL"),
            sync_port: var("SYNC_PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            cloud_backend,
            firestore,
            cloud_timeout: Duration::from_secs(parsed("CLOUD_TIMEOUT_SECS").unwrap_or(10)),
            sync_interval: parsed("SYNC_INTERVAL_SECS")
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            retry: RetryPolicy {
                max_rounds: parsed("SYNC_MAX_ROUNDS")
                    .and_then(|v| u32::try_from(v).ok())
                    .filter(|rounds| *rounds > 0)
                    .unwrap_or(3),
                backoff: Duration::from_millis(parsed("SYNC_BACKOFF_MS").unwrap_or(500)),
            },
        }
    }
}
