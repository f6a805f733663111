use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::domain::repository::{CloudStore, OutboxRepository, WatermarkRepository};
use crate::domain::types::SyncSummary;
use crate::error::SyncServiceError;
use crate::usecase::pull::PullUseCase;
use crate::usecase::push::PushUseCase;

/// Retry budget shared by push and pull drains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_rounds: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_rounds: 3,
            backoff: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Pause after `round` (1-based): `backoff * 2^(round-1)`.
    pub fn delay(&self, round: u32) -> Duration {
        let factor = 1u32
            .checked_shl(round.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.backoff.saturating_mul(factor)
    }

    fn rounds(&self) -> u32 {
        self.max_rounds.max(1)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub push: SyncSummary,
    pub pull: SyncSummary,
}

/// Runs push and pull cycles under one in-process lock so two drains never
/// interleave, whether started over HTTP, from the CLI or by the scheduler.
pub struct SyncDriver<O, W, C>
where
    O: OutboxRepository,
    W: WatermarkRepository,
    C: CloudStore,
{
    pub push: PushUseCase<O, C>,
    pub pull: PullUseCase<W, C>,
    pub policy: RetryPolicy,
    pub lock: Arc<Mutex<()>>,
}

impl<O, W, C> SyncDriver<O, W, C>
where
    O: OutboxRepository,
    W: WatermarkRepository,
    C: CloudStore,
{
    /// Push until a round has no failures or the budget is spent. `failed`
    /// in the result is what the last round could not deliver.
    pub async fn drain_push(&self) -> Result<SyncSummary, SyncServiceError> {
        let _guard = self.lock.lock().await;
        self.push_rounds().await
    }

    /// Pull until a round finds nothing new or the budget is spent.
    pub async fn drain_pull(&self) -> Result<SyncSummary, SyncServiceError> {
        let _guard = self.lock.lock().await;
        self.pull_rounds().await
    }

    /// Push then pull, as one locked unit.
    pub async fn cycle(&self) -> Result<CycleReport, SyncServiceError> {
        let _guard = self.lock.lock().await;
        let push = self.push_rounds().await?;
        let pull = self.pull_rounds().await?;
        Ok(CycleReport { push, pull })
    }

    async fn push_rounds(&self) -> Result<SyncSummary, SyncServiceError> {
        let mut total = SyncSummary::default();
        let rounds = self.policy.rounds();
        for round in 1..=rounds {
            let summary = self.push.execute().await?;
            total.absorb(summary);
            if summary.failed == 0 || round == rounds {
                break;
            }
            let delay = self.policy.delay(round);
            warn!(round, failed = summary.failed, ?delay, "retrying push");
            tokio::time::sleep(delay).await;
        }
        if total.failed > 0 {
            warn!(failed = total.failed, "push drain ended with undelivered entries");
        }
        Ok(total)
    }

    async fn pull_rounds(&self) -> Result<SyncSummary, SyncServiceError> {
        let mut total = SyncSummary::default();
        let rounds = self.policy.rounds();
        for round in 1..=rounds {
            let summary = self.pull.execute().await?;
            total += summary;
            if summary.processed == 0 || round == rounds {
                break;
            }
            if summary.failed > 0 {
                tokio::time::sleep(self.policy.delay(round)).await;
            }
        }
        Ok(total)
    }
}

/// Run a push-then-pull cycle on every tick of `interval`. Errors are logged
/// and the next tick tries again.
pub async fn run_scheduler<F, Fut>(interval: Duration, mut cycle: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<CycleReport, SyncServiceError>>,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    info!(interval_secs = interval.as_secs(), "sync scheduler started");
    loop {
        ticker.tick().await;
        match cycle().await {
            Ok(report) => {
                if report.push.processed + report.pull.processed > 0 {
                    info!(
                        pushed = report.push.succeeded,
                        push_failed = report.push.failed,
                        pulled = report.pull.succeeded,
                        pull_failed = report.pull.failed,
                        "scheduled sync finished"
                    );
                }
            }
            Err(e) => warn!(error = %e.detail(), "scheduled sync failed"),
        }
    }
}
