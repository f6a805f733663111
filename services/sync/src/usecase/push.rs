use std::collections::HashMap;

use futures::future::join_all;
use tracing::{error, info, warn};

use roadwatch_domain::sync::EntityKind;

use crate::domain::repository::{CloudStore, OutboxRepository};
use crate::domain::types::{DeliveryOutcome, OutboxEntry, SyncSummary};
use crate::error::SyncServiceError;

/// One push cycle: deliver every deliverable outbox entry to the cloud.
pub struct PushUseCase<O, C>
where
    O: OutboxRepository,
    C: CloudStore,
{
    pub outbox: O,
    pub cloud: C,
}

impl<O, C> PushUseCase<O, C>
where
    O: OutboxRepository,
    C: CloudStore,
{
    /// Different documents are delivered concurrently; entries for the same
    /// document go in creation order and stop at the first failure, so a
    /// retried older snapshot never lands after a newer one.
    pub async fn execute(&self) -> Result<SyncSummary, SyncServiceError> {
        let entries = self.outbox.list_pending(None).await?;
        if entries.is_empty() {
            return Ok(SyncSummary::default());
        }

        let chains = by_document(&entries);
        let mut summary = SyncSummary::default();
        for chain in join_all(chains.into_iter().map(|chain| self.deliver_chain(chain))).await {
            summary += chain;
        }
        info!(
            processed = summary.processed,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "push cycle finished"
        );
        Ok(summary)
    }

    async fn deliver_chain(&self, chain: Vec<&OutboxEntry>) -> SyncSummary {
        let mut summary = SyncSummary::default();
        for entry in chain {
            summary.processed += 1;
            if self.deliver(entry).await {
                summary.succeeded += 1;
            } else {
                summary.failed += 1;
                break;
            }
        }
        summary
    }

    async fn deliver(&self, entry: &OutboxEntry) -> bool {
        let outcome = match self
            .cloud
            .upsert_document(entry.entity.collection(), &entry.entity_id, &entry.payload)
            .await
        {
            Ok(()) => DeliveryOutcome::Success,
            Err(e) => {
                warn!(
                    entry_id = %entry.id,
                    entity = %entry.entity,
                    entity_id = %entry.entity_id,
                    attempts = entry.attempts + 1,
                    error = %e.detail(),
                    "push delivery failed"
                );
                DeliveryOutcome::Failed(e.detail())
            }
        };
        let delivered = outcome == DeliveryOutcome::Success;
        match self.outbox.mark_result(entry.id, &outcome).await {
            Ok(()) => delivered,
            Err(e) => {
                // The entry stays deliverable and is retried next cycle.
                error!(entry_id = %entry.id, error = %e.detail(), "failed to record push outcome");
                false
            }
        }
    }
}

/// Group entries by target document, keeping creation order inside a group.
fn by_document(entries: &[OutboxEntry]) -> Vec<Vec<&OutboxEntry>> {
    let mut index: HashMap<(EntityKind, &str), usize> = HashMap::new();
    let mut chains: Vec<Vec<&OutboxEntry>> = Vec::new();
    for entry in entries {
        let slot = *index
            .entry((entry.entity, entry.entity_id.as_str()))
            .or_insert_with(|| {
                chains.push(Vec::new());
                chains.len() - 1
            });
        chains[slot].push(entry);
    }
    chains
}
