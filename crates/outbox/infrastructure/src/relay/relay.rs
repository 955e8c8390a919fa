//! Outbox Relay
//!
//! Background service that claims unpublished rows from the outbox table
//! and hands them to the event publisher, one transaction per cycle.

use crate::persistence::{OutboxStoreError, PostgresOutboxStore};
use crate::relay::EventPublisher;
use sqlx::postgres::PgPool;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use yeelo_outbox_domain::outbox::{BatchReport, DeliveryOutcome};
use yeelo_outbox_domain::transport::EventTransport;

/// Configuration for the relay
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Maximum number of rows claimed per cycle
    pub batch_size: usize,
    /// How long to sleep when a cycle finds no work (or fails to claim)
    pub poll_interval: Duration,
    /// Source tag stamped into published envelopes
    pub source: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            poll_interval: Duration::from_millis(5000),
            source: "yeelo-outbox-publisher".to_string(),
        }
    }
}

/// Counters collected by the relay
#[derive(Debug, Default)]
struct RelayMetrics {
    events_published_total: u64,
    events_dead_lettered_total: u64,
    batch_count: u64,
    current_queue_depth: u64,
}

impl RelayMetrics {
    fn record_batch(&mut self, report: &BatchReport) {
        self.batch_count += 1;
        self.events_published_total += report.delivered as u64;
        self.events_dead_lettered_total += report.dead_lettered as u64;
    }

    fn snapshot(&self) -> RelayMetricsSnapshot {
        RelayMetricsSnapshot {
            events_published_total: self.events_published_total,
            events_dead_lettered_total: self.events_dead_lettered_total,
            batch_count: self.batch_count,
            current_queue_depth: self.current_queue_depth,
        }
    }
}

/// Snapshot of relay counters for reporting
#[derive(Debug, Clone, Copy)]
pub struct RelayMetricsSnapshot {
    pub events_published_total: u64,
    pub events_dead_lettered_total: u64,
    pub batch_count: u64,
    pub current_queue_depth: u64,
}

/// Error type for relay operations
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Outbox store error: {0}")]
    Store(#[from] OutboxStoreError),
}

/// Outbox Relay Service
///
/// Owns the database pool, the transport, and the polling configuration.
/// Constructed once at process start; `run` is the explicit lifecycle
/// entry point and returns when the shutdown channel flips.
pub struct OutboxRelay {
    store: PostgresOutboxStore,
    publisher: EventPublisher,
    config: RelayConfig,
    metrics: Mutex<RelayMetrics>,
}

impl OutboxRelay {
    pub fn new(pool: PgPool, transport: Arc<dyn EventTransport>, config: RelayConfig) -> Self {
        let publisher = EventPublisher::new(transport, config.source.clone());
        Self {
            store: PostgresOutboxStore::new(pool),
            publisher,
            config,
            metrics: Mutex::new(RelayMetrics::default()),
        }
    }

    pub fn store(&self) -> &PostgresOutboxStore {
        &self.store
    }

    /// Snapshot of the relay counters (thread-safe).
    pub fn metrics(&self) -> RelayMetricsSnapshot {
        self.metrics.lock().unwrap().snapshot()
    }

    /// Run the relay until the shutdown channel reads true.
    ///
    /// A cycle that finds no work (or fails to claim) sleeps for the poll
    /// interval; a productive cycle polls again immediately. A batch once
    /// claimed is always processed to completion: shutdown is only checked
    /// between cycles, never mid-batch.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<(), RelayError> {
        info!(
            batch_size = self.config.batch_size,
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            "🚀 Outbox relay started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            match self.poll_cycle().await {
                Ok(report) if report.is_empty() => {
                    debug!("No unpublished records");
                    self.idle_wait(&mut shutdown).await;
                }
                Ok(report) => {
                    info!(
                        claimed = report.claimed,
                        delivered = report.delivered,
                        dead_lettered = report.dead_lettered,
                        backlog = self.metrics.lock().unwrap().current_queue_depth,
                        "✅ Batch committed"
                    );
                }
                Err(e) => {
                    // Whole batch rolled back; nothing was marked
                    error!(error = %e, "Poll cycle failed, retrying after poll interval");
                    self.idle_wait(&mut shutdown).await;
                }
            }
        }

        info!("Outbox relay stopped");
        Ok(())
    }

    /// One claim/publish/commit cycle.
    ///
    /// Claims a batch under `FOR UPDATE SKIP LOCKED`, publishes each row
    /// sequentially collecting a per-row outcome, then applies every mark
    /// (published flag, dead letters) in the claiming transaction and
    /// commits. Any error before the commit rolls back the whole batch.
    pub async fn poll_cycle(&self) -> Result<BatchReport, RelayError> {
        let mut tx = self.store.pool().begin().await?;

        let records = self.store.claim_batch(&mut tx, self.config.batch_size).await?;
        if records.is_empty() {
            tx.commit().await?;
            return Ok(BatchReport::default());
        }

        debug!(count = records.len(), "📦 Claimed outbox records");

        // Sequential on purpose: per-row errors stay attributable and
        // claim-order delivery is preserved within the batch.
        let mut outcomes = Vec::with_capacity(records.len());
        for record in &records {
            let outcome = match self.publisher.publish(record).await {
                Ok(()) => DeliveryOutcome::Delivered,
                Err(e) => {
                    warn!(
                        event_id = %record.id,
                        event_type = %record.event_type,
                        error = %e,
                        "Delivery failed, dead-lettering"
                    );
                    DeliveryOutcome::DeadLettered {
                        reason: e.to_string(),
                    }
                }
            };
            outcomes.push(outcome);
        }

        for (record, outcome) in records.iter().zip(&outcomes) {
            if let DeliveryOutcome::DeadLettered { reason } = outcome {
                self.store
                    .upsert_dead_letter(&mut tx, record.id, reason)
                    .await?;
            }
        }

        // Dead-lettered rows are marked published too: a handled failure
        // is terminal for this component.
        let all_ids: Vec<Uuid> = records.iter().map(|r| r.id).collect();
        self.store.mark_published(&mut tx, &all_ids).await?;

        tx.commit().await?;

        let report = BatchReport {
            claimed: records.len(),
            delivered: outcomes.iter().filter(|o| o.is_delivered()).count(),
            dead_lettered: outcomes.iter().filter(|o| !o.is_delivered()).count(),
        };

        let backlog = self.store.count_unpublished().await.unwrap_or(0);
        {
            let mut metrics = self.metrics.lock().unwrap();
            metrics.record_batch(&report);
            metrics.current_queue_depth = backlog;
        }

        Ok(report)
    }

    /// Sleep for the poll interval, waking early on shutdown.
    async fn idle_wait(&self, shutdown: &mut watch::Receiver<bool>) {
        tokio::select! {
            _ = sleep(self.config.poll_interval) => {}
            _ = shutdown.changed() => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = RelayConfig::default();
        assert_eq!(config.batch_size, 100);
        assert_eq!(config.poll_interval, Duration::from_millis(5000));
    }

    #[test]
    fn test_metrics_accumulate_batches() {
        let mut metrics = RelayMetrics::default();
        metrics.record_batch(&BatchReport {
            claimed: 3,
            delivered: 2,
            dead_lettered: 1,
        });
        metrics.record_batch(&BatchReport {
            claimed: 1,
            delivered: 1,
            dead_lettered: 0,
        });

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.batch_count, 2);
        assert_eq!(snapshot.events_published_total, 3);
        assert_eq!(snapshot.events_dead_lettered_total, 1);
    }
}
