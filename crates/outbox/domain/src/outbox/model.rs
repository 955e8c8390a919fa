//! Outbox Record Model
//!
//! Domain model for rows of the `outbox` table. Rows are written by the
//! platform services in the same transaction as their business mutation;
//! the publisher is the only component that mutates them afterwards, and
//! it never deletes them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Error types for outbox operations
#[derive(Debug, thiserror::Error)]
pub enum OutboxError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Record not found: {0}")]
    NotFound(Uuid),

    #[error("Infrastructure error: {message}")]
    InfrastructureError { message: String },
}

/// A domain event awaiting delivery.
///
/// `published` is false until the row is either delivered to the transport
/// or terminally dead-lettered; in both cases the publisher flips it to
/// true so the row is never claimed again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxRecord {
    pub id: Uuid,
    /// Logical entity the event concerns ("order", "inventory", ...).
    pub aggregate_type: String,
    /// Identifier of the entity instance. Free-form: the writers use cuid
    /// strings, not UUIDs.
    pub aggregate_id: String,
    /// Dotted event name, e.g. "order.created".
    pub event_type: String,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub published: bool,
    pub published_at: Option<DateTime<Utc>>,
}

impl OutboxRecord {
    pub fn is_published(&self) -> bool {
        self.published
    }

    /// Age of the record since insertion.
    pub fn age(&self) -> chrono::Duration {
        Utc::now().signed_duration_since(self.created_at)
    }
}

/// An outbox record ready to be inserted.
///
/// Writers insert these within their own business transaction; the
/// publisher only ever reads them back as [`OutboxRecord`].
#[derive(Debug, Clone)]
pub struct OutboxInsert {
    pub aggregate_type: String,
    pub aggregate_id: String,
    pub event_type: String,
    pub payload: serde_json::Value,
}

impl OutboxInsert {
    pub fn new(
        aggregate_type: impl Into<String>,
        aggregate_id: impl Into<String>,
        event_type: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            aggregate_type: aggregate_type.into(),
            aggregate_id: aggregate_id.into(),
            event_type: event_type.into(),
            payload,
        }
    }
}

/// Result of attempting to deliver a single claimed record.
///
/// Per-row failures are data, not exceptions: the reader collects one
/// outcome per record and applies all marks in a single transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The transport accepted the message.
    Delivered,
    /// The transport rejected the message; the row is dead-lettered and
    /// still marked published (handled failure, no automatic retry).
    DeadLettered { reason: String },
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered)
    }
}

/// Summary of one poll cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub claimed: usize,
    pub delivered: usize,
    pub dead_lettered: usize,
}

impl BatchReport {
    pub fn is_empty(&self) -> bool {
        self.claimed == 0
    }
}

/// Counts over the outbox and DLQ tables, for operator visibility.
#[derive(Debug, Clone)]
pub struct OutboxStats {
    pub unpublished_count: u64,
    pub published_count: u64,
    pub dead_letter_count: u64,
    pub oldest_unpublished_age_seconds: Option<i64>,
}

impl OutboxStats {
    pub fn total(&self) -> u64 {
        self.unpublished_count + self.published_count
    }

    pub fn has_backlog(&self) -> bool {
        self.unpublished_count > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(published: bool) -> OutboxRecord {
        OutboxRecord {
            id: Uuid::new_v4(),
            aggregate_type: "order".to_string(),
            aggregate_id: "abc123".to_string(),
            event_type: "order.created".to_string(),
            payload: serde_json::json!({"orderId": "abc123"}),
            created_at: Utc::now(),
            published,
            published_at: published.then(Utc::now),
        }
    }

    #[test]
    fn test_record_published_flag() {
        assert!(!record(false).is_published());
        assert!(record(true).is_published());
    }

    #[test]
    fn test_delivery_outcome() {
        assert!(DeliveryOutcome::Delivered.is_delivered());
        assert!(
            !DeliveryOutcome::DeadLettered {
                reason: "broker unavailable".to_string()
            }
            .is_delivered()
        );
    }

    #[test]
    fn test_batch_report_empty() {
        assert!(BatchReport::default().is_empty());
        let report = BatchReport {
            claimed: 3,
            delivered: 2,
            dead_lettered: 1,
        };
        assert!(!report.is_empty());
    }

    #[test]
    fn test_stats_totals() {
        let stats = OutboxStats {
            unpublished_count: 2,
            published_count: 5,
            dead_letter_count: 1,
            oldest_unpublished_age_seconds: Some(12),
        };
        assert_eq!(stats.total(), 7);
        assert!(stats.has_backlog());
    }
}
