//! Event Envelope
//!
//! Wire format for published events. Consumers filter on the message
//! headers without deserializing this body; the body carries the original
//! payload plus publishing metadata for cross-service correlation.

use crate::outbox::OutboxRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Header names attached to every published message.
pub const HEADER_EVENT_TYPE: &str = "event-type";
pub const HEADER_AGGREGATE_TYPE: &str = "aggregate-type";
pub const HEADER_AGGREGATE_ID: &str = "aggregate-id";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Outbox row id, stable across delivery attempts.
    pub event_id: Uuid,
    pub event_type: String,
    pub aggregate_type: String,
    pub aggregate_id: String,
    pub payload: serde_json::Value,
    /// Publishing source tag, e.g. "yeelo-outbox-publisher".
    pub source: String,
    /// Wall-clock publish time, not the row's `created_at`.
    pub published_at: DateTime<Utc>,
    /// Fresh per publish attempt; ties broker-side logs to service logs.
    pub trace_id: Uuid,
}

impl EventEnvelope {
    /// Build the envelope for one claimed record.
    pub fn from_record(record: &OutboxRecord, source: &str) -> Self {
        Self {
            event_id: record.id,
            event_type: record.event_type.clone(),
            aggregate_type: record.aggregate_type.clone(),
            aggregate_id: record.aggregate_id.clone(),
            payload: record.payload.clone(),
            source: source.to_string(),
            published_at: Utc::now(),
            trace_id: Uuid::new_v4(),
        }
    }

    /// Headers carried alongside the serialized envelope.
    pub fn headers(&self) -> Vec<(String, String)> {
        vec![
            (HEADER_EVENT_TYPE.to_string(), self.event_type.clone()),
            (
                HEADER_AGGREGATE_TYPE.to_string(),
                self.aggregate_type.clone(),
            ),
            (HEADER_AGGREGATE_ID.to_string(), self.aggregate_id.clone()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> OutboxRecord {
        OutboxRecord {
            id: Uuid::new_v4(),
            aggregate_type: "order".to_string(),
            aggregate_id: "abc123".to_string(),
            event_type: "order.created".to_string(),
            payload: serde_json::json!({"orderId": "abc123", "totalAmount": 120.5}),
            created_at: Utc::now(),
            published: false,
            published_at: None,
        }
    }

    #[test]
    fn test_envelope_carries_record_fields() {
        let record = record();
        let envelope = EventEnvelope::from_record(&record, "yeelo-outbox-publisher");

        assert_eq!(envelope.event_id, record.id);
        assert_eq!(envelope.event_type, "order.created");
        assert_eq!(envelope.aggregate_id, "abc123");
        assert_eq!(envelope.payload, record.payload);
        assert_eq!(envelope.source, "yeelo-outbox-publisher");
    }

    #[test]
    fn test_trace_id_fresh_per_envelope() {
        let record = record();
        let first = EventEnvelope::from_record(&record, "test");
        let second = EventEnvelope::from_record(&record, "test");
        assert_ne!(first.trace_id, second.trace_id);
        assert_eq!(first.event_id, second.event_id);
    }

    #[test]
    fn test_headers_match_source_row() {
        let envelope = EventEnvelope::from_record(&record(), "test");
        let headers = envelope.headers();

        assert!(headers.contains(&(HEADER_EVENT_TYPE.to_string(), "order.created".to_string())));
        assert!(headers.contains(&(HEADER_AGGREGATE_TYPE.to_string(), "order".to_string())));
        assert!(headers.contains(&(HEADER_AGGREGATE_ID.to_string(), "abc123".to_string())));
    }

    #[test]
    fn test_envelope_round_trips_through_json() {
        let envelope = EventEnvelope::from_record(&record(), "test");
        let bytes = serde_json::to_vec(&envelope).unwrap();
        let decoded: EventEnvelope = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded.event_id, envelope.event_id);
        assert_eq!(decoded.trace_id, envelope.trace_id);
        assert_eq!(decoded.payload, envelope.payload);
    }
}
