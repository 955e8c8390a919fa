//! Event Publisher
//!
//! Turns a claimed outbox record into one transport message: builds the
//! envelope, resolves the destination topic, and sends it keyed by the
//! aggregate id so downstream consumers see per-aggregate order.

use std::sync::Arc;
use tracing::debug;
use yeelo_outbox_domain::envelope::EventEnvelope;
use yeelo_outbox_domain::outbox::OutboxRecord;
use yeelo_outbox_domain::topics::resolve_topic;
use yeelo_outbox_domain::transport::{EventTransport, OutboundMessage, TransportError};

pub struct EventPublisher {
    transport: Arc<dyn EventTransport>,
    /// Source tag stamped into every envelope.
    source: String,
}

impl EventPublisher {
    pub fn new(transport: Arc<dyn EventTransport>, source: impl Into<String>) -> Self {
        Self {
            transport,
            source: source.into(),
        }
    }

    /// Deliver one record to the transport.
    ///
    /// An error means the message did not reach the bus; the relay turns
    /// it into a dead-letter outcome for the row.
    pub async fn publish(&self, record: &OutboxRecord) -> Result<(), TransportError> {
        let envelope = EventEnvelope::from_record(record, &self.source);
        let topic = resolve_topic(&record.event_type);
        let payload = serde_json::to_vec(&envelope)?;

        let message = OutboundMessage {
            topic: topic.clone(),
            key: record.aggregate_id.clone(),
            headers: envelope.headers(),
            payload,
        };

        self.transport.publish(message).await?;

        debug!(
            event_id = %record.id,
            event_type = %record.event_type,
            topic = %topic,
            trace_id = %envelope.trace_id,
            "Event published"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::InMemoryTransport;
    use chrono::Utc;
    use uuid::Uuid;
    use yeelo_outbox_domain::envelope::{
        HEADER_AGGREGATE_ID, HEADER_AGGREGATE_TYPE, HEADER_EVENT_TYPE,
    };

    fn record(aggregate_id: &str, event_type: &str) -> OutboxRecord {
        OutboxRecord {
            id: Uuid::new_v4(),
            aggregate_type: "order".to_string(),
            aggregate_id: aggregate_id.to_string(),
            event_type: event_type.to_string(),
            payload: serde_json::json!({"orderId": aggregate_id}),
            created_at: Utc::now(),
            published: false,
            published_at: None,
        }
    }

    #[tokio::test]
    async fn test_message_is_keyed_by_aggregate_id() {
        let transport = Arc::new(InMemoryTransport::new());
        let publisher = EventPublisher::new(transport.clone(), "yeelo-outbox-publisher");

        publisher
            .publish(&record("abc123", "order.created"))
            .await
            .unwrap();

        let messages = transport.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].key, "abc123");
        assert_eq!(messages[0].topic, "orders.events");
    }

    #[tokio::test]
    async fn test_headers_carry_event_metadata() {
        let transport = Arc::new(InMemoryTransport::new());
        let publisher = EventPublisher::new(transport.clone(), "test");

        publisher
            .publish(&record("abc123", "order.created"))
            .await
            .unwrap();

        let headers = &transport.messages()[0].headers;
        assert!(headers.contains(&(HEADER_EVENT_TYPE.to_string(), "order.created".to_string())));
        assert!(headers.contains(&(HEADER_AGGREGATE_TYPE.to_string(), "order".to_string())));
        assert!(headers.contains(&(HEADER_AGGREGATE_ID.to_string(), "abc123".to_string())));
    }

    #[tokio::test]
    async fn test_unmapped_event_type_uses_fallback_topic() {
        let transport = Arc::new(InMemoryTransport::new());
        let publisher = EventPublisher::new(transport.clone(), "test");

        publisher
            .publish(&record("w-1", "widget.spun"))
            .await
            .unwrap();

        assert_eq!(transport.messages()[0].topic, "widget.events");
    }

    #[tokio::test]
    async fn test_payload_is_the_serialized_envelope() {
        let transport = Arc::new(InMemoryTransport::new());
        let publisher = EventPublisher::new(transport.clone(), "yeelo-outbox-publisher");

        let record = record("abc123", "order.created");
        publisher.publish(&record).await.unwrap();

        let envelope: EventEnvelope =
            serde_json::from_slice(&transport.messages()[0].payload).unwrap();
        assert_eq!(envelope.event_id, record.id);
        assert_eq!(envelope.aggregate_id, "abc123");
        assert_eq!(envelope.payload, record.payload);
        assert_eq!(envelope.source, "yeelo-outbox-publisher");
    }

    #[tokio::test]
    async fn test_transport_error_surfaces_to_caller() {
        let transport = Arc::new(InMemoryTransport::new());
        transport.fail_with("broker unavailable");
        let publisher = EventPublisher::new(transport.clone(), "test");

        let err = publisher
            .publish(&record("abc123", "order.created"))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Publish(_)));
    }
}
