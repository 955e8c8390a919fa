//! In-memory transport.
//!
//! Records published messages and fails on demand. Used by unit and
//! integration tests as a stand-in for the broker.

use async_trait::async_trait;
use std::sync::Mutex;
use yeelo_outbox_domain::transport::{EventTransport, OutboundMessage, TransportError};

#[derive(Default)]
pub struct InMemoryTransport {
    messages: Mutex<Vec<OutboundMessage>>,
    failure: Mutex<Option<String>>,
    failing_key: Mutex<Option<String>>,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every publish fail with the given reason until [`restore`] is
    /// called.
    ///
    /// [`restore`]: InMemoryTransport::restore
    pub fn fail_with(&self, reason: &str) {
        *self.failure.lock().unwrap() = Some(reason.to_string());
    }

    /// Fail only messages keyed by `key`; everything else still succeeds.
    pub fn fail_for_key(&self, key: &str) {
        *self.failing_key.lock().unwrap() = Some(key.to_string());
    }

    pub fn restore(&self) {
        *self.failure.lock().unwrap() = None;
        *self.failing_key.lock().unwrap() = None;
    }

    /// Everything published so far, in publish order.
    pub fn messages(&self) -> Vec<OutboundMessage> {
        self.messages.lock().unwrap().clone()
    }

    pub fn message_count(&self) -> usize {
        self.messages.lock().unwrap().len()
    }
}

#[async_trait]
impl EventTransport for InMemoryTransport {
    async fn publish(&self, message: OutboundMessage) -> Result<(), TransportError> {
        if let Some(reason) = self.failure.lock().unwrap().clone() {
            return Err(TransportError::Publish(reason));
        }

        if self.failing_key.lock().unwrap().as_deref() == Some(message.key.as_str()) {
            return Err(TransportError::Publish(format!(
                "simulated failure for key {}",
                message.key
            )));
        }

        self.messages.lock().unwrap().push(message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(key: &str) -> OutboundMessage {
        OutboundMessage {
            topic: "orders.events".to_string(),
            key: key.to_string(),
            headers: vec![],
            payload: b"{}".to_vec(),
        }
    }

    #[tokio::test]
    async fn test_records_published_messages() {
        let transport = InMemoryTransport::new();
        transport.publish(message("abc123")).await.unwrap();

        let messages = transport.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].key, "abc123");
    }

    #[tokio::test]
    async fn test_fail_and_restore() {
        let transport = InMemoryTransport::new();
        transport.fail_with("broker down");

        let err = transport.publish(message("abc123")).await.unwrap_err();
        assert!(matches!(err, TransportError::Publish(_)));
        assert_eq!(transport.message_count(), 0);

        transport.restore();
        transport.publish(message("abc123")).await.unwrap();
        assert_eq!(transport.message_count(), 1);
    }
}
