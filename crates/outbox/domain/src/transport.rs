//! Event Transport Port
//!
//! Abstraction over the topic-based message bus the publisher delivers to.
//! The infrastructure crate implements it for NATS JetStream; tests use an
//! in-memory recording implementation.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Failed to connect to broker: {0}")]
    Connection(String),
    #[error("Failed to publish message: {0}")]
    Publish(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// One message bound for the bus.
///
/// `key` is the aggregate id; the transport must use it so that messages
/// for the same aggregate keep their relative order on the wire. Headers
/// let consumers filter without deserializing the payload.
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    pub topic: String,
    pub key: String,
    pub headers: Vec<(String, String)>,
    pub payload: Vec<u8>,
}

/// Port to the message bus.
#[async_trait]
pub trait EventTransport: Send + Sync {
    /// Deliver a single message. An error here means the message did not
    /// reach the bus; the caller decides what happens to the source row.
    async fn publish(&self, message: OutboundMessage) -> Result<(), TransportError>;

    /// Flush in-flight messages and release the connection.
    async fn close(&self) -> Result<(), TransportError> {
        Ok(())
    }
}
