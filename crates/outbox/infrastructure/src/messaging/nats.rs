//! NATS JetStream transport.
//!
//! Publishes outbox envelopes to JetStream subjects with ack confirmation.
//! A topic ("orders.events") backs one stream; each message is published on
//! a key-suffixed subject (`orders.events.<aggregate-id>`), so messages for
//! one aggregate share a subject and keep their relative order. Headers
//! carry the event/aggregate metadata for consumer-side filtering.

use async_nats::jetstream::Context as JetStreamContext;
use async_nats::jetstream::stream::Config as StreamConfig;
use async_nats::{Client, ConnectOptions, HeaderMap};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};
use yeelo_outbox_domain::transport::{EventTransport, OutboundMessage, TransportError};

/// NATS connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NatsConfig {
    /// Broker URL, e.g. "nats://localhost:4222"
    #[serde(default = "default_url")]
    pub url: String,
    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connection_timeout_secs: u64,
    /// Max reconnection attempts (None = infinite)
    #[serde(default = "default_max_reconnects")]
    pub max_reconnects: Option<usize>,
    /// Client connection name
    #[serde(default)]
    pub name: Option<String>,
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            connection_timeout_secs: default_connect_timeout(),
            max_reconnects: default_max_reconnects(),
            name: None,
        }
    }
}

fn default_url() -> String {
    "nats://localhost:4222".to_string()
}

const fn default_connect_timeout() -> u64 {
    5
}

fn default_max_reconnects() -> Option<usize> {
    Some(5)
}

/// JetStream-backed [`EventTransport`].
pub struct NatsTransport {
    client: Client,
    jetstream: JetStreamContext,
    /// Streams already created or verified this process lifetime.
    ensured_streams: Mutex<HashSet<String>>,
}

impl NatsTransport {
    /// Connect to the broker and set up the JetStream context.
    ///
    /// # Errors
    /// Returns an error if the broker is unreachable; callers treat this
    /// as a fatal startup failure.
    pub async fn connect(config: NatsConfig) -> Result<Self, TransportError> {
        let mut connect_options = ConnectOptions::default()
            .connection_timeout(Duration::from_secs(config.connection_timeout_secs));

        if let Some(name) = &config.name {
            connect_options = connect_options.name(name);
        }

        if let Some(max_reconnects) = config.max_reconnects {
            connect_options = connect_options.max_reconnects(max_reconnects);
        }

        let client = async_nats::connect_with_options(&config.url, connect_options)
            .await
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        let jetstream = async_nats::jetstream::new(client.clone());

        info!(url = %config.url, "Connected to NATS");

        Ok(Self {
            client,
            jetstream,
            ensured_streams: Mutex::new(HashSet::new()),
        })
    }

    /// Stream name for a topic: "orders.events" → "ORDERS_EVENTS".
    fn stream_name_for_topic(topic: &str) -> String {
        topic.replace(['.', '-'], "_").to_uppercase()
    }

    /// Subject token for a message key. NATS reserves '.', '*', '>' and
    /// whitespace inside tokens.
    fn key_token(key: &str) -> String {
        let token: String = key
            .chars()
            .map(|c| match c {
                '.' | '*' | '>' => '_',
                c if c.is_whitespace() => '_',
                c => c,
            })
            .collect();

        if token.is_empty() {
            "_".to_string()
        } else {
            token
        }
    }

    /// Create the stream for a topic if this process has not seen it yet.
    async fn ensure_stream(&self, topic: &str) -> Result<(), TransportError> {
        let stream_name = Self::stream_name_for_topic(topic);

        let mut ensured = self.ensured_streams.lock().await;
        if ensured.contains(&stream_name) {
            return Ok(());
        }

        if self.jetstream.get_stream(&stream_name).await.is_err() {
            info!(stream = %stream_name, topic = %topic, "Creating stream");

            let stream_config = StreamConfig {
                name: stream_name.clone(),
                subjects: vec![format!("{topic}.>")],
                max_bytes: 1024 * 1024 * 1024, // 1GB
                storage: async_nats::jetstream::stream::StorageType::File,
                num_replicas: 1,
                discard: async_nats::jetstream::stream::DiscardPolicy::Old,
                ..Default::default()
            };

            self.jetstream
                .create_stream(stream_config)
                .await
                .map_err(|e| TransportError::Connection(e.to_string()))?;
        }

        ensured.insert(stream_name);
        Ok(())
    }
}

#[async_trait]
impl EventTransport for NatsTransport {
    async fn publish(&self, message: OutboundMessage) -> Result<(), TransportError> {
        self.ensure_stream(&message.topic).await?;

        let subject = format!("{}.{}", message.topic, Self::key_token(&message.key));

        let mut headers = HeaderMap::new();
        for (name, value) in &message.headers {
            headers.insert(name.as_str(), value.as_str());
        }

        // Await the ack so a positive result means the broker stored it
        let ack = self
            .jetstream
            .publish_with_headers(subject.clone(), headers, message.payload.into())
            .await
            .map_err(|e| TransportError::Publish(e.to_string()))?;

        ack.await
            .map_err(|e| TransportError::Publish(e.to_string()))?;

        debug!(subject = %subject, "Message acknowledged");

        Ok(())
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.client
            .flush()
            .await
            .map_err(|e| TransportError::Connection(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_name_for_topic() {
        assert_eq!(
            NatsTransport::stream_name_for_topic("orders.events"),
            "ORDERS_EVENTS"
        );
        assert_eq!(
            NatsTransport::stream_name_for_topic("purchase-orders.events"),
            "PURCHASE_ORDERS_EVENTS"
        );
    }

    #[test]
    fn test_key_token_sanitizes_reserved_characters() {
        assert_eq!(NatsTransport::key_token("abc123"), "abc123");
        assert_eq!(NatsTransport::key_token("a.b c*d"), "a_b_c_d");
        assert_eq!(NatsTransport::key_token(""), "_");
    }
}
