//! Infrastructure layer for the Yeelo outbox publisher.
//!
//! PostgreSQL persistence for the outbox and its dead-letter table, the
//! NATS JetStream transport, and the relay that polls one and feeds the
//! other.

pub mod messaging;
pub mod persistence;
pub mod relay;

pub use messaging::{InMemoryTransport, NatsConfig, NatsTransport};
pub use persistence::{OutboxStoreError, PostgresOutboxStore};
pub use relay::{EventPublisher, OutboxRelay, RelayConfig, RelayError, RelayMetricsSnapshot};
