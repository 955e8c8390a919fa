//! Outbox Relay Implementation
//!
//! Background worker that claims unpublished outbox rows and publishes
//! them to the event transport. Implements the delivery side of the
//! Transactional Outbox Pattern.

pub mod publisher;
pub mod relay;

pub use publisher::EventPublisher;
pub use relay::{OutboxRelay, RelayConfig, RelayError, RelayMetricsSnapshot};
