//! Transport implementations for the outbox publisher.

pub mod memory;
pub mod nats;

pub use memory::InMemoryTransport;
pub use nats::{NatsConfig, NatsTransport};
