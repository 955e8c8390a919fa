//! Domain layer for the Yeelo outbox publisher.
//!
//! Holds the outbox/dead-letter models, the message envelope, topic
//! resolution, and the transport port. No I/O lives here; the
//! infrastructure crate provides the PostgreSQL store and the NATS
//! transport.

pub mod envelope;
pub mod outbox;
pub mod topics;
pub mod transport;

pub use envelope::EventEnvelope;
pub use outbox::{
    BatchReport, DeadLetter, DeliveryOutcome, OutboxError, OutboxInsert, OutboxRecord, OutboxStats,
};
pub use topics::resolve_topic;
pub use transport::{EventTransport, OutboundMessage, TransportError};
