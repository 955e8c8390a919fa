//! Transactional Outbox Pattern models
//!
//! Domain-level types for the outbox table, its dead-letter companion,
//! and the per-row delivery outcome produced by a publish cycle.

pub mod dead_letter;
pub mod model;

pub use dead_letter::DeadLetter;
pub use model::{
    BatchReport, DeliveryOutcome, OutboxError, OutboxInsert, OutboxRecord, OutboxStats,
};
