//! PostgreSQL persistence for the outbox and dead-letter tables.

pub mod outbox_store;

pub use outbox_store::{OutboxStoreError, PostgresOutboxStore};
