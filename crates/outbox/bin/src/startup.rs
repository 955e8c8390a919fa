//! Worker startup and orderly teardown.
//!
//! Connects the database pool and the broker, runs migrations, then runs
//! the relay until a termination signal arrives. Connection failures here
//! are fatal: the process exits non-zero and the supervisor restarts it.

use crate::config::PublisherConfig;
use crate::shutdown;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use yeelo_outbox_domain::transport::{EventTransport, TransportError};
use yeelo_outbox_infrastructure::messaging::NatsTransport;
use yeelo_outbox_infrastructure::persistence::{OutboxStoreError, PostgresOutboxStore};
use yeelo_outbox_infrastructure::relay::{OutboxRelay, RelayError};

/// Error type for worker startup
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Database connection failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    Migration(#[from] OutboxStoreError),

    #[error("Broker connection failed: {0}")]
    Transport(#[from] TransportError),

    #[error("Relay error: {0}")]
    Relay(#[from] RelayError),
}

/// Run the publisher until shutdown.
pub async fn run(config: PublisherConfig) -> Result<(), StartupError> {
    info!("🚀 Starting Yeelo outbox publisher");

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.database_url)
        .await?;

    PostgresOutboxStore::new(pool.clone()).run_migrations().await?;

    let transport = Arc::new(NatsTransport::connect(config.nats_config()).await?);

    let relay = OutboxRelay::new(
        pool.clone(),
        transport.clone() as Arc<dyn EventTransport>,
        config.relay_config(),
    );

    let (shutdown_tx, shutdown_rx) = shutdown::channel();
    shutdown::spawn_signal_listener(shutdown_tx);

    relay.run(shutdown_rx).await?;

    // Orderly teardown: the relay has finished its in-flight batch
    let snapshot = relay.metrics();
    info!(
        published = snapshot.events_published_total,
        dead_lettered = snapshot.events_dead_lettered_total,
        batches = snapshot.batch_count,
        "Relay drained"
    );

    if let Err(e) = transport.close().await {
        warn!(error = %e, "Transport close failed");
    }
    pool.close().await;

    info!("Shutdown complete");
    Ok(())
}
