//! Yeelo Outbox Publisher
//!
//! Main entry point for the outbox publisher worker.

mod config;
mod shutdown;
mod startup;

use clap::Parser;

/// CLI arguments for yeelo-outbox-publisher
#[derive(clap::Parser, Debug)]
#[command(name = "yeelo-outbox-publisher")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Yeelo outbox event publisher", long_about = None)]
struct Args {
    /// Enable debug mode
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    setup_logging(args.debug);

    // Startup failures (bad config, unreachable database or broker)
    // propagate out of main so the supervisor sees a non-zero exit
    let config = config::PublisherConfig::from_env()?;
    startup::run(config).await?;

    Ok(())
}

/// Setup logging based on debug flag.
fn setup_logging(debug: bool) {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    let level = if debug { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}
