use tracing_subscriber::EnvFilter;

use arena_core::memory_store::MemoryStore;
use arena_rest::RestStoreConfig;
use arena_sim::config::{Backend, SimConfig};
use arena_sim::driver;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = SimConfig::load();
    tracing::info!(
        backend = ?config.backend,
        bots = config.bots,
        countdown_secs = config.collect.countdown_secs,
        "Arena simulation starting"
    );

    let outcome = match config.backend {
        Backend::Memory => driver::run_memory(&config, &MemoryStore::new()).await,
        Backend::Rest => driver::run_rest(&config, RestStoreConfig::load()).await,
    };

    match outcome {
        Ok(outcome) => {
            for result in &outcome.results {
                tracing::info!(
                    rank = result.rank,
                    name = %result.name,
                    score = result.score,
                    persisted = result.persisted,
                    "Final standing"
                );
            }
            if outcome.failed_writes > 0 {
                tracing::warn!(failed = outcome.failed_writes, "Some writes were rejected");
            }
        },
        Err(e) => {
            tracing::error!(error = %e, "Simulation failed");
            std::process::exit(1);
        },
    }
}
