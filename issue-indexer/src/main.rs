use std::env;
use std::time::Duration;

use dotenv::dotenv;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use issue_indexer::{Dependencies, IndexingError};

#[tokio::main]
async fn main() -> Result<(), IndexingError> {
    dotenv().ok();
    init_tracing();

    let deps = Dependencies::new().await?;
    let indexer = deps.indexer;

    // Bring the index up to date with the source of truth before serving
    // incremental syncs.
    let result = indexer.index_on_startup().await?;
    if result.is_success() {
        info!(total = result.total, "Startup indexing complete");
    } else {
        warn!(
            total = result.total,
            failures = result.failures(),
            "Startup indexing finished with failures; affected documents will be \
             picked up by queue drains"
        );
    }

    let mut interval = tokio::time::interval(Duration::from_secs(deps.drain_interval_secs));
    loop {
        tokio::select! {
            _ = interval.tick() => {
                match indexer.drain(deps.drain_batch_size).await {
                    Ok(result) if result.total > 0 => {
                        info!(
                            total = result.total,
                            successes = result.successes,
                            pending = result.failed_items.len(),
                            "Drained retry queue"
                        );
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(error = %e, "Queue drain failed");
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal");
                break;
            }
        }
    }

    info!("Shutdown complete");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if env::var("LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
