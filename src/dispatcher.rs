use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use futures::future::join_all;
use tokio::signal;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::batch::{BATCH_CAPACITY, Batch, batch_count};
use crate::entry::EntryTemplate;
use crate::metrics::stats::Stats;
use crate::queue::QueueGateway;
use crate::timing::Timer;

pub struct DispatchConfig {
    pub total_messages: f64,
    pub max_in_flight: usize,
    pub send_timeout: Duration,
}

/// Spawn one send task per batch, bounded by the limiter, and return once
/// every task has completed.
pub async fn run_dispatch(
    gateway: Arc<dyn QueueGateway>,
    template: EntryTemplate,
    config: DispatchConfig,
    stats: Arc<Stats>,
) -> Result<()> {
    let batches = batch_count(config.total_messages);
    info!("Starting dispatch:");
    info!("  Requested messages: {}", config.total_messages);
    info!("  Batches: {} ({} entries each)", batches, BATCH_CAPACITY);
    info!("  Max in-flight: {}", config.max_in_flight);
    info!("  Send timeout: {:?}", config.send_timeout);

    let limiter = Arc::new(Semaphore::new(config.max_in_flight));
    let mut handles = Vec::with_capacity(batches);
    for sequence in 1..=batches {
        let gateway = Arc::clone(&gateway);
        let limiter = Arc::clone(&limiter);
        let stats = Arc::clone(&stats);
        let template = template.clone();
        let send_timeout = config.send_timeout;
        handles.push(tokio::spawn(async move {
            // The limiter is never closed while tasks are running
            let Ok(_permit) = limiter.acquire_owned().await else {
                return;
            };
            let timer = Timer::batch(sequence);
            let batch = Batch::build(sequence, &template);
            match timeout(send_timeout, gateway.send_batch(&batch)).await {
                Ok(Ok(outcome)) => {
                    if !outcome.rejected.is_empty() {
                        warn!(
                            "Batch #{}: {} of {} entries rejected",
                            sequence,
                            outcome.rejected.len(),
                            batch.entries.len()
                        );
                        for failure in &outcome.rejected {
                            debug!(
                                "Batch #{} entry {}: {} ({})",
                                sequence,
                                failure.entry_id,
                                failure.code,
                                failure.message.as_deref().unwrap_or("no detail")
                            );
                        }
                    }
                    stats.record_batch(timer.elapsed(), &outcome).await;
                }
                Ok(Err(err)) => {
                    error!("Batch #{} send failed: {}", sequence, err);
                    stats.record_batch_failure().await;
                }
                Err(_) => {
                    error!("Batch #{} timed out after {:?}", sequence, send_timeout);
                    stats.record_batch_failure().await;
                }
            }
        }));
    }

    let abort_handles: Vec<_> = handles.iter().map(|handle| handle.abort_handle()).collect();
    tokio::select! {
        results = join_all(handles) => {
            for result in results {
                if let Err(err) = result {
                    if err.is_panic() {
                        error!("batch task panicked: {}", err);
                    }
                }
            }
        }
        _ = signal::ctrl_c() => {
            warn!("Ctrl+C received, aborting outstanding batches");
            for handle in &abort_handles {
                handle.abort();
            }
        }
    }

    Ok(())
}
