use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use sqs_bench::config::{Environment, Settings};
use sqs_bench::dispatcher::{DispatchConfig, run_dispatch};
use sqs_bench::entry::EntryTemplate;
use sqs_bench::logging;
use sqs_bench::metrics::stats::Stats;
use sqs_bench::output::OutputWriter;
use sqs_bench::queue::{Backend, GatewayBuilder};
use sqs_bench::timing::Timer;
use tokio::time::interval;
use tracing::info;

#[derive(Parser)]
#[command(name = "sqs-bench")]
#[command(about = "SQS batch-send load generator")]
struct Cli {
    /// Target environment
    #[arg(value_enum)]
    environment: Environment,

    /// Total number of messages to enqueue (rounded up to whole batches)
    #[arg(value_parser = parse_total)]
    total_messages: f64,

    /// Max batch sends in flight
    #[arg(long, default_value = "100")]
    concurrency: usize,

    /// Timeout per batch send (ms)
    #[arg(long, default_value = "30000")]
    timeout: u64,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Directory for run log files
    #[arg(long, default_value = "./logs")]
    log_dir: String,

    /// Snapshot interval in seconds for periodic stats output
    #[arg(long, default_value = "5")]
    snapshot_interval: u64,

    /// Optional CSV output file path for the final statistics (stdout if omitted)
    #[arg(long)]
    csv: Option<String>,
}

fn parse_total(raw: &str) -> Result<f64, String> {
    let total: f64 = raw.parse().map_err(|e| format!("{e}"))?;
    if !total.is_finite() || total < 0.0 {
        return Err("message count must be a non-negative number".to_string());
    }
    Ok(total)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let log_path = logging::init(&cli.log_level, &cli.log_dir)?;
    info!("Writing run log to: {}", log_path.display());

    let _run_timer = Timer::run("run");

    let settings = Settings::from_env(cli.environment)?;
    let gateway = GatewayBuilder::connect(Backend::Sqs, &settings)
        .await
        .map_err(|e| anyhow::Error::msg(format!("queue connect error: {e}")))?;
    let template = EntryTemplate::new(settings.message_body.clone());

    let stats = Arc::new(Stats::new());
    let mut output = if let Some(ref path) = cli.csv {
        OutputWriter::new_csv(path.clone()).await?
    } else {
        OutputWriter::new_stdout()
    };

    // Periodic progress while batches are in flight
    let snapshot_handle = {
        let stats = Arc::clone(&stats);
        let interval_secs = cli.snapshot_interval;
        tokio::spawn(async move {
            let mut ticker = interval(Duration::from_secs(interval_secs));
            loop {
                ticker.tick().await;
                let snapshot = stats.snapshot().await;
                info!(
                    "Dispatch stats - Batches: {}, Failed: {}, Entries delivered: {}, Rejected: {}, Rate: {:.2} batch/s",
                    snapshot.batches_sent,
                    snapshot.batches_failed,
                    snapshot.entries_delivered,
                    snapshot.entries_rejected,
                    snapshot.batch_throughput()
                );
            }
        })
    };

    run_dispatch(
        gateway,
        template,
        DispatchConfig {
            total_messages: cli.total_messages,
            max_in_flight: cli.concurrency,
            send_timeout: Duration::from_millis(cli.timeout),
        },
        Arc::clone(&stats),
    )
    .await?;

    snapshot_handle.abort();

    let final_stats = stats.snapshot().await;
    info!("Final dispatch statistics:");
    info!("  Batches sent: {}", final_stats.batches_sent);
    info!("  Batches failed: {}", final_stats.batches_failed);
    info!("  Entries delivered: {}", final_stats.entries_delivered);
    info!("  Entries rejected: {}", final_stats.entries_rejected);
    info!(
        "  Batch latency p50/p95/p99: {:.2}/{:.2}/{:.2} ms",
        final_stats.latency_ns_p50 as f64 / 1_000_000.0,
        final_stats.latency_ns_p95 as f64 / 1_000_000.0,
        final_stats.latency_ns_p99 as f64 / 1_000_000.0
    );
    info!("  Total duration: {:.2}s", final_stats.total_duration.as_secs_f64());
    output.write_snapshot(&final_stats).await?;

    Ok(())
}
