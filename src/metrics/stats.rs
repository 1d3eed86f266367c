use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use hdrhistogram::Histogram;
use tokio::sync::RwLock;

use crate::queue::BatchOutcome;

/// Statistics collector for batch throughput and send latency
pub struct Stats {
    // Batch-send latency histogram (nanosecond precision)
    latency_hist: RwLock<Histogram<u64>>,

    // Counters
    batches_sent: RwLock<u64>,
    batches_failed: RwLock<u64>,
    entries_delivered: RwLock<u64>,
    entries_rejected: RwLock<u64>,

    start_time: Instant,
}

impl Stats {
    pub fn new() -> Self {
        Self {
            // 1ns to 60s range, 3 significant digits
            latency_hist: RwLock::new(Histogram::new_with_bounds(1, 60_000_000_000, 3).unwrap()),
            batches_sent: RwLock::new(0),
            batches_failed: RwLock::new(0),
            entries_delivered: RwLock::new(0),
            entries_rejected: RwLock::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a completed batch send with its wall-clock duration
    pub async fn record_batch(&self, duration: Duration, outcome: &BatchOutcome) {
        *self.batches_sent.write().await += 1;
        *self.entries_delivered.write().await += outcome.delivered as u64;
        *self.entries_rejected.write().await += outcome.rejected.len() as u64;

        if let Ok(mut hist) = self.latency_hist.try_write() {
            let _ = hist.record(duration.as_nanos() as u64);
        }
    }

    /// Record a batch whose send call failed outright
    pub async fn record_batch_failure(&self) {
        *self.batches_failed.write().await += 1;
    }

    /// Get current snapshot of statistics
    pub async fn snapshot(&self) -> StatsSnapshot {
        let batches_sent = *self.batches_sent.read().await;
        let batches_failed = *self.batches_failed.read().await;
        let entries_delivered = *self.entries_delivered.read().await;
        let entries_rejected = *self.entries_rejected.read().await;

        let hist = self.latency_hist.read().await;
        StatsSnapshot {
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or(Duration::ZERO)
                .as_secs(),
            batches_sent,
            batches_failed,
            entries_delivered,
            entries_rejected,
            total_duration: self.start_time.elapsed(),
            latency_ns_p50: hist.value_at_quantile(0.5),
            latency_ns_p95: hist.value_at_quantile(0.95),
            latency_ns_p99: hist.value_at_quantile(0.99),
            latency_ns_mean: hist.mean(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StatsSnapshot {
    pub timestamp: u64,
    pub batches_sent: u64,
    pub batches_failed: u64,
    pub entries_delivered: u64,
    pub entries_rejected: u64,
    pub total_duration: Duration,
    pub latency_ns_p50: u64,
    pub latency_ns_p95: u64,
    pub latency_ns_p99: u64,
    pub latency_ns_mean: f64,
}

impl StatsSnapshot {
    /// Completed batches per second over the whole run
    pub fn batch_throughput(&self) -> f64 {
        let total_secs = self.total_duration.as_secs_f64();
        if total_secs > 0.0 {
            self.batches_sent as f64 / total_secs
        } else {
            0.0
        }
    }

    /// Delivered entries per second over the whole run
    pub fn entry_throughput(&self) -> f64 {
        let total_secs = self.total_duration.as_secs_f64();
        if total_secs > 0.0 {
            self.entries_delivered as f64 / total_secs
        } else {
            0.0
        }
    }

    /// Convert to CSV row
    pub fn to_csv_row(&self) -> String {
        format!(
            "{},{},{},{},{},{:.2},{:.2},{},{},{},{:.2}",
            self.timestamp,
            self.batches_sent,
            self.batches_failed,
            self.entries_delivered,
            self.entries_rejected,
            self.batch_throughput(),
            self.entry_throughput(),
            self.latency_ns_p50,
            self.latency_ns_p95,
            self.latency_ns_p99,
            self.latency_ns_mean
        )
    }

    /// CSV header
    pub fn csv_header() -> &'static str {
        "timestamp,batches_sent,batches_failed,entries_delivered,entries_rejected,batch_throughput,entry_throughput,latency_ns_p50,latency_ns_p95,latency_ns_p99,latency_ns_mean"
    }
}
