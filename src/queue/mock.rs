//! In-process gateway for tests: records sends, injects failures, and
//! gauges how many sends overlap.
use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::batch::Batch;
use crate::queue::{BatchOutcome, EntryFailure, QueueError, QueueGateway};

#[derive(Default)]
pub struct MockGateway {
    delay: Option<Duration>,
    fail_sequences: HashSet<usize>,
    reject_per_batch: usize,
    sent: Mutex<Vec<SentBatch>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

#[derive(Clone, Debug)]
pub struct SentBatch {
    pub sequence: usize,
    pub entries: usize,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold every send open for `delay` so concurrency becomes observable.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Fail the batch with the given sequence number outright.
    pub fn fail_on(mut self, sequence: usize) -> Self {
        self.fail_sequences.insert(sequence);
        self
    }

    /// Report the first `count` entries of every batch as rejected.
    pub fn reject_per_batch(mut self, count: usize) -> Self {
        self.reject_per_batch = count;
        self
    }

    pub fn sent(&self) -> Vec<SentBatch> {
        self.sent.lock().expect("mock state poisoned").clone()
    }

    pub fn total_entries(&self) -> usize {
        self.sent().iter().map(|batch| batch.entries).sum()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl QueueGateway for MockGateway {
    async fn send_batch(&self, batch: &Batch) -> Result<BatchOutcome, QueueError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let result = if self.fail_sequences.contains(&batch.sequence) {
            Err(QueueError::Service(format!(
                "injected failure for batch #{}",
                batch.sequence
            )))
        } else {
            self.sent
                .lock()
                .expect("mock state poisoned")
                .push(SentBatch {
                    sequence: batch.sequence,
                    entries: batch.entries.len(),
                });
            let rejected: Vec<EntryFailure> = batch
                .entries
                .iter()
                .take(self.reject_per_batch)
                .map(|entry| EntryFailure {
                    entry_id: entry.id.clone(),
                    code: "InternalError".to_string(),
                    message: None,
                    sender_fault: false,
                })
                .collect();
            Ok(BatchOutcome {
                delivered: batch.entries.len() - rejected.len(),
                rejected,
            })
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
