use crate::entry::{EntryTemplate, MessageEntry};

/// SQS caps SendMessageBatch at 10 entries per call.
pub const BATCH_CAPACITY: usize = 10;

/// Number of batches needed to cover `total_messages`, never less than 1.
pub fn batch_count(total_messages: f64) -> usize {
    let batches = (total_messages / BATCH_CAPACITY as f64).ceil() as usize;
    batches.max(1)
}

/// Fixed-capacity group of entries sent together in one queue-service call.
///
/// The assembler always fills a batch to capacity, so a run whose requested
/// total is not a multiple of `BATCH_CAPACITY` sends more entries than asked
/// for. Deliberate: the trailing batch is load-test padding, not truncated.
#[derive(Clone, Debug)]
pub struct Batch {
    pub sequence: usize,
    pub entries: Vec<MessageEntry>,
}

impl Batch {
    pub fn build(sequence: usize, template: &EntryTemplate) -> Self {
        let entries = (0..BATCH_CAPACITY).map(|_| template.new_entry()).collect();
        Self { sequence, entries }
    }
}
