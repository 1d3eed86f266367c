//! Queue gateway abstraction: trait, types, and builder factory.

#[cfg(any(test, feature = "queue-mock"))]
pub mod mock;
#[cfg(feature = "queue-sqs")]
pub mod sqs;

use std::sync::Arc;

use crate::batch::Batch;
use crate::config::Settings;

#[derive(Clone, Debug)]
pub enum Backend {
    Sqs,
    #[cfg(any(test, feature = "queue-mock"))]
    Mock,
}

#[derive(thiserror::Error, Debug)]
pub enum QueueError {
    #[error("config: {0}")]
    Config(String),
    #[error("entry build: {0}")]
    Entry(String),
    #[error("service: {0}")]
    Service(String),
    #[error("transport: {0}")]
    Transport(String),
}

/// Outcome of one batch-send call; the service may accept a subset of the
/// entries without failing the call.
#[derive(Clone, Debug, Default)]
pub struct BatchOutcome {
    pub delivered: usize,
    pub rejected: Vec<EntryFailure>,
}

#[derive(Clone, Debug)]
pub struct EntryFailure {
    pub entry_id: String,
    pub code: String,
    pub message: Option<String>,
    pub sender_fault: bool,
}

#[async_trait::async_trait]
pub trait QueueGateway: Send + Sync {
    async fn send_batch(&self, batch: &Batch) -> Result<BatchOutcome, QueueError>;
}

pub struct GatewayBuilder;

impl GatewayBuilder {
    pub async fn connect(
        backend: Backend,
        settings: &Settings,
    ) -> Result<Arc<dyn QueueGateway>, QueueError> {
        match backend {
            Backend::Sqs => {
                #[cfg(feature = "queue-sqs")]
                {
                    return sqs::connect(settings).await;
                }
                #[cfg(not(feature = "queue-sqs"))]
                {
                    let _ = settings;
                    Err(QueueError::Config("sqs feature disabled".into()))
                }
            }
            #[cfg(any(test, feature = "queue-mock"))]
            Backend::Mock => Ok(Arc::new(mock::MockGateway::new())),
        }
    }
}
