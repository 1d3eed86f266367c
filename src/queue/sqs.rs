//! SQS adapter (feature `queue-sqs`): batch sends through the AWS SDK.
use std::sync::Arc;

use aws_config::meta::region::RegionProviderChain;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_sqs::config::Credentials;
use aws_sdk_sqs::error::SdkError;
use aws_sdk_sqs::types::{MessageAttributeValue, SendMessageBatchRequestEntry};

use crate::batch::Batch;
use crate::config::{Environment, Settings};
use crate::queue::{BatchOutcome, EntryFailure, QueueError, QueueGateway};

pub struct SqsGateway {
    client: aws_sdk_sqs::Client,
    queue_url: String,
}

pub async fn connect(settings: &Settings) -> Result<Arc<dyn QueueGateway>, QueueError> {
    let region = RegionProviderChain::default_provider().or_else(Region::from_static("us-east-1"));
    let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(region);
    loader = match settings.environment {
        Environment::Local => {
            loader.credentials_provider(Credentials::new("not", "empty", None, None, "static"))
        }
        Environment::Prod => {
            let credentials = settings
                .credentials
                .as_ref()
                .ok_or_else(|| QueueError::Config("missing credentials for prod".into()))?;
            loader.credentials_provider(Credentials::new(
                credentials.access_key.clone(),
                credentials.secret_key.clone(),
                None,
                None,
                "environment",
            ))
        }
    };
    if let Some(ref endpoint) = settings.endpoint_url {
        loader = loader.endpoint_url(endpoint);
    }
    let client = aws_sdk_sqs::Client::new(&loader.load().await);
    Ok(Arc::new(SqsGateway {
        client,
        queue_url: settings.queue_url.clone(),
    }))
}

#[async_trait::async_trait]
impl QueueGateway for SqsGateway {
    async fn send_batch(&self, batch: &Batch) -> Result<BatchOutcome, QueueError> {
        let mut entries = Vec::with_capacity(batch.entries.len());
        for entry in &batch.entries {
            let mut builder = SendMessageBatchRequestEntry::builder()
                .id(&entry.id)
                .message_body(&entry.body);
            for (name, attribute) in &entry.attributes {
                let value = MessageAttributeValue::builder()
                    .data_type(&attribute.data_type)
                    .string_value(&attribute.value)
                    .build()
                    .map_err(|e| QueueError::Entry(e.to_string()))?;
                builder = builder.message_attributes(name, value);
            }
            entries.push(builder.build().map_err(|e| QueueError::Entry(e.to_string()))?);
        }

        let output = self
            .client
            .send_message_batch()
            .queue_url(&self.queue_url)
            .set_entries(Some(entries))
            .send()
            .await
            .map_err(|e| match &e {
                SdkError::ServiceError(context) => QueueError::Service(context.err().to_string()),
                other => QueueError::Transport(other.to_string()),
            })?;

        Ok(BatchOutcome {
            delivered: output.successful().len(),
            rejected: output
                .failed()
                .iter()
                .map(|failure| EntryFailure {
                    entry_id: failure.id().to_string(),
                    code: failure.code().to_string(),
                    message: failure.message().map(str::to_string),
                    sender_fault: failure.sender_fault(),
                })
                .collect(),
        })
    }
}
