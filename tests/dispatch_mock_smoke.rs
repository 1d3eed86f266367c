#![cfg(feature = "queue-mock")]
use std::sync::Arc;
use std::time::Duration;

use sqs_bench::batch::{BATCH_CAPACITY, Batch};
use sqs_bench::config::{Environment, Settings};
use sqs_bench::dispatcher::{DispatchConfig, run_dispatch};
use sqs_bench::entry::EntryTemplate;
use sqs_bench::metrics::stats::Stats;
use sqs_bench::queue::mock::MockGateway;
use sqs_bench::queue::{Backend, GatewayBuilder, QueueGateway};

fn config(total_messages: f64, max_in_flight: usize) -> DispatchConfig {
    DispatchConfig {
        total_messages,
        max_in_flight,
        send_timeout: Duration::from_secs(5),
    }
}

fn template() -> EntryTemplate {
    EntryTemplate::new("load-test-body".to_string())
}

#[tokio::test]
async fn dispatch_rounds_up_to_whole_batches() {
    let gateway = Arc::new(MockGateway::new());
    let stats = Arc::new(Stats::new());

    run_dispatch(gateway.clone(), template(), config(25.0, 100), stats.clone())
        .await
        .expect("dispatch");

    let sent = gateway.sent();
    assert_eq!(sent.len(), 3);
    assert!(sent.iter().all(|batch| batch.entries == BATCH_CAPACITY));
    // 25 requested, 30 sent: trailing batch is padded to capacity
    assert_eq!(gateway.total_entries(), 30);

    let snapshot = stats.snapshot().await;
    assert_eq!(snapshot.batches_sent, 3);
    assert_eq!(snapshot.entries_delivered, 30);
    assert_eq!(snapshot.batches_failed, 0);
}

#[tokio::test]
async fn limiter_bound_one_serializes_sends() {
    let gateway = Arc::new(MockGateway::new().with_delay(Duration::from_millis(10)));
    let stats = Arc::new(Stats::new());

    run_dispatch(gateway.clone(), template(), config(100.0, 1), stats)
        .await
        .expect("dispatch");

    assert_eq!(gateway.sent().len(), 10);
    assert_eq!(gateway.max_in_flight(), 1);
}

#[tokio::test]
async fn limiter_caps_concurrent_sends() {
    let gateway = Arc::new(MockGateway::new().with_delay(Duration::from_millis(5)));
    let stats = Arc::new(Stats::new());

    run_dispatch(gateway.clone(), template(), config(500.0, 4), stats)
        .await
        .expect("dispatch");

    assert_eq!(gateway.sent().len(), 50);
    assert!(gateway.max_in_flight() <= 4);
}

#[tokio::test]
async fn single_batch_failure_is_contained() {
    let gateway = Arc::new(MockGateway::new().fail_on(2));
    let stats = Arc::new(Stats::new());

    run_dispatch(gateway.clone(), template(), config(30.0, 100), stats.clone())
        .await
        .expect("dispatch");

    let sent = gateway.sent();
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().all(|batch| batch.sequence != 2));
    // every send released its slot
    assert_eq!(gateway.in_flight(), 0);

    let snapshot = stats.snapshot().await;
    assert_eq!(snapshot.batches_sent, 2);
    assert_eq!(snapshot.batches_failed, 1);
}

#[tokio::test]
async fn partial_rejection_is_not_a_batch_failure() {
    let gateway = Arc::new(MockGateway::new().reject_per_batch(3));
    let stats = Arc::new(Stats::new());

    run_dispatch(gateway.clone(), template(), config(20.0, 100), stats.clone())
        .await
        .expect("dispatch");

    let snapshot = stats.snapshot().await;
    assert_eq!(snapshot.batches_sent, 2);
    assert_eq!(snapshot.batches_failed, 0);
    assert_eq!(snapshot.entries_delivered, 14);
    assert_eq!(snapshot.entries_rejected, 6);
}

#[tokio::test]
async fn dispatch_joins_every_task_under_stress() {
    let gateway = Arc::new(MockGateway::new());
    let stats = Arc::new(Stats::new());

    run_dispatch(gateway.clone(), template(), config(10_000.0, 64), stats.clone())
        .await
        .expect("dispatch");

    assert_eq!(gateway.sent().len(), 1000);
    assert_eq!(gateway.total_entries(), 10_000);
    assert_eq!(gateway.in_flight(), 0);
    assert_eq!(stats.snapshot().await.batches_sent, 1000);
}

#[tokio::test]
async fn builder_connects_mock_backend() {
    let settings = Settings {
        environment: Environment::Local,
        queue_url: "http://localhost:4566/000000000000/demo".to_string(),
        message_body: "load-test-body".to_string(),
        endpoint_url: None,
        credentials: None,
    };
    let gateway = GatewayBuilder::connect(Backend::Mock, &settings)
        .await
        .expect("connect");

    let batch = Batch::build(1, &template());
    let outcome = gateway.send_batch(&batch).await.expect("send");
    assert_eq!(outcome.delivered, BATCH_CAPACITY);
    assert!(outcome.rejected.is_empty());
}
