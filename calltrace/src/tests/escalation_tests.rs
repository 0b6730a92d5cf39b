//! Escalation tests - detached publishing of error records
//!
//! Tests that escalated records carry the correlation id captured at the
//! time of the error, that the publish task sees that id as its own, and
//! that sink failures, panics and back-pressure never reach the caller.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Notify, mpsc};
use tokio::time::timeout;

use super::fixtures::*;
use crate::correlation::{self, CorrelationId};
use crate::{
    ChannelErrorSink, ErrorSink, Interceptor, InvocationContext, Loggable, MemorySink,
    MethodDescriptor, TraceConfig, TraceResult,
};

// =============================================================================
// Test Sinks
// =============================================================================

type Published = (String, String, Option<CorrelationId>);

/// Records each publish together with the correlation id it ran under.
struct RecordingSink {
    tx: mpsc::UnboundedSender<Published>,
}

#[async_trait]
impl ErrorSink for RecordingSink {
    async fn publish(&self, destination: &str, payload: String) -> TraceResult<()> {
        let _ = self
            .tx
            .send((destination.to_string(), payload, correlation::current()));
        Ok(())
    }
}

/// Blocks every publish until released.
struct BlockingSink {
    calls: Arc<AtomicUsize>,
    release: Arc<Notify>,
}

#[async_trait]
impl ErrorSink for BlockingSink {
    async fn publish(&self, _destination: &str, _payload: String) -> TraceResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.release.notified().await;
        Ok(())
    }
}

struct PanickingSink;

#[async_trait]
impl ErrorSink for PanickingSink {
    async fn publish(&self, _destination: &str, _payload: String) -> TraceResult<()> {
        panic!("sink exploded")
    }
}

fn escalating(config: TraceConfig, error_sink: Arc<dyn ErrorSink>) -> (Interceptor, MemorySink) {
    let sink = MemorySink::new();
    let interceptor = Interceptor::builder()
        .config(config)
        .log_sink(Arc::new(sink.clone()))
        .error_sink(error_sink)
        .build()
        .unwrap();
    (interceptor, sink)
}

fn escalating_method() -> MethodDescriptor {
    plain_method("charge").escalates_errors()
}

async fn settle(interceptor: &Interceptor) {
    for _ in 0..100 {
        if interceptor.escalation().in_flight() == 0 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
}

// =============================================================================
// Publishing
// =============================================================================

#[tokio::test]
async fn test_order_create_publishes_with_captured_correlation() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let config = TraceConfig::new()
        .with_application_name("orders")
        .with_escalation(true)
        .with_error_destination("order-errors");
    let (interceptor, sink) = escalating(config, Arc::new(RecordingSink { tx }));
    let method = create_order();
    let customer = CustomerDto::sample();

    let result: Result<Order, OrderError> = correlation::scope(None, async {
        let outcome = interceptor.observe(&method, &[&customer], || {
            Err(OrderError("bad amount".into()))
        });
        assert_eq!(correlation::current(), None);
        outcome
    })
    .await;
    assert!(result.is_err());

    let (destination, payload, seen) = timeout(Duration::from_secs(2), rx.recv())
        .await
        .unwrap()
        .unwrap();

    let captured = sink.lines()[0].line.correlation_id.clone();
    assert!(captured.is_some());
    assert_eq!(destination, "order-errors");
    assert_eq!(seen, captured);

    let record: Value = serde_json::from_str(&payload).unwrap();
    assert_eq!(record["applicationName"], json!("orders"));
    assert_eq!(record["message"], json!("bad amount"));
    assert_eq!(
        record["correlationId"],
        json!(captured.as_ref().map(CorrelationId::as_str))
    );
    assert_eq!(
        record["params"]["customer"],
        json!({"amount": 10.5, "creditCard": "4111111111111111"})
    );

    settle(&interceptor).await;
    assert_eq!(interceptor.escalation().in_flight(), 0);
}

#[tokio::test]
async fn test_publish_task_outlives_caller_scope() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let (interceptor, _sink) = escalating(
        TraceConfig::new().with_escalation(true),
        Arc::new(RecordingSink { tx }),
    );
    let method = escalating_method();
    let customer = CustomerDto::sample();
    let args: [&dyn Loggable; 1] = [&customer];

    correlation::scope(Some(CorrelationId::from_string("caller")), async {
        interceptor.after_error(
            &InvocationContext::new(&method, &args),
            &OrderError("declined".into()),
        );
        correlation::set(CorrelationId::from_string("changed-after-error"));
    })
    .await;

    let (_, _, seen) = timeout(Duration::from_secs(2), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(seen.unwrap().as_str(), "caller");
}

#[tokio::test]
async fn test_disabled_escalation_publishes_nothing() {
    let (channel, mut rx) = ChannelErrorSink::channel(4);
    let (interceptor, sink) = escalating(TraceConfig::new(), Arc::new(channel));
    let method = escalating_method();
    let args: [&dyn Loggable; 0] = [];

    let record = interceptor.after_error(
        &InvocationContext::new(&method, &args),
        &OrderError("declined".into()),
    );
    assert!(record.is_some());
    assert_eq!(sink.len(), 1);

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_unmarked_method_publishes_nothing() {
    let (channel, mut rx) = ChannelErrorSink::channel(4);
    let (interceptor, _sink) =
        escalating(TraceConfig::new().with_escalation(true), Arc::new(channel));
    let method = plain_method("charge");
    let args: [&dyn Loggable; 0] = [];

    interceptor.after_error(
        &InvocationContext::new(&method, &args),
        &OrderError("declined".into()),
    );

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(rx.try_recv().is_err());
    assert_eq!(interceptor.escalation().in_flight(), 0);
}

// =============================================================================
// Containment
// =============================================================================

#[tokio::test]
async fn test_in_flight_limit_drops_excess_records() {
    let calls = Arc::new(AtomicUsize::new(0));
    let release = Arc::new(Notify::new());
    let error_sink = BlockingSink {
        calls: Arc::clone(&calls),
        release: Arc::clone(&release),
    };
    let config = TraceConfig::new()
        .with_escalation(true)
        .with_max_in_flight(1);
    let (interceptor, _sink) = escalating(config, Arc::new(error_sink));
    let method = escalating_method();
    let args: [&dyn Loggable; 0] = [];
    let ctx = InvocationContext::new(&method, &args);

    assert!(interceptor.after_error(&ctx, &OrderError("first".into())).is_some());
    assert!(interceptor.after_error(&ctx, &OrderError("second".into())).is_some());
    assert_eq!(interceptor.escalation().in_flight(), 1);

    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    release.notify_one();
    settle(&interceptor).await;
    assert_eq!(interceptor.escalation().in_flight(), 0);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_panicking_sink_is_contained() {
    let (interceptor, _sink) = escalating(
        TraceConfig::new().with_escalation(true),
        Arc::new(PanickingSink),
    );
    let method = escalating_method();
    let args: [&dyn Loggable; 0] = [];

    let record = interceptor.after_error(
        &InvocationContext::new(&method, &args),
        &OrderError("declined".into()),
    );
    assert!(record.is_some());

    settle(&interceptor).await;
    assert_eq!(interceptor.escalation().in_flight(), 0);
}

#[tokio::test]
async fn test_failing_sink_releases_permit() {
    let (channel, rx) = ChannelErrorSink::channel(1);
    drop(rx);
    let (interceptor, _sink) =
        escalating(TraceConfig::new().with_escalation(true), Arc::new(channel));
    let method = escalating_method();
    let args: [&dyn Loggable; 0] = [];

    interceptor.after_error(
        &InvocationContext::new(&method, &args),
        &OrderError("declined".into()),
    );

    settle(&interceptor).await;
    assert_eq!(interceptor.escalation().in_flight(), 0);
}

// =============================================================================
// Runtimes
// =============================================================================

#[test]
fn test_without_runtime_record_is_still_logged() {
    let (channel, mut rx) = ChannelErrorSink::channel(4);
    let (interceptor, sink) =
        escalating(TraceConfig::new().with_escalation(true), Arc::new(channel));
    let method = escalating_method();
    let args: [&dyn Loggable; 0] = [];

    let record = correlation::sync_scope(None, || {
        interceptor.after_error(
            &InvocationContext::new(&method, &args),
            &OrderError("declined".into()),
        )
    });

    assert_eq!(record.unwrap().message, "declined");
    assert_eq!(sink.len(), 1);
    assert!(rx.try_recv().is_err());
}

#[test]
fn test_configured_runtime_is_used_outside_async_context() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let (channel, mut rx) = ChannelErrorSink::channel(4);
    let interceptor = Interceptor::builder()
        .config(TraceConfig::new().with_escalation(true))
        .log_sink(Arc::new(MemorySink::new()))
        .error_sink(Arc::new(channel))
        .runtime(runtime.handle().clone())
        .build()
        .unwrap();
    let method = escalating_method();
    let args: [&dyn Loggable; 0] = [];

    correlation::sync_scope(Some(CorrelationId::from_string("sync-caller")), || {
        interceptor.after_error(
            &InvocationContext::new(&method, &args),
            &OrderError("declined".into()),
        );
    });

    let message = runtime
        .block_on(async { timeout(Duration::from_secs(2), rx.recv()).await })
        .unwrap()
        .unwrap();
    let record: Value = serde_json::from_str(&message.payload).unwrap();
    assert_eq!(message.destination, "errors");
    assert_eq!(record["correlationId"], json!("sync-caller"));
}
