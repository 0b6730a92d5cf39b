use futures::FutureExt;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::panic::{AssertUnwindSafe, Location};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::Semaphore;

use super::record::ErrorRecord;
use super::sink::ErrorSink;
use crate::config::TraceConfig;
use crate::constants::PUBLISH_SUCCESS_MESSAGE;
use crate::correlation::{self, CorrelationId};
use crate::descriptor::MethodDescriptor;
use crate::encoding::Encoder;
use crate::error::{TraceError, TraceResult, panic_message};
use crate::invocation::InvocationContext;
use crate::logging::{LogLine, Phase, SinkRegistry, guarded, report_internal};

/// Builds, logs and publishes error records.
///
/// Record construction and the error line happen on the caller. Publishing
/// runs on a detached tokio task, bounded by `escalation.max_in_flight`
/// permits; records that find no permit or no runtime are dropped with a
/// warning.
pub struct ErrorEscalation {
    config: Arc<TraceConfig>,
    encoder: Arc<Encoder>,
    sinks: Arc<SinkRegistry>,
    error_sink: Arc<dyn ErrorSink>,
    runtime: Option<Handle>,
    permits: Arc<Semaphore>,
}

impl fmt::Debug for ErrorEscalation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorEscalation")
            .field("enabled", &self.config.escalation.enabled)
            .field("destination", &self.config.escalation.destination)
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

impl ErrorEscalation {
    /// Creates a pipeline.
    ///
    /// Without an explicit `runtime`, tasks are spawned on the runtime
    /// current at the time of the error.
    pub fn new(
        config: Arc<TraceConfig>,
        encoder: Arc<Encoder>,
        sinks: Arc<SinkRegistry>,
        error_sink: Arc<dyn ErrorSink>,
        runtime: Option<Handle>,
    ) -> Self {
        let permits = Arc::new(Semaphore::new(config.escalation.max_in_flight));
        Self {
            config,
            encoder,
            sinks,
            error_sink,
            runtime,
            permits,
        }
    }

    /// Returns true if errors of `method` are published.
    pub fn should_escalate(&self, method: &MethodDescriptor) -> bool {
        self.config.escalation.enabled && method.requests_escalation()
    }

    /// Number of publish tasks currently running.
    pub fn in_flight(&self) -> usize {
        self.config
            .escalation
            .max_in_flight
            .saturating_sub(self.permits.available_permits())
    }

    /// Handles a failed call.
    ///
    /// Returns the record that was logged, or `None` if building or logging
    /// it failed (a local error line is written instead).
    pub fn on_error(
        &self,
        ctx: &InvocationContext<'_>,
        error: &(dyn Error + 'static),
        location: &Location<'_>,
    ) -> Option<ErrorRecord> {
        let correlation_id = correlation::current();
        let sink = self.sinks.resolve(&ctx.method.declaring_type);

        let outcome = guarded(|| {
            let record = self.build_record(ctx, error, location, correlation_id.clone())?;
            let payload = serde_json::to_value(&record)?;
            sink.error(
                &LogLine::new(ctx.method, Phase::Output, payload, correlation_id.clone()),
                Some(error),
            );
            Ok(record)
        });

        match outcome {
            Ok(record) => {
                if self.should_escalate(ctx.method) {
                    self.detach(record.clone(), correlation_id);
                }
                Some(record)
            }
            Err(err) => {
                report_internal(sink.as_ref(), ctx.method, &err);
                None
            }
        }
    }

    fn build_record(
        &self,
        ctx: &InvocationContext<'_>,
        error: &(dyn Error + 'static),
        location: &Location<'_>,
        correlation_id: Option<CorrelationId>,
    ) -> TraceResult<ErrorRecord> {
        let params = ctx
            .named_args()
            .map(|(name, arg)| self.encoder.encode(arg, false).map(|node| (name, node)))
            .collect::<TraceResult<BTreeMap<_, _>>>()?;

        Ok(ErrorRecord {
            application_name: self.config.application_name.clone(),
            message: error.to_string(),
            correlation_id,
            date_time: chrono::Local::now().naive_local(),
            stacktrace: location.to_string(),
            method: ctx.method.to_string(),
            params,
        })
    }

    fn detach(&self, record: ErrorRecord, correlation_id: Option<CorrelationId>) {
        let handle = match &self.runtime {
            Some(handle) => handle.clone(),
            None => match Handle::try_current() {
                Ok(handle) => handle,
                Err(_) => {
                    tracing::warn!(
                        method = %record.method,
                        code = %TraceError::NoRuntime.code(),
                        "Dropping error record: no tokio runtime available"
                    );
                    return;
                }
            },
        };

        let permit = match Arc::clone(&self.permits).try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                tracing::warn!(
                    method = %record.method,
                    max_in_flight = self.config.escalation.max_in_flight,
                    "Dropping error record: too many escalations in flight"
                );
                return;
            }
        };

        let sink = Arc::clone(&self.error_sink);
        let destination = self.config.escalation.destination.clone();

        handle.spawn(correlation::scope(correlation_id, async move {
            let _permit = permit;
            let outcome = AssertUnwindSafe(publish(sink.as_ref(), &destination, &record))
                .catch_unwind()
                .await;

            let correlation_id = correlation::current();
            let correlation_id = correlation_id.as_ref().map(CorrelationId::as_str);
            match outcome {
                Ok(Ok(())) => tracing::info!(
                    destination = %destination,
                    correlation_id,
                    "ErrorSink@publish - Output - {PUBLISH_SUCCESS_MESSAGE}"
                ),
                Ok(Err(err)) => tracing::error!(
                    destination = %destination,
                    correlation_id,
                    code = %err.code(),
                    error = %err,
                    "ErrorSink@publish - Output - Failed to publish error record"
                ),
                Err(panic) => tracing::error!(
                    destination = %destination,
                    correlation_id,
                    panic = %panic_message(panic.as_ref()),
                    "ErrorSink@publish - Output - Error sink panicked"
                ),
            }
        }));
    }
}

async fn publish(sink: &dyn ErrorSink, destination: &str, record: &ErrorRecord) -> TraceResult<()> {
    let payload = record.to_json_string()?;
    sink.publish(destination, payload).await
}
