use serde_json::Value;
use std::error::Error;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use super::line::{LogLine, Phase};
use super::registry::SinkRegistry;
use super::sink::LogSink;
use crate::correlation;
use crate::descriptor::MethodDescriptor;
use crate::encoding::{Encoder, StructuredNode};
use crate::error::{TraceError, TraceResult};
use crate::exclusion::ExclusionFilter;
use crate::inspect::Loggable;
use crate::invocation::InvocationContext;

/// Writes `Input` and `Output` lines for observed calls.
///
/// Arguments and results are encoded with masking requested. Failures while
/// encoding or writing, panics included, are turned into a single local
/// error line and never reach the caller.
#[derive(Debug, Clone)]
pub struct InvocationLogger {
    encoder: Arc<Encoder>,
    filter: Arc<ExclusionFilter>,
    sinks: Arc<SinkRegistry>,
}

impl InvocationLogger {
    /// Creates a logger.
    pub fn new(
        encoder: Arc<Encoder>,
        filter: Arc<ExclusionFilter>,
        sinks: Arc<SinkRegistry>,
    ) -> Self {
        Self {
            encoder,
            filter,
            sinks,
        }
    }

    /// Logs the masked arguments of a call.
    ///
    /// Error and validation-context arguments are left out.
    pub fn log_entry(&self, ctx: &InvocationContext<'_>) {
        if self.filter.is_excluded(ctx.method) {
            return;
        }
        let sink = self.sinks.resolve(&ctx.method.declaring_type);
        let outcome = guarded(|| {
            let args = ctx
                .logged_args()
                .map(|arg| self.encoder.encode(arg, true))
                .collect::<TraceResult<Vec<_>>>()?;
            let payload = self.render(&StructuredNode::Array(args));
            sink.info(&LogLine::new(
                ctx.method,
                Phase::Input,
                payload,
                correlation::current(),
            ));
            Ok(())
        });
        if let Err(err) = outcome {
            report_internal(sink.as_ref(), ctx.method, &err);
        }
    }

    /// Logs the masked result of a successful call.
    pub fn log_success(&self, ctx: &InvocationContext<'_>, result: &dyn Loggable) {
        if self.filter.is_excluded(ctx.method) {
            return;
        }
        let sink = self.sinks.resolve(&ctx.method.declaring_type);
        let outcome = guarded(|| {
            let node = self.encoder.encode(result, true)?;
            let payload = self.render(&node);
            sink.info(&LogLine::new(
                ctx.method,
                Phase::Output,
                payload,
                correlation::current(),
            ));
            Ok(())
        });
        if let Err(err) = outcome {
            report_internal(sink.as_ref(), ctx.method, &err);
        }
    }

    fn render(&self, node: &StructuredNode) -> Value {
        node.to_json_with(self.encoder.policy().token())
    }
}

/// Runs `f`, turning a panic into [`TraceError::Panicked`].
pub(crate) fn guarded<T>(f: impl FnOnce() -> TraceResult<T>) -> TraceResult<T> {
    catch_unwind(AssertUnwindSafe(f))
        .unwrap_or_else(|payload| Err(TraceError::from_panic(payload)))
}

/// Writes the local error line for a logging failure.
///
/// A panic raised by the sink while doing so is swallowed.
pub(crate) fn report_internal(sink: &dyn LogSink, method: &MethodDescriptor, err: &TraceError) {
    let line = LogLine::internal(method, err.to_string(), correlation::current());
    let cause: &(dyn Error + 'static) = err;
    let _ = catch_unwind(AssertUnwindSafe(|| sink.error(&line, Some(cause))));
}
