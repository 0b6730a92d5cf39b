//! Interceptor facade.
//!
//! [`Interceptor`] wires the exclusion filter, correlation manager,
//! invocation logger and error escalation behind three hooks the host calls
//! around an observed method:
//!
//! - [`before_call`](Interceptor::before_call): seed correlation, log input
//! - [`after_success`](Interceptor::after_success): log output, end correlation
//! - [`after_error`](Interceptor::after_error): record and escalate, end correlation
//!
//! [`observe`](Interceptor::observe) and
//! [`observe_async`](Interceptor::observe_async) wrap a body with all three.
//!
//! # Example
//! ```rust,ignore
//! use calltrace::prelude::*;
//!
//! let interceptor = Interceptor::builder()
//!     .config(TraceConfig::new().with_application_name("orders"))
//!     .build()?;
//!
//! let method = MethodDescriptor::new("shop::orders::OrderService", "create")
//!     .with_param("customer", "CustomerDto")
//!     .returning("Order");
//!
//! let order = interceptor.observe(&method, &[&customer], || service.create(&customer))?;
//! ```

use std::error::Error;
use std::fmt;
use std::future::Future;
use std::panic::Location;
use std::sync::Arc;
use tokio::runtime::Handle;

use crate::config::TraceConfig;
use crate::correlation::{self, CorrelationManager};
use crate::descriptor::MethodDescriptor;
use crate::encoding::Encoder;
use crate::error::TraceResult;
use crate::escalation::{DiscardErrorSink, ErrorEscalation, ErrorRecord, ErrorSink};
use crate::exclusion::ExclusionFilter;
use crate::inspect::Loggable;
use crate::invocation::InvocationContext;
use crate::logging::{InvocationLogger, LogSink, SinkFactory, SinkRegistry};

/// Hook set for observed method calls.
pub struct Interceptor {
    config: Arc<TraceConfig>,
    filter: Arc<ExclusionFilter>,
    correlation: CorrelationManager,
    logger: InvocationLogger,
    escalation: ErrorEscalation,
}

impl fmt::Debug for Interceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interceptor")
            .field("config", &self.config)
            .field("escalation", &self.escalation)
            .finish()
    }
}

impl Default for Interceptor {
    fn default() -> Self {
        InterceptorBuilder::default().assemble()
    }
}

impl Interceptor {
    /// Creates an interceptor with `config` and default sinks.
    pub fn new(config: TraceConfig) -> TraceResult<Self> {
        Self::builder().config(config).build()
    }

    /// Starts building an interceptor.
    pub fn builder() -> InterceptorBuilder {
        InterceptorBuilder::default()
    }

    /// The active configuration.
    pub fn config(&self) -> &TraceConfig {
        &self.config
    }

    /// The invocation logger.
    pub fn logger(&self) -> &InvocationLogger {
        &self.logger
    }

    /// The error escalation pipeline.
    pub fn escalation(&self) -> &ErrorEscalation {
        &self.escalation
    }

    /// Returns true if `method` is never observed.
    pub fn is_excluded(&self, method: &MethodDescriptor) -> bool {
        self.filter.is_excluded(method)
    }

    /// Runs before the observed method.
    pub fn before_call(&self, ctx: &InvocationContext<'_>) {
        if self.is_excluded(ctx.method) {
            return;
        }
        self.correlation.on_enter(ctx.method);
        self.logger.log_entry(ctx);
    }

    /// Runs after the observed method returned normally.
    pub fn after_success(&self, ctx: &InvocationContext<'_>, result: &dyn Loggable) {
        if self.is_excluded(ctx.method) {
            return;
        }
        self.logger.log_success(ctx, result);
        self.correlation.on_exit(ctx.method);
    }

    /// Runs after the observed method failed.
    ///
    /// The caller's location becomes the record's stack trace head.
    #[track_caller]
    pub fn after_error(
        &self,
        ctx: &InvocationContext<'_>,
        error: &(dyn Error + 'static),
    ) -> Option<ErrorRecord> {
        self.after_error_at(ctx, error, Location::caller())
    }

    fn after_error_at(
        &self,
        ctx: &InvocationContext<'_>,
        error: &(dyn Error + 'static),
        location: &Location<'_>,
    ) -> Option<ErrorRecord> {
        if self.is_excluded(ctx.method) {
            return None;
        }
        let record = self.escalation.on_error(ctx, error, location);
        self.correlation.on_exit(ctx.method);
        record
    }

    /// Calls `call` between the hooks and returns its outcome unchanged.
    #[track_caller]
    pub fn observe<T, E>(
        &self,
        method: &MethodDescriptor,
        args: &[&dyn Loggable],
        call: impl FnOnce() -> Result<T, E>,
    ) -> Result<T, E>
    where
        T: Loggable,
        E: Error + 'static,
    {
        let location = Location::caller();
        let ctx = InvocationContext::new(method, args);

        self.before_call(&ctx);
        let outcome = call();
        match &outcome {
            Ok(value) => self.after_success(&ctx, value),
            Err(error) => {
                self.after_error_at(&ctx, error, location);
            }
        }
        outcome
    }

    /// Async form of [`observe`](Interceptor::observe).
    ///
    /// Arguments must be `Sync` so the returned future can be sent across
    /// threads. Outside a [`correlation::scope`](crate::correlation::scope)
    /// the call gets a scope of its own, starting at the caller's active id,
    /// so tasks sharing a worker thread never see each other's id.
    #[track_caller]
    pub fn observe_async<'a, T, E, F>(
        &'a self,
        method: &'a MethodDescriptor,
        args: &'a [&'a (dyn Loggable + Sync)],
        future: F,
    ) -> impl Future<Output = Result<T, E>> + 'a
    where
        F: Future<Output = Result<T, E>> + 'a,
        T: Loggable + 'a,
        E: Error + 'static,
    {
        let location = Location::caller();
        let call = async move {
            {
                let args = erase(args);
                self.before_call(&InvocationContext::new(method, &args));
            }

            let outcome = future.await;

            {
                let args = erase(args);
                let ctx = InvocationContext::new(method, &args);
                match &outcome {
                    Ok(value) => self.after_success(&ctx, value),
                    Err(error) => {
                        self.after_error_at(&ctx, error, location);
                    }
                }
            }
            outcome
        };

        async move {
            if correlation::in_scope() {
                call.await
            } else {
                correlation::scope(correlation::current(), call).await
            }
        }
    }
}

fn erase<'a>(args: &'a [&'a (dyn Loggable + Sync)]) -> Vec<&'a dyn Loggable> {
    args.iter().map(|arg| *arg as &dyn Loggable).collect()
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for [`Interceptor`].
#[derive(Default)]
pub struct InterceptorBuilder {
    config: TraceConfig,
    sinks: Option<SinkRegistry>,
    json_logging: bool,
    error_sink: Option<Arc<dyn ErrorSink>>,
    runtime: Option<Handle>,
}

impl InterceptorBuilder {
    /// Sets the configuration.
    pub fn config(mut self, config: TraceConfig) -> Self {
        self.config = config;
        self
    }

    /// Uses the same log sink for every declaring type.
    pub fn log_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sinks = Some(SinkRegistry::shared(sink));
        self
    }

    /// Writes lines as JSON documents instead of plain `tracing` events.
    ///
    /// Applies only when no explicit sink or factory is set.
    pub fn json_logging(mut self) -> Self {
        self.json_logging = true;
        self
    }

    /// Builds one log sink per declaring type with `factory`.
    pub fn sink_factory(mut self, factory: SinkFactory) -> Self {
        self.sinks = Some(SinkRegistry::new(factory));
        self
    }

    /// Sets the external error sink.
    pub fn error_sink(mut self, sink: Arc<dyn ErrorSink>) -> Self {
        self.error_sink = Some(sink);
        self
    }

    /// Spawns escalation tasks on `handle` instead of the current runtime.
    pub fn runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    /// Validates the configuration and builds the interceptor.
    pub fn build(self) -> TraceResult<Interceptor> {
        self.config.validate()?;
        Ok(self.assemble())
    }

    fn assemble(self) -> Interceptor {
        let config = Arc::new(self.config);
        let encoder = Arc::new(Encoder::new(&config));
        let filter = Arc::new(ExclusionFilter::new(&config.exclusions));
        let sinks = match self.sinks {
            Some(sinks) => sinks,
            None if self.json_logging => SinkRegistry::json(&config.correlation_key),
            None => SinkRegistry::tracing(&config.correlation_key),
        };
        let sinks = Arc::new(sinks);
        let error_sink = self
            .error_sink
            .unwrap_or_else(|| Arc::new(DiscardErrorSink) as Arc<dyn ErrorSink>);

        let logger = InvocationLogger::new(
            Arc::clone(&encoder),
            Arc::clone(&filter),
            Arc::clone(&sinks),
        );
        let escalation =
            ErrorEscalation::new(Arc::clone(&config), encoder, sinks, error_sink, self.runtime);

        Interceptor {
            config,
            filter,
            correlation: CorrelationManager::new(),
            logger,
            escalation,
        }
    }
}
