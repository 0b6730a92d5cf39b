#![warn(missing_docs)]
//! # calltrace
//!
//! Cross-cutting instrumentation for method invocations.
//!
//! ## Overview
//!
//! An [`Interceptor`] wraps observed calls and provides:
//! - **Entry/exit logging** of arguments and results as structured JSON
//! - **Field redaction** driven by declared markers and sensitive names
//! - **Correlation ids** seeded by marked methods and carried across `.await`
//! - **Error escalation** of failed calls to an external sink, off the caller
//!
//! ## Architecture
//!
//! ```text
//!  host hook ──► Exclusion Filter ──► Correlation Manager ──► Invocation Logger ──► LogSink
//!                      │                                              │
//!                      │                                              ▼
//!                      │                                     Encoder + Redaction
//!                      ▼                                              ▲
//!                after_error ──► Error Escalation ────────────────────┘
//!                                        │
//!                                        ▼  detached task (own correlation scope)
//!                                    ErrorSink
//! ```
//!
//! ## Quick Start
//!
//! ### 1. Describe Your Types
//!
//! ```rust,ignore
//! use calltrace::Loggable;
//!
//! #[derive(Loggable)]
//! struct CustomerDto {
//!     #[loggable(mask, rename = "creditCard")]
//!     credit_card: String,
//!     amount: f64,
//! }
//! ```
//!
//! ### 2. Describe Your Methods
//!
//! ```rust,ignore
//! use calltrace::MethodDescriptor;
//!
//! let create = MethodDescriptor::new("shop::orders::OrderService", "create")
//!     .with_param("customer", "CustomerDto")
//!     .returning("Order")
//!     .seeds_correlation()
//!     .escalates_errors();
//! ```
//!
//! ### 3. Observe Calls
//!
//! ```rust,ignore
//! use calltrace::prelude::*;
//!
//! let interceptor = Interceptor::builder()
//!     .config(TraceConfig::new().with_application_name("orders").with_escalation(true))
//!     .error_sink(Arc::new(my_queue_sink))
//!     .build()?;
//!
//! let order = interceptor.observe(&create, &[&customer], || service.create(&customer))?;
//! // OrderService@create - Input - [{"amount":10.5,"creditCard":"***"}]
//! // OrderService@create - Output - {...}
//! ```
//!
//! ## Redaction
//!
//! Masking is requested for entry and success lines only. Error records
//! carry the unmasked arguments so failures can be reproduced; treat the
//! error sink as a trusted destination. Map values are never redacted.

// Lets `#[derive(Loggable)]` output, which names `::calltrace`, compile here.
extern crate self as calltrace;

mod config;
pub mod constants;
pub mod correlation;
mod descriptor;
pub mod encoding;
mod error;
pub mod escalation;
mod exclusion;
pub mod inspect;
mod interceptor;
mod invocation;
pub mod logging;
pub mod redaction;

#[cfg(test)]
mod tests;

// Public API
pub use config::{
    ConfigValidationError, EscalationConfig, ExclusionRules, RedactionConfig, TraceConfig,
};
pub use correlation::{CorrelationId, CorrelationManager};
pub use descriptor::{
    FieldDescriptor, Marker, MethodDescriptor, MethodMarker, ParamDescriptor, TypeDescriptor,
};
pub use encoding::{Encoder, StructuredNode};
pub use error::{TraceError, TraceErrorCode, TraceResult};
pub use escalation::{
    ChannelErrorSink, DiscardErrorSink, ErrorEscalation, ErrorMessage, ErrorRecord, ErrorSink,
};
pub use exclusion::ExclusionFilter;
pub use inspect::{
    Bytes, Composite, Envelope, Loggable, Scalar, Shape, ValueKind, ValueRole, classify,
};
pub use interceptor::{Interceptor, InterceptorBuilder};
pub use invocation::InvocationContext;
pub use logging::{
    CapturedLine, InvocationLogger, JsonSink, LogLine, LogSink, MemorySink, Phase, Severity,
    SinkFactory, SinkRegistry, TracingSink,
};
pub use redaction::{RedactionPolicy, should_mask};

/// Derive macro for [`Loggable`].
///
/// See the `calltrace-macros` crate for the supported `#[loggable(..)]`
/// attributes.
#[cfg(feature = "derive")]
pub use calltrace_macros::Loggable;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        // Correlation
        CorrelationId,
        // Escalation
        ErrorRecord,
        ErrorSink,
        // Interception
        Interceptor,
        InvocationContext,
        // Values
        Loggable,
        MethodDescriptor,
        MethodMarker,
        // Configuration
        TraceConfig,
        TraceError,
        TraceResult,
        correlation,
    };
    pub use std::sync::Arc;
}
