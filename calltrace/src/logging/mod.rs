//! Log lines and the sinks that receive them.
//!
//! - `line`: [`LogLine`] and its `Type@method - Phase - payload` rendering
//! - `sink`: the [`LogSink`] trait with tracing, JSON and in-memory sinks
//! - `registry`: [`SinkRegistry`], one cached sink per declaring type
//! - `logger`: [`InvocationLogger`], entry and success lines

mod line;
mod logger;
mod registry;
mod sink;

pub use line::{LogLine, Phase};
pub use logger::InvocationLogger;
pub use registry::{SinkFactory, SinkRegistry};
pub use sink::{CapturedLine, JsonSink, LogSink, MemorySink, Severity, TracingSink};

pub(crate) use logger::{guarded, report_internal};
