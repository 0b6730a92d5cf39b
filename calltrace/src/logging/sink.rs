use std::error::Error;
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::{Map, Value};

use super::line::LogLine;
use crate::constants::DEFAULT_CORRELATION_KEY;
use crate::correlation::CorrelationId;

// =============================================================================
// LogSink Trait
// =============================================================================

/// Destination for invocation log lines.
///
/// Calls happen synchronously on the thread running the observed method.
pub trait LogSink: Send + Sync {
    /// Writes an informational line (entry and success).
    fn info(&self, line: &LogLine);

    /// Writes an error line, with the observed error or the logging failure
    /// attached when available.
    fn error(&self, line: &LogLine, cause: Option<&(dyn Error + 'static)>);
}

// =============================================================================
// TracingSink
// =============================================================================

/// Default sink that emits `tracing` events with structured fields.
///
/// `tracing` field names are static, so the id is always recorded as
/// `correlation_id` and the configured key travels beside it as
/// `correlation_key`.
#[derive(Debug, Clone)]
pub struct TracingSink {
    correlation_key: String,
}

impl Default for TracingSink {
    fn default() -> Self {
        Self::new(DEFAULT_CORRELATION_KEY)
    }
}

impl TracingSink {
    /// Creates a sink labelling the correlation id with `correlation_key`.
    pub fn new(correlation_key: impl Into<String>) -> Self {
        Self {
            correlation_key: correlation_key.into(),
        }
    }

    /// The key the correlation id is published under.
    pub fn correlation_key(&self) -> &str {
        &self.correlation_key
    }
}

impl LogSink for TracingSink {
    fn info(&self, line: &LogLine) {
        tracing::info!(
            declaring_type = %line.declaring_type,
            method = %line.method,
            phase = %line.phase,
            correlation_key = %self.correlation_key,
            correlation_id = line.correlation_id.as_ref().map(CorrelationId::as_str),
            "{}",
            line
        );
    }

    fn error(&self, line: &LogLine, cause: Option<&(dyn Error + 'static)>) {
        let cause = cause.map(ToString::to_string).unwrap_or_default();
        tracing::error!(
            declaring_type = %line.declaring_type,
            method = %line.method,
            phase = %line.phase,
            correlation_key = %self.correlation_key,
            correlation_id = line.correlation_id.as_ref().map(CorrelationId::as_str),
            cause = %cause,
            "{}",
            line
        );
    }
}

// =============================================================================
// JsonSink
// =============================================================================

/// Sink that emits one JSON document per line under the `calltrace_json`
/// target. The correlation id is written under the configured key.
#[derive(Debug, Clone)]
pub struct JsonSink {
    correlation_key: String,
}

impl Default for JsonSink {
    fn default() -> Self {
        Self::new(DEFAULT_CORRELATION_KEY)
    }
}

impl JsonSink {
    /// Creates a sink publishing the correlation id under `correlation_key`.
    pub fn new(correlation_key: impl Into<String>) -> Self {
        Self {
            correlation_key: correlation_key.into(),
        }
    }

    /// The key the correlation id is published under.
    pub fn correlation_key(&self) -> &str {
        &self.correlation_key
    }

    /// Builds the JSON document for a line.
    pub fn document(&self, line: &LogLine, cause: Option<&(dyn Error + 'static)>) -> Value {
        let mut doc = Map::new();
        doc.insert("type".into(), Value::String(line.simple_type_name().to_string()));
        doc.insert("method".into(), Value::String(line.method.clone()));
        doc.insert("phase".into(), Value::String(line.phase.to_string()));
        doc.insert("message".into(), Value::String(line.to_string()));
        doc.insert("payload".into(), line.payload.clone());
        if let Some(id) = &line.correlation_id {
            doc.insert(self.correlation_key.clone(), Value::String(id.to_string()));
        }
        if let Some(cause) = cause {
            doc.insert("cause".into(), Value::String(cause.to_string()));
        }
        Value::Object(doc)
    }
}

impl LogSink for JsonSink {
    fn info(&self, line: &LogLine) {
        tracing::info!(target: "calltrace_json", "{}", self.document(line, None));
    }

    fn error(&self, line: &LogLine, cause: Option<&(dyn Error + 'static)>) {
        tracing::error!(target: "calltrace_json", "{}", self.document(line, cause));
    }
}

// =============================================================================
// MemorySink
// =============================================================================

/// Severity of a captured line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Written through [`LogSink::info`].
    Info,
    /// Written through [`LogSink::error`].
    Error,
}

/// A line captured by [`MemorySink`].
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedLine {
    /// Severity the line was written with.
    pub severity: Severity,
    /// The line itself.
    pub line: LogLine,
    /// Rendered cause, for error lines that carried one.
    pub cause: Option<String>,
}

/// Sink that keeps every line in memory.
///
/// Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<CapturedLine>>>,
}

impl MemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the captured lines.
    pub fn lines(&self) -> Vec<CapturedLine> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the captured lines rendered as text.
    pub fn messages(&self) -> Vec<String> {
        self.lines()
            .iter()
            .map(|captured| captured.line.to_string())
            .collect()
    }

    /// Returns the number of captured lines.
    pub fn len(&self) -> usize {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns true if nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every captured line.
    pub fn clear(&self) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn push(&self, severity: Severity, line: &LogLine, cause: Option<String>) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(CapturedLine {
                severity,
                line: line.clone(),
                cause,
            });
    }
}

impl LogSink for MemorySink {
    fn info(&self, line: &LogLine) {
        self.push(Severity::Info, line, None);
    }

    fn error(&self, line: &LogLine, cause: Option<&(dyn Error + 'static)>) {
        self.push(Severity::Error, line, cause.map(ToString::to_string));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::MethodDescriptor;
    use crate::logging::Phase;
    use serde_json::json;

    fn line(correlation_id: Option<CorrelationId>) -> LogLine {
        let method = MethodDescriptor::new("shop::orders::OrderService", "create");
        LogLine::new(&method, Phase::Output, json!({"id": 7}), correlation_id)
    }

    #[test]
    fn test_json_document_uses_correlation_key() {
        let sink = JsonSink::new("traceId");
        let doc = sink.document(&line(Some(CorrelationId::from_string("abc"))), None);
        assert_eq!(doc["traceId"], json!("abc"));
        assert_eq!(doc["type"], json!("OrderService"));
        assert_eq!(doc["phase"], json!("Output"));
        assert_eq!(doc["payload"], json!({"id": 7}));
        assert!(doc.get("cause").is_none());
    }

    #[test]
    fn test_json_document_without_correlation() {
        let doc = JsonSink::default().document(&line(None), None);
        assert!(doc.get(DEFAULT_CORRELATION_KEY).is_none());
    }

    #[test]
    fn test_tracing_sink_keeps_correlation_key() {
        assert_eq!(TracingSink::default().correlation_key(), DEFAULT_CORRELATION_KEY);
        assert_eq!(TracingSink::new("traceId").correlation_key(), "traceId");
        assert_eq!(JsonSink::new("traceId").correlation_key(), "traceId");
    }

    #[test]
    fn test_memory_sink_captures_severity_and_cause() {
        let sink = MemorySink::new();
        let shared = sink.clone();
        let cause = std::io::Error::other("disk full");

        sink.info(&line(None));
        sink.error(&line(None), Some(&cause as &(dyn Error + 'static)));

        let lines = shared.lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].severity, Severity::Info);
        assert_eq!(lines[1].severity, Severity::Error);
        assert_eq!(lines[1].cause.as_deref(), Some("disk full"));

        shared.clear();
        assert!(sink.is_empty());
    }
}
