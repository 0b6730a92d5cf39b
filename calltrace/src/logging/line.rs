use serde::Serialize;
use serde_json::Value;
use std::fmt;

use crate::constants::INTERNAL_ERROR_PREFIX;
use crate::correlation::CorrelationId;
use crate::descriptor::{MethodDescriptor, simple_name};

/// Which side of an invocation a line describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Phase {
    /// Arguments on entry.
    Input,
    /// Result on success, or the error record on failure.
    Output,
    /// Logging itself failed.
    Internal,
}

impl Phase {
    /// Returns the string representation of the phase.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Input => "Input",
            Self::Output => "Output",
            Self::Internal => "Internal",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One line written to a [`LogSink`](super::LogSink).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogLine {
    /// Fully-qualified declaring type of the observed method.
    pub declaring_type: String,
    /// Method name.
    pub method: String,
    /// Invocation side.
    pub phase: Phase,
    /// Encoded arguments, result, error record, or failure reason.
    pub payload: Value,
    /// Correlation id active when the line was produced.
    pub correlation_id: Option<CorrelationId>,
}

impl LogLine {
    /// Creates a line for `method`.
    pub fn new(
        method: &MethodDescriptor,
        phase: Phase,
        payload: Value,
        correlation_id: Option<CorrelationId>,
    ) -> Self {
        Self {
            declaring_type: method.declaring_type.clone(),
            method: method.name.clone(),
            phase,
            payload,
            correlation_id,
        }
    }

    /// Creates a line reporting a logging failure.
    pub fn internal(
        method: &MethodDescriptor,
        reason: impl Into<String>,
        correlation_id: Option<CorrelationId>,
    ) -> Self {
        Self::new(
            method,
            Phase::Internal,
            Value::String(reason.into()),
            correlation_id,
        )
    }

    /// Last path segment of the declaring type.
    pub fn simple_type_name(&self) -> &str {
        simple_name(&self.declaring_type)
    }
}

/// `Type@method - Input - [..]`, or `Error during intercept logger ..` for
/// internal failures.
impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.phase, &self.payload) {
            (Phase::Internal, Value::String(reason)) => {
                write!(f, "{INTERNAL_ERROR_PREFIX} {reason}")
            }
            (Phase::Internal, payload) => write!(f, "{INTERNAL_ERROR_PREFIX} {payload}"),
            (phase, payload) => write!(
                f,
                "{}@{} - {} - {}",
                self.simple_type_name(),
                self.method,
                phase,
                payload
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn method() -> MethodDescriptor {
        MethodDescriptor::new("shop::orders::OrderService", "create")
    }

    #[test]
    fn test_input_line_format() {
        let line = LogLine::new(&method(), Phase::Input, json!([{"amount": 10.5}]), None);
        assert_eq!(
            line.to_string(),
            r#"OrderService@create - Input - [{"amount":10.5}]"#
        );
    }

    #[test]
    fn test_internal_line_format() {
        let line = LogLine::internal(&method(), "field `x` of `Y` is not readable", None);
        assert_eq!(
            line.to_string(),
            "Error during intercept logger field `x` of `Y` is not readable"
        );
        assert_eq!(line.phase, Phase::Internal);
    }
}
