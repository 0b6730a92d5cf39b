//! Error types for the tracing core.
//!
//! Nothing in this module ever reaches the observed call. Every
//! [`TraceError`] is either written as a local error line by the
//! invocation logger, or logged from inside the detached escalation task.
//!
//! # Error Codes
//!
//! Each error maps to a [`TraceErrorCode`], rendered as
//! SCREAMING_SNAKE_CASE when serialized or displayed.

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use thiserror::Error;

use crate::config::ConfigValidationError;

/// Type-safe error codes for tracing failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum TraceErrorCode {
    /// A declared field could not be read during encoding
    FieldUnreadable,
    /// The value graph nested deeper than the configured limit
    DepthExceeded,
    /// JSON serialization failed
    SerializationError,
    /// A user `Loggable` implementation panicked
    Panicked,
    /// The external error sink rejected a record
    PublishFailed,
    /// Configuration did not pass validation
    InvalidConfig,
    /// No tokio runtime was reachable for a detached task
    NoRuntime,
}

impl TraceErrorCode {
    /// Returns the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FieldUnreadable => "FIELD_UNREADABLE",
            Self::DepthExceeded => "DEPTH_EXCEEDED",
            Self::SerializationError => "SERIALIZATION_ERROR",
            Self::Panicked => "PANICKED",
            Self::PublishFailed => "PUBLISH_FAILED",
            Self::InvalidConfig => "INVALID_CONFIG",
            Self::NoRuntime => "NO_RUNTIME",
        }
    }

    /// Returns true if the failure happened while encoding a value.
    pub fn is_encoding_error(&self) -> bool {
        matches!(
            self,
            Self::FieldUnreadable | Self::DepthExceeded | Self::SerializationError | Self::Panicked
        )
    }
}

impl fmt::Display for TraceErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors produced while logging or escalating an invocation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TraceError {
    /// A field listed in a type descriptor had no readable value.
    #[error("field `{field}` of `{type_name}` is not readable")]
    FieldUnreadable {
        /// Type whose descriptor listed the field
        type_name: &'static str,
        /// Declared field name
        field: &'static str,
    },

    /// Encoding recursed past `max_depth`.
    #[error("value nesting exceeds the maximum depth of {limit}")]
    DepthExceeded {
        /// Configured limit
        limit: usize,
    },

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A `Loggable` implementation panicked.
    #[error("panicked while encoding: {0}")]
    Panicked(String),

    /// The error sink could not accept a record.
    #[error("publish to `{destination}` failed: {reason}")]
    Publish {
        /// Queue or channel name
        destination: String,
        /// Transport-specific reason
        reason: String,
    },

    /// The configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigValidationError),

    /// No tokio runtime was available to run a detached task.
    #[error("no tokio runtime available")]
    NoRuntime,
}

impl TraceError {
    /// Returns the code for this error.
    pub fn code(&self) -> TraceErrorCode {
        match self {
            Self::FieldUnreadable { .. } => TraceErrorCode::FieldUnreadable,
            Self::DepthExceeded { .. } => TraceErrorCode::DepthExceeded,
            Self::Serialization(_) => TraceErrorCode::SerializationError,
            Self::Panicked(_) => TraceErrorCode::Panicked,
            Self::Publish { .. } => TraceErrorCode::PublishFailed,
            Self::Config(_) => TraceErrorCode::InvalidConfig,
            Self::NoRuntime => TraceErrorCode::NoRuntime,
        }
    }

    /// Create a publish error.
    pub fn publish(destination: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Publish {
            destination: destination.into(),
            reason: reason.into(),
        }
    }

    /// Build a [`TraceError::Panicked`] from a caught panic payload.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        Self::Panicked(panic_message(payload.as_ref()))
    }
}

/// Extracts the message of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Result type for tracing operations.
pub type TraceResult<T> = Result<T, TraceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_screaming_snake_case() {
        let json = serde_json::to_string(&TraceErrorCode::FieldUnreadable).unwrap();
        assert_eq!(json, "\"FIELD_UNREADABLE\"");
        assert_eq!(TraceErrorCode::DepthExceeded.to_string(), "DEPTH_EXCEEDED");
    }

    #[test]
    fn test_error_codes_match_variants() {
        let err = TraceError::FieldUnreadable {
            type_name: "CustomerDto",
            field: "creditCard",
        };
        assert_eq!(err.code(), TraceErrorCode::FieldUnreadable);
        assert!(err.code().is_encoding_error());
        assert_eq!(
            err.to_string(),
            "field `creditCard` of `CustomerDto` is not readable"
        );

        let err = TraceError::publish("errors", "channel closed");
        assert_eq!(err.code(), TraceErrorCode::PublishFailed);
        assert!(!err.code().is_encoding_error());
    }

    #[test]
    fn test_panic_payloads() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(TraceError::from_panic(payload).to_string(), "panicked while encoding: boom");

        let payload: Box<dyn Any + Send> = Box::new(String::from("owned boom"));
        assert_eq!(panic_message(payload.as_ref()), "owned boom");

        let payload: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic payload");
    }
}
