use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::correlation::CorrelationId;
use crate::encoding::StructuredNode;

/// Snapshot of a failed call, published to the error sink.
///
/// Serialized with camelCase keys. `params` holds the unmasked arguments
/// keyed by parameter name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorRecord {
    /// Configured application name.
    pub application_name: String,
    /// `Display` text of the error.
    pub message: String,
    /// Correlation id active when the error was observed.
    pub correlation_id: Option<CorrelationId>,
    /// Local date and time the record was built.
    pub date_time: NaiveDateTime,
    /// Location of the failing call, `file:line:column`.
    pub stacktrace: String,
    /// Signature string of the failing method.
    pub method: String,
    /// Unmasked arguments by parameter name.
    pub params: BTreeMap<String, StructuredNode>,
}

impl ErrorRecord {
    /// Serializes the record to a JSON string.
    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
