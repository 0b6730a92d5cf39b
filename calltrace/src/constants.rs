//! Default values shared by the configuration and the runtime components.

/// Key under which the correlation id is published to log sinks.
pub const DEFAULT_CORRELATION_KEY: &str = "correlation_id";

/// Replacement text rendered in place of a redacted value.
pub const DEFAULT_REDACTION_TOKEN: &str = "***";

/// Application name stamped on error records when none is configured.
pub const DEFAULT_APPLICATION_NAME: &str = "application";

/// Destination (queue or channel name) for escalated error records.
pub const DEFAULT_ERROR_DESTINATION: &str = "errors";

/// Maximum number of escalation tasks allowed to run at once.
///
/// Records arriving while every permit is taken are dropped.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 64;

/// Maximum nesting depth the encoder follows before giving up.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Message written when logging itself fails.
pub const INTERNAL_ERROR_PREFIX: &str = "Error during intercept logger";

/// Message written by the escalation task after a successful publish.
pub const PUBLISH_SUCCESS_MESSAGE: &str = "Message process with success";
