//! Configuration for the tracing core.
//!
//! [`TraceConfig`] groups everything the interceptor needs:
//! - application name and correlation key
//! - encoder limits (`extension_level`, `max_depth`)
//! - [`RedactionConfig`]: replacement token and sensitive field names
//! - [`ExclusionRules`]: package fragments and method names never logged
//! - [`EscalationConfig`]: whether and where error records are published
//!
//! All types deserialize with defaults for missing keys, so a partial JSON
//! document is a valid configuration.
//!
//! # Example
//! ```rust,ignore
//! use calltrace::TraceConfig;
//!
//! let config = TraceConfig::new()
//!     .with_application_name("orders")
//!     .with_extension_level(1)
//!     .with_escalation(true);
//! config.validate()?;
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::constants::{
    DEFAULT_APPLICATION_NAME, DEFAULT_CORRELATION_KEY, DEFAULT_ERROR_DESTINATION,
    DEFAULT_MAX_DEPTH, DEFAULT_MAX_IN_FLIGHT, DEFAULT_REDACTION_TOKEN,
};
use crate::error::TraceResult;

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    /// correlation_key must not be empty
    EmptyCorrelationKey,
    /// redaction.token must not be empty
    EmptyRedactionToken,
    /// max_depth must be greater than 0
    InvalidMaxDepth,
    /// escalation.max_in_flight must be greater than 0
    InvalidMaxInFlight,
    /// escalation.destination must not be empty while escalation is enabled
    EmptyDestination,
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyCorrelationKey => write!(f, "correlation_key must not be empty"),
            Self::EmptyRedactionToken => write!(f, "redaction.token must not be empty"),
            Self::InvalidMaxDepth => write!(f, "max_depth must be greater than 0"),
            Self::InvalidMaxInFlight => {
                write!(f, "escalation.max_in_flight must be greater than 0")
            }
            Self::EmptyDestination => write!(
                f,
                "escalation.destination must not be empty while escalation is enabled"
            ),
        }
    }
}

impl std::error::Error for ConfigValidationError {}

// =============================================================================
// Redaction
// =============================================================================

/// Redaction settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedactionConfig {
    /// Text rendered in place of a redacted value.
    pub token: String,
    /// Field names treated as if they carried the redaction marker.
    ///
    /// Matching is case-insensitive and uses substring matching. Empty by
    /// default: only declared markers trigger redaction.
    pub sensitive_fields: HashSet<String>,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            token: DEFAULT_REDACTION_TOKEN.to_string(),
            sensitive_fields: HashSet::new(),
        }
    }
}

// =============================================================================
// Exclusions
// =============================================================================

/// Methods that are never logged.
///
/// A method is excluded when its declaring type path contains any of
/// `packages`, or when its name equals any of `methods`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExclusionRules {
    /// Fragments matched against the fully-qualified declaring type.
    pub packages: Vec<String>,
    /// Exact method names.
    pub methods: Vec<String>,
}

impl ExclusionRules {
    /// Creates an empty rule set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a package fragment.
    pub fn exclude_package(mut self, fragment: impl Into<String>) -> Self {
        self.packages.push(fragment.into());
        self
    }

    /// Adds an exact method name.
    pub fn exclude_method(mut self, name: impl Into<String>) -> Self {
        self.methods.push(name.into());
        self
    }

    /// Returns true if no rule is configured.
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty() && self.methods.is_empty()
    }
}

// =============================================================================
// Escalation
// =============================================================================

/// Error escalation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EscalationConfig {
    /// Whether error records are published at all.
    pub enabled: bool,
    /// Queue or channel name handed to the error sink.
    pub destination: String,
    /// Maximum number of concurrently running publish tasks.
    pub max_in_flight: usize,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            destination: DEFAULT_ERROR_DESTINATION.to_string(),
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }
}

// =============================================================================
// TraceConfig
// =============================================================================

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    /// Name stamped on every error record.
    pub application_name: String,
    /// Key under which sinks publish the correlation id.
    pub correlation_key: String,
    /// Number of ancestor levels whose fields are included when encoding a
    /// composite. 0 means the value's own fields only.
    pub extension_level: usize,
    /// Maximum nesting depth followed by the encoder.
    pub max_depth: usize,
    /// Redaction settings.
    pub redaction: RedactionConfig,
    /// Methods that are never logged.
    pub exclusions: ExclusionRules,
    /// Error escalation settings.
    pub escalation: EscalationConfig,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            application_name: DEFAULT_APPLICATION_NAME.to_string(),
            correlation_key: DEFAULT_CORRELATION_KEY.to_string(),
            extension_level: 0,
            max_depth: DEFAULT_MAX_DEPTH,
            redaction: RedactionConfig::default(),
            exclusions: ExclusionRules::default(),
            escalation: EscalationConfig::default(),
        }
    }
}

impl TraceConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON document and validates the result.
    pub fn from_json_str(json: &str) -> TraceResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.correlation_key.is_empty() {
            return Err(ConfigValidationError::EmptyCorrelationKey);
        }
        if self.redaction.token.is_empty() {
            return Err(ConfigValidationError::EmptyRedactionToken);
        }
        if self.max_depth == 0 {
            return Err(ConfigValidationError::InvalidMaxDepth);
        }
        if self.escalation.max_in_flight == 0 {
            return Err(ConfigValidationError::InvalidMaxInFlight);
        }
        if self.escalation.enabled && self.escalation.destination.is_empty() {
            return Err(ConfigValidationError::EmptyDestination);
        }
        Ok(())
    }

    /// Set the application name.
    pub fn with_application_name(mut self, name: impl Into<String>) -> Self {
        self.application_name = name.into();
        self
    }

    /// Set the correlation key.
    pub fn with_correlation_key(mut self, key: impl Into<String>) -> Self {
        self.correlation_key = key.into();
        self
    }

    /// Set how many ancestor levels are expanded.
    pub fn with_extension_level(mut self, level: usize) -> Self {
        self.extension_level = level;
        self
    }

    /// Set the maximum encoding depth.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set the redaction token.
    pub fn with_redaction_token(mut self, token: impl Into<String>) -> Self {
        self.redaction.token = token.into();
        self
    }

    /// Adds a sensitive field name (case-insensitive substring match).
    pub fn redact_field(mut self, field: impl Into<String>) -> Self {
        self.redaction.sensitive_fields.insert(field.into());
        self
    }

    /// Replace the exclusion rules.
    pub fn with_exclusions(mut self, exclusions: ExclusionRules) -> Self {
        self.exclusions = exclusions;
        self
    }

    /// Enable or disable error escalation.
    pub fn with_escalation(mut self, enabled: bool) -> Self {
        self.escalation.enabled = enabled;
        self
    }

    /// Set the escalation destination.
    pub fn with_error_destination(mut self, destination: impl Into<String>) -> Self {
        self.escalation.destination = destination.into();
        self
    }

    /// Set the maximum number of in-flight escalation tasks.
    pub fn with_max_in_flight(mut self, max: usize) -> Self {
        self.escalation.max_in_flight = max;
        self
    }
}
