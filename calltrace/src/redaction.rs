//! Redaction policy.
//!
//! A value is redacted only when masking is requested for the current
//! encoding pass AND the value (or the field holding it) is marked. Entry
//! and success logging request masking; error records do not.
//!
//! Besides declared markers, [`RedactionPolicy`] can treat configured field
//! names as sensitive. Names are lowercased once at construction and matched
//! as case-insensitive substrings.

use std::collections::HashSet;

use crate::config::RedactionConfig;
use crate::descriptor::{FieldDescriptor, Marker};

/// Returns true if masking is requested and any marker is the redaction kind.
pub fn should_mask(markers: &[Marker], masking_requested: bool) -> bool {
    masking_requested && markers.iter().any(Marker::is_mask)
}

/// Redaction decisions for one configuration.
#[derive(Debug, Clone)]
pub struct RedactionPolicy {
    /// Pre-computed lowercase field names
    sensitive_fields_lower: HashSet<String>,
    token: String,
}

impl Default for RedactionPolicy {
    fn default() -> Self {
        Self::new(&RedactionConfig::default())
    }
}

impl RedactionPolicy {
    /// Creates a policy from configuration.
    pub fn new(config: &RedactionConfig) -> Self {
        Self {
            sensitive_fields_lower: config
                .sensitive_fields
                .iter()
                .map(|s| s.to_lowercase())
                .collect(),
            token: config.token.clone(),
        }
    }

    /// Replacement text for redacted values.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Decision for a scalar value carrying `markers`.
    pub fn should_mask_value(&self, markers: &[Marker], masking_requested: bool) -> bool {
        should_mask(markers, masking_requested)
    }

    /// Decision for a composite field, by marker or by sensitive name.
    pub fn should_mask_field(&self, field: &FieldDescriptor, masking_requested: bool) -> bool {
        masking_requested
            && (should_mask(field.markers, true) || self.is_sensitive_name(field.name))
    }

    /// Returns true if `name` contains any configured sensitive name.
    pub fn is_sensitive_name(&self, name: &str) -> bool {
        if self.sensitive_fields_lower.is_empty() {
            return false;
        }
        let name_lower = name.to_lowercase();
        self.sensitive_fields_lower
            .iter()
            .any(|field| name_lower.contains(field.as_str()))
    }
}
