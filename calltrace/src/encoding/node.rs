//! The encoded form of a logged value.

use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::constants::DEFAULT_REDACTION_TOKEN;
use crate::inspect::Scalar;

/// Log-safe tree produced by the encoder.
///
/// Owned and acyclic. `Redacted` stands for a value that was withheld; it
/// renders as the redaction token.
#[derive(Debug, Clone, PartialEq)]
pub enum StructuredNode {
    /// Absent value.
    Null,
    /// Withheld value.
    Redacted,
    /// Scalar leaf.
    Scalar(Scalar),
    /// Ordered items.
    Array(Vec<StructuredNode>),
    /// Named members, sorted by key.
    Object(BTreeMap<String, StructuredNode>),
}

impl StructuredNode {
    /// Returns true if this node or any descendant is [`StructuredNode::Redacted`].
    pub fn contains_redacted(&self) -> bool {
        match self {
            Self::Redacted => true,
            Self::Null | Self::Scalar(_) => false,
            Self::Array(items) => items.iter().any(Self::contains_redacted),
            Self::Object(members) => members.values().any(Self::contains_redacted),
        }
    }

    /// Looks up an object member.
    pub fn get(&self, key: &str) -> Option<&StructuredNode> {
        match self {
            Self::Object(members) => members.get(key),
            _ => None,
        }
    }

    /// Renders the tree as JSON with the default redaction token.
    pub fn to_json(&self) -> Value {
        self.to_json_with(DEFAULT_REDACTION_TOKEN)
    }

    /// Renders the tree as JSON, replacing redacted values with `token`.
    pub fn to_json_with(&self, token: &str) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Redacted => Value::String(token.to_string()),
            Self::Scalar(scalar) => scalar_to_json(scalar),
            Self::Array(items) => {
                Value::Array(items.iter().map(|item| item.to_json_with(token)).collect())
            }
            Self::Object(members) => Value::Object(
                members
                    .iter()
                    .map(|(key, member)| (key.clone(), member.to_json_with(token)))
                    .collect(),
            ),
        }
    }
}

impl From<Scalar> for StructuredNode {
    fn from(scalar: Scalar) -> Self {
        if scalar.is_null() {
            Self::Null
        } else {
            Self::Scalar(scalar)
        }
    }
}

// Non-finite floats become null, as in serde_json.
fn scalar_to_json(scalar: &Scalar) -> Value {
    match scalar {
        Scalar::Null => Value::Null,
        Scalar::Bool(b) => Value::Bool(*b),
        Scalar::Int(i) => Value::from(*i),
        Scalar::UInt(u) => Value::from(*u),
        Scalar::Float(f) => Value::from(*f),
        Scalar::Text(s) => Value::String(s.clone()),
        Scalar::Bytes(bytes) => Value::Array(bytes.iter().map(|b| Value::from(*b)).collect()),
    }
}

/// Serializes like [`StructuredNode::to_json`]: redacted values become
/// [`DEFAULT_REDACTION_TOKEN`]. Use [`StructuredNode::to_json_with`] to honor
/// a configured token.
impl Serialize for StructuredNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Redacted => serializer.serialize_str(DEFAULT_REDACTION_TOKEN),
            Self::Scalar(scalar) => scalar.serialize(serializer),
            Self::Array(items) => items.serialize(serializer),
            Self::Object(members) => members.serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> StructuredNode {
        StructuredNode::Object(BTreeMap::from([
            ("amount".to_string(), StructuredNode::Scalar(Scalar::Float(10.5))),
            ("creditCard".to_string(), StructuredNode::Redacted),
            (
                "tags".to_string(),
                StructuredNode::Array(vec![StructuredNode::Null, Scalar::text("vip").into()]),
            ),
        ]))
    }

    #[test]
    fn test_redacted_renders_as_token() {
        let node = sample();
        assert_eq!(
            node.to_json(),
            json!({"amount": 10.5, "creditCard": "***", "tags": [null, "vip"]})
        );
        assert_eq!(node.to_json_with("[REDACTED]")["creditCard"], json!("[REDACTED]"));
    }

    #[test]
    fn test_serialize_matches_to_json() {
        let node = sample();
        assert_eq!(serde_json::to_value(&node).unwrap(), node.to_json());
    }

    #[test]
    fn test_serialize_uses_default_token() {
        let node = sample();
        let serialized = serde_json::to_value(&node).unwrap();
        assert_eq!(serialized["creditCard"], json!(DEFAULT_REDACTION_TOKEN));
        assert_ne!(serialized, node.to_json_with("[REDACTED]"));
    }

    #[test]
    fn test_contains_redacted() {
        assert!(sample().contains_redacted());
        assert!(!StructuredNode::Array(vec![StructuredNode::Null]).contains_redacted());
    }

    #[test]
    fn test_bytes_render_as_numbers() {
        let node = StructuredNode::Scalar(Scalar::Bytes(vec![0, 255]));
        assert_eq!(node.to_json(), json!([0, 255]));
    }

    #[test]
    fn test_non_finite_float_is_null() {
        let node = StructuredNode::Scalar(Scalar::Float(f64::NAN));
        assert_eq!(node.to_json(), Value::Null);
    }
}
