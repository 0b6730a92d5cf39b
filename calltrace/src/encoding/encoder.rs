use std::collections::BTreeMap;

use crate::config::TraceConfig;
use crate::error::{TraceError, TraceResult};
use crate::inspect::{Composite, Loggable, Scalar, Shape};
use crate::redaction::RedactionPolicy;

use super::StructuredNode;

/// Converts [`Loggable`] values into [`StructuredNode`] trees.
///
/// Rules, in order:
/// 1. null scalars and empty optionals become `Null`;
/// 2. scalars become `Redacted` when masking is requested and the value's
///    type carries the redaction marker;
/// 3. optionals, collections and wrapped results recurse with the same
///    masking flag; map values recurse with masking disabled;
/// 4. composites expand their own fields plus up to `extension_level`
///    ancestors, checking each field's markers before reading it.
#[derive(Debug, Clone)]
pub struct Encoder {
    policy: RedactionPolicy,
    extension_level: usize,
    max_depth: usize,
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new(&TraceConfig::default())
    }
}

impl Encoder {
    /// Creates an encoder from configuration.
    pub fn new(config: &TraceConfig) -> Self {
        Self {
            policy: RedactionPolicy::new(&config.redaction),
            extension_level: config.extension_level,
            max_depth: config.max_depth,
        }
    }

    /// The redaction policy in use.
    pub fn policy(&self) -> &RedactionPolicy {
        &self.policy
    }

    /// Encodes one value.
    pub fn encode(&self, value: &dyn Loggable, masking: bool) -> TraceResult<StructuredNode> {
        self.encode_at(value, masking, 0)
    }

    fn encode_at(
        &self,
        value: &dyn Loggable,
        masking: bool,
        depth: usize,
    ) -> TraceResult<StructuredNode> {
        if depth > self.max_depth {
            return Err(TraceError::DepthExceeded {
                limit: self.max_depth,
            });
        }

        match value.shape() {
            Shape::Simple(Scalar::Null) | Shape::Optional(None) => Ok(StructuredNode::Null),
            Shape::Simple(scalar) => {
                if self.policy.should_mask_value(value.markers(), masking) {
                    Ok(StructuredNode::Redacted)
                } else {
                    Ok(StructuredNode::Scalar(scalar))
                }
            }
            Shape::Optional(Some(inner)) | Shape::Wrapped(inner) => {
                self.encode_at(inner, masking, depth + 1)
            }
            Shape::Collection(items) => items
                .into_iter()
                .map(|item| self.encode_at(item, masking, depth + 1))
                .collect::<TraceResult<Vec<_>>>()
                .map(StructuredNode::Array),
            // Map values are never redacted.
            Shape::Map(entries) => entries
                .into_iter()
                .map(|(key, entry)| {
                    self.encode_at(entry, false, depth + 1)
                        .map(|node| (key, node))
                })
                .collect::<TraceResult<BTreeMap<_, _>>>()
                .map(StructuredNode::Object),
            Shape::Composite(composite) => self.expand(composite, masking, depth),
        }
    }

    fn expand<'a>(
        &self,
        composite: &'a dyn Composite,
        masking: bool,
        depth: usize,
    ) -> TraceResult<StructuredNode> {
        let mut members = BTreeMap::new();
        let mut level: Option<&'a dyn Composite> = Some(composite);
        let mut remaining = self.extension_level.saturating_add(1);

        while let Some(current) = level {
            if remaining == 0 {
                break;
            }
            remaining -= 1;

            let descriptor = current.descriptor();
            for field in descriptor.fields {
                let node = if self.policy.should_mask_field(field, masking) {
                    StructuredNode::Redacted
                } else {
                    let value = current
                        .field(field.name)
                        .ok_or(TraceError::FieldUnreadable {
                            type_name: descriptor.name,
                            field: field.name,
                        })?;
                    self.encode_at(value, masking, depth + 1)?
                };
                // Ancestor fields overwrite same-named own fields.
                members.insert(field.name.to_string(), node);
            }

            level = current.parent();
        }

        Ok(StructuredNode::Object(members))
    }
}
