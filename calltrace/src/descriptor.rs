//! Static metadata about observed methods and logged types.
//!
//! [`TypeDescriptor`] and [`FieldDescriptor`] are `'static` items emitted by
//! `#[derive(Loggable)]`, one per type. [`MethodDescriptor`] is built by the
//! host for each method it instruments and is usually kept in a `static`
//! `LazyLock` or constructed once at startup.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Attribute declared on a type or field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
    /// Redaction marker: the value is replaced by the redaction token when
    /// masking is requested.
    Mask,
    /// Any other declared attribute. Never triggers redaction.
    Tag(&'static str),
}

impl Marker {
    /// Returns true for the redaction marker kind.
    pub fn is_mask(&self) -> bool {
        matches!(self, Self::Mask)
    }
}

/// Attribute declared on an observed method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodMarker {
    /// The method starts a correlation scope when none is active and ends it
    /// on exit.
    SeedCorrelation,
    /// Errors raised by the method are published to the error sink.
    EscalateErrors,
}

/// A declared field of a composite type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Name used as the key in the encoded object.
    pub name: &'static str,
    /// Markers declared on the field.
    pub markers: &'static [Marker],
}

impl FieldDescriptor {
    /// Creates a field descriptor.
    pub const fn new(name: &'static str, markers: &'static [Marker]) -> Self {
        Self { name, markers }
    }
}

/// Declared shape of a composite type, excluding its ancestors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeDescriptor {
    /// Type name.
    pub name: &'static str,
    /// Markers declared on the type.
    pub markers: &'static [Marker],
    /// Own fields in declaration order.
    pub fields: &'static [FieldDescriptor],
}

impl TypeDescriptor {
    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&'static FieldDescriptor> {
        self.fields.iter().find(|field| field.name == name)
    }
}

// =============================================================================
// Methods
// =============================================================================

/// A declared parameter of an observed method.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParamDescriptor {
    /// Parameter name, used as the key in error records.
    pub name: String,
    /// Declared type, used in the signature string.
    pub type_name: String,
}

/// Describes one observed method.
///
/// # Example
/// ```rust,ignore
/// use calltrace::{MethodDescriptor, MethodMarker};
///
/// let method = MethodDescriptor::new("shop::orders::OrderService", "create")
///     .with_param("customer", "CustomerDto")
///     .returning("Order")
///     .with_marker(MethodMarker::EscalateErrors);
///
/// assert_eq!(method.simple_type_name(), "OrderService");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodDescriptor {
    /// Fully-qualified path of the declaring type.
    pub declaring_type: String,
    /// Method name.
    pub name: String,
    /// Declared parameters in order.
    pub params: Vec<ParamDescriptor>,
    /// Declared return type.
    pub return_type: String,
    /// Method-level markers.
    pub markers: Vec<MethodMarker>,
}

impl MethodDescriptor {
    /// Creates a descriptor with no parameters, returning `()`.
    pub fn new(declaring_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            declaring_type: declaring_type.into(),
            name: name.into(),
            params: Vec::new(),
            return_type: "()".to_string(),
            markers: Vec::new(),
        }
    }

    /// Appends a parameter.
    pub fn with_param(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.params.push(ParamDescriptor {
            name: name.into(),
            type_name: type_name.into(),
        });
        self
    }

    /// Sets the return type.
    pub fn returning(mut self, type_name: impl Into<String>) -> Self {
        self.return_type = type_name.into();
        self
    }

    /// Adds a method marker.
    pub fn with_marker(mut self, marker: MethodMarker) -> Self {
        if !self.markers.contains(&marker) {
            self.markers.push(marker);
        }
        self
    }

    /// Shorthand for `with_marker(MethodMarker::SeedCorrelation)`.
    pub fn seeds_correlation(self) -> Self {
        self.with_marker(MethodMarker::SeedCorrelation)
    }

    /// Shorthand for `with_marker(MethodMarker::EscalateErrors)`.
    pub fn escalates_errors(self) -> Self {
        self.with_marker(MethodMarker::EscalateErrors)
    }

    /// Returns true if the method carries the correlation seeding marker.
    pub fn requests_correlation(&self) -> bool {
        self.markers.contains(&MethodMarker::SeedCorrelation)
    }

    /// Returns true if the method carries the error escalation marker.
    pub fn requests_escalation(&self) -> bool {
        self.markers.contains(&MethodMarker::EscalateErrors)
    }

    /// Last path segment of the declaring type.
    pub fn simple_type_name(&self) -> &str {
        simple_name(&self.declaring_type)
    }

    /// Parameter name for the argument at `index`.
    pub fn param_name(&self, index: usize) -> String {
        self.params
            .get(index)
            .map(|param| param.name.clone())
            .unwrap_or_else(|| format!("arg{index}"))
    }
}

/// Signature string: `{return} {declaring}::{name}({param types})`.
impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}::{}(",
            self.return_type, self.declaring_type, self.name
        )?;
        for (index, param) in self.params.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", param.type_name)?;
        }
        write!(f, ")")
    }
}

/// Strips everything up to the last `::` or `.` separator.
pub(crate) fn simple_name(path: &str) -> &str {
    let after_colons = path.rsplit("::").next().unwrap_or(path);
    after_colons.rsplit('.').next().unwrap_or(after_colons)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_string() {
        let method = MethodDescriptor::new("shop::orders::OrderService", "create")
            .with_param("customer", "CustomerDto")
            .with_param("quantity", "u32")
            .returning("Order");
        assert_eq!(
            method.to_string(),
            "Order shop::orders::OrderService::create(CustomerDto, u32)"
        );
    }

    #[test]
    fn test_simple_type_name() {
        assert_eq!(simple_name("shop::orders::OrderService"), "OrderService");
        assert_eq!(simple_name("br.com.shop.OrderService"), "OrderService");
        assert_eq!(simple_name("OrderService"), "OrderService");
    }

    #[test]
    fn test_markers_are_not_duplicated() {
        let method = MethodDescriptor::new("a::B", "c")
            .seeds_correlation()
            .seeds_correlation()
            .escalates_errors();
        assert_eq!(method.markers.len(), 2);
        assert!(method.requests_correlation());
        assert!(method.requests_escalation());
    }

    #[test]
    fn test_param_name_falls_back_to_index() {
        let method = MethodDescriptor::new("a::B", "c").with_param("first", "u8");
        assert_eq!(method.param_name(0), "first");
        assert_eq!(method.param_name(2), "arg2");
    }
}
