//! Runtime introspection of logged values.
//!
//! Every value that reaches the encoder implements [`Loggable`], which
//! reports the value's [`Shape`]: a scalar, an optional, a collection, a map,
//! a wrapped transport result, or a [`Composite`] with named fields and an
//! optional ancestor. The encoder only ever sees values through this trait.
//!
//! Implementations for standard library types, `chrono` date/time types,
//! `uuid::Uuid` and `serde_json::Value` live in the `impls` module. Domain
//! types use `#[derive(Loggable)]`.
//!
//! # Example
//! ```rust,ignore
//! use calltrace::{classify, Loggable, ValueKind};
//!
//! assert_eq!(classify(&42_u32), ValueKind::Simple);
//! assert_eq!(classify(&Some("x")), ValueKind::OptionalLike);
//! assert_eq!(classify(&vec![1, 2]), ValueKind::CollectionLike);
//! ```

mod impls;

pub use impls::{Bytes, Envelope};

use serde::Serialize;
use std::fmt;

use crate::descriptor::{Marker, TypeDescriptor};

/// A value that can be encoded into a log-safe structure.
pub trait Loggable {
    /// Reports the value's shape.
    fn shape(&self) -> Shape<'_>;

    /// Markers declared on the value's type.
    fn markers(&self) -> &'static [Marker] {
        &[]
    }

    /// Role of the value when it appears as a method argument.
    fn role(&self) -> ValueRole {
        ValueRole::Data
    }
}

/// A value with named fields and an optional ancestor.
///
/// The fields of `descriptor()` are the type's own fields. Fields inherited
/// from an embedded base value are reached through `parent()`.
pub trait Composite {
    /// Declared fields and markers of the type.
    fn descriptor(&self) -> &'static TypeDescriptor;

    /// Reads a declared field. `None` means the field cannot be read.
    fn field(&self, name: &str) -> Option<&dyn Loggable>;

    /// The embedded ancestor, if the type has one.
    fn parent(&self) -> Option<&dyn Composite> {
        None
    }
}

/// Role of an argument in a method call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ValueRole {
    /// Ordinary data, logged on entry and recorded on error.
    #[default]
    Data,
    /// An error value passed as an argument. Never logged.
    Error,
    /// A validation result holder passed as an argument. Never logged.
    ValidationContext,
}

impl ValueRole {
    /// Returns true if arguments with this role are logged.
    pub fn is_logged(&self) -> bool {
        matches!(self, Self::Data)
    }
}

/// Closed classification of a value's shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Scalar leaf (numbers, text, booleans, dates, enums, bytes, null).
    Simple,
    /// Possibly-empty single value.
    OptionalLike,
    /// Ordered sequence.
    CollectionLike,
    /// Key/value mapping.
    MapLike,
    /// Transport envelope around a payload.
    WrappedResult,
    /// Value with named fields.
    Composite,
}

/// Shape of one value, borrowing from it.
pub enum Shape<'a> {
    /// Scalar leaf.
    Simple(Scalar),
    /// Optional value; `None` encodes as null.
    Optional(Option<&'a dyn Loggable>),
    /// Items in source order.
    Collection(Vec<&'a dyn Loggable>),
    /// Entries keyed by the key's string form.
    Map(Vec<(String, &'a dyn Loggable)>),
    /// Payload of a transport envelope.
    Wrapped(&'a dyn Loggable),
    /// Value with named fields.
    Composite(&'a dyn Composite),
}

impl Shape<'_> {
    /// Returns the classification of this shape.
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Simple(_) => ValueKind::Simple,
            Self::Optional(_) => ValueKind::OptionalLike,
            Self::Collection(_) => ValueKind::CollectionLike,
            Self::Map(_) => ValueKind::MapLike,
            Self::Wrapped(_) => ValueKind::WrappedResult,
            Self::Composite(_) => ValueKind::Composite,
        }
    }
}

impl fmt::Debug for Shape<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple(scalar) => f.debug_tuple("Simple").field(scalar).finish(),
            Self::Optional(value) => write!(f, "Optional(present: {})", value.is_some()),
            Self::Collection(items) => write!(f, "Collection(len: {})", items.len()),
            Self::Map(entries) => write!(f, "Map(len: {})", entries.len()),
            Self::Wrapped(_) => write!(f, "Wrapped"),
            Self::Composite(composite) => {
                write!(f, "Composite({})", composite.descriptor().name)
            }
        }
    }
}

/// Classifies a value. Null scalars classify as [`ValueKind::Simple`].
pub fn classify(value: &dyn Loggable) -> ValueKind {
    value.shape().kind()
}

/// Owned scalar leaf.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    /// Absent value.
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Unsigned integer.
    UInt(u64),
    /// Floating point number.
    Float(f64),
    /// Text, including dates, enum variants and identifiers.
    Text(String),
    /// Raw bytes, rendered as an array of numbers.
    Bytes(Vec<u8>),
}

impl Scalar {
    /// Returns true for [`Scalar::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Creates a text scalar.
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }
}
