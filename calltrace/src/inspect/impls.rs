//! `Loggable` implementations for foreign types.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt::Display;
use std::hash::BuildHasher;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use super::{Loggable, Scalar, Shape, ValueRole};
use crate::descriptor::Marker;

// =============================================================================
// Scalars
// =============================================================================

macro_rules! signed_scalar {
    ($($ty:ty),*) => {
        $(
            impl Loggable for $ty {
                fn shape(&self) -> Shape<'_> {
                    Shape::Simple(Scalar::Int(i64::from(*self)))
                }
            }
        )*
    };
}

macro_rules! unsigned_scalar {
    ($($ty:ty),*) => {
        $(
            impl Loggable for $ty {
                fn shape(&self) -> Shape<'_> {
                    Shape::Simple(Scalar::UInt(u64::from(*self)))
                }
            }
        )*
    };
}

macro_rules! text_scalar {
    ($($ty:ty),*) => {
        $(
            impl Loggable for $ty {
                fn shape(&self) -> Shape<'_> {
                    Shape::Simple(Scalar::Text(self.to_string()))
                }
            }
        )*
    };
}

signed_scalar!(i8, i16, i32, i64);
unsigned_scalar!(u8, u16, u32, u64);
text_scalar!(
    char,
    str,
    String,
    uuid::Uuid,
    chrono::NaiveDate,
    chrono::NaiveTime
);

impl Loggable for isize {
    fn shape(&self) -> Shape<'_> {
        Shape::Simple(i64::try_from(*self).map_or_else(|_| Scalar::Text(self.to_string()), Scalar::Int))
    }
}

impl Loggable for usize {
    fn shape(&self) -> Shape<'_> {
        Shape::Simple(u64::try_from(*self).map_or_else(|_| Scalar::Text(self.to_string()), Scalar::UInt))
    }
}

impl Loggable for i128 {
    fn shape(&self) -> Shape<'_> {
        Shape::Simple(i64::try_from(*self).map_or_else(|_| Scalar::Text(self.to_string()), Scalar::Int))
    }
}

impl Loggable for u128 {
    fn shape(&self) -> Shape<'_> {
        Shape::Simple(u64::try_from(*self).map_or_else(|_| Scalar::Text(self.to_string()), Scalar::UInt))
    }
}

impl Loggable for f32 {
    fn shape(&self) -> Shape<'_> {
        Shape::Simple(Scalar::Float(f64::from(*self)))
    }
}

impl Loggable for f64 {
    fn shape(&self) -> Shape<'_> {
        Shape::Simple(Scalar::Float(*self))
    }
}

impl Loggable for bool {
    fn shape(&self) -> Shape<'_> {
        Shape::Simple(Scalar::Bool(*self))
    }
}

impl Loggable for () {
    fn shape(&self) -> Shape<'_> {
        Shape::Simple(Scalar::Null)
    }
}

impl Loggable for Cow<'_, str> {
    fn shape(&self) -> Shape<'_> {
        Shape::Simple(Scalar::Text(self.to_string()))
    }
}

impl Loggable for Duration {
    fn shape(&self) -> Shape<'_> {
        Shape::Simple(Scalar::Text(format!("{self:?}")))
    }
}

impl Loggable for chrono::NaiveDateTime {
    fn shape(&self) -> Shape<'_> {
        Shape::Simple(Scalar::Text(self.format("%Y-%m-%dT%H:%M:%S%.f").to_string()))
    }
}

impl<Tz> Loggable for chrono::DateTime<Tz>
where
    Tz: chrono::TimeZone,
    Tz::Offset: Display,
{
    fn shape(&self) -> Shape<'_> {
        Shape::Simple(Scalar::Text(self.to_rfc3339()))
    }
}

impl Loggable for serde_json::Value {
    fn shape(&self) -> Shape<'_> {
        use serde_json::Value;
        match self {
            Value::Null => Shape::Simple(Scalar::Null),
            Value::Bool(b) => Shape::Simple(Scalar::Bool(*b)),
            Value::Number(n) => Shape::Simple(if let Some(i) = n.as_i64() {
                Scalar::Int(i)
            } else if let Some(u) = n.as_u64() {
                Scalar::UInt(u)
            } else {
                n.as_f64().map_or(Scalar::Null, Scalar::Float)
            }),
            Value::String(s) => Shape::Simple(Scalar::Text(s.clone())),
            Value::Array(items) => {
                Shape::Collection(items.iter().map(|item| item as &dyn Loggable).collect())
            }
            Value::Object(map) => Shape::Map(
                map.iter()
                    .map(|(key, value)| (key.clone(), value as &dyn Loggable))
                    .collect(),
            ),
        }
    }
}

/// Raw bytes, encoded as an array of numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bytes(pub Vec<u8>);

impl From<Vec<u8>> for Bytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl Loggable for Bytes {
    fn shape(&self) -> Shape<'_> {
        Shape::Simple(Scalar::Bytes(self.0.clone()))
    }
}

// =============================================================================
// Transparent wrappers
// =============================================================================

macro_rules! transparent {
    ($($wrapper:ident),*) => {
        $(
            impl<T: Loggable + ?Sized> Loggable for $wrapper<T> {
                fn shape(&self) -> Shape<'_> {
                    (**self).shape()
                }

                fn markers(&self) -> &'static [Marker] {
                    (**self).markers()
                }

                fn role(&self) -> ValueRole {
                    (**self).role()
                }
            }
        )*
    };
}

transparent!(Box, Arc, Rc);

impl<T: Loggable + ?Sized> Loggable for &T {
    fn shape(&self) -> Shape<'_> {
        (**self).shape()
    }

    fn markers(&self) -> &'static [Marker] {
        (**self).markers()
    }

    fn role(&self) -> ValueRole {
        (**self).role()
    }
}

// =============================================================================
// Optionals and collections
// =============================================================================

impl<T: Loggable> Loggable for Option<T> {
    fn shape(&self) -> Shape<'_> {
        Shape::Optional(self.as_ref().map(|value| value as &dyn Loggable))
    }
}

fn items<'a, T: Loggable + 'a>(iter: impl Iterator<Item = &'a T>) -> Shape<'a> {
    Shape::Collection(iter.map(|item| item as &dyn Loggable).collect())
}

impl<T: Loggable> Loggable for [T] {
    fn shape(&self) -> Shape<'_> {
        items(self.iter())
    }
}

impl<T: Loggable, const N: usize> Loggable for [T; N] {
    fn shape(&self) -> Shape<'_> {
        items(self.iter())
    }
}

impl<T: Loggable> Loggable for Vec<T> {
    fn shape(&self) -> Shape<'_> {
        items(self.iter())
    }
}

impl<T: Loggable> Loggable for VecDeque<T> {
    fn shape(&self) -> Shape<'_> {
        items(self.iter())
    }
}

impl<T: Loggable> Loggable for BTreeSet<T> {
    fn shape(&self) -> Shape<'_> {
        items(self.iter())
    }
}

impl<T: Loggable, S: BuildHasher> Loggable for HashSet<T, S> {
    fn shape(&self) -> Shape<'_> {
        items(self.iter())
    }
}

// =============================================================================
// Maps
// =============================================================================

fn entries<'a, K, V>(iter: impl Iterator<Item = (&'a K, &'a V)>) -> Shape<'a>
where
    K: Display + 'a,
    V: Loggable + 'a,
{
    Shape::Map(
        iter.map(|(key, value)| (key.to_string(), value as &dyn Loggable))
            .collect(),
    )
}

impl<K: Display, V: Loggable> Loggable for BTreeMap<K, V> {
    fn shape(&self) -> Shape<'_> {
        entries(self.iter())
    }
}

impl<K: Display, V: Loggable, S: BuildHasher> Loggable for HashMap<K, V, S> {
    fn shape(&self) -> Shape<'_> {
        entries(self.iter())
    }
}

// =============================================================================
// Envelope
// =============================================================================

/// Transport envelope around a result payload.
///
/// Only the body is logged; status and headers are transport details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// Transport status code.
    pub status: u16,
    /// Transport headers.
    pub headers: Vec<(String, String)>,
    /// Result payload.
    pub body: T,
}

impl<T> Envelope<T> {
    /// Creates an envelope with status 200 and no headers.
    pub fn ok(body: T) -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body,
        }
    }

    /// Sets the status code.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Appends a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

impl<T: Loggable> Loggable for Envelope<T> {
    fn shape(&self) -> Shape<'_> {
        Shape::Wrapped(&self.body)
    }
}
