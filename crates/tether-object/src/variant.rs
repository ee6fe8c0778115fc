use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use tether_types::Node;

use crate::graph::Handle;

/// Scalar kinds a property can declare, also used as decoding hints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarType {
    Bool,
    Int,
    Double,
    String,
    Uri,
    DateTime,
    Date,
    Time,
    Duration,
    Bytes,
    /// Any value, carried through the opaque encoding when it has no
    /// canonical literal form.
    Any,
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A dynamically-typed property value.
///
/// `Object` holds an in-memory handle and never reaches the store directly;
/// the storer replaces it with the referenced object's node. `Reference`
/// holds a raw node for a reference that was not resolved into an object.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum Variant {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
    Uri(String),
    DateTime(DateTime<Utc>),
    Date(NaiveDate),
    Time(NaiveTime),
    Duration(Duration),
    Bytes(Vec<u8>),
    List(Vec<Variant>),
    Map(BTreeMap<String, Variant>),
    Object(Handle),
    Reference(Node),
}

impl Variant {
    pub fn is_null(&self) -> bool {
        matches!(self, Variant::Null)
    }

    /// Short name of the variant's kind, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Variant::Null => "null",
            Variant::Bool(_) => "bool",
            Variant::Int(_) => "int",
            Variant::Double(_) => "double",
            Variant::String(_) => "string",
            Variant::Uri(_) => "uri",
            Variant::DateTime(_) => "datetime",
            Variant::Date(_) => "date",
            Variant::Time(_) => "time",
            Variant::Duration(_) => "duration",
            Variant::Bytes(_) => "bytes",
            Variant::List(_) => "list",
            Variant::Map(_) => "map",
            Variant::Object(_) => "object",
            Variant::Reference(_) => "reference",
        }
    }

    /// The scalar kind of this value, if it is a scalar.
    pub fn scalar_type(&self) -> Option<ScalarType> {
        Some(match self {
            Variant::Bool(_) => ScalarType::Bool,
            Variant::Int(_) => ScalarType::Int,
            Variant::Double(_) => ScalarType::Double,
            Variant::String(_) => ScalarType::String,
            Variant::Uri(_) => ScalarType::Uri,
            Variant::DateTime(_) => ScalarType::DateTime,
            Variant::Date(_) => ScalarType::Date,
            Variant::Time(_) => ScalarType::Time,
            Variant::Duration(_) => ScalarType::Duration,
            Variant::Bytes(_) => ScalarType::Bytes,
            _ => return None,
        })
    }

    /// Whether a value of this variant may be stored in a property
    /// declared as `scalar`.
    pub fn fits_scalar(&self, scalar: ScalarType) -> bool {
        match (scalar, self) {
            (_, Variant::Null) | (ScalarType::Any, _) => true,
            (ScalarType::Double, Variant::Int(_)) => true,
            (expected, value) => value.scalar_type() == Some(expected),
        }
    }

    /// Whether this value, or anything nested in it, is an in-memory
    /// handle or raw reference.
    pub fn contains_references(&self) -> bool {
        match self {
            Variant::Object(_) | Variant::Reference(_) => true,
            Variant::List(items) => items.iter().any(Variant::contains_references),
            Variant::Map(entries) => entries.values().any(Variant::contains_references),
            _ => false,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Variant::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Variant::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Variant::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_uri(&self) -> Option<&str> {
        match self {
            Variant::Uri(u) => Some(u),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<Handle> {
        match self {
            Variant::Object(h) => Some(*h),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Variant]> {
        match self {
            Variant::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<bool> for Variant {
    fn from(v: bool) -> Self {
        Variant::Bool(v)
    }
}

impl From<i64> for Variant {
    fn from(v: i64) -> Self {
        Variant::Int(v)
    }
}

impl From<i32> for Variant {
    fn from(v: i32) -> Self {
        Variant::Int(i64::from(v))
    }
}

impl From<f64> for Variant {
    fn from(v: f64) -> Self {
        Variant::Double(v)
    }
}

impl From<&str> for Variant {
    fn from(v: &str) -> Self {
        Variant::String(v.to_string())
    }
}

impl From<String> for Variant {
    fn from(v: String) -> Self {
        Variant::String(v)
    }
}

impl From<Handle> for Variant {
    fn from(v: Handle) -> Self {
        Variant::Object(v)
    }
}

impl From<Duration> for Variant {
    fn from(v: Duration) -> Self {
        Variant::Duration(v)
    }
}

impl From<DateTime<Utc>> for Variant {
    fn from(v: DateTime<Utc>) -> Self {
        Variant::DateTime(v)
    }
}

impl<T: Into<Variant>> From<Vec<T>> for Variant {
    fn from(v: Vec<T>) -> Self {
        Variant::List(v.into_iter().map(Into::into).collect())
    }
}
