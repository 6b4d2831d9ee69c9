//! Field-tagging contract between host types and the validator
//!
//! A type opts into validation by describing its shape: a leaf value, an
//! optional slot, a list, or a record whose tagged fields are visited under
//! their tag. Records are usually described with [`impl_shape!`], which builds
//! the static `(tag, field)` table once per type instead of inspecting the
//! value at every call.
//!
//! ```
//! use sval::{impl_shape, Shape, Node};
//!
//! struct Order {
//!     id: String,
//!     quantity: i64,
//!     internal_note: String, // untagged: never visited
//! }
//!
//! impl_shape!(Order {
//!     id => "id",
//!     quantity => "qty",
//! });
//!
//! let order = Order { id: "A-1".into(), quantity: 2, internal_note: String::new() };
//! assert!(matches!(order.shape(), Node::Record(fields) if fields.len() == 2));
//! ```

use chrono::{DateTime, FixedOffset, Utc};
use serde_json::Value as JsonValue;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use crate::types::{json_number, HardwareAddr, Value};

// ============================================================================
// Node
// ============================================================================

/// One level of a value's shape
pub enum Node<'a> {
    /// Scalar handed to a rule
    Leaf(Value),
    /// Pointer-like slot; `None` is an absent value
    Optional(Option<&'a dyn Shape>),
    /// Record with tagged fields, visited in order
    Record(Vec<(&'a str, &'a dyn Shape)>),
    /// Document object; keys may be missing, and a registered key that is
    /// missing is checked as an absent value
    Object(Vec<(&'a str, &'a dyn Shape)>),
    /// Sequence; every element is visited under its index
    List(Vec<&'a dyn Shape>),
}

/// Describes how the validator should walk a value
pub trait Shape {
    /// Shape of this value at the current level
    fn shape(&self) -> Node<'_>;
}

/// Implement [`Shape`] for a struct by listing its tagged fields.
///
/// Each entry maps a struct field to the path segment used to address it in
/// rule paths. Fields that are not listed are never visited.
#[macro_export]
macro_rules! impl_shape {
    ($ty:ty { $($field:ident => $tag:expr),* $(,)? }) => {
        impl $crate::Shape for $ty {
            fn shape(&self) -> $crate::Node<'_> {
                $crate::Node::Record(vec![
                    $(($tag, &self.$field as &dyn $crate::Shape)),*
                ])
            }
        }
    };
}

// ============================================================================
// Scalars
// ============================================================================

macro_rules! leaf_shape {
    ($($t:ty),* $(,)?) => {
        $(
            impl Shape for $t {
                fn shape(&self) -> Node<'_> {
                    Node::Leaf(Value::from(self.clone()))
                }
            }
        )*
    };
}

leaf_shape!(
    bool,
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    u64,
    usize,
    f32,
    f64,
    String,
    IpAddr,
    Ipv4Addr,
    Ipv6Addr,
    HardwareAddr,
    DateTime<Utc>,
    DateTime<FixedOffset>,
    DateTime<chrono_tz::Tz>,
);

impl Shape for str {
    fn shape(&self) -> Node<'_> {
        Node::Leaf(Value::String(self.to_string()))
    }
}

// ============================================================================
// Wrappers and Collections
// ============================================================================

impl<T: Shape + ?Sized> Shape for &T {
    fn shape(&self) -> Node<'_> {
        (**self).shape()
    }
}

impl<T: Shape + ?Sized> Shape for Box<T> {
    fn shape(&self) -> Node<'_> {
        (**self).shape()
    }
}

impl<T: Shape> Shape for Option<T> {
    fn shape(&self) -> Node<'_> {
        Node::Optional(self.as_ref().map(|inner| inner as &dyn Shape))
    }
}

impl<T: Shape> Shape for Vec<T> {
    fn shape(&self) -> Node<'_> {
        self.as_slice().shape()
    }
}

impl<T: Shape> Shape for [T] {
    fn shape(&self) -> Node<'_> {
        Node::List(self.iter().map(|item| item as &dyn Shape).collect())
    }
}

impl<T: Shape, const N: usize> Shape for [T; N] {
    fn shape(&self) -> Node<'_> {
        self.as_slice().shape()
    }
}

// ============================================================================
// Dynamic Documents
// ============================================================================

impl Shape for Value {
    fn shape(&self) -> Node<'_> {
        match self {
            Value::Null => Node::Optional(None),
            Value::List(items) => Node::List(items.iter().map(|v| v as &dyn Shape).collect()),
            Value::Object(fields) => Node::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.as_str(), v as &dyn Shape))
                    .collect(),
            ),
            scalar => Node::Leaf(scalar.clone()),
        }
    }
}

impl Shape for JsonValue {
    fn shape(&self) -> Node<'_> {
        match self {
            JsonValue::Null => Node::Optional(None),
            JsonValue::Bool(b) => Node::Leaf(Value::Bool(*b)),
            JsonValue::Number(n) => Node::Leaf(json_number(n)),
            JsonValue::String(s) => Node::Leaf(Value::String(s.clone())),
            JsonValue::Array(items) => Node::List(items.iter().map(|v| v as &dyn Shape).collect()),
            JsonValue::Object(fields) => Node::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.as_str(), v as &dyn Shape))
                    .collect(),
            ),
        }
    }
}
