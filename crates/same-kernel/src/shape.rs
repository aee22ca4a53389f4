//! Shapes and the shape-compatibility relation.
//!
//! A shape is the coarse runtime category of a value. It is computed fresh
//! for every comparison and decides whether a deeper, value-level
//! comparison may proceed at all:
//!
//! - identical shapes are compatible
//! - fixed and growable sequences are compatible with each other
//! - all integers are compatible, whatever their width or signedness
//! - all floats are compatible, whatever their width
//!
//! Everything else is incompatible. Compatibility is necessary but not
//! sufficient for two values to be the same.

use crate::value::{FloatWidth, IntWidth, SequenceKind, Value};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The coarse runtime category of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    Null,
    Integer(IntWidth),
    UnsignedInteger(IntWidth),
    Float(FloatWidth),
    Boolean,
    Text,
    Sequence(SequenceKind),
    Mapping,
    Record,
    Other,
}

impl Shape {
    /// Classify a value, looking through any indirection first.
    pub fn of(value: &Value) -> Self {
        match value.resolve() {
            Value::Null => Self::Null,
            Value::Int(_, width) => Self::Integer(*width),
            Value::Uint(_, width) => Self::UnsignedInteger(*width),
            Value::Float(_, width) => Self::Float(*width),
            Value::Bool(_) => Self::Boolean,
            Value::Text(_) => Self::Text,
            Value::Sequence(kind, _) => Self::Sequence(*kind),
            Value::Mapping(_) => Self::Mapping,
            Value::Record(_) => Self::Record,
            Value::Opaque(_) => Self::Other,
            Value::Ref(_) => unreachable!("resolve() never yields an indirection"),
        }
    }

    pub fn is_integer(self) -> bool {
        matches!(self, Self::Integer(_) | Self::UnsignedInteger(_))
    }

    pub fn is_float(self) -> bool {
        matches!(self, Self::Float(_))
    }

    /// Whether values of these two shapes might be the same.
    ///
    /// Symmetric: `a.is_compatible_with(b) == b.is_compatible_with(a)`.
    pub fn is_compatible_with(self, other: Self) -> bool {
        if self == other {
            return true;
        }
        match (self, other) {
            (Self::Sequence(_), Self::Sequence(_)) => true,
            (a, b) if a.is_integer() && b.is_integer() => true,
            (a, b) if a.is_float() && b.is_float() => true,
            _ => false,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Integer(width) => write!(f, "i{}", width.bits()),
            Self::UnsignedInteger(width) => write!(f, "u{}", width.bits()),
            Self::Float(FloatWidth::F32) => write!(f, "f32"),
            Self::Float(FloatWidth::F64) => write!(f, "f64"),
            Self::Boolean => write!(f, "bool"),
            Self::Text => write!(f, "text"),
            Self::Sequence(SequenceKind::Fixed) => write!(f, "array"),
            Self::Sequence(SequenceKind::Growable) => write!(f, "seq"),
            Self::Mapping => write!(f, "map"),
            Self::Record => write!(f, "record"),
            Self::Other => write!(f, "other"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: &[Shape] = &[
        Shape::Null,
        Shape::Integer(IntWidth::W8),
        Shape::Integer(IntWidth::W64),
        Shape::UnsignedInteger(IntWidth::W16),
        Shape::Float(FloatWidth::F32),
        Shape::Float(FloatWidth::F64),
        Shape::Boolean,
        Shape::Text,
        Shape::Sequence(SequenceKind::Fixed),
        Shape::Sequence(SequenceKind::Growable),
        Shape::Mapping,
        Shape::Record,
        Shape::Other,
    ];

    #[test]
    fn compatibility_is_symmetric() {
        for a in ALL {
            for b in ALL {
                assert_eq!(
                    a.is_compatible_with(*b),
                    b.is_compatible_with(*a),
                    "{a} vs {b}"
                );
            }
        }
    }

    #[test]
    fn width_and_signedness_are_ignored() {
        assert!(Shape::Integer(IntWidth::W8).is_compatible_with(Shape::UnsignedInteger(IntWidth::W64)));
        assert!(Shape::Float(FloatWidth::F32).is_compatible_with(Shape::Float(FloatWidth::F64)));
        assert!(
            Shape::Sequence(SequenceKind::Fixed)
                .is_compatible_with(Shape::Sequence(SequenceKind::Growable))
        );
    }

    #[test]
    fn cross_category_pairs_are_incompatible() {
        assert!(!Shape::Text.is_compatible_with(Shape::Integer(IntWidth::W64)));
        assert!(!Shape::Integer(IntWidth::W64).is_compatible_with(Shape::Float(FloatWidth::F64)));
        assert!(!Shape::Mapping.is_compatible_with(Shape::Record));
        assert!(!Shape::Null.is_compatible_with(Shape::Boolean));
        assert!(!Shape::Sequence(SequenceKind::Growable).is_compatible_with(Shape::Mapping));
    }

    #[test]
    fn classification_looks_through_indirection() {
        let v = Value::reference(Value::reference(Value::from(3i16)));
        assert_eq!(Shape::of(&v), Shape::Integer(IntWidth::W16));
        assert_eq!(Shape::of(&Value::reference(Value::Null)), Shape::Null);
        assert_eq!(Shape::of(&Value::opaque("fn()", "<fn>")), Shape::Other);
    }

    #[test]
    fn display_uses_rust_names() {
        assert_eq!(Shape::Integer(IntWidth::W8).to_string(), "i8");
        assert_eq!(Shape::UnsignedInteger(IntWidth::W64).to_string(), "u64");
        assert_eq!(Shape::Sequence(SequenceKind::Fixed).to_string(), "array");
        assert_eq!(Shape::Mapping.to_string(), "map");
    }
}
