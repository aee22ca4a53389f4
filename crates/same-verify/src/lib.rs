//! Assertion helpers over the same kernel.
//!
//! This crate is intentionally thin: it answers "are these the same?" with
//! a report naming both rendered values and their shapes, and keeps no
//! comparison policy of its own.

use same_kernel::{Comparator, Shape, to_value};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What the caller expected of a pair of values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expectation {
    Same,
    Different,
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Same => write!(f, "the same"),
            Self::Different => write!(f, "different"),
        }
    }
}

/// One side of a failed expectation, as rendered for humans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rendered {
    pub value: String,
    /// `None` when the value could not be captured.
    pub shape: Option<Shape>,
}

impl Rendered {
    fn of<T: ?Sized + Serialize>(value: &T) -> Self {
        match to_value(value) {
            Ok(captured) => Self {
                value: captured.to_string(),
                shape: Some(Shape::of(&captured)),
            },
            Err(err) => Self {
                value: format!("<{err}>"),
                shape: None,
            },
        }
    }
}

impl fmt::Display for Rendered {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.shape {
            Some(shape) => write!(f, "{}({shape})", self.value),
            None => write!(f, "{}(?)", self.value),
        }
    }
}

/// A failed same/different expectation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("expected {left} and {right} to be {expectation}, but they were not")]
pub struct Mismatch {
    pub expectation: Expectation,
    pub left: Rendered,
    pub right: Rendered,
}

impl Mismatch {
    /// Machine-readable form of the report.
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// `Ok` when `left` and `right` are the same under the default comparator.
pub fn verify_same<A, B>(left: &A, right: &B) -> Result<(), Mismatch>
where
    A: ?Sized + Serialize,
    B: ?Sized + Serialize,
{
    verify_same_with(&Comparator::default(), left, right)
}

/// `Ok` when `left` and `right` are different under the default comparator.
pub fn verify_different<A, B>(left: &A, right: &B) -> Result<(), Mismatch>
where
    A: ?Sized + Serialize,
    B: ?Sized + Serialize,
{
    verify_different_with(&Comparator::default(), left, right)
}

pub fn verify_same_with<A, B>(comparator: &Comparator, left: &A, right: &B) -> Result<(), Mismatch>
where
    A: ?Sized + Serialize,
    B: ?Sized + Serialize,
{
    verify(comparator, Expectation::Same, left, right)
}

pub fn verify_different_with<A, B>(
    comparator: &Comparator,
    left: &A,
    right: &B,
) -> Result<(), Mismatch>
where
    A: ?Sized + Serialize,
    B: ?Sized + Serialize,
{
    verify(comparator, Expectation::Different, left, right)
}

fn verify<A, B>(
    comparator: &Comparator,
    expectation: Expectation,
    left: &A,
    right: &B,
) -> Result<(), Mismatch>
where
    A: ?Sized + Serialize,
    B: ?Sized + Serialize,
{
    let same = comparator.is_same(left, right);
    let met = match expectation {
        Expectation::Same => same,
        Expectation::Different => !same,
    };
    if met {
        return Ok(());
    }
    Err(Mismatch {
        expectation,
        left: Rendered::of(left),
        right: Rendered::of(right),
    })
}

/// Panic unless both values are the same.
#[macro_export]
macro_rules! assert_same {
    ($left:expr, $right:expr $(,)?) => {
        if let Err(mismatch) = $crate::verify_same(&$left, &$right) {
            panic!("{mismatch}");
        }
    };
}

/// Panic unless the values are different.
#[macro_export]
macro_rules! assert_different {
    ($left:expr, $right:expr $(,)?) => {
        if let Err(mismatch) = $crate::verify_different(&$left, &$right) {
            panic!("{mismatch}");
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use same_kernel::{IntWidth, SameConfig};
    use std::collections::BTreeMap;

    #[test]
    fn verify_same_passes_for_equivalent_values() {
        assert!(verify_same(&1u8, &1i64).is_ok());
        assert!(verify_different(&"x", &"y").is_ok());
    }

    #[test]
    fn mismatch_names_values_and_shapes() {
        let err = verify_same(&vec![1i8, 2], &[2u64, 1]).unwrap_err();
        assert_eq!(err.expectation, Expectation::Same);
        assert_eq!(err.left.value, "[1, 2]");
        assert_eq!(err.right.shape, Some(Shape::Sequence(same_kernel::SequenceKind::Fixed)));
        insta::assert_snapshot!(
            err.to_string(),
            @"expected [1, 2](seq) and [2, 1](array) to be the same, but they were not"
        );
    }

    #[test]
    fn verify_different_reports_same_values() {
        let err = verify_different(&16u16, &16i64).unwrap_err();
        assert_eq!(err.left.shape, Some(Shape::UnsignedInteger(IntWidth::W16)));
        insta::assert_snapshot!(
            err.to_string(),
            @"expected 16(u16) and 16(i64) to be different, but they were not"
        );
    }

    #[test]
    fn mismatch_json_form() {
        let mut book = BTreeMap::new();
        book.insert("title", "Jaws");
        let err = verify_same(&book, &"Jaws").unwrap_err();
        insta::assert_json_snapshot!(err.to_json().unwrap(), @r#"
        {
          "expectation": "same",
          "left": {
            "shape": "mapping",
            "value": "{\"title\": \"Jaws\"}"
          },
          "right": {
            "shape": "text",
            "value": "\"Jaws\""
          }
        }
        "#);
    }

    #[test]
    fn custom_comparator_is_honoured() {
        let loose = Comparator::new(SameConfig::default().with_epsilon(0.1));
        assert!(verify_same_with(&loose, &1.0, &1.05).is_ok());
        assert!(verify_different_with(&loose, &1.0, &1.05).is_err());
    }

    #[test]
    fn uncapturable_values_render_with_unknown_shape() {
        struct Broken;
        impl Serialize for Broken {
            fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
                Err(serde::ser::Error::custom("broken"))
            }
        }
        let err = verify_same(&Broken, &1).unwrap_err();
        assert_eq!(err.left.shape, None);
        assert_eq!(err.left.to_string(), "<capture failed: broken>(?)");
    }

    #[test]
    fn macros_pass_and_panic() {
        assert_same!(vec![1, 2, 3], [1u8, 2, 3]);
        assert_different!("abc", "xbc");
        let caught = std::panic::catch_unwind(|| assert_same!(1, 2));
        assert!(caught.is_err());
    }
}
