//! The structural equality engine.
//!
//! `is_same(x, y)` decides whether two values are "the same" under loose
//! rules:
//!
//! 1. two nulls are the same
//! 2. indirections are followed on each side
//! 3. both sides are classified into [`Shape`]s
//! 4. incompatible shapes are different, without looking at contents
//! 5. compatible shapes dispatch to one rule per shape
//!
//! The map rule builds a [`DumbMap`] per side and delegates to it, and the
//! container calls back into the engine for every key and value, so the
//! two are mutually recursive. Nothing is memoized.

use crate::capture::to_value;
use crate::config::SameConfig;
use crate::dumb_map::DumbMap;
use crate::error::SameError;
use crate::shape::Shape;
use crate::value::{Record, Value};
use serde::Serialize;
use tracing::{trace, warn};

/// A configured equality predicate.
#[derive(Debug, Clone, Default)]
pub struct Comparator {
    config: SameConfig,
}

impl Comparator {
    pub fn new(config: SameConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SameConfig {
        &self.config
    }

    /// Capture both sides and compare them.
    ///
    /// A side that fails to capture makes the pair different; the failure
    /// is logged. Use [`Comparator::try_is_same`] to see the error.
    pub fn is_same<A, B>(&self, x: &A, y: &B) -> bool
    where
        A: ?Sized + Serialize,
        B: ?Sized + Serialize,
    {
        match self.try_is_same(x, y) {
            Ok(same) => same,
            Err(err) => {
                warn!(error = %err, "capture failed, treating values as different");
                false
            }
        }
    }

    pub fn try_is_same<A, B>(&self, x: &A, y: &B) -> Result<bool, SameError>
    where
        A: ?Sized + Serialize,
        B: ?Sized + Serialize,
    {
        let x = to_value(x)?;
        let y = to_value(y)?;
        Ok(self.is_same_value(&x, &y))
    }

    /// Compare two captured values.
    pub fn is_same_value(&self, x: &Value, y: &Value) -> bool {
        if x.is_null() && y.is_null() {
            return true;
        }

        let x = x.resolve();
        let y = y.resolve();

        let shape_x = Shape::of(x);
        let shape_y = Shape::of(y);
        if !shape_x.is_compatible_with(shape_y) {
            trace!(left = %shape_x, right = %shape_y, "incompatible shapes");
            return false;
        }

        match (x, y) {
            (Value::Null, Value::Null) => true,
            (Value::Int(a, _), Value::Int(b, _)) => a == b,
            (Value::Uint(a, _), Value::Uint(b, _)) => a == b,
            (Value::Int(signed, _), Value::Uint(unsigned, _))
            | (Value::Uint(unsigned, _), Value::Int(signed, _)) => {
                u128::try_from(*signed).is_ok_and(|widened| widened == *unsigned)
            }
            (Value::Float(a, _), Value::Float(b, _)) => self.same_float(*a, *b),
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Sequence(_, a), Value::Sequence(_, b)) => self.same_sequence(a, b),
            (Value::Mapping(a), Value::Mapping(b)) => self.same_mapping(a, b),
            (Value::Record(a), Value::Record(b)) => self.same_record(a, b),
            _ => {
                warn!(shape = %shape_x, left = %x, right = %y, "no comparison rule for shape");
                false
            }
        }
    }

    // Absolute tolerance: large magnitudes that are relatively close still
    // differ, tiny distinct magnitudes compare the same.
    fn same_float(&self, a: f64, b: f64) -> bool {
        a == b || (a - b).abs() < self.config.epsilon
    }

    fn same_sequence(&self, a: &[Value], b: &[Value]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| self.is_same_value(x, y))
    }

    fn same_mapping(&self, a: &[(Value, Value)], b: &[(Value, Value)]) -> bool {
        if a.len() != b.len() {
            return false;
        }
        DumbMap::from_entries(a).is_same(&DumbMap::from_entries(b), self)
    }

    /// Records with canonical text on both sides compare by text.
    /// Otherwise field counts must match and every readable field of `a`
    /// must be the same as the readable field of that name in `b`. A field
    /// absent from `b` makes the records different; fields present but
    /// unreadable on either side are skipped.
    fn same_record(&self, a: &Record, b: &Record) -> bool {
        if let (Some(text_a), Some(text_b)) = (a.canonical(), b.canonical()) {
            return text_a == text_b;
        }
        if a.len() != b.len() {
            return false;
        }
        a.fields().iter().all(|field| {
            let Some(theirs) = b.field(&field.name) else {
                return false;
            };
            match (field.value.as_ref(), theirs.value.as_ref()) {
                (Some(mine), Some(theirs)) => self.is_same_value(mine, theirs),
                _ => true,
            }
        })
    }
}

/// [`Comparator::is_same`] with the default configuration.
pub fn is_same<A, B>(x: &A, y: &B) -> bool
where
    A: ?Sized + Serialize,
    B: ?Sized + Serialize,
{
    Comparator::default().is_same(x, y)
}

/// [`Comparator::is_same_value`] with the default configuration.
pub fn is_same_value(x: &Value, y: &Value) -> bool {
    Comparator::default().is_same_value(x, y)
}
