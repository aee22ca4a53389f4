//! Unordered associative container used for map comparison.
//!
//! A `DumbMap` flattens a mapping into parallel key and value vectors.
//! Lookups scan linearly and match keys by engine equivalence, so maps
//! whose key types differ (`String` keys vs dynamically typed keys, `u8`
//! vs `i64`) can still be compared. Engine equivalence is not consistent
//! with native hashing, which is why there is no hash index.
//!
//! Containers are built fresh for every map comparison and borrow from
//! the values being compared.

use crate::config::MapCoverage;
use crate::engine::Comparator;
use crate::error::SameError;
use crate::shape::Shape;
use crate::value::Value;

/// Parallel key/value view over a mapping value.
#[derive(Debug, Clone)]
pub struct DumbMap<'a> {
    keys: Vec<&'a Value>,
    values: Vec<&'a Value>,
}

impl<'a> DumbMap<'a> {
    /// Build a container from a mapping, looking through indirection.
    pub fn new(source: &'a Value) -> Result<Self, SameError> {
        match source.resolve() {
            Value::Mapping(entries) => Ok(Self::from_entries(entries)),
            other => Err(SameError::NotAMapping {
                shape: Shape::of(other),
            }),
        }
    }

    /// Build a container from entries in their enumeration order.
    pub fn from_entries(entries: &'a [(Value, Value)]) -> Self {
        let (keys, values): (Vec<_>, Vec<_>) = entries.iter().map(|(k, v)| (k, v)).unzip();
        Self { keys, values }
    }

    pub fn count(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[&'a Value] {
        &self.keys
    }

    pub fn values(&self) -> &[&'a Value] {
        &self.values
    }

    /// The value of the first entry whose key is the same as `key`.
    ///
    /// `None` means no key matched; a stored `Null` comes back as
    /// `Some(&Value::Null)`.
    pub fn lookup(&self, key: &Value, comparator: &Comparator) -> Option<&'a Value> {
        self.keys
            .iter()
            .position(|candidate| comparator.is_same_value(key, candidate))
            .map(|index| self.values[index])
    }

    /// Whether two containers hold the same entries.
    ///
    /// Counts must match, then every key of `self` must look up to
    /// equivalent values in both containers. With
    /// [`MapCoverage::Bijective`] the check is repeated from `other`'s keys.
    pub fn is_same(&self, other: &DumbMap<'_>, comparator: &Comparator) -> bool {
        if self.count() != other.count() {
            return false;
        }
        if !self.covers(other, comparator) {
            return false;
        }
        match comparator.config().map_coverage {
            MapCoverage::Forward => true,
            MapCoverage::Bijective => other.covers(self, comparator),
        }
    }

    fn covers(&self, other: &DumbMap<'_>, comparator: &Comparator) -> bool {
        self.keys.iter().all(|key| {
            match (self.lookup(key, comparator), other.lookup(key, comparator)) {
                (Some(mine), Some(theirs)) => comparator.is_same_value(mine, theirs),
                _ => false,
            }
        })
    }
}
