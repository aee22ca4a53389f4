//! # Same Kernel
//!
//! A loose structural equality predicate: two values are "the same" when
//! their contents agree, whatever their declared types.
//!
//! - integers compare by magnitude, ignoring width and signedness
//! - floats compare within an absolute tolerance ([`EPSILON`])
//! - fixed and growable sequences compare element by element, in order
//! - maps compare by key/value equivalence, ignoring key and value types
//! - records compare field by field, by name
//!
//! This crate is **type-agnostic**: anything that implements
//! `serde::Serialize` is captured into a [`Value`] and compared.
//!
//! ## Architecture
//!
//! ```text
//! Serialize              ← Any Rust value
//!     │  capture
//! Value                  ← Owned, dynamically shaped tree
//!     │  classify
//! Shape                  ← Coarse category + compatibility relation
//!     │  dispatch
//! Comparator             ← One rule per shape
//!     ⇅  mutual recursion
//! DumbMap                ← Order-independent view for map comparison
//! ```

pub mod capture;
pub mod config;
pub mod dumb_map;
pub mod engine;
pub mod error;
pub mod shape;
pub mod value;

pub use capture::{Canonical, to_value};
pub use config::{EPSILON, MapCoverage, SameConfig};
pub use dumb_map::DumbMap;
pub use engine::{Comparator, is_same, is_same_value};
pub use error::SameError;
pub use shape::Shape;
pub use value::{Field, FloatWidth, IntWidth, Opaque, Record, SequenceKind, Value};
