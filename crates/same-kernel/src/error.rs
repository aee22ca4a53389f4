//! Error types for same-kernel operations.
//!
//! The equality predicate itself never fails: it answers `true` or
//! `false`. Errors only arise at the edges, while capturing a value,
//! building a container from something that is not a mapping, or loading
//! configuration.

use crate::shape::Shape;
use std::fmt::Display;

/// Errors raised around, never inside, a comparison.
#[derive(Debug, thiserror::Error)]
pub enum SameError {
    /// A `Serialize` impl reported a failure while being captured.
    #[error("capture failed: {0}")]
    Capture(String),

    /// A container was requested for a value that is not a mapping.
    #[error("expected a map, got {shape}")]
    NotAMapping { shape: Shape },

    /// Configuration parsed but holds an unusable value.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Configuration text is not valid TOML for [`crate::SameConfig`].
    #[error("invalid toml config: {source}")]
    ParseToml {
        #[source]
        source: toml::de::Error,
    },
}

impl serde::ser::Error for SameError {
    fn custom<T: Display>(msg: T) -> Self {
        Self::Capture(msg.to_string())
    }
}
