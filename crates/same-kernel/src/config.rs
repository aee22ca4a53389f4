//! Comparator configuration.
//!
//! ```toml
//! epsilon = 1.0e-5
//! map_coverage = "forward"
//! ```
//!
//! Every key is optional; missing keys take the defaults below.

use crate::error::SameError;
use serde::{Deserialize, Serialize};

/// Default absolute tolerance for float comparison.
pub const EPSILON: f64 = 1.0e-5;

/// Which keys a map comparison walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapCoverage {
    /// Walk the first map's keys only, relying on equal entry counts to
    /// rule out extras on the second side.
    #[default]
    Forward,

    /// Also walk the second map's keys against the first.
    ///
    /// Catches maps whose first side holds several equivalent keys.
    Bijective,
}

/// Tunables for a [`crate::Comparator`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SameConfig {
    /// Absolute float tolerance. Two floats are the same when equal or
    /// when `|a - b| < epsilon`.
    pub epsilon: f64,

    /// Which keys a map comparison walks; see [`MapCoverage`].
    pub map_coverage: MapCoverage,
}

impl Default for SameConfig {
    fn default() -> Self {
        Self {
            epsilon: EPSILON,
            map_coverage: MapCoverage::Forward,
        }
    }
}

impl SameConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, SameError> {
        let config: Self =
            toml::from_str(text).map_err(|source| SameError::ParseToml { source })?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_map_coverage(mut self, coverage: MapCoverage) -> Self {
        self.map_coverage = coverage;
        self
    }

    /// Reject tolerances that would make float comparison meaningless.
    pub fn validate(&self) -> Result<(), SameError> {
        if !self.epsilon.is_finite() || self.epsilon < 0.0 {
            return Err(SameError::InvalidConfig(format!(
                "epsilon must be finite and non-negative, got {}",
                self.epsilon
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_constants() {
        let config = SameConfig::default();
        assert_eq!(config.epsilon, EPSILON);
        assert_eq!(config.map_coverage, MapCoverage::Forward);
    }

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(SameConfig::from_toml_str("").unwrap(), SameConfig::default());
    }

    #[test]
    fn toml_overrides() {
        let config =
            SameConfig::from_toml_str("epsilon = 0.5\nmap_coverage = \"bijective\"\n").unwrap();
        assert_eq!(config.epsilon, 0.5);
        assert_eq!(config.map_coverage, MapCoverage::Bijective);
    }

    #[test]
    fn negative_epsilon_rejected() {
        let err = SameConfig::from_toml_str("epsilon = -1.0").unwrap_err();
        assert!(matches!(err, SameError::InvalidConfig(_)));
    }

    #[test]
    fn unknown_keys_rejected() {
        let err = SameConfig::from_toml_str("tolerance = 1.0").unwrap_err();
        assert!(matches!(err, SameError::ParseToml { .. }));
    }
}
