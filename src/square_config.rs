//! Square size configuration.
//!
//! This module defines `SquareConfig`, which bounds the width of the squares the
//! builder produces. The effective maximum is the governance value capped by
//! the hard upper bound for the current protocol version.
//!
//! Validation helpers surface obvious configuration mistakes (non power of two
//! widths, minimum above maximum).

use crate::da_definition::{DEFAULT_GOV_MAX_SQUARE_SIZE, DEFAULT_MIN_SQUARE_SIZE, SQUARE_SIZE_UPPER_BOUND};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Bounds on the square width.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SquareConfig {
    /// Smallest width produced, even for an empty block.
    pub min_square_size: usize,
    /// Governance-controlled maximum width.
    pub gov_max_square_size: usize,
    /// Protocol-version upper bound on the width.
    pub square_size_upper_bound: usize,
}

impl Default for SquareConfig {
    fn default() -> Self {
        Self {
            min_square_size: DEFAULT_MIN_SQUARE_SIZE,
            gov_max_square_size: DEFAULT_GOV_MAX_SQUARE_SIZE,
            square_size_upper_bound: SQUARE_SIZE_UPPER_BOUND,
        }
    }
}

impl SquareConfig {
    /// Create a new config.
    pub fn new(min_square_size: usize, gov_max_square_size: usize) -> Self {
        Self {
            min_square_size,
            gov_max_square_size,
            square_size_upper_bound: SQUARE_SIZE_UPPER_BOUND,
        }
    }

    /// Parse a config from JSON; missing fields take protocol defaults.
    pub fn from_json_str(s: &str) -> Result<Self, SquareConfigError> {
        let config: SquareConfig = serde_json::from_str(s).map_err(|e| SquareConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Effective maximum width.
    pub fn max_square_size(&self) -> usize {
        self.gov_max_square_size.min(self.square_size_upper_bound)
    }

    /// Largest number of shares a square may hold.
    pub fn max_shares(&self) -> usize {
        self.max_square_size() * self.max_square_size()
    }

    pub fn validate(&self) -> Result<(), SquareConfigError> {
        for (field, value) in [
            ("min_square_size", self.min_square_size),
            ("gov_max_square_size", self.gov_max_square_size),
            ("square_size_upper_bound", self.square_size_upper_bound),
        ] {
            if !value.is_power_of_two() {
                return Err(SquareConfigError::NotPowerOfTwo { field, value });
            }
        }
        if self.min_square_size > self.max_square_size() {
            return Err(SquareConfigError::MinAboveMax {
                min: self.min_square_size,
                max: self.max_square_size(),
            });
        }
        Ok(())
    }
}

/// Errors that can be produced by configuration validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SquareConfigError {
    #[error("{field} must be a non-zero power of two, got {value}")]
    NotPowerOfTwo { field: &'static str, value: usize },

    #[error("min square size {min} exceeds max square size {max}")]
    MinAboveMax { min: usize, max: usize },

    #[error("invalid square config: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = SquareConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.max_square_size(), 64);
        assert_eq!(cfg.max_shares(), 4096);
    }

    #[test]
    fn upper_bound_caps_governance() {
        let mut cfg = SquareConfig::new(1, 256);
        assert_eq!(cfg.max_square_size(), 128);
        cfg.square_size_upper_bound = 32;
        assert_eq!(cfg.max_square_size(), 32);
    }

    #[test]
    fn validation_errors() {
        assert_eq!(
            SquareConfig::new(3, 64).validate(),
            Err(SquareConfigError::NotPowerOfTwo {
                field: "min_square_size",
                value: 3
            })
        );
        assert_eq!(
            SquareConfig::new(0, 64).validate(),
            Err(SquareConfigError::NotPowerOfTwo {
                field: "min_square_size",
                value: 0
            })
        );
        assert_eq!(
            SquareConfig::new(128, 64).validate(),
            Err(SquareConfigError::MinAboveMax { min: 128, max: 64 })
        );
    }

    #[test]
    fn json_with_partial_fields() {
        let cfg = SquareConfig::from_json_str(r#"{"gov_max_square_size": 8}"#).unwrap();
        assert_eq!(cfg.min_square_size, 1);
        assert_eq!(cfg.max_square_size(), 8);
        assert!(matches!(
            SquareConfig::from_json_str(r#"{"min_square_size": 5}"#),
            Err(SquareConfigError::NotPowerOfTwo { .. })
        ));
        assert!(matches!(SquareConfig::from_json_str("not json"), Err(SquareConfigError::Parse(_))));
    }
}
