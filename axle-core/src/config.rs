//! Evolution loop configuration.

use axle_types::{Gravity, Result, SolverError};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration of the evolution loop.
///
/// # Example
///
/// ```
/// use axle_core::EvolutionConfig;
///
/// let config = EvolutionConfig::default();
/// assert!(config.validate().is_ok());
/// assert_eq!(config.num_position_iterations, 8);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EvolutionConfig {
    /// Gravity applied to dynamic particles during integration.
    pub gravity: Gravity,
    /// Constraint position iterations per substep.
    ///
    /// The suspension spring applies once per iteration, so its effective
    /// strength scales with this count.
    pub num_position_iterations: usize,
    /// Constraint velocity iterations per substep.
    pub num_velocity_iterations: usize,
    /// Margin added to world bounds so small movement does not force
    /// re-registration in the acceleration structure (meters).
    pub bounds_extension: f64,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            gravity: Gravity::earth(),
            num_position_iterations: 8,
            num_velocity_iterations: 2,
            bounds_extension: 0.1,
        }
    }
}

impl EvolutionConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::InvalidConfig`] when iteration counts or the
    /// bounds extension are out of range.
    pub fn validate(&self) -> Result<()> {
        if self.num_position_iterations == 0 {
            return Err(SolverError::invalid_config(
                "at least one position iteration is required",
            ));
        }
        if !self.bounds_extension.is_finite() || self.bounds_extension < 0.0 {
            return Err(SolverError::invalid_config(
                "bounds extension must be non-negative",
            ));
        }
        if !self.gravity.acceleration.iter().all(|x| x.is_finite()) {
            return Err(SolverError::invalid_config("gravity must be finite"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_validates() {
        EvolutionConfig::default().validate().unwrap();
    }

    #[test]
    fn test_zero_position_iterations_rejected() {
        let config = EvolutionConfig {
            num_position_iterations: 0,
            ..EvolutionConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_negative_bounds_extension_rejected() {
        let config = EvolutionConfig {
            bounds_extension: -0.1,
            ..EvolutionConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
