//! Per-wheel suspension parameters, results, and global tuning.

use axle_types::{Result, SolverError};
use nalgebra::{Point3, Vector3};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Directions this far from unit length are rejected by validation.
const UNIT_TOLERANCE: f64 = 1e-6;

/// Static parameters of one suspension constraint.
///
/// `axis` is expressed in the body's local frame and points from the ground
/// target towards the attachment point; `normal` is the world-space ground
/// contact normal the spring and hard-stop push along. Lengths are travel
/// limits measured along the axis: the spring is fully extended at
/// `max_length` and bottoms out at `min_length`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SuspensionSettings {
    /// Whether the constraint participates in solving.
    pub enabled: bool,
    /// World-space ground target the travel distance is measured from.
    pub target: Point3<f64>,
    /// Local-frame suspension axis (unit length, target towards attachment).
    pub axis: Vector3<f64>,
    /// World-space ground contact normal (unit length).
    pub normal: Vector3<f64>,
    /// Travel at which the suspension bottoms out (meters).
    pub min_length: f64,
    /// Travel at which the spring is fully extended (meters).
    pub max_length: f64,
    /// Spring rate (N/m).
    pub spring_stiffness: f64,
    /// Spring damping coefficient (N s/m).
    pub spring_damping: f64,
}

impl Default for SuspensionSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            target: Point3::origin(),
            axis: Vector3::z(),
            normal: Vector3::z(),
            min_length: 0.0,
            max_length: 0.5,
            spring_stiffness: 50_000.0,
            spring_damping: 1_000.0,
        }
    }
}

impl SuspensionSettings {
    /// Validate the settings.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::InvalidTravelLimits`] when the travel limits
    /// are inverted or non-finite, and [`SolverError::InvalidConfig`] for
    /// non-unit directions or negative spring coefficients.
    pub fn validate(&self) -> Result<()> {
        if !self.min_length.is_finite()
            || !self.max_length.is_finite()
            || self.min_length > self.max_length
        {
            return Err(SolverError::InvalidTravelLimits {
                min: self.min_length,
                max: self.max_length,
            });
        }
        if (self.axis.norm() - 1.0).abs() > UNIT_TOLERANCE {
            return Err(SolverError::invalid_config("suspension axis must be unit length"));
        }
        if (self.normal.norm() - 1.0).abs() > UNIT_TOLERANCE {
            return Err(SolverError::invalid_config("contact normal must be unit length"));
        }
        if !self.spring_stiffness.is_finite() || self.spring_stiffness < 0.0 {
            return Err(SolverError::invalid_config("spring stiffness must be non-negative"));
        }
        if !self.spring_damping.is_finite() || self.spring_damping < 0.0 {
            return Err(SolverError::invalid_config("spring damping must be non-negative"));
        }
        if !self.target.coords.iter().all(|x| x.is_finite()) {
            return Err(SolverError::invalid_config("suspension target must be finite"));
        }
        Ok(())
    }
}

/// Per-step output of one suspension constraint.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SuspensionResults {
    /// Net positional correction applied by the spring (world space).
    pub net_pushout: Vector3<f64>,
    /// Net velocity impulse applied by the spring (world space).
    pub net_impulse: Vector3<f64>,
    /// Net positional correction applied by the hard-stop contact.
    pub hardstop_net_pushout: Vector3<f64>,
    /// Net velocity impulse applied by the hard-stop contact.
    pub hardstop_net_impulse: Vector3<f64>,
    /// Resolved travel distance along the axis, clamped to the travel
    /// limits once the spring has run (meters).
    pub length: f64,
}

impl SuspensionResults {
    /// Clear all accumulated output, ready for the next step.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Solver-wide suspension tuning.
///
/// Pushout limits follow the usual engine defaults: at most 5 cm of
/// hard-stop correction per step, further capped by a 1 m/s pushout
/// velocity so small timesteps get proportionally smaller corrections.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SuspensionTuning {
    /// Solve the suspension spring during the position phase.
    pub spring_enabled: bool,
    /// Solve the bottom-out hard-stop contact.
    pub hardstop_enabled: bool,
    /// Run the hard-stop velocity pass after the position phase.
    pub velocity_solve: bool,
    /// Maximum hard-stop positional correction per step (meters).
    pub max_pushout: f64,
    /// Maximum hard-stop pushout velocity (meters per second).
    pub max_pushout_velocity: f64,
}

impl Default for SuspensionTuning {
    fn default() -> Self {
        Self {
            spring_enabled: true,
            hardstop_enabled: true,
            velocity_solve: true,
            max_pushout: 0.05,
            max_pushout_velocity: 1.0,
        }
    }
}

impl SuspensionTuning {
    /// Effective hard-stop pushout cap for a timestep of `dt`.
    #[must_use]
    pub fn pushout_cap(&self, dt: f64) -> f64 {
        self.max_pushout.min(self.max_pushout_velocity * dt)
    }

    /// Validate the tuning.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::InvalidConfig`] when a pushout limit is
    /// negative or non-finite.
    pub fn validate(&self) -> Result<()> {
        if !self.max_pushout.is_finite() || self.max_pushout < 0.0 {
            return Err(SolverError::invalid_config("max pushout must be non-negative"));
        }
        if !self.max_pushout_velocity.is_finite() || self.max_pushout_velocity < 0.0 {
            return Err(SolverError::invalid_config(
                "max pushout velocity must be non-negative",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_validate() {
        SuspensionSettings::default().validate().unwrap();
        SuspensionTuning::default().validate().unwrap();
    }

    #[test]
    fn test_inverted_travel_limits_rejected() {
        let settings = SuspensionSettings {
            min_length: 0.6,
            max_length: 0.5,
            ..SuspensionSettings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(SolverError::InvalidTravelLimits { min, max }) if min == 0.6 && max == 0.5
        ));
    }

    #[test]
    fn test_non_unit_axis_rejected() {
        let settings = SuspensionSettings {
            axis: Vector3::new(0.0, 0.0, 2.0),
            ..SuspensionSettings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_negative_stiffness_rejected() {
        let settings = SuspensionSettings {
            spring_stiffness: -1.0,
            ..SuspensionSettings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_pushout_cap_scales_with_dt() {
        use approx::assert_relative_eq;
        let tuning = SuspensionTuning::default();
        // Small dt: the velocity cap wins.
        assert_relative_eq!(tuning.pushout_cap(0.01), 0.01, epsilon = 1e-12);
        // Large dt: the absolute cap wins.
        assert_relative_eq!(tuning.pushout_cap(0.1), 0.05, epsilon = 1e-12);
    }

    #[test]
    fn test_results_reset() {
        let mut results = SuspensionResults {
            net_pushout: Vector3::new(0.0, 0.0, 0.1),
            length: 0.3,
            ..SuspensionResults::default()
        };
        results.reset();
        assert_eq!(results, SuspensionResults::default());
    }
}
