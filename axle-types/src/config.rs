//! Gravity configuration.

use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Gravity applied by the evolution loop during integration.
///
/// # Example
///
/// ```
/// use axle_types::Gravity;
///
/// let g = Gravity::earth();
/// assert!(g.acceleration.z < 0.0);
/// assert!(Gravity::zero().acceleration.norm() == 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Gravity {
    /// Acceleration applied to all dynamic particles (m/s^2).
    pub acceleration: Vector3<f64>,
}

impl Default for Gravity {
    fn default() -> Self {
        Self::earth()
    }
}

impl Gravity {
    /// Standard Earth gravity along -Z.
    #[must_use]
    pub fn earth() -> Self {
        Self {
            acceleration: Vector3::new(0.0, 0.0, -9.81),
        }
    }

    /// Zero gravity.
    #[must_use]
    pub fn zero() -> Self {
        Self {
            acceleration: Vector3::zeros(),
        }
    }

    /// Custom gravity vector.
    #[must_use]
    pub const fn new(acceleration: Vector3<f64>) -> Self {
        Self { acceleration }
    }
}
