//! Per-shape collision and material data.
//!
//! A particle may have several shapes; the state-sync push path updates
//! collision and material data shape-by-shape, then decides whether the
//! particle belongs in the acceleration structure by OR-ing the collision
//! flags across *all* shapes, not just the ones that changed.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Collision participation flags for one shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CollisionData {
    /// Shape participates in simulation (contact generation).
    pub sim_enabled: bool,
    /// Shape participates in scene queries (raycasts, sweeps).
    pub query_enabled: bool,
}

impl CollisionData {
    /// Collision enabled for both simulation and query.
    #[must_use]
    pub const fn enabled() -> Self {
        Self {
            sim_enabled: true,
            query_enabled: true,
        }
    }

    /// Collision fully disabled.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            sim_enabled: false,
            query_enabled: false,
        }
    }

    /// Whether this shape contributes collision at all.
    #[must_use]
    pub const fn has_collision(&self) -> bool {
        self.sim_enabled || self.query_enabled
    }
}

/// Surface material of one shape.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MaterialData {
    /// Coulomb friction coefficient.
    pub friction: f64,
    /// Restitution coefficient in `[0, 1]`.
    pub restitution: f64,
}

impl Default for MaterialData {
    fn default() -> Self {
        Self {
            friction: 0.5,
            restitution: 0.0,
        }
    }
}

/// One shape attached to a particle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ParticleShape {
    /// Collision participation flags.
    pub collision: CollisionData,
    /// Surface material.
    pub material: MaterialData,
}

impl ParticleShape {
    /// A shape with collision enabled and default material.
    #[must_use]
    pub fn with_collision() -> Self {
        Self {
            collision: CollisionData::enabled(),
            material: MaterialData::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_collision_is_an_or() {
        assert!(!CollisionData::disabled().has_collision());
        assert!(CollisionData::enabled().has_collision());
        let query_only = CollisionData {
            sim_enabled: false,
            query_enabled: true,
        };
        assert!(query_only.has_collision());
    }
}
