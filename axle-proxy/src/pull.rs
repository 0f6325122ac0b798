//! Physics-to-game-thread result buffering.

use axle_core::{MinEvolution, RigidParticle};
use axle_types::{ObjectState, ParticleId};
use nalgebra::{Point3, UnitQuaternion, Vector3};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One particle's simulation result, captured at the end of a step.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PullData {
    /// The particle this result belongs to.
    pub particle: ParticleId,
    /// World position.
    pub position: Point3<f64>,
    /// World rotation.
    pub rotation: UnitQuaternion<f64>,
    /// Linear velocity.
    pub linear_velocity: Vector3<f64>,
    /// Angular velocity.
    pub angular_velocity: Vector3<f64>,
    /// Object state at capture.
    pub object_state: ObjectState,
}

impl PullData {
    /// Capture a particle's current state.
    #[must_use]
    pub fn from_particle(particle: &RigidParticle) -> Self {
        Self {
            particle: particle.id(),
            position: particle.pose.position,
            rotation: particle.pose.rotation,
            linear_velocity: particle.twist.linear,
            angular_velocity: particle.twist.angular,
            object_state: particle.state,
        }
    }
}

/// All moving particles' results for one solver step, stamped with the
/// external timestamp the step consumed input up to.
///
/// The simulation thread fills one of these per step and hands it over;
/// the game thread keeps the latest two for interpolation. The timestamp
/// is what the pull path compares per-channel overwrite timestamps
/// against.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PullSnapshot {
    /// External timestamp whose input this step consumed.
    pub solver_timestamp: u64,
    /// Captured particle results.
    pub bodies: Vec<PullData>,
}

impl PullSnapshot {
    /// Capture every non-static particle of an evolution.
    #[must_use]
    pub fn capture(evolution: &MinEvolution, solver_timestamp: u64) -> Self {
        let bodies = evolution
            .particles()
            .iter()
            .filter(|p| p.state != ObjectState::Static)
            .map(PullData::from_particle)
            .collect();
        Self {
            solver_timestamp,
            bodies,
        }
    }

    /// Result for one particle, if captured.
    #[must_use]
    pub fn find(&self, particle: ParticleId) -> Option<&PullData> {
        self.bodies.iter().find(|b| b.particle == particle)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axle_core::EvolutionConfig;
    use axle_types::{MassProperties, Pose};

    #[test]
    fn test_capture_skips_static_particles() {
        let mut evolution = MinEvolution::new(EvolutionConfig::default()).unwrap();
        let dynamic = evolution.create_particle(
            Pose::from_position(Point3::new(0.0, 0.0, 2.0)),
            MassProperties::sphere(1.0, 0.5),
            ObjectState::Dynamic,
        );
        let fixed = evolution.create_particle(
            Pose::identity(),
            MassProperties::infinite(),
            ObjectState::Static,
        );

        let snapshot = PullSnapshot::capture(&evolution, 7);
        assert_eq!(snapshot.solver_timestamp, 7);
        assert_eq!(snapshot.bodies.len(), 1);
        assert_eq!(snapshot.find(dynamic).unwrap().position.z, 2.0);
        assert!(snapshot.find(fixed).is_none());
    }
}
