//! Game-thread-to-physics dirty data.
//!
//! The game thread accumulates changes into a [`DirtyParticleData`] while
//! the simulation runs; [`crate::ParticleProxy::push_to_physics_state`]
//! consumes it at the start of the next step. Each field is optional so
//! only what actually changed is copied, and the push path can apply the
//! side effects (bounds refresh, contact invalidation, acceleration
//! structure registration) each kind of change demands.

use axle_core::Aabb;
use axle_types::{
    CollisionData, KinematicTarget, MassProperties, MaterialData, ObjectState, ParticleShape,
    Pose, Twist,
};
use nalgebra::Vector3;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Sync layer configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProxyConfig {
    /// When set, kinematic particles are synced from the simulation like
    /// dynamic ones. Off by default: the game thread drives kinematics and
    /// pulling sim state back would fight its writes.
    pub sync_kinematic_on_game_thread: bool,
    /// When set, every pushed particle is registered in the acceleration
    /// structure regardless of its collision flags.
    pub force_all_into_acceleration_structure: bool,
}

/// Rarely-changing data: geometry.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NonFrequentData {
    /// Full replacement shape list.
    pub shapes: Vec<ParticleShape>,
    /// Local-space bounds of the new geometry.
    pub local_bounds: Aabb,
}

/// Accumulated forces and impulses.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DirtyDynamics {
    /// Force through the center of mass (N).
    pub force: Vector3<f64>,
    /// Torque (N m).
    pub torque: Vector3<f64>,
    /// Instantaneous linear impulse (N s).
    pub linear_impulse: Vector3<f64>,
    /// Instantaneous angular impulse (N m s).
    pub angular_impulse: Vector3<f64>,
}

/// Infrequent per-particle flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DirtyMisc {
    /// New object state classification.
    pub object_state: ObjectState,
}

/// One per-shape update.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ShapeDirtyData {
    /// Index into the particle's shape list.
    pub shape_index: usize,
    /// New collision flags, if changed.
    pub collision: Option<CollisionData>,
    /// New material, if changed.
    pub material: Option<MaterialData>,
}

/// Everything the game thread changed on one particle since the last push.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DirtyParticleData {
    /// New transform.
    pub xr: Option<Pose>,
    /// New geometry.
    pub non_frequent: Option<NonFrequentData>,
    /// New velocities.
    pub velocities: Option<Twist>,
    /// Kinematic target for the next step.
    pub kinematic_target: Option<KinematicTarget>,
    /// New mass properties.
    pub mass_props: Option<MassProperties>,
    /// Forces and impulses to apply.
    pub dynamics: Option<DirtyDynamics>,
    /// Flag changes.
    pub misc: Option<DirtyMisc>,
    /// Per-shape updates.
    pub shapes: Vec<ShapeDirtyData>,
}

impl DirtyParticleData {
    /// Whether nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.xr.is_none()
            && self.non_frequent.is_none()
            && self.velocities.is_none()
            && self.kinematic_target.is_none()
            && self.mass_props.is_none()
            && self.dynamics.is_none()
            && self.misc.is_none()
            && self.shapes.is_empty()
    }
}
