//! Rigid particles and their dense storage.

use crate::Aabb;
use axle_types::{
    KinematicTarget, MassProperties, ObjectState, ParticleId, ParticleShape, Pose, Result,
    SolverError, Twist,
};
use hashbrown::HashMap;
use nalgebra::Vector3;

/// One rigid body as the evolution sees it.
///
/// "Particle" is the solver-side name: the body is a point mass plus
/// inertia, with shapes attached for collision bookkeeping. Fields mutated
/// every step (pose, twist, force accumulators) are public; identity and
/// storage invariants stay behind accessors.
#[derive(Debug, Clone)]
pub struct RigidParticle {
    id: ParticleId,
    /// Current transform.
    pub pose: Pose,
    /// Transform at the start of the current substep.
    pub prev_pose: Pose,
    /// Linear and angular velocity.
    pub twist: Twist,
    /// Mass, center of mass, and inertia.
    pub mass: MassProperties,
    /// Dynamic / kinematic / static / sleeping classification.
    pub state: ObjectState,
    /// Force accumulator, cleared after every step (N).
    pub force: Vector3<f64>,
    /// Torque accumulator, cleared after every step (N m).
    pub torque: Vector3<f64>,
    /// Shapes attached to this particle.
    pub shapes: Vec<ParticleShape>,
    /// Union of shape bounds in the particle's local frame.
    pub local_bounds: Aabb,
    /// Cached world-space bounds.
    pub world_bounds: Aabb,
    /// Target consumed by the next integration when kinematic.
    pub kinematic_target: Option<KinematicTarget>,
}

impl RigidParticle {
    fn new(id: ParticleId, pose: Pose, mass: MassProperties, state: ObjectState) -> Self {
        Self {
            id,
            pose,
            prev_pose: pose,
            twist: Twist::zero(),
            mass,
            state,
            force: Vector3::zeros(),
            torque: Vector3::zeros(),
            shapes: Vec::new(),
            local_bounds: Aabb::default(),
            world_bounds: Aabb::point(pose.position),
            kinematic_target: None,
        }
    }

    /// This particle's id.
    #[must_use]
    pub fn id(&self) -> ParticleId {
        self.id
    }

    /// Whether any attached shape participates in collision.
    #[must_use]
    pub fn has_any_collision(&self) -> bool {
        self.shapes.iter().any(|s| s.collision.has_collision())
    }

    /// Recompute world bounds from the current pose, grown by `extension`
    /// to absorb small movement without re-registration.
    pub fn update_world_bounds(&mut self, extension: f64) {
        self.world_bounds = self.local_bounds.transformed_by(&self.pose).expanded(extension);
    }

    /// Accumulate a force through the center of mass for the next step.
    pub fn add_force(&mut self, force: Vector3<f64>) {
        self.force += force;
    }

    /// Accumulate a torque for the next step.
    pub fn add_torque(&mut self, torque: Vector3<f64>) {
        self.torque += torque;
    }

    /// Clear the force and torque accumulators.
    pub fn clear_forces(&mut self) {
        self.force = Vector3::zeros();
        self.torque = Vector3::zeros();
    }
}

/// Dense particle storage with stable ids.
///
/// Particles live in a dense vector for iteration; a hash map translates
/// [`ParticleId`]s. Removal swap-removes, so iteration order is not stable
/// across removals.
#[derive(Debug, Default)]
pub struct ParticleSet {
    particles: Vec<RigidParticle>,
    index: HashMap<ParticleId, usize>,
    next_id: u64,
}

impl ParticleSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of particles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Create a particle and return its id.
    pub fn create(
        &mut self,
        pose: Pose,
        mass: MassProperties,
        state: ObjectState,
    ) -> ParticleId {
        let id = ParticleId::new(self.next_id);
        self.next_id += 1;
        self.index.insert(id, self.particles.len());
        self.particles.push(RigidParticle::new(id, pose, mass, state));
        id
    }

    /// Remove a particle, returning its final state.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::UnknownParticle`] when `id` is not present.
    pub fn destroy(&mut self, id: ParticleId) -> Result<RigidParticle> {
        let dense = self
            .index
            .remove(&id)
            .ok_or(SolverError::UnknownParticle(id))?;
        let removed = self.particles.swap_remove(dense);
        if let Some(moved) = self.particles.get(dense) {
            self.index.insert(moved.id(), dense);
        }
        Ok(removed)
    }

    /// Whether `id` is present.
    #[must_use]
    pub fn contains(&self, id: ParticleId) -> bool {
        self.index.contains_key(&id)
    }

    /// Shared access to a particle.
    #[must_use]
    pub fn get(&self, id: ParticleId) -> Option<&RigidParticle> {
        self.index.get(&id).map(|&i| &self.particles[i])
    }

    /// Exclusive access to a particle.
    #[must_use]
    pub fn get_mut(&mut self, id: ParticleId) -> Option<&mut RigidParticle> {
        self.index.get(&id).map(|&i| &mut self.particles[i])
    }

    /// Iterate over all particles.
    pub fn iter(&self) -> impl Iterator<Item = &RigidParticle> {
        self.particles.iter()
    }

    /// Iterate mutably over all particles.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut RigidParticle> {
        self.particles.iter_mut()
    }
}
