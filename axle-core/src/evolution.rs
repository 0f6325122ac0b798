//! The minimal evolution loop.

use crate::{AccelerationStructure, EvolutionConfig, ParticleSet, RigidParticle};
use axle_contact::{IslandScratch, SolverBody, SolverBodyContainer};
use axle_suspension::SuspensionConstraints;
use axle_types::{
    KinematicTarget, MassProperties, ObjectState, ParticleId, Pose, Result, SolverError, Twist,
};
use nalgebra::{Matrix3, Quaternion, UnitQuaternion, Vector3};
use tracing::trace;

/// Integrate a rotation by an angular velocity over `dt`.
fn integrate_rotation(
    q: &UnitQuaternion<f64>,
    w: &Vector3<f64>,
    dt: f64,
) -> UnitQuaternion<f64> {
    let dq = Quaternion::from_parts(0.0, *w * dt);
    UnitQuaternion::from_quaternion(q.into_inner() + dq * q.into_inner() * 0.5)
}

/// Minimal rigid-body evolution: integration, suspension constraint
/// solving, and acceleration structure bookkeeping.
///
/// Each substep runs a fixed phase sequence:
///
/// 1. **Integrate** - save previous poses, apply gravity and accumulated
///    forces, advance dynamic poses, consume kinematic targets
/// 2. **Detect collisions** - refresh registered world bounds
/// 3. **Gather** - snapshot dynamic particles into solver bodies, bind
///    suspension constraints, inject hard-stop manifolds
/// 4. **Position phase** - suspension hard-stop and spring corrections,
///    iterated [`EvolutionConfig::num_position_iterations`] times
/// 5. **Update velocities** - rebuild velocities from the corrected poses
///    (backward difference)
/// 6. **Velocity phase** - hard-stop velocity cleanup, iterated
///    [`EvolutionConfig::num_velocity_iterations`] times
/// 7. **Scatter** - publish suspension results, write corrected poses and
///    velocities back to particles, clear force accumulators
///
/// # Example
///
/// ```
/// use axle_core::{EvolutionConfig, MinEvolution};
/// use axle_types::{MassProperties, ObjectState, Pose};
/// use nalgebra::Point3;
///
/// let mut evolution = MinEvolution::new(EvolutionConfig::default())?;
/// let body = evolution.create_particle(
///     Pose::from_position(Point3::new(0.0, 0.0, 10.0)),
///     MassProperties::sphere(5.0, 0.5),
///     ObjectState::Dynamic,
/// );
/// evolution.advance(1.0 / 60.0, 4)?;
/// let particle = evolution.particles().get(body).unwrap();
/// assert!(particle.pose.position.z < 10.0); // falling
/// # Ok::<(), axle_types::SolverError>(())
/// ```
#[derive(Debug, Default)]
pub struct MinEvolution {
    config: EvolutionConfig,
    particles: ParticleSet,
    suspension: SuspensionConstraints,
    bodies: SolverBodyContainer,
    island: IslandScratch,
    accel: AccelerationStructure,
    step_count: u64,
}

impl MinEvolution {
    /// Create an evolution with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::InvalidConfig`] when the configuration is
    /// invalid.
    pub fn new(config: EvolutionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    /// Current configuration.
    #[must_use]
    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    /// Replace the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::InvalidConfig`] when the configuration is
    /// invalid.
    pub fn set_config(&mut self, config: EvolutionConfig) -> Result<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// The particle storage.
    #[must_use]
    pub fn particles(&self) -> &ParticleSet {
        &self.particles
    }

    /// Mutable particle storage.
    pub fn particles_mut(&mut self) -> &mut ParticleSet {
        &mut self.particles
    }

    /// The suspension constraints.
    #[must_use]
    pub fn suspension(&self) -> &SuspensionConstraints {
        &self.suspension
    }

    /// Mutable suspension constraints.
    pub fn suspension_mut(&mut self) -> &mut SuspensionConstraints {
        &mut self.suspension
    }

    /// The collision acceleration structure.
    #[must_use]
    pub fn acceleration_structure(&self) -> &AccelerationStructure {
        &self.accel
    }

    /// Number of substeps advanced so far.
    #[must_use]
    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Create a particle.
    pub fn create_particle(
        &mut self,
        pose: Pose,
        mass: MassProperties,
        state: ObjectState,
    ) -> ParticleId {
        self.particles.create(pose, mass, state)
    }

    /// Destroy a particle: cached constraint state and the acceleration
    /// structure entry go with it. Suspension constraints still attached
    /// simply stop participating until re-pointed or removed.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::UnknownParticle`] when `id` is not present.
    pub fn destroy_particle(&mut self, id: ParticleId) -> Result<()> {
        self.suspension.clear_particle_state(id);
        self.accel.remove(id);
        self.particles.destroy(id).map(|_| ())
    }

    /// Refresh a particle's world bounds and, if registered, its
    /// acceleration structure entry. Call after externally mutating the
    /// particle's transform, velocities or geometry.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::UnknownParticle`] when `id` is not present.
    pub fn dirty_particle(&mut self, id: ParticleId) -> Result<()> {
        let extension = self.config.bounds_extension;
        let particle = self
            .particles
            .get_mut(id)
            .ok_or(SolverError::UnknownParticle(id))?;
        particle.update_world_bounds(extension);
        if self.accel.contains(id) {
            self.accel.update(id, particle.world_bounds);
        }
        Ok(())
    }

    /// Invalidate a particle after a geometry change: drop cached contact
    /// state, then refresh bounds and registration.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::UnknownParticle`] when `id` is not present.
    pub fn invalidate_particle(&mut self, id: ParticleId) -> Result<()> {
        self.destroy_particle_collisions(id)?;
        self.dirty_particle(id)
    }

    /// Drop cached contact state involving a particle.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::UnknownParticle`] when `id` is not present.
    pub fn destroy_particle_collisions(&mut self, id: ParticleId) -> Result<()> {
        if !self.particles.contains(id) {
            return Err(SolverError::UnknownParticle(id));
        }
        self.suspension.clear_particle_state(id);
        Ok(())
    }

    /// Re-derive acceleration structure membership from the particle's
    /// collision flags: present when any shape has collision (or `force`
    /// is set), absent otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::UnknownParticle`] when `id` is not present.
    pub fn refresh_collision_registration(&mut self, id: ParticleId, force: bool) -> Result<()> {
        let particle = self
            .particles
            .get(id)
            .ok_or(SolverError::UnknownParticle(id))?;
        if force || particle.has_any_collision() {
            self.accel.update(id, particle.world_bounds);
        } else {
            self.accel.remove(id);
        }
        Ok(())
    }

    /// Remove a particle from the acceleration structure without touching
    /// its shapes. Returns whether it was registered.
    pub fn remove_from_acceleration_structure(&mut self, id: ParticleId) -> bool {
        self.accel.remove(id)
    }

    /// Re-admit a particle to solving: refresh its world bounds and
    /// re-derive acceleration structure membership from its collision
    /// flags. The counterpart of
    /// [`Self::remove_from_acceleration_structure`].
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::UnknownParticle`] when `id` is not present.
    pub fn enable_particle(&mut self, id: ParticleId) -> Result<()> {
        self.dirty_particle(id)?;
        self.refresh_collision_registration(id, false)
    }

    /// Queue a kinematic target for the next integration.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::UnknownParticle`] when `id` is not present.
    pub fn set_particle_kinematic_target(
        &mut self,
        id: ParticleId,
        target: KinematicTarget,
    ) -> Result<()> {
        let particle = self
            .particles
            .get_mut(id)
            .ok_or(SolverError::UnknownParticle(id))?;
        particle.kinematic_target = Some(target);
        self.dirty_particle(id)
    }

    /// Advance the simulation by `num_steps` substeps of `step_dt` each.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::InvalidTimestep`] when `step_dt` is not
    /// positive and finite.
    pub fn advance(&mut self, step_dt: f64, num_steps: u32) -> Result<()> {
        if !step_dt.is_finite() || step_dt <= 0.0 {
            return Err(SolverError::InvalidTimestep(step_dt));
        }
        trace!(step_dt, num_steps, "advancing evolution");
        for _ in 0..num_steps {
            self.advance_one_time_step(step_dt);
        }
        Ok(())
    }

    fn advance_one_time_step(&mut self, dt: f64) {
        self.integrate(dt);
        self.detect_collisions();
        self.gather_input(dt);
        for _ in 0..self.config.num_position_iterations {
            self.suspension.apply_phase1(dt, &mut self.bodies, &self.island);
        }
        self.update_velocities(dt);
        for _ in 0..self.config.num_velocity_iterations {
            self.suspension.apply_phase2(dt, &mut self.bodies, &self.island);
        }
        self.scatter_output(dt);
        self.step_count += 1;
    }

    fn integrate(&mut self, dt: f64) {
        let gravity = self.config.gravity.acceleration;
        let extension = self.config.bounds_extension;

        for particle in self.particles.iter_mut() {
            particle.prev_pose = particle.pose;
            match particle.state {
                ObjectState::Dynamic => {
                    integrate_dynamic(particle, gravity, dt);
                    particle.update_world_bounds(extension);
                }
                ObjectState::Kinematic => {
                    integrate_kinematic(particle, dt);
                    particle.update_world_bounds(extension);
                }
                ObjectState::Static | ObjectState::Sleeping => {}
            }
        }
    }

    fn detect_collisions(&mut self) {
        // Narrowphase pair generation is out of scope; the structure is
        // kept current so queries and the sync layer see fresh bounds.
        for particle in self.particles.iter() {
            if self.accel.contains(particle.id()) {
                self.accel.update(particle.id(), particle.world_bounds);
            }
        }
    }

    fn gather_input(&mut self, dt: f64) {
        self.bodies.reset();
        for particle in self.particles.iter() {
            if !particle.state.is_dynamic() {
                continue;
            }
            let id = particle.id();
            self.bodies.find_or_add(id, || {
                SolverBody::from_particle(
                    id,
                    particle.prev_pose.position,
                    particle.prev_pose.rotation,
                    particle.pose.position,
                    particle.pose.rotation,
                    particle.twist,
                    &particle.mass,
                    particle.state,
                )
            });
        }
        self.suspension.pre_gather_input(dt, &self.bodies, &mut self.island);
    }

    fn update_velocities(&mut self, dt: f64) {
        for body in self.bodies.iter_mut() {
            if body.is_dynamic() {
                let v = body.implicit_velocity(dt);
                let w = body.implicit_angular_velocity(dt);
                body.set_v(v);
                body.set_w(w);
            }
        }
    }

    fn scatter_output(&mut self, dt: f64) {
        self.suspension.scatter_output(dt, &self.island);

        let extension = self.config.bounds_extension;
        for body in self.bodies.iter() {
            if !body.is_dynamic() {
                continue;
            }
            if let Some(particle) = self.particles.get_mut(body.particle()) {
                let (position, rotation) = body.corrected_actor_pose();
                particle.pose = Pose::from_position_rotation(position, rotation);
                particle.twist = Twist::new(body.v(), body.w());
                particle.update_world_bounds(extension);
            }
        }
        for particle in self.particles.iter_mut() {
            particle.clear_forces();
        }
        self.bodies.reset();
    }
}

fn integrate_dynamic(particle: &mut RigidParticle, gravity: Vector3<f64>, dt: f64) {
    let inv_mass = particle.mass.inv_mass();
    if inv_mass > 0.0 {
        particle.twist.linear += (gravity + particle.force * inv_mass) * dt;
        let q = particle.pose.rotation * particle.mass.rotation_of_mass;
        let rot = q.to_rotation_matrix();
        let inv_inertia_world =
            rot * Matrix3::from_diagonal(&particle.mass.inv_inertia()) * rot.transpose();
        particle.twist.angular += inv_inertia_world * particle.torque * dt;
    }
    particle.pose.position += particle.twist.linear * dt;
    particle.pose.rotation =
        integrate_rotation(&particle.pose.rotation, &particle.twist.angular, dt);
}

/// Kinematic particles follow their queued target; the target is consumed.
/// A position target also rewrites the velocities to the implied motion, so
/// downstream consumers see consistent state.
fn integrate_kinematic(particle: &mut RigidParticle, dt: f64) {
    match particle.kinematic_target.take() {
        Some(KinematicTarget::Position(target)) => {
            if dt > 0.0 {
                particle.twist.linear = (target.position - particle.pose.position) / dt;
                particle.twist.angular =
                    (target.rotation * particle.pose.rotation.inverse()).scaled_axis() / dt;
            }
            particle.pose = target;
        }
        Some(KinematicTarget::Velocity) | None => {
            particle.pose.position += particle.twist.linear * dt;
            particle.pose.rotation =
                integrate_rotation(&particle.pose.rotation, &particle.twist.angular, dt);
        }
    }
}
