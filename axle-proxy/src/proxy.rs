//! The per-particle sync proxy.

use crate::{DirtyParticleData, ProxyConfig, PullData};
use axle_core::MinEvolution;
use axle_types::{ObjectState, ParticleId, Pose, Result, SolverError, Twist};
use nalgebra::{Matrix3, Point3, UnitQuaternion, Vector3};
use tracing::trace;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A game-thread write recorded while the simulation was in flight.
///
/// The timestamp is the external frame the write happened in. At pull time
/// it is compared against the solver step's consumed timestamp to decide
/// whether the simulation result already reflects the write.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Overwrite<T> {
    /// External frame of the write.
    pub timestamp: u64,
    /// Value written.
    pub value: T,
}

/// Per-channel overwrite records.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProxyTimestamps {
    /// Position overwrite.
    pub position: Option<Overwrite<Point3<f64>>>,
    /// Rotation overwrite.
    pub rotation: Option<Overwrite<UnitQuaternion<f64>>>,
    /// Linear velocity overwrite.
    pub linear_velocity: Option<Overwrite<Vector3<f64>>>,
    /// Angular velocity overwrite.
    pub angular_velocity: Option<Overwrite<Vector3<f64>>>,
    /// External frame of the last object state write, if any.
    pub object_state: Option<u64>,
}

/// The game thread's view of one particle.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExternalState {
    /// Transform.
    pub pose: Pose,
    /// Velocities.
    pub twist: Twist,
    /// Object state.
    pub object_state: ObjectState,
}

impl Default for ExternalState {
    fn default() -> Self {
        Self {
            pose: Pose::identity(),
            twist: Twist::zero(),
            object_state: ObjectState::Dynamic,
        }
    }
}

/// Two-way state sync for one particle.
///
/// The proxy owns the game thread's view ([`ExternalState`]) and the
/// per-channel overwrite records. Data flows in both directions:
///
/// - **Push**: [`Self::push_to_physics_state`] applies accumulated
///   [`DirtyParticleData`] to the simulation, with the side effects each
///   change requires (bounds refresh, contact invalidation, acceleration
///   structure registration).
/// - **Pull**: [`Self::pull_from_physics_state`] writes buffered results
///   back into the external state, reconciling per channel against
///   overwrites the game thread made while the step was in flight.
#[derive(Debug, Clone)]
pub struct ParticleProxy {
    particle: ParticleId,
    external: ExternalState,
    timestamps: ProxyTimestamps,
}

impl ParticleProxy {
    /// Create a proxy for `particle` with an initial external view.
    #[must_use]
    pub fn new(particle: ParticleId, external: ExternalState) -> Self {
        Self {
            particle,
            external,
            timestamps: ProxyTimestamps::default(),
        }
    }

    /// The particle this proxy syncs.
    #[must_use]
    pub fn particle(&self) -> ParticleId {
        self.particle
    }

    /// The game thread's current view.
    #[must_use]
    pub fn external(&self) -> &ExternalState {
        &self.external
    }

    /// Recorded overwrites.
    #[must_use]
    pub fn timestamps(&self) -> &ProxyTimestamps {
        &self.timestamps
    }

    /// Record a game-thread position write at `timestamp`.
    pub fn write_position(&mut self, position: Point3<f64>, timestamp: u64) {
        self.external.pose.position = position;
        self.timestamps.position = Some(Overwrite {
            timestamp,
            value: position,
        });
    }

    /// Record a game-thread rotation write at `timestamp`.
    pub fn write_rotation(&mut self, rotation: UnitQuaternion<f64>, timestamp: u64) {
        self.external.pose.rotation = rotation;
        self.timestamps.rotation = Some(Overwrite {
            timestamp,
            value: rotation,
        });
    }

    /// Record a game-thread linear velocity write at `timestamp`.
    pub fn write_linear_velocity(&mut self, v: Vector3<f64>, timestamp: u64) {
        self.external.twist.linear = v;
        self.timestamps.linear_velocity = Some(Overwrite {
            timestamp,
            value: v,
        });
    }

    /// Record a game-thread angular velocity write at `timestamp`.
    pub fn write_angular_velocity(&mut self, w: Vector3<f64>, timestamp: u64) {
        self.external.twist.angular = w;
        self.timestamps.angular_velocity = Some(Overwrite {
            timestamp,
            value: w,
        });
    }

    /// Record a game-thread object state write at `timestamp`.
    pub fn write_object_state(&mut self, state: ObjectState, timestamp: u64) {
        self.external.object_state = state;
        self.timestamps.object_state = Some(timestamp);
    }

    /// Drop all recorded overwrites.
    pub fn clear_accumulated_data(&mut self) {
        self.timestamps = ProxyTimestamps::default();
    }

    /// Apply accumulated game-thread changes to the simulation.
    ///
    /// Changes are applied in a fixed order with their side effects:
    /// geometry first (invalidates cached contacts), then transform, mass,
    /// velocities, kinematic target, forces and impulses, flags, and
    /// per-shape updates. One bounds refresh covers every transform-like
    /// change; acceleration structure membership is re-derived by OR-ing
    /// collision flags across *all* shapes whenever any collision flag (or
    /// the geometry itself) changed.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::UnknownParticle`] when the particle is gone
    /// and [`SolverError::ShapeIndexOutOfRange`] for a bad per-shape
    /// update. Changes already applied stay applied.
    pub fn push_to_physics_state(
        &mut self,
        evolution: &mut MinEvolution,
        mut dirty: DirtyParticleData,
        config: &ProxyConfig,
    ) -> Result<()> {
        let id = self.particle;
        let mut moved = false;
        let mut collision_changed = false;

        if let Some(non_frequent) = dirty.non_frequent.take() {
            let particle = evolution
                .particles_mut()
                .get_mut(id)
                .ok_or(SolverError::UnknownParticle(id))?;
            particle.shapes = non_frequent.shapes;
            particle.local_bounds = non_frequent.local_bounds;
            evolution.invalidate_particle(id)?;
            collision_changed = true;
            moved = true;
        }
        if let Some(pose) = dirty.xr.take() {
            let particle = evolution
                .particles_mut()
                .get_mut(id)
                .ok_or(SolverError::UnknownParticle(id))?;
            particle.pose = pose;
            particle.prev_pose = pose;
            moved = true;
        }
        if let Some(mass) = dirty.mass_props.take() {
            let particle = evolution
                .particles_mut()
                .get_mut(id)
                .ok_or(SolverError::UnknownParticle(id))?;
            particle.mass = mass;
        }
        if let Some(twist) = dirty.velocities.take() {
            let particle = evolution
                .particles_mut()
                .get_mut(id)
                .ok_or(SolverError::UnknownParticle(id))?;
            particle.twist = twist;
            moved = true;
        }
        if let Some(target) = dirty.kinematic_target.take() {
            evolution.set_particle_kinematic_target(id, target)?;
            moved = true;
        }
        if let Some(dynamics) = dirty.dynamics.take() {
            let particle = evolution
                .particles_mut()
                .get_mut(id)
                .ok_or(SolverError::UnknownParticle(id))?;
            particle.add_force(dynamics.force);
            particle.add_torque(dynamics.torque);
            particle.twist.linear += dynamics.linear_impulse * particle.mass.inv_mass();
            let q = particle.pose.rotation * particle.mass.rotation_of_mass;
            let rot = q.to_rotation_matrix();
            let inv_inertia =
                rot * Matrix3::from_diagonal(&particle.mass.inv_inertia()) * rot.transpose();
            particle.twist.angular += inv_inertia * dynamics.angular_impulse;
        }
        if let Some(misc) = dirty.misc.take() {
            let particle = evolution
                .particles_mut()
                .get_mut(id)
                .ok_or(SolverError::UnknownParticle(id))?;
            particle.state = misc.object_state;
        }
        for update in dirty.shapes.drain(..) {
            let particle = evolution
                .particles_mut()
                .get_mut(id)
                .ok_or(SolverError::UnknownParticle(id))?;
            let count = particle.shapes.len();
            let shape = particle.shapes.get_mut(update.shape_index).ok_or(
                SolverError::ShapeIndexOutOfRange {
                    index: update.shape_index,
                    count,
                },
            )?;
            if let Some(collision) = update.collision {
                shape.collision = collision;
                collision_changed = true;
            }
            if let Some(material) = update.material {
                shape.material = material;
            }
        }

        if moved {
            evolution.dirty_particle(id)?;
        }
        if collision_changed {
            evolution
                .refresh_collision_registration(id, config.force_all_into_acceleration_structure)?;
        }
        Ok(())
    }

    /// Capture this particle's end-of-step state from the evolution.
    #[must_use]
    pub fn buffer_physics_results(&self, evolution: &MinEvolution) -> Option<PullData> {
        evolution
            .particles()
            .get(self.particle)
            .map(PullData::from_particle)
    }

    /// Write buffered simulation results into the external state.
    ///
    /// With `next` present, channels interpolate between `current` and
    /// `next` by `alpha` in `[0, 1]`; otherwise `current` is applied
    /// directly. Each channel reconciles against its overwrite record:
    ///
    /// - overwrite older than `solver_timestamp`: the step consumed the
    ///   write, the simulation result wins and the record is dropped
    /// - overwrite exactly at `solver_timestamp`: the write is this step's
    ///   input; interpolation runs *from the written value* towards `next`,
    ///   and without `next` the simulation result already reflects the
    ///   write and wins
    /// - overwrite newer than `solver_timestamp`: the game thread is
    ///   ahead, its value stands
    ///
    /// `leash_alpha`, when set, blends the interpolated result from the
    /// current external value towards the reconciled target instead of
    /// snapping; a direct (non-interpolating) pull ignores it.
    ///
    /// Kinematic particles skip position and rotation sync unless
    /// [`ProxyConfig::sync_kinematic_on_game_thread`] is set; velocities
    /// sync regardless. Object state follows the current snapshot as soon
    /// as its last write is consumed; a write consumed exactly this step
    /// holds the state until interpolation reaches the next snapshot.
    #[allow(clippy::too_many_lines)]
    pub fn pull_from_physics_state(
        &mut self,
        current: &PullData,
        solver_timestamp: u64,
        next: Option<&PullData>,
        alpha: f64,
        leash_alpha: Option<f64>,
        config: &ProxyConfig,
    ) {
        if current.particle != self.particle {
            trace!(
                particle = %self.particle,
                pulled = %current.particle,
                "pull data for a different particle, ignoring"
            );
            return;
        }
        let alpha = alpha.clamp(0.0, 1.0);

        let lerp_vec = |a: Vector3<f64>, b: Vector3<f64>, t: f64| a.lerp(&b, t);
        let lerp_point =
            |a: Point3<f64>, b: Point3<f64>, t: f64| Point3::from(a.coords.lerp(&b.coords, t));
        let lerp_rot =
            |a: UnitQuaternion<f64>, b: UnitQuaternion<f64>, t: f64| a.nlerp(&b, t);

        // Leash smoothing only applies to the interpolating path.
        let leash = match next {
            Some(_) => leash_alpha.map(|l| l.clamp(0.0, 1.0)),
            None => None,
        };

        let sync_xr =
            !self.external.object_state.is_kinematic() || config.sync_kinematic_on_game_thread;
        if sync_xr {
            let mut position = reconcile(
                &self.timestamps.position,
                solver_timestamp,
                current.position,
                next.map(|n| n.position),
                alpha,
                self.external.pose.position,
                lerp_point,
            );
            let mut rotation = reconcile(
                &self.timestamps.rotation,
                solver_timestamp,
                current.rotation,
                next.map(|n| n.rotation),
                alpha,
                self.external.pose.rotation,
                lerp_rot,
            );
            if let Some(leash) = leash {
                position = lerp_point(self.external.pose.position, position, leash);
                rotation = lerp_rot(self.external.pose.rotation, rotation, leash);
            }
            self.external.pose.position = position;
            self.external.pose.rotation = rotation;
        }

        // Velocities sync even for kinematic particles; the kinematic skip
        // covers the transform only.
        let mut linear = reconcile(
            &self.timestamps.linear_velocity,
            solver_timestamp,
            current.linear_velocity,
            next.map(|n| n.linear_velocity),
            alpha,
            self.external.twist.linear,
            lerp_vec,
        );
        let mut angular = reconcile(
            &self.timestamps.angular_velocity,
            solver_timestamp,
            current.angular_velocity,
            next.map(|n| n.angular_velocity),
            alpha,
            self.external.twist.angular,
            lerp_vec,
        );
        if let Some(leash) = leash {
            linear = lerp_vec(self.external.twist.linear, linear, leash);
            angular = lerp_vec(self.external.twist.angular, angular, leash);
        }
        self.external.twist.linear = linear;
        self.external.twist.angular = angular;

        // Object state follows the current snapshot once its last write is
        // consumed; a write consumed exactly this step holds the state
        // until interpolation reaches the next snapshot.
        match self.timestamps.object_state {
            Some(ts) if ts > solver_timestamp => {}
            Some(ts) if ts == solver_timestamp => {
                if let Some(n) = next {
                    if alpha >= 1.0 {
                        self.external.object_state = n.object_state;
                    }
                }
            }
            _ => self.external.object_state = current.object_state,
        }

        let reached_snapshot = next.is_none() || alpha >= 1.0;
        self.expire_overwrites(solver_timestamp, reached_snapshot);
    }

    /// Drop overwrite records the simulation has caught up with.
    fn expire_overwrites(&mut self, solver_timestamp: u64, reached_snapshot: bool) {
        let expired =
            |ts: u64| ts < solver_timestamp || (ts == solver_timestamp && reached_snapshot);
        if self.timestamps.position.is_some_and(|ow| expired(ow.timestamp)) {
            self.timestamps.position = None;
        }
        if self.timestamps.rotation.is_some_and(|ow| expired(ow.timestamp)) {
            self.timestamps.rotation = None;
        }
        if self
            .timestamps
            .linear_velocity
            .is_some_and(|ow| expired(ow.timestamp))
        {
            self.timestamps.linear_velocity = None;
        }
        if self
            .timestamps
            .angular_velocity
            .is_some_and(|ow| expired(ow.timestamp))
        {
            self.timestamps.angular_velocity = None;
        }
        if self.timestamps.object_state.is_some_and(expired) {
            self.timestamps.object_state = None;
        }
    }
}

/// Per-channel reconciliation of a simulation result against a possible
/// game-thread overwrite.
fn reconcile<T: Copy>(
    overwrite: &Option<Overwrite<T>>,
    solver_timestamp: u64,
    current: T,
    next: Option<T>,
    alpha: f64,
    external: T,
    lerp: impl Fn(T, T, f64) -> T,
) -> T {
    match overwrite {
        // Game thread is ahead of this result: its value stands.
        Some(ow) if ow.timestamp > solver_timestamp => external,
        // The write is exactly this step's input: interpolate from it, or
        // without a next snapshot take the result that consumed it.
        Some(ow) if ow.timestamp == solver_timestamp => match next {
            Some(n) => lerp(ow.value, n, alpha),
            None => current,
        },
        // Consumed write (or none): the simulation result wins.
        _ => match next {
            Some(n) => lerp(current, n, alpha),
            None => current,
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use axle_core::EvolutionConfig;
    use axle_types::{CollisionData, MassProperties, ParticleShape};
    use crate::{DirtyDynamics, DirtyMisc, NonFrequentData, ShapeDirtyData};

    fn pull_at(particle: ParticleId, z: f64) -> PullData {
        PullData {
            particle,
            position: Point3::new(0.0, 0.0, z),
            rotation: UnitQuaternion::identity(),
            linear_velocity: Vector3::zeros(),
            angular_velocity: Vector3::zeros(),
            object_state: ObjectState::Dynamic,
        }
    }

    fn proxy(id: u64) -> ParticleProxy {
        ParticleProxy::new(ParticleId::new(id), ExternalState::default())
    }

    fn evolution_with_particle() -> (MinEvolution, ParticleId) {
        let mut evolution = MinEvolution::new(EvolutionConfig::default()).unwrap();
        let id = evolution.create_particle(
            Pose::identity(),
            MassProperties::sphere(2.0, 0.5),
            ObjectState::Dynamic,
        );
        (evolution, id)
    }

    #[test]
    fn test_push_transform_and_velocities() {
        let (mut evolution, id) = evolution_with_particle();
        let mut proxy = ParticleProxy::new(id, ExternalState::default());
        let dirty = DirtyParticleData {
            xr: Some(Pose::from_position(Point3::new(1.0, 2.0, 3.0))),
            velocities: Some(Twist::linear(Vector3::new(0.0, 0.0, -1.0))),
            ..DirtyParticleData::default()
        };
        proxy
            .push_to_physics_state(&mut evolution, dirty, &ProxyConfig::default())
            .unwrap();

        let particle = evolution.particles().get(id).unwrap();
        assert_eq!(particle.pose.position, Point3::new(1.0, 2.0, 3.0));
        assert_eq!(particle.prev_pose.position, Point3::new(1.0, 2.0, 3.0));
        assert_eq!(particle.twist.linear.z, -1.0);
        // Bounds were refreshed around the new position.
        assert!(particle.world_bounds.min.z <= 3.0 && particle.world_bounds.max.z >= 3.0);
    }

    #[test]
    fn test_push_geometry_registers_collision() {
        let (mut evolution, id) = evolution_with_particle();
        let mut proxy = ParticleProxy::new(id, ExternalState::default());
        let dirty = DirtyParticleData {
            non_frequent: Some(NonFrequentData {
                shapes: vec![ParticleShape::with_collision()],
                local_bounds: axle_core::Aabb::from_half_extents(
                    Point3::origin(),
                    Vector3::repeat(0.5),
                ),
            }),
            ..DirtyParticleData::default()
        };
        proxy
            .push_to_physics_state(&mut evolution, dirty, &ProxyConfig::default())
            .unwrap();
        assert!(evolution.acceleration_structure().contains(id));

        // Disabling the only shape's collision drops the registration.
        let dirty = DirtyParticleData {
            shapes: vec![ShapeDirtyData {
                shape_index: 0,
                collision: Some(CollisionData::disabled()),
                material: None,
            }],
            ..DirtyParticleData::default()
        };
        proxy
            .push_to_physics_state(&mut evolution, dirty, &ProxyConfig::default())
            .unwrap();
        assert!(!evolution.acceleration_structure().contains(id));
    }

    #[test]
    fn test_push_force_registration_overrides_flags() {
        let (mut evolution, id) = evolution_with_particle();
        let mut proxy = ParticleProxy::new(id, ExternalState::default());
        let config = ProxyConfig {
            force_all_into_acceleration_structure: true,
            ..ProxyConfig::default()
        };
        let dirty = DirtyParticleData {
            non_frequent: Some(NonFrequentData {
                shapes: vec![ParticleShape::default()], // collision disabled
                local_bounds: axle_core::Aabb::default(),
            }),
            ..DirtyParticleData::default()
        };
        proxy.push_to_physics_state(&mut evolution, dirty, &config).unwrap();
        assert!(evolution.acceleration_structure().contains(id));
    }

    #[test]
    fn test_push_shape_index_out_of_range() {
        let (mut evolution, id) = evolution_with_particle();
        let mut proxy = ParticleProxy::new(id, ExternalState::default());
        let dirty = DirtyParticleData {
            shapes: vec![ShapeDirtyData {
                shape_index: 3,
                collision: Some(CollisionData::enabled()),
                material: None,
            }],
            ..DirtyParticleData::default()
        };
        assert!(matches!(
            proxy.push_to_physics_state(&mut evolution, dirty, &ProxyConfig::default()),
            Err(SolverError::ShapeIndexOutOfRange { index: 3, count: 0 })
        ));
    }

    #[test]
    fn test_push_impulses_change_velocity() {
        let (mut evolution, id) = evolution_with_particle();
        let mut proxy = ParticleProxy::new(id, ExternalState::default());
        let dirty = DirtyParticleData {
            dynamics: Some(DirtyDynamics {
                linear_impulse: Vector3::new(0.0, 4.0, 0.0), // 2 kg body
                ..DirtyDynamics::default()
            }),
            ..DirtyParticleData::default()
        };
        proxy
            .push_to_physics_state(&mut evolution, dirty, &ProxyConfig::default())
            .unwrap();
        assert_relative_eq!(
            evolution.particles().get(id).unwrap().twist.linear.y,
            2.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_push_misc_changes_object_state() {
        let (mut evolution, id) = evolution_with_particle();
        let mut proxy = ParticleProxy::new(id, ExternalState::default());
        let dirty = DirtyParticleData {
            misc: Some(DirtyMisc {
                object_state: ObjectState::Kinematic,
            }),
            ..DirtyParticleData::default()
        };
        proxy
            .push_to_physics_state(&mut evolution, dirty, &ProxyConfig::default())
            .unwrap();
        assert_eq!(
            evolution.particles().get(id).unwrap().state,
            ObjectState::Kinematic
        );
    }

    #[test]
    fn test_pull_without_next_applies_sim_state() {
        let mut proxy = proxy(1);
        let current = pull_at(proxy.particle(), 5.0);
        proxy.pull_from_physics_state(&current, 10, None, 1.0, None, &ProxyConfig::default());
        assert_eq!(proxy.external().pose.position.z, 5.0);
        assert_eq!(proxy.external().object_state, ObjectState::Dynamic);
    }

    #[test]
    fn test_pull_interpolates_between_snapshots() {
        let mut proxy = proxy(1);
        let current = pull_at(proxy.particle(), 0.0);
        let next = pull_at(proxy.particle(), 1.0);
        proxy.pull_from_physics_state(
            &current,
            10,
            Some(&next),
            0.25,
            None,
            &ProxyConfig::default(),
        );
        assert_relative_eq!(proxy.external().pose.position.z, 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_pull_respects_newer_overwrite() {
        let mut proxy = proxy(1);
        // Game thread wrote at frame 12; the step only consumed frame 10.
        proxy.write_position(Point3::new(0.0, 0.0, 100.0), 12);
        let current = pull_at(proxy.particle(), 5.0);
        proxy.pull_from_physics_state(&current, 10, None, 1.0, None, &ProxyConfig::default());
        assert_eq!(proxy.external().pose.position.z, 100.0);
        // The record survives for the next pull.
        assert!(proxy.timestamps().position.is_some());
    }

    #[test]
    fn test_pull_consumed_overwrite_yields_to_sim() {
        let mut proxy = proxy(1);
        proxy.write_position(Point3::new(0.0, 0.0, 100.0), 8);
        let current = pull_at(proxy.particle(), 5.0);
        proxy.pull_from_physics_state(&current, 10, None, 1.0, None, &ProxyConfig::default());
        assert_eq!(proxy.external().pose.position.z, 5.0);
        assert!(proxy.timestamps().position.is_none());
    }

    #[test]
    fn test_pull_overwrite_at_sync_is_lerp_source() {
        let mut proxy = proxy(1);
        proxy.write_position(Point3::new(0.0, 0.0, 2.0), 10);
        let current = pull_at(proxy.particle(), 0.0);
        let next = pull_at(proxy.particle(), 4.0);
        proxy.pull_from_physics_state(
            &current,
            10,
            Some(&next),
            0.5,
            None,
            &ProxyConfig::default(),
        );
        // Halfway from the written value (2) to next (4), not from current (0).
        assert_relative_eq!(proxy.external().pose.position.z, 3.0, epsilon = 1e-12);
        // Not fully consumed until alpha reaches 1.
        assert!(proxy.timestamps().position.is_some());

        proxy.pull_from_physics_state(
            &current,
            10,
            Some(&next),
            1.0,
            None,
            &ProxyConfig::default(),
        );
        assert_relative_eq!(proxy.external().pose.position.z, 4.0, epsilon = 1e-12);
        assert!(proxy.timestamps().position.is_none());
    }

    #[test]
    fn test_pull_overwrite_at_sync_without_next_yields_to_sim() {
        let mut proxy = proxy(1);
        proxy.write_position(Point3::new(0.0, 0.0, 100.0), 10);
        let current = pull_at(proxy.particle(), 5.0);
        proxy.pull_from_physics_state(&current, 10, None, 1.0, None, &ProxyConfig::default());
        // The step at the sync timestamp consumed the write; its result wins.
        assert_eq!(proxy.external().pose.position.z, 5.0);
        assert!(proxy.timestamps().position.is_none());
    }

    #[test]
    fn test_pull_overwrites_are_per_channel() {
        let mut proxy = proxy(1);
        proxy.write_linear_velocity(Vector3::new(9.0, 0.0, 0.0), 12);
        let current = pull_at(proxy.particle(), 5.0);
        proxy.pull_from_physics_state(&current, 10, None, 1.0, None, &ProxyConfig::default());
        // Position follows the sim; the velocity overwrite stands.
        assert_eq!(proxy.external().pose.position.z, 5.0);
        assert_eq!(proxy.external().twist.linear.x, 9.0);
    }

    #[test]
    fn test_pull_leash_blends_towards_target() {
        let mut proxy = proxy(1);
        let current = pull_at(proxy.particle(), 8.0);
        let next = pull_at(proxy.particle(), 12.0);
        proxy.pull_from_physics_state(
            &current,
            10,
            Some(&next),
            0.5,
            Some(0.25),
            &ProxyConfig::default(),
        );
        // Interpolated target is 10; external was at 0, a quarter of the way.
        assert_relative_eq!(proxy.external().pose.position.z, 2.5, epsilon = 1e-12);
    }

    #[test]
    fn test_pull_leash_ignored_without_next() {
        let mut proxy = proxy(1);
        let current = pull_at(proxy.particle(), 10.0);
        proxy.pull_from_physics_state(
            &current,
            10,
            None,
            1.0,
            Some(0.25),
            &ProxyConfig::default(),
        );
        // A direct pull applies the result as-is.
        assert_relative_eq!(proxy.external().pose.position.z, 10.0, epsilon = 1e-12);
    }

    #[test]
    fn test_pull_skips_kinematic_transform_by_default() {
        let mut proxy = proxy(1);
        proxy.external.object_state = ObjectState::Kinematic;
        let mut current = pull_at(proxy.particle(), 5.0);
        current.object_state = ObjectState::Kinematic;
        current.linear_velocity = Vector3::new(0.0, 0.0, -3.0);
        proxy.pull_from_physics_state(&current, 10, None, 1.0, None, &ProxyConfig::default());
        // Transform is authoritative on the game thread...
        assert_eq!(proxy.external().pose.position.z, 0.0);
        // ...but velocities still sync.
        assert_eq!(proxy.external().twist.linear.z, -3.0);

        let config = ProxyConfig {
            sync_kinematic_on_game_thread: true,
            ..ProxyConfig::default()
        };
        proxy.pull_from_physics_state(&current, 10, None, 1.0, None, &config);
        assert_eq!(proxy.external().pose.position.z, 5.0);
    }

    #[test]
    fn test_pull_object_state_follows_current_mid_interpolation() {
        let mut proxy = proxy(1);
        proxy.external.object_state = ObjectState::Sleeping;
        let current = pull_at(proxy.particle(), 0.0);
        let next = pull_at(proxy.particle(), 1.0);
        proxy.pull_from_physics_state(
            &current,
            10,
            Some(&next),
            0.5,
            None,
            &ProxyConfig::default(),
        );
        // No pending write: the current snapshot's state applies at any alpha.
        assert_eq!(proxy.external().object_state, ObjectState::Dynamic);
    }

    #[test]
    fn test_pull_object_state_write_at_sync_holds_until_full_alpha() {
        let mut proxy = proxy(1);
        proxy.write_object_state(ObjectState::Kinematic, 10);
        let mut current = pull_at(proxy.particle(), 0.0);
        current.object_state = ObjectState::Dynamic;
        let mut next = pull_at(proxy.particle(), 1.0);
        next.object_state = ObjectState::Sleeping;
        let config = ProxyConfig {
            sync_kinematic_on_game_thread: true,
            ..ProxyConfig::default()
        };

        proxy.pull_from_physics_state(&current, 10, Some(&next), 0.5, None, &config);
        // The write is this window's starting point and stands mid-window.
        assert_eq!(proxy.external().object_state, ObjectState::Kinematic);

        proxy.pull_from_physics_state(&current, 10, Some(&next), 1.0, None, &config);
        // Reaching the next snapshot advances past the written state.
        assert_eq!(proxy.external().object_state, ObjectState::Sleeping);
        assert!(proxy.timestamps().object_state.is_none());
    }

    #[test]
    fn test_pull_object_state_respects_newer_write() {
        let mut proxy = proxy(1);
        proxy.write_object_state(ObjectState::Kinematic, 12);
        let mut current = pull_at(proxy.particle(), 0.0);
        current.object_state = ObjectState::Dynamic;
        let config = ProxyConfig {
            sync_kinematic_on_game_thread: true,
            ..ProxyConfig::default()
        };
        proxy.pull_from_physics_state(&current, 10, None, 1.0, None, &config);
        // The state write at frame 12 hasn't been consumed yet.
        assert_eq!(proxy.external().object_state, ObjectState::Kinematic);
    }

    #[test]
    fn test_pull_ignores_foreign_particle() {
        let mut proxy = proxy(1);
        let current = pull_at(ParticleId::new(2), 5.0);
        proxy.pull_from_physics_state(&current, 10, None, 1.0, None, &ProxyConfig::default());
        assert_eq!(proxy.external().pose.position.z, 0.0);
    }

    #[test]
    fn test_buffer_physics_results_round_trip() {
        let (mut evolution, id) = evolution_with_particle();
        let mut proxy = ParticleProxy::new(id, ExternalState::default());
        evolution.advance(1.0 / 60.0, 2).unwrap();
        let pulled = proxy.buffer_physics_results(&evolution).unwrap();
        assert!(pulled.position.z < 0.0); // fell under gravity
        proxy.pull_from_physics_state(&pulled, 1, None, 1.0, None, &ProxyConfig::default());
        assert_eq!(proxy.external().pose.position, pulled.position);
        assert_eq!(proxy.external().twist.linear, pulled.linear_velocity);
    }
}
