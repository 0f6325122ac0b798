//! The per-step solver body.
//!
//! A [`SolverBody`] is the read/write unit constraint solving mutates. It
//! carries the body's start-of-substep pose, the positional and rotational
//! corrections accumulated so far this substep, velocities, and inverse mass
//! properties. The pose is the *center-of-mass* pose in the principal
//! inertia frame; the actor-frame offsets (`center_of_mass`,
//! `rotation_of_mass`) are kept alongside so constraints can map actor-local
//! attachment points into this frame.
//!
//! Mutating a solver body through [`SolverBody::apply_transform_delta`] is
//! the only way constraint solving communicates a correction, and it is safe
//! to do repeatedly within a single step: multiple constraints may touch the
//! same body.

use axle_types::{MassProperties, ObjectState, ParticleId, Twist};
use nalgebra::{Matrix3, Point3, Quaternion, UnitQuaternion, Vector3};

/// Minimal physical state of one body during a solve step.
#[derive(Debug, Clone)]
pub struct SolverBody {
    particle: ParticleId,
    /// Start-of-substep center-of-mass position.
    x: Point3<f64>,
    /// Start-of-substep center-of-mass rotation (principal frame).
    r: UnitQuaternion<f64>,
    /// Accumulated positional correction this substep.
    dp: Vector3<f64>,
    /// Accumulated rotational correction this substep (rotation vector).
    dq: Vector3<f64>,
    /// Cached corrected rotation (`r` advanced by `dq`).
    q: UnitQuaternion<f64>,
    v: Vector3<f64>,
    w: Vector3<f64>,
    inv_mass: f64,
    inv_inertia_local: Vector3<f64>,
    /// World-space inverse inertia, cached from the corrected rotation.
    inv_inertia: Matrix3<f64>,
    center_of_mass: Vector3<f64>,
    rotation_of_mass: UnitQuaternion<f64>,
    state: ObjectState,
}

impl SolverBody {
    /// Build a solver body from particle state.
    ///
    /// `pose_x`/`pose_r` are the start-of-substep *actor* pose; the solver
    /// body works in the center-of-mass frame, so the mass-frame offsets are
    /// folded in here. `predicted` is the post-integration actor pose; the
    /// difference becomes the initial accumulated correction, which makes
    /// [`Self::implicit_velocity`] reproduce the integrated velocity.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn from_particle(
        particle: ParticleId,
        pose_x: Point3<f64>,
        pose_r: UnitQuaternion<f64>,
        predicted_x: Point3<f64>,
        predicted_r: UnitQuaternion<f64>,
        twist: Twist,
        mass: &MassProperties,
        state: ObjectState,
    ) -> Self {
        let com_x = pose_x + pose_r * mass.center_of_mass;
        let com_r = pose_r * mass.rotation_of_mass;
        let predicted_com_x = predicted_x + predicted_r * mass.center_of_mass;
        let predicted_com_r = predicted_r * mass.rotation_of_mass;

        let dp = predicted_com_x - com_x;
        let dq = (predicted_com_r * com_r.inverse()).scaled_axis();

        let mut body = Self {
            particle,
            x: com_x,
            r: com_r,
            dp,
            dq,
            q: predicted_com_r,
            v: twist.linear,
            w: twist.angular,
            inv_mass: mass.inv_mass(),
            inv_inertia_local: mass.inv_inertia(),
            inv_inertia: Matrix3::zeros(),
            center_of_mass: mass.center_of_mass,
            rotation_of_mass: mass.rotation_of_mass,
            state,
        };
        body.update_rotation_dependent_state();
        body
    }

    /// A synthetic static body pinned at `position` with infinite mass.
    ///
    /// Used to spoof terrain for the suspension hard-stop manifold.
    #[must_use]
    pub fn static_at(position: Point3<f64>) -> Self {
        Self {
            particle: ParticleId::new(u64::MAX),
            x: position,
            r: UnitQuaternion::identity(),
            dp: Vector3::zeros(),
            dq: Vector3::zeros(),
            q: UnitQuaternion::identity(),
            v: Vector3::zeros(),
            w: Vector3::zeros(),
            inv_mass: 0.0,
            inv_inertia_local: Vector3::zeros(),
            inv_inertia: Matrix3::zeros(),
            center_of_mass: Vector3::zeros(),
            rotation_of_mass: UnitQuaternion::identity(),
            state: ObjectState::Static,
        }
    }

    /// Re-pin a static body at a new position, clearing any correction.
    pub fn set_position(&mut self, position: Point3<f64>) {
        self.x = position;
        self.dp = Vector3::zeros();
        self.dq = Vector3::zeros();
        self.q = self.r;
    }

    /// The particle this solver body was gathered from.
    #[must_use]
    pub fn particle(&self) -> ParticleId {
        self.particle
    }

    /// Start-of-substep position.
    #[must_use]
    pub fn x(&self) -> Point3<f64> {
        self.x
    }

    /// Start-of-substep rotation.
    #[must_use]
    pub fn r(&self) -> UnitQuaternion<f64> {
        self.r
    }

    /// Corrected position: start-of-substep plus accumulated correction.
    #[must_use]
    pub fn corrected_p(&self) -> Point3<f64> {
        self.x + self.dp
    }

    /// Corrected rotation.
    #[must_use]
    pub fn corrected_q(&self) -> UnitQuaternion<f64> {
        self.q
    }

    /// Accumulated positional correction this substep.
    #[must_use]
    pub fn dp(&self) -> Vector3<f64> {
        self.dp
    }

    /// Accumulated rotational correction this substep (rotation vector).
    #[must_use]
    pub fn dq(&self) -> Vector3<f64> {
        self.dq
    }

    /// Linear velocity.
    #[must_use]
    pub fn v(&self) -> Vector3<f64> {
        self.v
    }

    /// Angular velocity.
    #[must_use]
    pub fn w(&self) -> Vector3<f64> {
        self.w
    }

    /// Set the linear velocity.
    pub fn set_v(&mut self, v: Vector3<f64>) {
        self.v = v;
    }

    /// Set the angular velocity.
    pub fn set_w(&mut self, w: Vector3<f64>) {
        self.w = w;
    }

    /// Inverse mass; zero for static or infinitely heavy bodies.
    #[must_use]
    pub fn inv_m(&self) -> f64 {
        self.inv_mass
    }

    /// World-space inverse inertia, valid for the corrected rotation as of
    /// the last [`Self::update_rotation_dependent_state`].
    #[must_use]
    pub fn inv_i(&self) -> &Matrix3<f64> {
        &self.inv_inertia
    }

    /// Actor-frame center-of-mass offset.
    #[must_use]
    pub fn center_of_mass(&self) -> Vector3<f64> {
        self.center_of_mass
    }

    /// Actor-frame rotation into the principal inertia frame.
    #[must_use]
    pub fn rotation_of_mass(&self) -> UnitQuaternion<f64> {
        self.rotation_of_mass
    }

    /// Whether the solver may move this body.
    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        self.state.is_dynamic() && self.inv_mass > 0.0
    }

    /// Whether the body is externally driven.
    #[must_use]
    pub fn is_kinematic(&self) -> bool {
        self.state.is_kinematic()
    }

    /// Apply a positional and rotational correction.
    ///
    /// `delta_rotation` is a rotation vector; the corrected rotation is
    /// advanced incrementally and renormalized. Callers that consume the
    /// world-space inverse inertia afterwards must refresh it with
    /// [`Self::update_rotation_dependent_state`].
    pub fn apply_transform_delta(&mut self, delta_position: Vector3<f64>, delta_rotation: Vector3<f64>) {
        self.dp += delta_position;
        self.dq += delta_rotation;
        let dq = Quaternion::from_parts(0.0, delta_rotation);
        let q = self.q.into_inner() + (dq * self.q.into_inner()) * 0.5;
        self.q = UnitQuaternion::from_quaternion(q);
    }

    /// Apply a velocity correction.
    pub fn apply_velocity_delta(&mut self, delta_v: Vector3<f64>, delta_w: Vector3<f64>) {
        self.v += delta_v;
        self.w += delta_w;
    }

    /// Recompute the world-space inverse inertia from the corrected rotation.
    pub fn update_rotation_dependent_state(&mut self) {
        let rot = self.q.to_rotation_matrix();
        self.inv_inertia =
            rot * Matrix3::from_diagonal(&self.inv_inertia_local) * rot.transpose();
    }

    /// Implicit linear velocity: the backward difference of the corrected
    /// position over the previous sub-step pose.
    ///
    /// During the position-solve phase the stored velocity has not yet been
    /// updated for this iteration, so damping terms must use this implicit
    /// velocity to stay consistent with the corrections applied so far.
    #[must_use]
    pub fn implicit_velocity(&self, dt: f64) -> Vector3<f64> {
        if dt > 0.0 {
            self.dp / dt
        } else {
            Vector3::zeros()
        }
    }

    /// Implicit angular velocity, backward-differenced like
    /// [`Self::implicit_velocity`].
    #[must_use]
    pub fn implicit_angular_velocity(&self, dt: f64) -> Vector3<f64> {
        if dt > 0.0 {
            (self.q * self.r.inverse()).scaled_axis() / dt
        } else {
            Vector3::zeros()
        }
    }

    /// Corrected actor-frame pose, for scattering back to the particle.
    #[must_use]
    pub fn corrected_actor_pose(&self) -> (Point3<f64>, UnitQuaternion<f64>) {
        let actor_r = self.q * self.rotation_of_mass.inverse();
        let actor_x = self.corrected_p() - actor_r * self.center_of_mass;
        (actor_x, actor_r)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn dynamic_body_at(z: f64) -> SolverBody {
        SolverBody::from_particle(
            ParticleId::new(0),
            Point3::new(0.0, 0.0, z),
            UnitQuaternion::identity(),
            Point3::new(0.0, 0.0, z),
            UnitQuaternion::identity(),
            Twist::zero(),
            &MassProperties::sphere(2.0, 0.5),
            ObjectState::Dynamic,
        )
    }

    #[test]
    fn test_transform_delta_accumulates() {
        let mut body = dynamic_body_at(1.0);
        body.apply_transform_delta(Vector3::new(0.0, 0.0, 0.1), Vector3::zeros());
        body.apply_transform_delta(Vector3::new(0.0, 0.0, 0.2), Vector3::zeros());
        assert_relative_eq!(body.corrected_p().z, 1.3, epsilon = 1e-12);
        assert_relative_eq!(body.x().z, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_implicit_velocity_matches_correction() {
        let mut body = dynamic_body_at(0.0);
        body.apply_transform_delta(Vector3::new(0.0, 0.0, 0.5), Vector3::zeros());
        let v = body.implicit_velocity(0.1);
        assert_relative_eq!(v.z, 5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_implicit_angular_velocity() {
        let mut body = dynamic_body_at(0.0);
        let dr = Vector3::new(0.0, 0.0, 0.02);
        body.apply_transform_delta(Vector3::zeros(), dr);
        let w = body.implicit_angular_velocity(0.01);
        assert_relative_eq!(w.z, 2.0, epsilon = 1e-3);
    }

    #[test]
    fn test_static_body_is_not_dynamic() {
        let body = SolverBody::static_at(Point3::origin());
        assert!(!body.is_dynamic());
        assert_eq!(body.inv_m(), 0.0);
    }

    #[test]
    fn test_com_frame_round_trip() {
        let mass = MassProperties::new(
            4.0,
            Vector3::new(0.1, 0.0, -0.2),
            UnitQuaternion::from_euler_angles(0.0, 0.3, 0.0),
            Vector3::new(0.2, 0.2, 0.2),
        );
        let pose_x = Point3::new(1.0, 2.0, 3.0);
        let pose_r = UnitQuaternion::from_euler_angles(0.1, 0.0, 0.5);
        let body = SolverBody::from_particle(
            ParticleId::new(3),
            pose_x,
            pose_r,
            pose_x,
            pose_r,
            Twist::zero(),
            &mass,
            ObjectState::Dynamic,
        );
        let (actor_x, actor_r) = body.corrected_actor_pose();
        assert_relative_eq!(actor_x, pose_x, epsilon = 1e-12);
        assert_relative_eq!(actor_r.angle_to(&pose_r), 0.0, epsilon = 1e-12);
    }
}
