//! Rigid particle state types.
//!
//! This module provides the types describing a single rigid particle in 6
//! degrees of freedom: pose, twist, mass distribution, and the
//! static/kinematic/dynamic classification the solver gates its work on.

use nalgebra::{Matrix3, Point3, UnitQuaternion, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Unique identifier for a rigid particle in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ParticleId(pub u64);

impl ParticleId {
    /// Create a new particle ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl From<u64> for ParticleId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ParticleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Particle({})", self.0)
    }
}

/// Simulation classification of a particle.
///
/// Only [`ObjectState::Dynamic`] bodies are mutated by force integration and
/// constraint solving. Static and infinitely-heavy bodies carry an inverse
/// mass of zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ObjectState {
    /// Never moves, infinite mass.
    Static,
    /// Moved by user code; pushes dynamic bodies but is not affected by them.
    Kinematic,
    /// Moved by the solver (gravity, constraints, impulses).
    #[default]
    Dynamic,
    /// Dynamic body currently asleep; not integrated until woken.
    Sleeping,
}

impl ObjectState {
    /// Whether the solver may integrate forces and apply corrections.
    #[must_use]
    pub fn is_dynamic(self) -> bool {
        self == Self::Dynamic
    }

    /// Whether the body is driven externally rather than by the solver.
    #[must_use]
    pub fn is_kinematic(self) -> bool {
        self == Self::Kinematic
    }
}

/// Position and orientation of a rigid particle.
///
/// # Example
///
/// ```
/// use axle_types::Pose;
/// use nalgebra::Point3;
///
/// let pose = Pose::from_position(Point3::new(1.0, 2.0, 3.0));
/// let world = pose.transform_point(&Point3::new(1.0, 0.0, 0.0));
/// assert_eq!(world, Point3::new(2.0, 2.0, 3.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pose {
    /// Position in world coordinates.
    pub position: Point3<f64>,
    /// Orientation as a unit quaternion.
    pub rotation: UnitQuaternion<f64>,
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

impl Pose {
    /// Create an identity pose (origin, no rotation).
    #[must_use]
    pub fn identity() -> Self {
        Self {
            position: Point3::origin(),
            rotation: UnitQuaternion::identity(),
        }
    }

    /// Create a pose from position only (identity rotation).
    #[must_use]
    pub fn from_position(position: Point3<f64>) -> Self {
        Self {
            position,
            rotation: UnitQuaternion::identity(),
        }
    }

    /// Create a pose from position and rotation.
    #[must_use]
    pub const fn from_position_rotation(
        position: Point3<f64>,
        rotation: UnitQuaternion<f64>,
    ) -> Self {
        Self { position, rotation }
    }

    /// Transform a point from local to world coordinates.
    #[must_use]
    pub fn transform_point(&self, local: &Point3<f64>) -> Point3<f64> {
        self.position + self.rotation * local.coords
    }

    /// Transform a vector from local to world coordinates (rotation only).
    #[must_use]
    pub fn transform_vector(&self, local: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * local
    }

    /// Transform a point from world to local coordinates.
    #[must_use]
    pub fn inverse_transform_point(&self, world: &Point3<f64>) -> Point3<f64> {
        Point3::from(self.rotation.inverse() * (world - self.position))
    }

    /// Transform a vector from world to local coordinates.
    #[must_use]
    pub fn inverse_transform_vector(&self, world: &Vector3<f64>) -> Vector3<f64> {
        self.rotation.inverse() * world
    }

    /// Blend between two poses.
    ///
    /// Positions are linearly interpolated; rotations use normalized lerp,
    /// matching the blend the state-sync pull path performs between
    /// consecutive result snapshots.
    #[must_use]
    pub fn lerp(&self, other: &Self, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self {
            position: Point3::from(self.position.coords.lerp(&other.position.coords, t)),
            rotation: self.rotation.nlerp(&other.rotation, t),
        }
    }

    /// Check if the pose contains `NaN` or `Inf` values.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.position.coords.iter().all(|x| x.is_finite())
            && self.rotation.coords.iter().all(|x| x.is_finite())
    }
}

/// Linear and angular velocity of a rigid particle.
///
/// # Example
///
/// ```
/// use axle_types::Twist;
/// use nalgebra::Vector3;
///
/// let twist = Twist::linear(Vector3::new(1.0, 0.0, 0.0));
/// assert_eq!(twist.linear.x, 1.0);
/// assert_eq!(twist.angular.norm(), 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Twist {
    /// Linear velocity in world coordinates (m/s).
    pub linear: Vector3<f64>,
    /// Angular velocity in world coordinates (rad/s).
    pub angular: Vector3<f64>,
}

impl Default for Twist {
    fn default() -> Self {
        Self::zero()
    }
}

impl Twist {
    /// Create a twist with specified linear and angular velocity.
    #[must_use]
    pub const fn new(linear: Vector3<f64>, angular: Vector3<f64>) -> Self {
        Self { linear, angular }
    }

    /// Create a zero twist (at rest).
    #[must_use]
    pub fn zero() -> Self {
        Self {
            linear: Vector3::zeros(),
            angular: Vector3::zeros(),
        }
    }

    /// Create a twist with linear velocity only.
    #[must_use]
    pub fn linear(v: Vector3<f64>) -> Self {
        Self {
            linear: v,
            angular: Vector3::zeros(),
        }
    }

    /// Create a twist with angular velocity only.
    #[must_use]
    pub fn angular(omega: Vector3<f64>) -> Self {
        Self {
            linear: Vector3::zeros(),
            angular: omega,
        }
    }

    /// Compute the velocity of a point offset from the body origin.
    ///
    /// `v_point` = `v_linear` + omega x r
    #[must_use]
    pub fn velocity_at_point(&self, offset: &Vector3<f64>) -> Vector3<f64> {
        self.linear + self.angular.cross(offset)
    }

    /// Check if the twist contains `NaN` or `Inf` values.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.linear.iter().all(|x| x.is_finite()) && self.angular.iter().all(|x| x.is_finite())
    }
}

/// Target pose for a kinematically driven particle.
///
/// Authored on the external thread, consumed by the evolution loop when the
/// kinematic particle is integrated.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum KinematicTarget {
    /// Drive the particle to this pose over the step.
    Position(Pose),
    /// Integrate the particle's current velocities instead of a pose target.
    Velocity,
}

impl KinematicTarget {
    /// The target pose, when in position mode.
    #[must_use]
    pub fn pose(&self) -> Option<&Pose> {
        match self {
            Self::Position(pose) => Some(pose),
            Self::Velocity => None,
        }
    }
}

/// Mass distribution of a rigid particle.
///
/// The mass frame may be offset and rotated relative to the particle's actor
/// frame: `center_of_mass` is the local-space offset of the center of mass,
/// and `rotation_of_mass` rotates the actor frame into the principal inertia
/// frame. The inertia tensor is stored as its principal diagonal.
///
/// An infinite mass (static body) is represented with `inv_mass() == 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MassProperties {
    /// Total mass in kg. `f64::INFINITY` for unmovable bodies.
    pub mass: f64,
    /// Center of mass offset from the particle origin, in local coordinates.
    pub center_of_mass: Vector3<f64>,
    /// Rotation from the actor frame into the principal inertia frame.
    pub rotation_of_mass: UnitQuaternion<f64>,
    /// Principal inertia diagonal about the center of mass (kg m^2).
    pub inertia: Vector3<f64>,
}

impl Default for MassProperties {
    fn default() -> Self {
        Self::sphere(1.0, 0.5)
    }
}

impl MassProperties {
    /// Create mass properties with an explicit mass frame.
    #[must_use]
    pub const fn new(
        mass: f64,
        center_of_mass: Vector3<f64>,
        rotation_of_mass: UnitQuaternion<f64>,
        inertia: Vector3<f64>,
    ) -> Self {
        Self {
            mass,
            center_of_mass,
            rotation_of_mass,
            inertia,
        }
    }

    /// Mass properties of a solid sphere centered on the particle origin.
    #[must_use]
    pub fn sphere(mass: f64, radius: f64) -> Self {
        let i = 0.4 * mass * radius * radius;
        Self {
            mass,
            center_of_mass: Vector3::zeros(),
            rotation_of_mass: UnitQuaternion::identity(),
            inertia: Vector3::new(i, i, i),
        }
    }

    /// Mass properties of a solid cuboid with the given full extents.
    #[must_use]
    pub fn cuboid(mass: f64, extents: Vector3<f64>) -> Self {
        let c = mass / 12.0;
        let (x2, y2, z2) = (
            extents.x * extents.x,
            extents.y * extents.y,
            extents.z * extents.z,
        );
        Self {
            mass,
            center_of_mass: Vector3::zeros(),
            rotation_of_mass: UnitQuaternion::identity(),
            inertia: Vector3::new(c * (y2 + z2), c * (x2 + z2), c * (x2 + y2)),
        }
    }

    /// Infinite mass properties for static or unmovable bodies.
    ///
    /// Guarantees `inv_mass() == 0.0` and a zero inverse inertia.
    #[must_use]
    pub fn infinite() -> Self {
        Self {
            mass: f64::INFINITY,
            center_of_mass: Vector3::zeros(),
            rotation_of_mass: UnitQuaternion::identity(),
            inertia: Vector3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
        }
    }

    /// Inverse mass; zero for infinite mass.
    #[must_use]
    pub fn inv_mass(&self) -> f64 {
        if self.mass.is_finite() && self.mass > 0.0 {
            1.0 / self.mass
        } else {
            0.0
        }
    }

    /// Inverse principal inertia diagonal; zero components for infinite terms.
    #[must_use]
    pub fn inv_inertia(&self) -> Vector3<f64> {
        self.inertia.map(|i| if i.is_finite() && i > 0.0 { 1.0 / i } else { 0.0 })
    }

    /// Inverse inertia as a local-frame matrix (principal frame diagonal).
    #[must_use]
    pub fn inv_inertia_matrix(&self) -> Matrix3<f64> {
        Matrix3::from_diagonal(&self.inv_inertia())
    }

    /// Whether this body can ever be moved by the solver.
    #[must_use]
    pub fn is_movable(&self) -> bool {
        self.inv_mass() > 0.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_pose_round_trip() {
        let pose = Pose::from_position_rotation(
            Point3::new(1.0, 2.0, 3.0),
            UnitQuaternion::from_euler_angles(0.1, 0.2, 0.3),
        );
        let local = Point3::new(0.5, -0.25, 2.0);
        let world = pose.transform_point(&local);
        let back = pose.inverse_transform_point(&world);
        assert_relative_eq!(back, local, epsilon = 1e-12);
    }

    #[test]
    fn test_pose_lerp_endpoints() {
        let a = Pose::from_position(Point3::new(0.0, 0.0, 0.0));
        let b = Pose::from_position_rotation(
            Point3::new(2.0, 0.0, 0.0),
            UnitQuaternion::from_euler_angles(0.0, 0.0, 1.0),
        );
        assert_relative_eq!(a.lerp(&b, 0.0).position, a.position);
        assert_relative_eq!(a.lerp(&b, 1.0).position, b.position);
        assert_relative_eq!(
            a.lerp(&b, 1.0).rotation.angle_to(&b.rotation),
            0.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_twist_velocity_at_point() {
        let twist = Twist::new(Vector3::new(1.0, 0.0, 0.0), Vector3::new(0.0, 0.0, 1.0));
        let v = twist.velocity_at_point(&Vector3::new(0.0, 1.0, 0.0));
        // omega x r = (0,0,1) x (0,1,0) = (-1,0,0)
        assert_relative_eq!(v, Vector3::new(0.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_infinite_mass_has_zero_inverse() {
        let props = MassProperties::infinite();
        assert_eq!(props.inv_mass(), 0.0);
        assert_eq!(props.inv_inertia(), Vector3::zeros());
        assert!(!props.is_movable());
    }

    #[test]
    fn test_sphere_inertia() {
        let props = MassProperties::sphere(10.0, 0.5);
        assert_relative_eq!(props.inertia.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(props.inv_mass(), 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_object_state_classification() {
        assert!(ObjectState::Dynamic.is_dynamic());
        assert!(!ObjectState::Static.is_dynamic());
        assert!(!ObjectState::Sleeping.is_dynamic());
        assert!(ObjectState::Kinematic.is_kinematic());
        assert!(!ObjectState::Dynamic.is_kinematic());
    }
}
