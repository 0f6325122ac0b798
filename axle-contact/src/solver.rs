//! Frictionless single-manifold contact solving.
//!
//! The solver owns a small manifold (up to [`MAX_MANIFOLD_POINTS`] points;
//! the suspension hard-stop uses exactly one) and resolves it in two passes:
//!
//! 1. **Position**: push penetrating points apart along the contact normal,
//!    clamping the net contact-space pushout to a caller-supplied maximum so
//!    deep penetration never produces an explosive correction.
//! 2. **Velocity**: remove residual velocity driving further penetration.
//!
//! Manifolds are ephemeral: [`ContactSolver::reset`] must be called every
//! step before repopulating. Failing to reset leaks stale contacts into the
//! next step - a correctness bug, not a crash.

use crate::SolverBody;
use nalgebra::Vector3;
use smallvec::SmallVec;

/// Maximum number of points one manifold can carry.
pub const MAX_MANIFOLD_POINTS: usize = 4;

/// Effective masses below this are treated as unsolvable (two static bodies).
const MIN_EFFECTIVE_INV_MASS: f64 = 1e-12;

/// Initialization data for one manifold point.
///
/// `delta_normal` encodes separation along `world_normal`: negative means
/// penetrating by that amount. Tangent data is carried for completeness but
/// unused by this frictionless solver.
#[derive(Debug, Clone, Copy)]
pub struct ManifoldPointInit {
    /// Restitution coefficient (0 = perfectly inelastic).
    pub restitution: f64,
    /// Approach speeds below this produce no restitution response.
    pub restitution_velocity_threshold: f64,
    /// Contact offset from body A's corrected position.
    pub relative_contact_a: Vector3<f64>,
    /// Contact offset from body B's corrected position.
    pub relative_contact_b: Vector3<f64>,
    /// World-space contact normal, pointing from B towards A.
    pub world_normal: Vector3<f64>,
    /// First tangent direction (unused, frictionless).
    pub world_tangent_u: Vector3<f64>,
    /// Second tangent direction (unused, frictionless).
    pub world_tangent_v: Vector3<f64>,
    /// Separation along the normal; negative = penetrating.
    pub delta_normal: f64,
    /// Separation along tangent U (unused, frictionless).
    pub delta_tangent_u: f64,
    /// Separation along tangent V (unused, frictionless).
    pub delta_tangent_v: f64,
}

/// One solved contact correspondence between two bodies.
#[derive(Debug, Clone, Copy)]
pub struct ManifoldPoint {
    /// Contact offset from body A's corrected position at capture.
    pub relative_contact_a: Vector3<f64>,
    /// Contact offset from body B's corrected position at capture.
    pub relative_contact_b: Vector3<f64>,
    /// World-space contact normal.
    pub world_normal: Vector3<f64>,
    /// Separation along the normal at capture; negative = penetrating.
    pub delta_normal: f64,
    /// Net contact-space pushout applied so far (meters, along the normal).
    pub net_pushout_normal: f64,
    /// Net velocity impulse applied so far (kg m/s, along the normal).
    pub net_impulse_normal: f64,
    /// Target normal velocity after the velocity pass (restitution).
    target_normal_velocity: f64,
    /// `1 / (sum of inverse-mass terms)` along the normal.
    contact_mass_normal: f64,
    /// Body A's accumulated corrections when the point was captured.
    capture_dp_a: Vector3<f64>,
    capture_dq_a: Vector3<f64>,
    /// Body B's accumulated corrections when the point was captured.
    capture_dp_b: Vector3<f64>,
    capture_dq_b: Vector3<f64>,
}

impl Default for ManifoldPoint {
    fn default() -> Self {
        Self {
            relative_contact_a: Vector3::zeros(),
            relative_contact_b: Vector3::zeros(),
            world_normal: Vector3::z(),
            delta_normal: 0.0,
            net_pushout_normal: 0.0,
            net_impulse_normal: 0.0,
            target_normal_velocity: 0.0,
            contact_mass_normal: 0.0,
            capture_dp_a: Vector3::zeros(),
            capture_dq_a: Vector3::zeros(),
            capture_dp_b: Vector3::zeros(),
            capture_dq_b: Vector3::zeros(),
        }
    }
}

impl ManifoldPoint {
    /// Current separation along the normal given the bodies' corrections
    /// accumulated since this point was captured.
    fn current_separation(&self, body_a: &SolverBody, body_b: &SolverBody) -> f64 {
        let move_a =
            (body_a.dp() - self.capture_dp_a) + (body_a.dq() - self.capture_dq_a).cross(&self.relative_contact_a);
        let move_b =
            (body_b.dp() - self.capture_dp_b) + (body_b.dq() - self.capture_dq_b).cross(&self.relative_contact_b);
        self.delta_normal + (move_a - move_b).dot(&self.world_normal)
    }
}

/// Position/velocity solver for one contact manifold.
///
/// # Example
///
/// ```
/// use axle_contact::{ContactSolver, ManifoldPointInit, SolverBody};
/// use axle_types::{MassProperties, ObjectState, ParticleId, Twist};
/// use nalgebra::{Point3, UnitQuaternion, Vector3};
///
/// let mut body = SolverBody::from_particle(
///     ParticleId::new(0),
///     Point3::new(0.0, 0.0, -0.05), // penetrating the ground by 5 cm
///     UnitQuaternion::identity(),
///     Point3::new(0.0, 0.0, -0.05),
///     UnitQuaternion::identity(),
///     Twist::zero(),
///     &MassProperties::sphere(1.0, 0.5),
///     ObjectState::Dynamic,
/// );
/// let mut ground = SolverBody::static_at(Point3::origin());
///
/// let mut solver = ContactSolver::new();
/// solver.set_num_manifold_points(1);
/// solver.set_manifold_point(
///     0,
///     1.0 / 60.0,
///     ManifoldPointInit {
///         restitution: 0.0,
///         restitution_velocity_threshold: 0.1,
///         relative_contact_a: Vector3::zeros(),
///         relative_contact_b: Vector3::zeros(),
///         world_normal: Vector3::z(),
///         world_tangent_u: Vector3::zeros(),
///         world_tangent_v: Vector3::zeros(),
///         delta_normal: -0.05,
///         delta_tangent_u: 0.0,
///         delta_tangent_v: 0.0,
///     },
///     &body,
///     &ground,
/// );
/// solver.solve_position_no_friction(&mut body, &mut ground, 1.0 / 60.0, 1.0);
/// assert!(body.corrected_p().z > -1e-9);
/// ```
#[derive(Debug, Default)]
pub struct ContactSolver {
    points: SmallVec<[ManifoldPoint; MAX_MANIFOLD_POINTS]>,
}

impl ContactSolver {
    /// Create a solver with an empty manifold.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear the manifold. Must be called every step before repopulating.
    pub fn reset(&mut self) {
        self.points.clear();
    }

    /// Resize the manifold to `count` default-initialized points.
    ///
    /// # Panics
    ///
    /// Panics if `count` exceeds [`MAX_MANIFOLD_POINTS`].
    pub fn set_num_manifold_points(&mut self, count: usize) {
        assert!(count <= MAX_MANIFOLD_POINTS);
        self.points.clear();
        self.points.resize(count, ManifoldPoint::default());
    }

    /// Number of points in the manifold.
    #[must_use]
    pub fn num_manifold_points(&self) -> usize {
        self.points.len()
    }

    /// Read back a manifold point.
    #[must_use]
    pub fn manifold_point(&self, index: usize) -> Option<&ManifoldPoint> {
        self.points.get(index)
    }

    /// Record one contact point.
    ///
    /// Captures the bodies' current accumulated corrections so later
    /// position iterations can re-evaluate the separation incrementally, and
    /// precomputes the normal-direction effective mass. The implicit
    /// (backward-difference) approach velocity over `dt` seeds the
    /// restitution target; a zero-restitution point targets zero normal
    /// velocity, which is what the suspension hard-stop uses.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range for the configured point count.
    pub fn set_manifold_point(
        &mut self,
        index: usize,
        dt: f64,
        init: ManifoldPointInit,
        body_a: &SolverBody,
        body_b: &SolverBody,
    ) {
        let normal = init.world_normal;

        let inv_mass_term = |body: &SolverBody, rel: &Vector3<f64>| -> f64 {
            let rxn = rel.cross(&normal);
            body.inv_m() + (body.inv_i() * rxn).cross(rel).dot(&normal)
        };
        let effective_inv_mass =
            inv_mass_term(body_a, &init.relative_contact_a) + inv_mass_term(body_b, &init.relative_contact_b);
        let contact_mass_normal = if effective_inv_mass > MIN_EFFECTIVE_INV_MASS {
            1.0 / effective_inv_mass
        } else {
            0.0
        };

        // Approach velocity from the corrections accumulated this substep
        // (stored velocities are stale during the position phase).
        let target_normal_velocity = if init.restitution > 0.0 && dt > 0.0 {
            let va = body_a.implicit_velocity(dt)
                + body_a.implicit_angular_velocity(dt).cross(&init.relative_contact_a);
            let vb = body_b.implicit_velocity(dt)
                + body_b.implicit_angular_velocity(dt).cross(&init.relative_contact_b);
            let approach = (va - vb).dot(&normal);
            if approach < -init.restitution_velocity_threshold {
                -init.restitution * approach
            } else {
                0.0
            }
        } else {
            0.0
        };

        self.points[index] = ManifoldPoint {
            relative_contact_a: init.relative_contact_a,
            relative_contact_b: init.relative_contact_b,
            world_normal: normal,
            delta_normal: init.delta_normal,
            net_pushout_normal: 0.0,
            net_impulse_normal: 0.0,
            target_normal_velocity,
            contact_mass_normal,
            capture_dp_a: body_a.dp(),
            capture_dq_a: body_a.dq(),
            capture_dp_b: body_b.dp(),
            capture_dq_b: body_b.dq(),
        };
    }

    /// One position-correction iteration for the whole manifold.
    ///
    /// The net contact-space pushout per point is clamped to
    /// `[0, max_pushout]`: penetration beyond the cap is resolved over
    /// multiple steps rather than in one violent correction, and an earlier
    /// over-correction may be partially withdrawn but never reversed into a
    /// pull.
    pub fn solve_position_no_friction(
        &mut self,
        body_a: &mut SolverBody,
        body_b: &mut SolverBody,
        _dt: f64,
        max_pushout: f64,
    ) {
        for point in &mut self.points {
            if point.contact_mass_normal == 0.0 {
                continue;
            }

            let separation = point.current_separation(body_a, body_b);
            let new_net = (point.net_pushout_normal - separation).clamp(0.0, max_pushout);
            let applied = new_net - point.net_pushout_normal;
            if applied == 0.0 {
                continue;
            }
            point.net_pushout_normal = new_net;

            let lambda = applied * point.contact_mass_normal;
            let dx = lambda * point.world_normal;
            if body_a.is_dynamic() {
                let dr = body_a.inv_i() * point.relative_contact_a.cross(&dx);
                body_a.apply_transform_delta(body_a.inv_m() * dx, dr);
            }
            if body_b.is_dynamic() {
                let dr = body_b.inv_i() * point.relative_contact_b.cross(&-dx);
                body_b.apply_transform_delta(body_b.inv_m() * -dx, dr);
            }
        }
    }

    /// One velocity iteration: removes residual normal velocity driving
    /// further penetration (plus any restitution target captured at setup).
    ///
    /// When `use_all_iterations` is false, points whose position pass never
    /// pushed out are skipped - they were not in contact this step.
    pub fn solve_velocity(
        &mut self,
        body_a: &mut SolverBody,
        body_b: &mut SolverBody,
        _dt: f64,
        use_all_iterations: bool,
    ) {
        for point in &mut self.points {
            if point.contact_mass_normal == 0.0 {
                continue;
            }
            if !use_all_iterations && point.net_pushout_normal == 0.0 {
                continue;
            }

            let va = body_a.v() + body_a.w().cross(&point.relative_contact_a);
            let vb = body_b.v() + body_b.w().cross(&point.relative_contact_b);
            let normal_velocity = (va - vb).dot(&point.world_normal);

            let impulse =
                (point.target_normal_velocity - normal_velocity) * point.contact_mass_normal;
            let new_net = (point.net_impulse_normal + impulse).max(0.0);
            let applied = new_net - point.net_impulse_normal;
            if applied == 0.0 {
                continue;
            }
            point.net_impulse_normal = new_net;

            let dv = applied * point.world_normal;
            if body_a.is_dynamic() {
                let dw = body_a.inv_i() * point.relative_contact_a.cross(&dv);
                body_a.apply_velocity_delta(body_a.inv_m() * dv, dw);
            }
            if body_b.is_dynamic() {
                let dw = body_b.inv_i() * point.relative_contact_b.cross(&-dv);
                body_b.apply_velocity_delta(body_b.inv_m() * -dv, dw);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use axle_types::{MassProperties, ObjectState, ParticleId, Twist};
    use nalgebra::{Point3, UnitQuaternion};

    fn dynamic_body(z: f64, vz: f64) -> SolverBody {
        SolverBody::from_particle(
            ParticleId::new(0),
            Point3::new(0.0, 0.0, z),
            UnitQuaternion::identity(),
            Point3::new(0.0, 0.0, z),
            UnitQuaternion::identity(),
            Twist::linear(Vector3::new(0.0, 0.0, vz)),
            &MassProperties::sphere(1.0, 0.5),
            ObjectState::Dynamic,
        )
    }

    fn point_init(delta_normal: f64) -> ManifoldPointInit {
        ManifoldPointInit {
            restitution: 0.0,
            restitution_velocity_threshold: 0.1,
            relative_contact_a: Vector3::zeros(),
            relative_contact_b: Vector3::zeros(),
            world_normal: Vector3::z(),
            world_tangent_u: Vector3::zeros(),
            world_tangent_v: Vector3::zeros(),
            delta_normal,
            delta_tangent_u: 0.0,
            delta_tangent_v: 0.0,
        }
    }

    const DT: f64 = 1.0 / 60.0;

    fn one_point_solver(body: &SolverBody, ground: &SolverBody, depth: f64) -> ContactSolver {
        let mut solver = ContactSolver::new();
        solver.set_num_manifold_points(1);
        solver.set_manifold_point(0, DT, point_init(-depth), body, ground);
        solver
    }

    #[test]
    fn test_penetration_resolved_in_one_iteration() {
        let mut body = dynamic_body(-0.02, 0.0);
        let mut ground = SolverBody::static_at(Point3::origin());
        let mut solver = one_point_solver(&body, &ground, 0.02);

        solver.solve_position_no_friction(&mut body, &mut ground, DT, 1.0);

        assert_relative_eq!(body.corrected_p().z, 0.0, epsilon = 1e-9);
        let point = solver.manifold_point(0).unwrap();
        assert_relative_eq!(point.net_pushout_normal, 0.02, epsilon = 1e-9);
        // Static counterpart never moves.
        assert_relative_eq!(ground.corrected_p().z, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_pushout_clamped_to_max() {
        let mut body = dynamic_body(-1.0, 0.0);
        let mut ground = SolverBody::static_at(Point3::origin());
        let mut solver = one_point_solver(&body, &ground, 1.0);

        let max_pushout = 0.05;
        for _ in 0..16 {
            solver.solve_position_no_friction(&mut body, &mut ground, DT, max_pushout);
        }

        // Deep penetration resolves no further than the cap this step.
        let point = solver.manifold_point(0).unwrap();
        assert_relative_eq!(point.net_pushout_normal, max_pushout, epsilon = 1e-9);
        assert_relative_eq!(body.corrected_p().z, -1.0 + max_pushout, epsilon = 1e-9);
    }

    #[test]
    fn test_separated_contact_is_untouched() {
        let mut body = dynamic_body(0.1, 0.0);
        let mut ground = SolverBody::static_at(Point3::origin());
        let mut solver = one_point_solver(&body, &ground, -0.1); // positive separation

        solver.solve_position_no_friction(&mut body, &mut ground, DT, 1.0);

        assert_relative_eq!(body.corrected_p().z, 0.1, epsilon = 1e-12);
        assert_eq!(solver.manifold_point(0).unwrap().net_pushout_normal, 0.0);
    }

    #[test]
    fn test_velocity_solve_removes_penetrating_velocity() {
        let mut body = dynamic_body(-0.01, -2.0);
        let mut ground = SolverBody::static_at(Point3::origin());
        let mut solver = one_point_solver(&body, &ground, 0.01);

        solver.solve_position_no_friction(&mut body, &mut ground, DT, 1.0);
        solver.solve_velocity(&mut body, &mut ground, DT, false);

        assert_relative_eq!(body.v().z, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_velocity_solve_skips_inactive_points_unless_forced() {
        let mut body = dynamic_body(0.5, -2.0);
        let mut ground = SolverBody::static_at(Point3::origin());
        // Separated: position pass applies nothing.
        let mut solver = one_point_solver(&body, &ground, -0.5);

        solver.solve_position_no_friction(&mut body, &mut ground, DT, 1.0);
        solver.solve_velocity(&mut body, &mut ground, DT, false);
        assert_relative_eq!(body.v().z, -2.0, epsilon = 1e-12);

        solver.solve_velocity(&mut body, &mut ground, DT, true);
        assert_relative_eq!(body.v().z, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_reset_clears_manifold() {
        let body = dynamic_body(0.0, 0.0);
        let ground = SolverBody::static_at(Point3::origin());
        let mut solver = one_point_solver(&body, &ground, 0.01);
        assert_eq!(solver.num_manifold_points(), 1);
        solver.reset();
        assert_eq!(solver.num_manifold_points(), 0);
    }

    #[test]
    fn test_two_static_bodies_do_not_explode() {
        let mut a = SolverBody::static_at(Point3::new(0.0, 0.0, -0.1));
        let mut b = SolverBody::static_at(Point3::origin());
        let mut solver = ContactSolver::new();
        solver.set_num_manifold_points(1);
        solver.set_manifold_point(0, DT, point_init(0.1), &a, &b);

        solver.solve_position_no_friction(&mut a, &mut b, DT, 1.0);
        assert_relative_eq!(a.corrected_p().z, -0.1, epsilon = 1e-12);
    }
}
