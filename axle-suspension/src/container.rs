//! The suspension constraint container and its solve loop.

use crate::{SuspensionResults, SuspensionSettings, SuspensionTuning};
use axle_contact::{ContactSolver, IslandScratch, ManifoldPointInit, SolverBody, SolverBodyContainer};
use axle_types::{ParticleId, Result, SolverError};
use nalgebra::{Point3, Vector3};
use tracing::trace;

const INVALID_DENSE: u32 = u32::MAX;

/// Stable, generation-checked handle to one suspension constraint.
///
/// Removal invalidates the handle: a handle held across a
/// [`SuspensionConstraints::remove_constraint`] of its constraint (or of
/// another constraint that recycled its slot) fails every later lookup with
/// [`SolverError::StaleHandle`] instead of silently addressing a different
/// wheel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SuspensionHandle {
    index: u32,
    generation: u32,
}

impl std::fmt::Display for SuspensionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Suspension({}v{})", self.index, self.generation)
    }
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    generation: u32,
    dense: u32,
}

/// Per-step transient solve state of one constraint, filled at gather time.
#[derive(Debug, Clone, Copy)]
struct SolveState {
    /// Attachment point in the body's center-of-mass frame.
    com_offset: Vector3<f64>,
    /// Whether a bottom-out manifold was injected this step.
    has_hardstop: bool,
}

impl Default for SolveState {
    fn default() -> Self {
        Self {
            com_offset: Vector3::zeros(),
            has_hardstop: false,
        }
    }
}

/// All suspension constraints of one solver, stored densely.
///
/// Constraints live in parallel arrays indexed by a dense position; handles
/// go through a slot table so removal can swap-remove the dense arrays
/// without invalidating other handles.
///
/// The solve loop runs in four phases each substep, driven by the evolution:
///
/// 1. [`Self::pre_gather_input`] caches attachment geometry, measures the
///    travel distance, and injects a one-point hard-stop contact manifold
///    for bottomed-out wheels.
/// 2. [`Self::apply_phase1`], once per position iteration: hard-stop
///    position solve followed by the spring correction.
/// 3. [`Self::apply_phase2`], once per velocity iteration: hard-stop
///    velocity solve.
/// 4. [`Self::scatter_output`] copies net corrections into per-constraint
///    [`SuspensionResults`] and unbinds solver bodies.
#[derive(Debug, Default)]
pub struct SuspensionConstraints {
    particles: Vec<ParticleId>,
    local_offsets: Vec<Vector3<f64>>,
    settings: Vec<SuspensionSettings>,
    results: Vec<SuspensionResults>,
    solve: Vec<SolveState>,
    static_bodies: Vec<SolverBody>,
    contact_solvers: Vec<ContactSolver>,
    bound_bodies: Vec<Option<usize>>,
    slot_of: Vec<u32>,
    slots: Vec<Slot>,
    free: Vec<u32>,
    tuning: SuspensionTuning,
}

impl SuspensionConstraints {
    /// Create an empty container with default tuning.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty container with explicit tuning.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::InvalidConfig`] when the tuning is invalid.
    pub fn with_tuning(tuning: SuspensionTuning) -> Result<Self> {
        tuning.validate()?;
        Ok(Self {
            tuning,
            ..Self::default()
        })
    }

    /// Current solver-wide tuning.
    #[must_use]
    pub fn tuning(&self) -> &SuspensionTuning {
        &self.tuning
    }

    /// Replace the solver-wide tuning.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::InvalidConfig`] when the tuning is invalid.
    pub fn set_tuning(&mut self, tuning: SuspensionTuning) -> Result<()> {
        tuning.validate()?;
        self.tuning = tuning;
        Ok(())
    }

    /// Number of constraints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    /// Whether the container holds no constraints.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Add a constraint attaching `particle` at `local_offset` (actor
    /// frame) with the given settings.
    ///
    /// # Errors
    ///
    /// Returns the settings' validation error when they are invalid.
    pub fn add_constraint(
        &mut self,
        particle: ParticleId,
        local_offset: Vector3<f64>,
        settings: SuspensionSettings,
    ) -> Result<SuspensionHandle> {
        settings.validate()?;

        let dense = self.particles.len() as u32;
        self.particles.push(particle);
        self.local_offsets.push(local_offset);
        self.settings.push(settings);
        self.results.push(SuspensionResults::default());
        self.solve.push(SolveState::default());
        self.static_bodies.push(SolverBody::static_at(Point3::origin()));
        self.contact_solvers.push(ContactSolver::new());
        self.bound_bodies.push(None);

        let slot_index = if let Some(slot_index) = self.free.pop() {
            self.slots[slot_index as usize].dense = dense;
            slot_index
        } else {
            self.slots.push(Slot { generation: 0, dense });
            (self.slots.len() - 1) as u32
        };
        self.slot_of.push(slot_index);

        Ok(SuspensionHandle {
            index: slot_index,
            generation: self.slots[slot_index as usize].generation,
        })
    }

    /// Remove a constraint, invalidating its handle.
    ///
    /// The last dense entry is swapped into the removed position; handles
    /// to it stay valid because the slot table is re-pointed.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::StaleHandle`] when the handle has already
    /// been removed.
    pub fn remove_constraint(&mut self, handle: SuspensionHandle) -> Result<()> {
        let dense = self.dense_index(handle)?;

        self.particles.swap_remove(dense);
        self.local_offsets.swap_remove(dense);
        self.settings.swap_remove(dense);
        self.results.swap_remove(dense);
        self.solve.swap_remove(dense);
        self.static_bodies.swap_remove(dense);
        self.contact_solvers.swap_remove(dense);
        self.bound_bodies.swap_remove(dense);
        self.slot_of.swap_remove(dense);

        if dense < self.slot_of.len() {
            let moved_slot = self.slot_of[dense];
            self.slots[moved_slot as usize].dense = dense as u32;
        }

        let slot = &mut self.slots[handle.index as usize];
        slot.generation = slot.generation.wrapping_add(1);
        slot.dense = INVALID_DENSE;
        self.free.push(handle.index);
        Ok(())
    }

    /// The particle a constraint is attached to.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::StaleHandle`] for removed handles.
    pub fn particle(&self, handle: SuspensionHandle) -> Result<ParticleId> {
        Ok(self.particles[self.dense_index(handle)?])
    }

    /// A constraint's settings.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::StaleHandle`] for removed handles.
    pub fn settings(&self, handle: SuspensionHandle) -> Result<&SuspensionSettings> {
        Ok(&self.settings[self.dense_index(handle)?])
    }

    /// Replace a constraint's settings.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::StaleHandle`] for removed handles and the
    /// settings' validation error when they are invalid.
    pub fn set_settings(
        &mut self,
        handle: SuspensionHandle,
        settings: SuspensionSettings,
    ) -> Result<()> {
        settings.validate()?;
        let dense = self.dense_index(handle)?;
        self.settings[dense] = settings;
        Ok(())
    }

    /// Update the ground target and contact normal, the per-frame feed from
    /// wheel raycasts.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::StaleHandle`] for removed handles.
    pub fn set_target(
        &mut self,
        handle: SuspensionHandle,
        target: Point3<f64>,
        normal: Vector3<f64>,
    ) -> Result<()> {
        let dense = self.dense_index(handle)?;
        self.settings[dense].target = target;
        self.settings[dense].normal = normal;
        Ok(())
    }

    /// Enable or disable a constraint without removing it.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::StaleHandle`] for removed handles.
    pub fn set_enabled(&mut self, handle: SuspensionHandle, enabled: bool) -> Result<()> {
        let dense = self.dense_index(handle)?;
        self.settings[dense].enabled = enabled;
        Ok(())
    }

    /// A constraint's output from the most recent step.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::StaleHandle`] for removed handles.
    pub fn results(&self, handle: SuspensionHandle) -> Result<&SuspensionResults> {
        Ok(&self.results[self.dense_index(handle)?])
    }

    /// Drop cached contact and solve state for every constraint attached
    /// to `particle`, e.g. after its geometry changed or it was destroyed.
    pub fn clear_particle_state(&mut self, particle: ParticleId) {
        for i in 0..self.len() {
            if self.particles[i] == particle {
                self.contact_solvers[i].reset();
                self.results[i].reset();
                self.solve[i] = SolveState::default();
                self.bound_bodies[i] = None;
            }
        }
    }

    fn dense_index(&self, handle: SuspensionHandle) -> Result<usize> {
        let stale = || SolverError::StaleHandle {
            index: handle.index,
            generation: handle.generation,
        };
        let slot = self.slots.get(handle.index as usize).ok_or_else(stale)?;
        if slot.generation != handle.generation || slot.dense == INVALID_DENSE {
            return Err(stale());
        }
        Ok(slot.dense as usize)
    }

    /// Gather phase: bind solver bodies, cache attachment geometry, measure
    /// travel, and inject hard-stop manifolds for bottomed-out wheels.
    ///
    /// Resets `island` and registers every constraint that will participate
    /// this step. Particles missing from `bodies` (not gathered, e.g. not
    /// dynamic this step) are skipped.
    pub fn pre_gather_input(
        &mut self,
        dt: f64,
        bodies: &SolverBodyContainer,
        island: &mut IslandScratch,
    ) {
        island.reset(self.len());

        for i in 0..self.len() {
            self.results[i].reset();
            self.contact_solvers[i].reset();
            self.bound_bodies[i] = None;
            self.solve[i] = SolveState::default();

            let settings = &self.settings[i];
            if !settings.enabled {
                continue;
            }
            let Some(body_index) = bodies.index_of(self.particles[i]) else {
                trace!(particle = %self.particles[i], "suspension particle not gathered, skipping");
                continue;
            };
            let Some(body) = bodies.get(body_index) else {
                continue;
            };

            let com_offset = body.rotation_of_mass().inverse()
                * (self.local_offsets[i] - body.center_of_mass());
            let actor_rotation = body.corrected_q() * body.rotation_of_mass().inverse();
            let world_attach = body.corrected_p() + body.corrected_q() * com_offset;
            let axis = actor_rotation * settings.axis;
            let distance = (world_attach - settings.target).dot(&axis);

            self.solve[i].com_offset = com_offset;
            self.bound_bodies[i] = Some(body_index);
            self.results[i].length = distance;

            if self.tuning.hardstop_enabled && distance < settings.min_length {
                let static_position = settings.target + distance * axis;
                self.static_bodies[i].set_position(static_position);

                let delta_normal =
                    -((settings.min_length - distance) * axis).dot(&settings.normal);
                let solver = &mut self.contact_solvers[i];
                solver.set_num_manifold_points(1);
                solver.set_manifold_point(
                    0,
                    dt,
                    ManifoldPointInit {
                        restitution: 0.0,
                        restitution_velocity_threshold: 0.0,
                        relative_contact_a: world_attach - body.corrected_p(),
                        relative_contact_b: world_attach - static_position,
                        world_normal: settings.normal,
                        world_tangent_u: Vector3::zeros(),
                        world_tangent_v: Vector3::zeros(),
                        delta_normal,
                        delta_tangent_u: 0.0,
                        delta_tangent_v: 0.0,
                    },
                    body,
                    &self.static_bodies[i],
                );
                self.solve[i].has_hardstop = true;
            }

            island.push(i);
        }
    }

    /// One position iteration: all hard-stop solves, then all springs.
    ///
    /// The two sweeps are sequenced so every hard-stop in the island sees
    /// the bodies before this iteration's spring corrections. The spring
    /// runs every position iteration, so its effective strength scales
    /// with the configured iteration count.
    pub fn apply_phase1(
        &mut self,
        dt: f64,
        bodies: &mut SolverBodyContainer,
        island: &IslandScratch,
    ) {
        let cap = self.tuning.pushout_cap(dt);
        let Self {
            settings,
            results,
            solve,
            static_bodies,
            contact_solvers,
            bound_bodies,
            tuning,
            ..
        } = self;

        for &i in island.indices() {
            if !solve[i].has_hardstop {
                continue;
            }
            let Some(body_index) = bound_bodies[i] else {
                continue;
            };
            let Some(body) = bodies.get_mut(body_index) else {
                continue;
            };
            contact_solvers[i].solve_position_no_friction(body, &mut static_bodies[i], dt, cap);
            body.update_rotation_dependent_state();
        }

        if tuning.spring_enabled {
            for &i in island.indices() {
                let Some(body_index) = bound_bodies[i] else {
                    continue;
                };
                let Some(body) = bodies.get_mut(body_index) else {
                    continue;
                };
                apply_single(dt, &settings[i], &solve[i], &mut results[i], body);
            }
        }
    }

    /// One velocity iteration: hard-stop velocity solve.
    pub fn apply_phase2(
        &mut self,
        dt: f64,
        bodies: &mut SolverBodyContainer,
        island: &IslandScratch,
    ) {
        if !self.tuning.velocity_solve {
            return;
        }
        let Self {
            solve,
            static_bodies,
            contact_solvers,
            bound_bodies,
            ..
        } = self;

        for &i in island.indices() {
            if !solve[i].has_hardstop {
                continue;
            }
            let Some(body_index) = bound_bodies[i] else {
                continue;
            };
            let Some(body) = bodies.get_mut(body_index) else {
                continue;
            };
            contact_solvers[i].solve_velocity(body, &mut static_bodies[i], dt, false);
        }
    }

    /// Copy net hard-stop corrections into the per-constraint results and
    /// unbind solver bodies.
    pub fn scatter_output(&mut self, _dt: f64, island: &IslandScratch) {
        for &i in island.indices() {
            if let Some(point) = self.contact_solvers[i].manifold_point(0) {
                self.results[i].hardstop_net_pushout =
                    point.net_pushout_normal * point.world_normal;
                self.results[i].hardstop_net_impulse =
                    point.net_impulse_normal * point.world_normal;
            }
            self.bound_bodies[i] = None;
        }
    }
}

/// One spring correction for one constraint.
///
/// Travel is re-measured against the body's corrections so far; a wheel
/// past full droop gets no spring force at all, and a bottomed-out wheel is
/// treated as sitting exactly at the bottom-out length (the hard-stop
/// handles the rest). Damping uses the implicit velocity so it stays
/// consistent with corrections applied earlier this substep.
fn apply_single(
    dt: f64,
    settings: &SuspensionSettings,
    state: &SolveState,
    results: &mut SuspensionResults,
    body: &mut SolverBody,
) {
    let actor_rotation = body.corrected_q() * body.rotation_of_mass().inverse();
    let axis = actor_rotation * settings.axis;
    let world_attach = body.corrected_p() + body.corrected_q() * state.com_offset;
    let mut distance = (world_attach - settings.target).dot(&axis);

    if distance >= settings.max_length {
        // Full droop: the wheel cannot reach the ground.
        results.length = settings.max_length;
        return;
    }
    if distance < settings.min_length {
        distance = settings.min_length;
    }
    results.length = distance;

    let arm = world_attach - body.corrected_p();
    let arm_velocity =
        body.implicit_velocity(dt) + body.implicit_angular_velocity(dt).cross(&arm);

    let stiffness = settings.spring_stiffness * dt * dt;
    let damping = settings.spring_damping * dt;
    let delta_lambda = stiffness * axis.dot(&settings.normal) * (settings.max_length - distance)
        - damping * arm_velocity.dot(&settings.normal);
    // Springs push, never pull.
    if delta_lambda <= 0.0 {
        return;
    }

    let dx = delta_lambda * settings.normal;
    let dp = body.inv_m() * dx;
    let dr = body.inv_i() * arm.cross(&dx);
    body.apply_transform_delta(dp, dr);
    body.update_rotation_dependent_state();
    results.net_pushout += dx;
}
