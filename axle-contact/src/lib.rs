//! Solver bodies and single-manifold contact solving.
//!
//! This crate provides the low-level pieces every constraint in the stack
//! works against:
//!
//! - [`SolverBody`] - A minimal physical state snapshot (pose, velocity,
//!   inverse mass, inverse inertia) mutated in place during one solve step
//! - [`SolverBodyContainer`] - Per-step dense storage mapping particles to
//!   their solver bodies
//! - [`IslandScratch`] - The per-island scratch listing which constraint
//!   indices participate in the current solve batch
//! - [`ContactSolver`] - A frictionless, Gauss-Seidel position/velocity
//!   solver for one contact manifold
//!
//! # Solver Approach
//!
//! The contact solver is position-based: each position iteration computes
//! the current separation of every manifold point against the bodies'
//! accumulated corrections, and pushes penetrating points apart along the
//! contact normal, clamped to a caller-supplied maximum pushout. A velocity
//! pass afterwards removes any residual velocity driving further
//! penetration. With a single manifold point (the suspension hard-stop
//! case) the Gauss-Seidel sweep degenerates to one well-ordered correction.
//!
//! # Ownership
//!
//! The solver never stores body references. Bodies are passed explicitly by
//! mutable reference into every solve operation, so the borrow checker
//! enforces the exclusive per-step ownership the solve loop relies on.

#![doc(html_root_url = "https://docs.rs/axle-contact/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn, // nalgebra constructors aren't const
    clippy::suboptimal_flops,
)]

mod body;
mod container;
mod solver;

pub use body::SolverBody;
pub use container::{IslandScratch, SolverBodyContainer};
pub use solver::{ContactSolver, ManifoldPoint, ManifoldPointInit, MAX_MANIFOLD_POINTS};
