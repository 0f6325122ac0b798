//! Position-based vehicle suspension constraints.
//!
//! Each constraint ties a wheel attachment point on a rigid body to a
//! world-space ground target along a local suspension axis:
//!
//! - A one-sided **spring** pushes the body away from the ground along the
//!   contact normal, with implicit damping, applied as a positional
//!   correction every position iteration
//! - A **hard-stop** contact engages when the suspension bottoms out below
//!   its minimum travel, solved through a one-point contact manifold against
//!   a synthetic static body standing in for the ground
//!
//! # Solve loop
//!
//! The owning evolution drives [`SuspensionConstraints`] through four
//! phases per substep: gather (bind bodies, measure travel, inject
//! hard-stop manifolds), the position phase (hard-stop pushout then spring,
//! iterated), the velocity phase (hard-stop velocity cleanup, iterated),
//! and scatter (publish [`SuspensionResults`], unbind).
//!
//! # Example
//!
//! ```
//! use axle_suspension::{SuspensionConstraints, SuspensionSettings};
//! use axle_types::ParticleId;
//! use nalgebra::{Point3, Vector3};
//!
//! let mut constraints = SuspensionConstraints::new();
//! let wheel = constraints.add_constraint(
//!     ParticleId::new(0),
//!     Vector3::new(1.2, 0.8, -0.3), // front-left attachment, body frame
//!     SuspensionSettings {
//!         target: Point3::new(1.2, 0.8, -0.8),
//!         min_length: 0.05,
//!         max_length: 0.4,
//!         ..SuspensionSettings::default()
//!     },
//! )?;
//!
//! // Feed each wheel's raycast hit before stepping the solver.
//! constraints.set_target(wheel, Point3::new(1.2, 0.8, -0.78), Vector3::z())?;
//! # Ok::<(), axle_types::SolverError>(())
//! ```

#![doc(html_root_url = "https://docs.rs/axle-suspension/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn, // nalgebra constructors aren't const
    clippy::suboptimal_flops,
)]

mod container;
mod settings;

pub use container::{SuspensionConstraints, SuspensionHandle};
pub use settings::{SuspensionResults, SuspensionSettings, SuspensionTuning};
