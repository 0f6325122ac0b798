//! Core types for the axle rigid-body suspension solver.
//!
//! This crate provides the foundational types shared by the solver stack:
//!
//! - [`ParticleId`] - Opaque handle identifying a rigid particle
//! - [`Pose`] / [`Twist`] - Position, orientation and velocity of a body
//! - [`MassProperties`] - Mass, center of mass, rotation of mass, inertia
//! - [`ObjectState`] - Static / kinematic / dynamic / sleeping classification
//! - [`ParticleShape`] - Per-shape collision and material data
//! - [`Gravity`] - Gravity configuration for the evolution loop
//! - [`SolverError`] - Error type for configuration and lookup surfaces
//!
//! # Design Philosophy
//!
//! These types are **pure data**. They have no solver behavior. They're the
//! common language between:
//!
//! - The contact and suspension solvers (axle-contact, axle-suspension)
//! - The evolution loop (axle-core)
//! - The cross-thread state sync proxy (axle-proxy)
//!
//! # Error Policy
//!
//! [`SolverError`] is returned only from construction, configuration and
//! handle-lookup surfaces. The per-step solve path never returns errors:
//! malformed per-frame input (disabled constraint, non-dynamic body) is a
//! silent no-op, because a best-effort per-frame solver must never abort a
//! step.
//!
//! # Coordinate System
//!
//! - X: right
//! - Y: forward
//! - Z: up
//! - Right-handed, SI units (meters, kilograms, seconds)
//!
//! # Example
//!
//! ```
//! use axle_types::{MassProperties, ObjectState, Pose, Twist};
//! use nalgebra::Point3;
//!
//! let pose = Pose::from_position(Point3::new(0.0, 0.0, 1.0));
//! let mass = MassProperties::sphere(10.0, 0.3);
//!
//! assert!(mass.inv_mass() > 0.0);
//! assert!(ObjectState::Dynamic.is_dynamic());
//! assert!(!ObjectState::Sleeping.is_dynamic());
//! # let _ = (pose, Twist::zero());
//! ```

#![doc(html_root_url = "https://docs.rs/axle-types/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
// Allow certain clippy lints that are overly pedantic for type definitions
#![allow(
    clippy::missing_const_for_fn,  // Many methods can't be const due to nalgebra
    clippy::suboptimal_flops,      // mul_add style changes aren't always clearer
    clippy::missing_errors_doc,    // Error docs added where non-obvious
)]

mod body;
mod config;
mod error;
mod shape;

pub use body::{KinematicTarget, MassProperties, ObjectState, ParticleId, Pose, Twist};
pub use config::Gravity;
pub use error::{Result, SolverError};
pub use shape::{CollisionData, MaterialData, ParticleShape};
