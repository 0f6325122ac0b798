//! Minimal rigid-body evolution loop for the axle suspension solver.
//!
//! This crate owns the per-step simulation pipeline:
//!
//! - [`RigidParticle`] / [`ParticleSet`] - Rigid bodies and their storage
//! - [`Aabb`] / [`AccelerationStructure`] - World bounds and broadphase
//!   membership bookkeeping
//! - [`EvolutionConfig`] - Gravity, iteration counts, bounds extension
//! - [`MinEvolution`] - The evolution itself: integrate, gather, solve
//!   suspension constraints, scatter
//!
//! "Minimal" is deliberate: there is no narrowphase, no islands beyond a
//! single batch, and no sleeping management. The loop exists to drive the
//! suspension constraint solver and to expose the bookkeeping hooks the
//! cross-thread sync layer needs (dirty, invalidate, register, kinematic
//! targets).
//!
//! # Example
//!
//! ```
//! use axle_core::{EvolutionConfig, MinEvolution};
//! use axle_suspension::SuspensionSettings;
//! use axle_types::{MassProperties, ObjectState, Pose};
//! use nalgebra::{Point3, Vector3};
//!
//! let mut evolution = MinEvolution::new(EvolutionConfig::default())?;
//! let chassis = evolution.create_particle(
//!     Pose::from_position(Point3::new(0.0, 0.0, 0.4)),
//!     MassProperties::cuboid(1200.0, Vector3::new(4.0, 1.8, 1.2)),
//!     ObjectState::Dynamic,
//! );
//! evolution.suspension_mut().add_constraint(
//!     chassis,
//!     Vector3::new(1.3, 0.8, -0.2),
//!     SuspensionSettings::default(),
//! )?;
//! evolution.advance(1.0 / 60.0, 4)?;
//! # Ok::<(), axle_types::SolverError>(())
//! ```

#![doc(html_root_url = "https://docs.rs/axle-core/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn, // nalgebra constructors aren't const
    clippy::suboptimal_flops,
)]

mod bounds;
mod broadphase;
mod config;
mod evolution;
mod particle;

pub use bounds::Aabb;
pub use broadphase::AccelerationStructure;
pub use config::EvolutionConfig;
pub use evolution::MinEvolution;
pub use particle::{ParticleSet, RigidParticle};
