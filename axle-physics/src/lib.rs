//! Unified API for the axle rigid-body suspension solver.
//!
//! This crate re-exports the complete solver stack:
//!
//! - [`axle_types`] - Core data types (particles, poses, mass, shapes)
//! - [`axle_contact`] - Solver bodies and single-manifold contact solving
//! - [`axle_suspension`] - XPBD suspension constraints with hard-stop
//! - [`axle_core`] - The evolution loop and acceleration structure
//! - [`axle_proxy`] - Cross-thread particle state sync
//!
//! # Quick Start
//!
//! ```
//! use axle_physics::prelude::*;
//! use nalgebra::{Point3, Vector3};
//!
//! // A chassis held up by one suspension spring.
//! let mut evolution = MinEvolution::new(EvolutionConfig::default())?;
//! let chassis = evolution.create_particle(
//!     Pose::from_position(Point3::new(0.0, 0.0, 0.3)),
//!     MassProperties::cuboid(1500.0, Vector3::new(4.0, 2.0, 1.0)),
//!     ObjectState::Dynamic,
//! );
//! let wheel = evolution.suspension_mut().add_constraint(
//!     chassis,
//!     Vector3::zeros(),
//!     SuspensionSettings {
//!         target: Point3::origin(),
//!         min_length: 0.1,
//!         max_length: 0.5,
//!         spring_stiffness: 2.5e4, // per position iteration, 8 by default
//!         spring_damping: 4.0e3,
//!         ..SuspensionSettings::default()
//!     },
//! )?;
//!
//! evolution.advance(1.0 / 60.0, 60)?;
//!
//! let results = evolution.suspension().results(wheel)?;
//! assert!(results.length > 0.1 && results.length < 0.5);
//! # Ok::<(), axle_physics::prelude::SolverError>(())
//! ```
//!
//! # Cross-Thread Sync
//!
//! ```
//! use axle_physics::prelude::*;
//! use nalgebra::Point3;
//!
//! let mut evolution = MinEvolution::new(EvolutionConfig::default())?;
//! let ball = evolution.create_particle(
//!     Pose::from_position(Point3::new(0.0, 0.0, 5.0)),
//!     MassProperties::sphere(1.0, 0.5),
//!     ObjectState::Dynamic,
//! );
//! let mut proxy = ParticleProxy::new(ball, ExternalState::default());
//!
//! // Game thread teleports the ball at frame 3, then physics steps.
//! proxy.write_position(Point3::new(0.0, 0.0, 5.0), 3);
//! let dirty = DirtyParticleData {
//!     xr: Some(proxy.external().pose),
//!     ..DirtyParticleData::default()
//! };
//! proxy.push_to_physics_state(&mut evolution, dirty, &ProxyConfig::default())?;
//! evolution.advance(1.0 / 60.0, 1)?;
//!
//! // The step consumed input through frame 4, so the result wins.
//! let snapshot = PullSnapshot::capture(&evolution, 4);
//! let pulled = *snapshot.find(ball).unwrap();
//! proxy.pull_from_physics_state(
//!     &pulled,
//!     snapshot.solver_timestamp,
//!     None,
//!     1.0,
//!     None,
//!     &ProxyConfig::default(),
//! );
//! assert!(proxy.external().pose.position.z < 5.0); // fell this step
//! # Ok::<(), SolverError>(())
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                axle-physics (this crate)            │
//! │                Unified API / re-exports             │
//! └─────────────────────────────────────────────────────┘
//!                           │
//!            ┌──────────────┴──────────────┐
//!            ▼                             ▼
//! ┌─────────────────────┐       ┌─────────────────────┐
//! │     axle-proxy      │       │      axle-core      │
//! │  Cross-thread sync  │──────▶│   Evolution loop    │
//! └─────────────────────┘       └──────────┬──────────┘
//!                                          │
//!                               ┌──────────▼──────────┐
//!                               │   axle-suspension   │
//!                               │  Spring + hard-stop │
//!                               └──────────┬──────────┘
//!                                          │
//!                               ┌──────────▼──────────┐
//!                               │     axle-contact    │
//!                               │ Bodies + manifolds  │
//!                               └──────────┬──────────┘
//!                                          │
//!                               ┌──────────▼──────────┐
//!                               │      axle-types     │
//!                               │     Data structs    │
//!                               └─────────────────────┘
//! ```

#![doc(html_root_url = "https://docs.rs/axle-physics/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]

// Re-export sub-crates
pub use axle_contact;
pub use axle_core;
pub use axle_proxy;
pub use axle_suspension;
pub use axle_types;

// Re-export nalgebra for convenience
pub use nalgebra;

/// Prelude module for convenient imports.
///
/// Import everything you need with a single line:
///
/// ```
/// use axle_physics::prelude::*;
/// ```
pub mod prelude {
    // ========================================================================
    // Core types from axle-types
    // ========================================================================

    // Particles and motion
    pub use axle_types::{
        KinematicTarget, MassProperties, ObjectState, ParticleId, Pose, Twist,
    };

    // Shapes
    pub use axle_types::{CollisionData, MaterialData, ParticleShape};

    // Configuration
    pub use axle_types::Gravity;

    // Errors
    pub use axle_types::{Result, SolverError};

    // ========================================================================
    // Solver bodies and contact from axle-contact
    // ========================================================================

    pub use axle_contact::{
        ContactSolver, IslandScratch, ManifoldPoint, ManifoldPointInit, SolverBody,
        SolverBodyContainer,
    };

    // ========================================================================
    // Suspension constraints from axle-suspension
    // ========================================================================

    pub use axle_suspension::{
        SuspensionConstraints, SuspensionHandle, SuspensionResults, SuspensionSettings,
        SuspensionTuning,
    };

    // ========================================================================
    // Evolution loop from axle-core
    // ========================================================================

    pub use axle_core::{
        Aabb, AccelerationStructure, EvolutionConfig, MinEvolution, ParticleSet, RigidParticle,
    };

    // ========================================================================
    // Cross-thread sync from axle-proxy
    // ========================================================================

    pub use axle_proxy::{
        DirtyDynamics, DirtyMisc, DirtyParticleData, ExternalState, NonFrequentData, Overwrite,
        ParticleProxy, ProxyConfig, ProxyTimestamps, PullData, PullSnapshot, ShapeDirtyData,
    };
}
