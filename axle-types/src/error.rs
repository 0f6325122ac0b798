//! Error types for solver configuration and lookup surfaces.
//!
//! The per-step solve path never returns these: a disabled constraint or a
//! non-dynamic body is a silent no-op. Errors exist only where the caller can
//! act on them, at construction, configuration and handle-resolution time.

use crate::ParticleId;
use thiserror::Error;

/// Errors that can occur configuring or querying the solver.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SolverError {
    /// A particle ID that no registered particle backs.
    #[error("unknown particle: {0}")]
    UnknownParticle(ParticleId),

    /// A constraint handle whose slot was freed or reused.
    ///
    /// Removal bumps the slot generation, so any handle held across a
    /// `remove_constraint` elsewhere in the container fails this check
    /// instead of silently aliasing the constraint swapped into its place.
    #[error("stale constraint handle: index {index}, generation {generation}")]
    StaleHandle {
        /// Slot index the handle pointed at.
        index: u32,
        /// Generation the handle was issued with.
        generation: u32,
    },

    /// Suspension travel limits violate `min_length <= max_length`.
    #[error("invalid travel limits: min {min} > max {max}")]
    InvalidTravelLimits {
        /// Configured minimum length.
        min: f64,
        /// Configured maximum length.
        max: f64,
    },

    /// Invalid timestep.
    #[error("invalid timestep: {0} (must be positive and finite)")]
    InvalidTimestep(f64),

    /// Invalid configuration.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the configuration error.
        reason: String,
    },

    /// A per-shape update referenced a shape index the particle doesn't have.
    #[error("shape index {index} out of range ({count} shapes)")]
    ShapeIndexOutOfRange {
        /// Offending shape index.
        index: usize,
        /// Number of shapes on the particle.
        count: usize,
    },
}

impl SolverError {
    /// Create an `InvalidConfig` error from any printable reason.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }
}

/// Convenient result alias for solver operations.
pub type Result<T> = std::result::Result<T, SolverError>;
