//! Cross-thread particle state sync.
//!
//! The simulation advances on its own thread while the game thread keeps
//! writing to the same logical particles. This crate is the reconciliation
//! layer between the two, one [`ParticleProxy`] per particle:
//!
//! - **Push** (game thread -> physics): [`DirtyParticleData`] accumulates
//!   what changed; [`ParticleProxy::push_to_physics_state`] applies it to
//!   the evolution with the side effects each change requires
//! - **Buffer** (physics thread): [`PullSnapshot`] captures end-of-step
//!   results, double-buffered by the caller so the game thread can
//!   interpolate between the two most recent steps
//! - **Pull** (physics -> game thread):
//!   [`ParticleProxy::pull_from_physics_state`] writes results into the
//!   external view, reconciling per channel against [`Overwrite`] records
//!   of game-thread writes the step had not yet consumed
//!
//! # Timestamps
//!
//! Every game-thread write carries the external frame number it happened
//! in; every solver step records the frame whose input it consumed. A
//! result only overrides the external value of a channel when the step
//! consumed that channel's last write - otherwise the game thread is ahead
//! and its value stands. This is what keeps a teleport issued mid-step
//! from being snapped back by a stale simulation result.
//!
//! # Threading
//!
//! Nothing here locks. The types are plain data meant to be moved across
//! a channel or guarded by the caller's own synchronization; `Send` comes
//! for free from the field types.

#![doc(html_root_url = "https://docs.rs/axle-proxy/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn, // nalgebra constructors aren't const
    clippy::suboptimal_flops,
)]

mod dirty;
mod proxy;
mod pull;

pub use dirty::{
    DirtyDynamics, DirtyMisc, DirtyParticleData, NonFrequentData, ProxyConfig, ShapeDirtyData,
};
pub use proxy::{ExternalState, Overwrite, ParticleProxy, ProxyTimestamps};
pub use pull::{PullData, PullSnapshot};
