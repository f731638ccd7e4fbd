//! Orbital dynamics layer for the pursuit-evasion environment.
//!
//! This crate pins the data model the rest of the workspace is built on:
//! - **One frame, one unit system**: all Cartesian states are J2000-style
//!   inertial, in meters and meters/second. Conversions happen at this
//!   boundary only, never ad hoc at call sites.
//! - **Explicit time**: epochs are UTC calendar timestamps, advanced by the
//!   propagator in lockstep with the state.
//! - **Explicit configuration**: the dynamics configuration is a plain value
//!   passed into every propagation call. There is no shared mutable
//!   propagator state, so independent episodes never couple through it.
//!
//! The [`Propagator`] trait is the seam to swap in a high-fidelity engine;
//! [`TwoBodyPropagator`] is the built-in closed-form implementation.

mod elements;
mod epoch;
mod error;
mod kepler;
mod propagator;
mod state;

pub use elements::ClassicalElements;
pub use epoch::Epoch;
pub use error::DynamicsError;
pub use kepler::TwoBodyPropagator;
pub use propagator::{DynamicsConfig, Propagator, MU_EARTH};
pub use state::CartesianState;
