//! Error types for the dynamics layer.

use thiserror::Error;

/// Errors that can occur while converting or propagating orbital states.
#[derive(Debug, Error)]
pub enum DynamicsError {
    /// Input or computed state contains NaN or infinite components
    #[error("non-finite state: {0}")]
    NonFiniteState(String),

    /// Orbit is not elliptic (parabolic/hyperbolic, or degenerate geometry)
    #[error("unsupported orbit: {0}")]
    UnsupportedOrbit(String),

    /// Kepler's equation solver did not converge
    #[error("Kepler solver failed to converge after {0} iterations")]
    NoConvergence(usize),
}

impl DynamicsError {
    /// Creates a non-finite-state error.
    pub fn non_finite(msg: impl Into<String>) -> Self {
        Self::NonFiniteState(msg.into())
    }

    /// Creates an unsupported-orbit error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedOrbit(msg.into())
    }
}
