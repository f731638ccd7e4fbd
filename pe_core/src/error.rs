//! Error types for the episode engine.
//!
//! Nothing in this crate retries: every failure is reported upward
//! immediately, and a step either fully succeeds or leaves the episode in
//! an error state the caller must `reset()` out of.

use thiserror::Error;

/// Errors surfaced by the episode engine.
#[derive(Debug, Error)]
pub enum EpisodeError {
    /// Invalid `EpisodeConfig` at construction (non-1v1 agent counts,
    /// non-positive budget or impulse cap, ...)
    #[error("invalid episode configuration: {0}")]
    Configuration(String),

    /// Action mapping missing an entry for a live agent, or containing a
    /// non-finite impulse vector
    #[error("invalid action: {0}")]
    InvalidAction(String),

    /// `step()` invoked outside the READY/RUNNING phases
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Internal invariant violated (NaN state, negative budget, epoch
    /// mismatch, propagator failure). Unrecoverable for the episode.
    #[error("episode state corrupted: {0}")]
    StateCorruption(String),
}

impl EpisodeError {
    /// Creates a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Creates an invalid-action error.
    pub fn invalid_action(msg: impl Into<String>) -> Self {
        Self::InvalidAction(msg.into())
    }

    /// Creates an invalid-state error.
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    /// Creates a state-corruption error.
    pub fn corruption(msg: impl Into<String>) -> Self {
        Self::StateCorruption(msg.into())
    }
}
