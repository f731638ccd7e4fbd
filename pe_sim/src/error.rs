//! Error types for the rollout harness.

use thiserror::Error;

/// Errors surfaced while driving episodes.
#[derive(Debug, Error)]
pub enum SimError {
    /// The engine rejected a call or corrupted state
    #[error("episode error: {0}")]
    Episode(#[from] pe_core::EpisodeError),

    /// Export file could not be written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Unrecognized policy name on the command line
    #[error("unknown policy '{0}' (expected fixed, random or pursuit)")]
    UnknownPolicy(String),
}
