//! The propagator contract.

use serde::{Deserialize, Serialize};

use crate::elements::ClassicalElements;
use crate::epoch::Epoch;
use crate::error::DynamicsError;
use crate::state::CartesianState;

/// Earth's gravitational parameter GM, m³/s².
pub const MU_EARTH: f64 = 3.986_004_418e14;

/// Dynamics configuration handed to every propagation call.
///
/// This is a plain immutable value, constructed once per episode and passed
/// explicitly: two episodes running side by side can use different
/// configurations without any shared state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DynamicsConfig {
    /// Gravitational parameter of the central body, m³/s²
    pub mu: f64,
}

impl Default for DynamicsConfig {
    fn default() -> Self {
        Self { mu: MU_EARTH }
    }
}

/// Advances orbital states in time and converts between representations.
///
/// Implementations must be deterministic for fixed inputs, and
/// [`propagate`](Propagator::propagate) must return an epoch advanced by
/// exactly `dt_secs`. The trait takes `&self`: an implementation holding
/// interior mutable state (e.g. a handle to a native engine) must document
/// whether it is safe to share across threads; the episode controller never
/// assumes it is.
pub trait Propagator {
    /// Converts classical orbital elements to a Cartesian state.
    fn elements_to_state(
        &self,
        elements: &ClassicalElements,
        config: &DynamicsConfig,
    ) -> Result<CartesianState, DynamicsError>;

    /// Converts a Cartesian state to classical orbital elements.
    fn state_to_elements(
        &self,
        state: &CartesianState,
        config: &DynamicsConfig,
    ) -> Result<ClassicalElements, DynamicsError>;

    /// Advances `state` forward by `dt_secs` seconds.
    ///
    /// Returns the new epoch (always `epoch + dt_secs`) and the new state.
    fn propagate(
        &self,
        epoch: Epoch,
        state: &CartesianState,
        dt_secs: f64,
        config: &DynamicsConfig,
    ) -> Result<(Epoch, CartesianState), DynamicsError>;
}
