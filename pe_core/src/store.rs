//! Per-agent state storage.

use std::collections::HashMap;

use nalgebra::Vector3;
use pe_dynamics::CartesianState;

use crate::agent::AgentId;
use crate::error::EpisodeError;

/// Holds each agent's Cartesian state and remaining delta-v budget.
///
/// Reads are public; writes are crate-private so only the episode controller
/// can mutate an episode. Writes re-check the data-model invariants (finite
/// states, non-negative budgets) and report violations as
/// [`EpisodeError::StateCorruption`] rather than repairing them; a NaN or a
/// negative budget here means an upstream bug, not normal operation.
pub struct AgentStore {
    states: HashMap<AgentId, CartesianState>,
    budgets: HashMap<AgentId, f64>,
}

impl AgentStore {
    /// Creates a store with zeroed states and budgets for the given agents.
    pub(crate) fn new(agents: &[AgentId]) -> Self {
        let zero = CartesianState::new(Vector3::zeros(), Vector3::zeros());
        Self {
            states: agents.iter().map(|a| (*a, zero)).collect(),
            budgets: agents.iter().map(|a| (*a, 0.0)).collect(),
        }
    }

    /// Returns an agent's current state.
    pub fn state(&self, agent: AgentId) -> Option<&CartesianState> {
        self.states.get(&agent)
    }

    /// Returns an agent's remaining delta-v budget, m/s.
    pub fn budget(&self, agent: AgentId) -> Option<f64> {
        self.budgets.get(&agent).copied()
    }

    /// Returns a copy of every agent's state.
    pub fn snapshot(&self) -> HashMap<AgentId, CartesianState> {
        self.states.clone()
    }

    /// Reinstalls an agent's state and budget at episode reset.
    pub(crate) fn reinstate(&mut self, agent: AgentId, state: CartesianState, budget: f64) {
        self.states.insert(agent, state);
        self.budgets.insert(agent, budget);
    }

    /// Overwrites an agent's state, rejecting non-finite components.
    pub(crate) fn set_state(
        &mut self,
        agent: AgentId,
        state: CartesianState,
    ) -> Result<(), EpisodeError> {
        if !state.is_finite() {
            return Err(EpisodeError::corruption(format!(
                "non-finite state for agent {agent}: {state:?}"
            )));
        }
        match self.states.get_mut(&agent) {
            Some(slot) => {
                *slot = state;
                Ok(())
            }
            None => Err(EpisodeError::corruption(format!("unknown agent {agent}"))),
        }
    }

    /// Charges an impulse magnitude against an agent's budget.
    ///
    /// Returns the remaining budget.
    pub(crate) fn charge(&mut self, agent: AgentId, magnitude: f64) -> Result<f64, EpisodeError> {
        let budget = self
            .budgets
            .get_mut(&agent)
            .ok_or_else(|| EpisodeError::corruption(format!("unknown agent {agent}")))?;

        if !magnitude.is_finite() || magnitude < 0.0 {
            return Err(EpisodeError::corruption(format!(
                "invalid impulse magnitude {magnitude} for agent {agent}"
            )));
        }

        let remaining = *budget - magnitude;
        if remaining < 0.0 {
            return Err(EpisodeError::corruption(format!(
                "budget for agent {agent} driven negative ({remaining})"
            )));
        }

        *budget = remaining;
        Ok(remaining)
    }
}
