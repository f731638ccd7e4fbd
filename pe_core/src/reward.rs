//! Pluggable reward hook.

use crate::agent::AgentId;
use crate::store::AgentStore;

/// Computes one agent's reward at the end of a step.
///
/// Reward shaping is not part of the engine; the reference behavior is all
/// zeros. A training setup injects its own implementation at controller
/// construction and gets the post-step store plus the current
/// pursuer-evader separation to work with.
pub trait RewardFn: Send {
    fn reward(&self, agent: AgentId, store: &AgentStore, separation: f64) -> f64;
}

/// Reference reward: zero for every agent on every step.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroReward;

impl RewardFn for ZeroReward {
    fn reward(&self, _agent: AgentId, _store: &AgentStore, _separation: f64) -> f64 {
        0.0
    }
}
