//! Action policies for driving episodes.
//!
//! The engine only consumes action vectors; behavior lives here, injected
//! into the rollout loop. A learned policy plugs in through the same
//! [`ActionPolicy`] trait the scripted ones implement.

use std::collections::HashMap;
use std::str::FromStr;

use nalgebra::Vector3;
use pe_core::{ActionSpace, AgentId, Role};
use pe_dynamics::CartesianState;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::SimError;

/// Selects an impulse for one agent each step.
///
/// Policies see the full observation mapping (what a centralized training
/// loop holds), not just their own state; the engine clamps whatever they
/// return.
pub trait ActionPolicy: Send {
    /// Name used for logging.
    fn name(&self) -> &'static str;

    /// Returns the proposed impulse for `agent`, m/s.
    fn act(
        &mut self,
        agent: AgentId,
        observations: &HashMap<AgentId, CartesianState>,
        space: &ActionSpace,
    ) -> Vector3<f64>;
}

/// Built-in policy variants selectable from the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyKind {
    /// Zero impulse every step: the agent stays on its initial orbit
    Fixed,

    /// Uniform random components within the action box
    Random,

    /// Full burn along the line of sight (toward for pursuers, away for
    /// evaders)
    Pursuit,
}

impl PolicyKind {
    /// Returns the policy name.
    pub fn name(&self) -> &'static str {
        match self {
            PolicyKind::Fixed => "fixed",
            PolicyKind::Random => "random",
            PolicyKind::Pursuit => "pursuit",
        }
    }

    /// Instantiates the policy, seeding any internal randomness.
    pub fn create(self, seed: u64) -> Box<dyn ActionPolicy> {
        match self {
            PolicyKind::Fixed => Box::new(FixedPolicy),
            PolicyKind::Random => Box::new(RandomPolicy::new(seed)),
            PolicyKind::Pursuit => Box::new(PursuitPolicy),
        }
    }
}

impl FromStr for PolicyKind {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fixed" | "none" => Ok(PolicyKind::Fixed),
            "random" => Ok(PolicyKind::Random),
            "pursuit" | "greedy" => Ok(PolicyKind::Pursuit),
            other => Err(SimError::UnknownPolicy(other.to_string())),
        }
    }
}

/// Never maneuvers.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedPolicy;

impl ActionPolicy for FixedPolicy {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn act(
        &mut self,
        _agent: AgentId,
        _observations: &HashMap<AgentId, CartesianState>,
        _space: &ActionSpace,
    ) -> Vector3<f64> {
        Vector3::zeros()
    }
}

/// Uniform random impulses within the action box.
pub struct RandomPolicy {
    rng: ChaCha8Rng,
}

impl RandomPolicy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl ActionPolicy for RandomPolicy {
    fn name(&self) -> &'static str {
        "random"
    }

    fn act(
        &mut self,
        _agent: AgentId,
        _observations: &HashMap<AgentId, CartesianState>,
        space: &ActionSpace,
    ) -> Vector3<f64> {
        Vector3::new(
            self.rng.gen_range(space.low..space.high),
            self.rng.gen_range(space.low..space.high),
            self.rng.gen_range(space.low..space.high),
        )
    }
}

/// Line-of-sight burn: pursuers thrust toward the nearest opponent, evaders
/// thrust directly away. A deliberately naive baseline, not an optimal
/// guidance law.
#[derive(Debug, Clone, Copy, Default)]
pub struct PursuitPolicy;

impl ActionPolicy for PursuitPolicy {
    fn name(&self) -> &'static str {
        "pursuit"
    }

    fn act(
        &mut self,
        agent: AgentId,
        observations: &HashMap<AgentId, CartesianState>,
        space: &ActionSpace,
    ) -> Vector3<f64> {
        let own = match observations.get(&agent) {
            Some(state) => state,
            None => return Vector3::zeros(),
        };

        let opponent = observations
            .iter()
            .filter(|(id, _)| id.role != agent.role)
            .map(|(_, state)| state)
            .min_by(|a, b| {
                own.distance_to(a)
                    .partial_cmp(&own.distance_to(b))
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

        let opponent = match opponent {
            Some(state) => state,
            None => return Vector3::zeros(),
        };

        let line_of_sight = opponent.position - own.position;
        let range = line_of_sight.norm();
        if range == 0.0 {
            return Vector3::zeros();
        }

        let direction = match agent.role {
            Role::Pursuer => line_of_sight / range,
            Role::Evader => -line_of_sight / range,
        };
        direction * space.high
    }
}
