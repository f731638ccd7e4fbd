//! The episode controller state machine.

use std::collections::HashMap;
use std::f64::consts::TAU;

use nalgebra::Vector3;
use pe_dynamics::{CartesianState, Epoch, Propagator};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Uniform};
use serde::{Deserialize, Serialize};

use crate::action::{clamp_impulse, ActionSpace, ObservationSpace};
use crate::agent::{AgentId, Role};
use crate::config::EpisodeConfig;
use crate::error::EpisodeError;
use crate::reward::{RewardFn, ZeroReward};
use crate::store::AgentStore;

/// Lifecycle phase of an episode.
///
/// `Terminal` is absorbing until the next `reset()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Constructed, never reset
    Uninitialized,

    /// Reset, no step taken yet
    Ready,

    /// At least one step taken
    Running,

    /// Terminated or truncated
    Terminal,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Uninitialized => "uninitialized",
            Phase::Ready => "ready",
            Phase::Running => "running",
            Phase::Terminal => "terminal",
        };
        write!(f, "{name}")
    }
}

/// Per-agent step diagnostics.
///
/// Clamping is silent by design; the magnitude actually applied is surfaced
/// here so a training loop can observe it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StepInfo {
    /// Impulse magnitude applied this step after clamping, m/s
    pub applied_dv: f64,

    /// Remaining delta-v budget after this step, m/s
    pub remaining_dv: f64,
}

/// Everything a `step()` returns, keyed per agent.
#[derive(Debug, Clone)]
pub struct StepOutput {
    /// Fresh per-agent state snapshots (never aliases of engine state)
    pub observations: HashMap<AgentId, CartesianState>,

    /// Per-agent rewards from the injected reward hook
    pub rewards: HashMap<AgentId, f64>,

    /// Episode-wide capture flag, broadcast identically to every agent
    pub terminations: HashMap<AgentId, bool>,

    /// Episode-wide time-budget flag, broadcast identically to every agent
    pub truncations: HashMap<AgentId, bool>,

    /// Per-agent diagnostics
    pub infos: HashMap<AgentId, StepInfo>,
}

impl StepOutput {
    /// Returns true when the episode ended this step (either flag).
    pub fn done(&self) -> bool {
        self.terminations.values().any(|t| *t) || self.truncations.values().any(|t| *t)
    }
}

/// The episode simulation engine.
///
/// Owns the simulation clock, the per-agent state store and the lifecycle
/// phase; orchestrates impulse application, per-agent propagation and the
/// termination/truncation decision. Single-threaded and synchronous:
/// `reset()` and `step()` are blocking calls, and the propagator is invoked
/// serially, never concurrently. Episodes running in parallel must each own
/// their controller.
pub struct EpisodeController<P: Propagator> {
    config: EpisodeConfig,
    propagator: P,
    reward: Box<dyn RewardFn>,
    agents: Vec<AgentId>,
    store: AgentStore,
    initial_epoch: Epoch,
    epoch: Epoch,
    step_count: u64,
    phase: Phase,
    rng: ChaCha8Rng,
}

impl<P: Propagator> EpisodeController<P> {
    /// Builds a controller, validating the configuration.
    pub fn new(config: EpisodeConfig, propagator: P) -> Result<Self, EpisodeError> {
        config.validate()?;

        let agents = config.agent_ids();
        let store = AgentStore::new(&agents);
        let initial_epoch = config.init_epoch;

        Ok(Self {
            config,
            propagator,
            reward: Box::new(ZeroReward),
            agents,
            store,
            initial_epoch,
            epoch: initial_epoch,
            step_count: 0,
            phase: Phase::Uninitialized,
            rng: ChaCha8Rng::seed_from_u64(0),
        })
    }

    /// Replaces the reward hook (default: zero for everyone).
    pub fn with_reward(mut self, reward: impl RewardFn + 'static) -> Self {
        self.reward = Box::new(reward);
        self
    }

    /// Agent ids in stable order: pursuers first, then evaders.
    pub fn agents(&self) -> &[AgentId] {
        &self.agents
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Current simulation epoch.
    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    /// Steps taken since the last reset.
    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// The episode configuration.
    pub fn config(&self) -> &EpisodeConfig {
        &self.config
    }

    /// Read access to the per-agent store.
    pub fn store(&self) -> &AgentStore {
        &self.store
    }

    /// Action-space descriptor, identical for every agent.
    pub fn action_space(&self) -> ActionSpace {
        ActionSpace::new(self.config.dv_step)
    }

    /// Observation-space descriptor, identical for every agent.
    pub fn observation_space(&self) -> ObservationSpace {
        ObservationSpace::new()
    }

    /// Copy of every agent's current state, for display sinks.
    pub fn snapshot(&self) -> HashMap<AgentId, CartesianState> {
        self.store.snapshot()
    }

    /// Current pursuer-evader distance, m. Meaningful after a reset.
    pub fn separation(&self) -> f64 {
        match (
            self.store.state(AgentId::pursuer(0)),
            self.store.state(AgentId::evader(0)),
        ) {
            (Some(p), Some(e)) => p.distance_to(e),
            _ => f64::NAN,
        }
    }

    /// Starts a new episode.
    ///
    /// Draws a reference true anomaly uniformly on `[0, 2π)`, offsets the
    /// evader from it and the pursuer from the evader by independent uniform
    /// draws in `±phase_jitter`, and places both agents on the reference
    /// orbit at those phases. Budgets, clock and step counter are reset.
    ///
    /// `Some(seed)` reseeds the episode RNG for a reproducible draw; `None`
    /// continues the current stream.
    pub fn reset(
        &mut self,
        seed: Option<u64>,
    ) -> Result<(HashMap<AgentId, CartesianState>, HashMap<AgentId, StepInfo>), EpisodeError> {
        if let Some(seed) = seed {
            self.rng = ChaCha8Rng::seed_from_u64(seed);
        }

        let jitter = Uniform::new(-self.config.phase_jitter, self.config.phase_jitter);
        let ta_ref = Uniform::new(0.0, TAU).sample(&mut self.rng);
        let ta_eva = (ta_ref + jitter.sample(&mut self.rng)).rem_euclid(TAU);
        let ta_pur = (ta_eva + jitter.sample(&mut self.rng)).rem_euclid(TAU);

        for agent in self.agents.clone() {
            let ta = match agent.role {
                Role::Pursuer => ta_pur,
                Role::Evader => ta_eva,
            };
            let elements = self.config.reference_orbit.elements_at(ta);
            let state = self
                .propagator
                .elements_to_state(&elements, &self.config.dynamics)
                .map_err(|e| {
                    EpisodeError::corruption(format!("initial state conversion failed: {e}"))
                })?;
            if !state.is_finite() {
                return Err(EpisodeError::corruption(format!(
                    "propagator produced non-finite initial state for {agent}"
                )));
            }
            self.store.reinstate(agent, state, self.config.initial_dv);
        }

        self.epoch = self.config.init_epoch;
        self.initial_epoch = self.config.init_epoch;
        self.step_count = 0;
        self.phase = Phase::Ready;

        let infos = self
            .agents
            .iter()
            .map(|a| {
                (
                    *a,
                    StepInfo {
                        applied_dv: 0.0,
                        remaining_dv: self.config.initial_dv,
                    },
                )
            })
            .collect();

        Ok((self.store.snapshot(), infos))
    }

    /// Advances the episode by one step interval.
    ///
    /// `actions` must contain one finite impulse vector per live agent
    /// (extra entries are ignored). Impulses are clamped per
    /// [`clamp_impulse`], applied to each agent's velocity and charged
    /// against its budget; every agent is then propagated by exactly one
    /// step interval; finally capture and time-budget predicates are
    /// evaluated episode-wide.
    pub fn step(
        &mut self,
        actions: &HashMap<AgentId, Vector3<f64>>,
    ) -> Result<StepOutput, EpisodeError> {
        match self.phase {
            Phase::Ready | Phase::Running => {}
            Phase::Uninitialized => {
                return Err(EpisodeError::invalid_state(
                    "step() before the first reset()",
                ))
            }
            Phase::Terminal => {
                return Err(EpisodeError::invalid_state(
                    "step() on a finished episode; call reset() first",
                ))
            }
        }

        // Validate the whole mapping before touching any state, so a bad
        // call leaves the episode unchanged.
        let mut proposed = Vec::with_capacity(self.agents.len());
        for agent in &self.agents {
            let dv = actions.get(agent).ok_or_else(|| {
                EpisodeError::invalid_action(format!("missing action for agent {agent}"))
            })?;
            if !dv.iter().all(|c| c.is_finite()) {
                return Err(EpisodeError::invalid_action(format!(
                    "non-finite action for agent {agent}: {dv:?}"
                )));
            }
            proposed.push((*agent, *dv));
        }

        self.phase = Phase::Running;

        // Impulses are independent and instantaneous; application order
        // cannot affect the outcome.
        let mut infos = HashMap::with_capacity(self.agents.len());
        for (agent, raw) in &proposed {
            let budget = self.stored_budget(*agent)?;
            let clamped = clamp_impulse(*raw, self.config.dv_step, budget);

            let state = self.stored_state(*agent)?;
            self.store.set_state(*agent, state.with_impulse(clamped.dv))?;
            let remaining = self.store.charge(*agent, clamped.magnitude)?;

            infos.insert(
                *agent,
                StepInfo {
                    applied_dv: clamped.magnitude,
                    remaining_dv: remaining,
                },
            );
        }

        // Propagate each agent independently; coupling exists only through
        // the termination predicate below.
        let dt = self.config.step_interval;
        let next_epoch = self.epoch.advance(dt);
        for (agent, _) in &proposed {
            let state = self.stored_state(*agent)?;
            let (agent_epoch, new_state) = self
                .propagator
                .propagate(self.epoch, &state, dt, &self.config.dynamics)
                .map_err(|e| {
                    EpisodeError::corruption(format!("propagation failed for {agent}: {e}"))
                })?;
            if agent_epoch != next_epoch {
                return Err(EpisodeError::corruption(format!(
                    "epoch mismatch for {agent}: propagator returned {agent_epoch}, expected {next_epoch}"
                )));
            }
            self.store.set_state(*agent, new_state)?;
        }
        self.epoch = next_epoch;
        self.step_count += 1;

        // Capture is a joint event: one decision, broadcast to every agent.
        let pursuer = self.stored_state(AgentId::pursuer(0))?;
        let evader = self.stored_state(AgentId::evader(0))?;
        let separation = pursuer.distance_to(&evader);

        let mut captured = separation < self.config.capture_radius;
        if let Some(max_speed) = self.config.capture_speed {
            captured = captured && pursuer.speed_relative_to(&evader) < max_speed;
        }

        let exhausted = self.config.end_on_dv_exhaustion
            && self
                .agents
                .iter()
                .filter(|a| a.role == Role::Pursuer)
                .all(|a| self.store.budget(*a) == Some(0.0));

        let terminated = captured || exhausted;
        let truncated = self.epoch.seconds_since(&self.initial_epoch) >= self.config.episode_length;

        if terminated || truncated {
            self.phase = Phase::Terminal;
        }

        let rewards = self
            .agents
            .iter()
            .map(|a| (*a, self.reward.reward(*a, &self.store, separation)))
            .collect();
        let terminations = self.agents.iter().map(|a| (*a, terminated)).collect();
        let truncations = self.agents.iter().map(|a| (*a, truncated)).collect();

        Ok(StepOutput {
            observations: self.store.snapshot(),
            rewards,
            terminations,
            truncations,
            infos,
        })
    }

    fn stored_state(&self, agent: AgentId) -> Result<CartesianState, EpisodeError> {
        self.store
            .state(agent)
            .copied()
            .ok_or_else(|| EpisodeError::corruption(format!("unknown agent {agent}")))
    }

    fn stored_budget(&self, agent: AgentId) -> Result<f64, EpisodeError> {
        self.store
            .budget(agent)
            .ok_or_else(|| EpisodeError::corruption(format!("unknown agent {agent}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pe_dynamics::TwoBodyPropagator;

    fn controller(config: EpisodeConfig) -> EpisodeController<TwoBodyPropagator> {
        EpisodeController::new(config, TwoBodyPropagator::new()).unwrap()
    }

    fn zero_actions(agents: &[AgentId]) -> HashMap<AgentId, Vector3<f64>> {
        agents.iter().map(|a| (*a, Vector3::zeros())).collect()
    }

    #[test]
    fn test_reset_seeds_both_agents_on_the_reference_orbit() {
        let mut env = controller(EpisodeConfig::default());
        let (obs, infos) = env.reset(Some(0)).unwrap();

        assert_eq!(obs.len(), 2);
        for agent in [AgentId::pursuer(0), AgentId::evader(0)] {
            let state = obs[&agent];
            assert!(state.is_finite());
            // Same semi-major axis for both: radius equals sma on a circle.
            assert!((state.position.norm() - 42_166_300.0).abs() < 1.0);
            assert_eq!(infos[&agent].remaining_dv, 100.0);
        }
        assert_eq!(env.phase(), Phase::Ready);
        assert_eq!(env.step_count(), 0);
    }

    #[test]
    fn test_reset_is_reproducible() {
        let mut a = controller(EpisodeConfig::default());
        let mut b = controller(EpisodeConfig::default());

        let (obs_a, _) = a.reset(Some(42)).unwrap();
        let (obs_b, _) = b.reset(Some(42)).unwrap();

        for agent in a.agents().to_vec() {
            assert_eq!(obs_a[&agent].position, obs_b[&agent].position);
            assert_eq!(obs_a[&agent].velocity, obs_b[&agent].velocity);
        }
    }

    #[test]
    fn test_reset_without_seed_continues_the_stream() {
        let mut env = controller(EpisodeConfig::default());

        let (first, _) = env.reset(Some(1)).unwrap();
        let (second, _) = env.reset(None).unwrap();

        let p = AgentId::pursuer(0);
        assert_ne!(first[&p].position, second[&p].position);
    }

    #[test]
    fn test_step_before_reset_is_invalid_state() {
        let mut env = controller(EpisodeConfig::default());
        let actions = zero_actions(&[AgentId::pursuer(0), AgentId::evader(0)]);

        let err = env.step(&actions).unwrap_err();
        assert!(matches!(err, EpisodeError::InvalidState(_)));
    }

    #[test]
    fn test_missing_action_is_rejected() {
        let mut env = controller(EpisodeConfig::default());
        env.reset(Some(0)).unwrap();

        let mut actions = HashMap::new();
        actions.insert(AgentId::pursuer(0), Vector3::zeros());

        let err = env.step(&actions).unwrap_err();
        assert!(matches!(err, EpisodeError::InvalidAction(_)));
        // The failed call must not have consumed the step.
        assert_eq!(env.step_count(), 0);
    }

    #[test]
    fn test_non_finite_action_is_rejected() {
        let mut env = controller(EpisodeConfig::default());
        env.reset(Some(0)).unwrap();

        let mut actions = zero_actions(env.agents());
        actions.insert(AgentId::evader(0), Vector3::new(0.0, f64::NAN, 0.0));

        let err = env.step(&actions).unwrap_err();
        assert!(matches!(err, EpisodeError::InvalidAction(_)));
    }

    #[test]
    fn test_budget_decrements_by_exactly_the_applied_magnitude() {
        let mut env = controller(EpisodeConfig::default());
        env.reset(Some(0)).unwrap();

        let p = AgentId::pursuer(0);
        let mut budget_before = env.store().budget(p).unwrap();

        for i in 0..5 {
            let mut actions = zero_actions(env.agents());
            actions.insert(p, Vector3::new(0.4 + 0.3 * i as f64, -0.2, 0.1));

            let out = env.step(&actions).unwrap();
            let info = out.infos[&p];

            assert_eq!(budget_before - info.applied_dv, info.remaining_dv);
            assert!(info.remaining_dv <= budget_before);
            assert!(info.applied_dv <= env.config().dv_step);
            budget_before = info.remaining_dv;
        }
    }

    #[test]
    fn test_zero_budget_agent_moves_on_rails() {
        // Twin controllers, identical seeds. Both exhaust the pursuer's
        // budget on step one; on step two only one of them requests a huge
        // burn. With nothing left to spend, the trajectories must match.
        let config = EpisodeConfig {
            initial_dv: 1.0,
            ..EpisodeConfig::default()
        };
        let mut a = controller(config.clone());
        let mut b = controller(config);
        a.reset(Some(7)).unwrap();
        b.reset(Some(7)).unwrap();

        let p = AgentId::pursuer(0);
        let burn: HashMap<_, _> = [
            (p, Vector3::new(1.0, 0.0, 0.0)),
            (AgentId::evader(0), Vector3::zeros()),
        ]
        .into_iter()
        .collect();

        let out_a = a.step(&burn).unwrap();
        let out_b = b.step(&burn).unwrap();
        assert_eq!(out_a.infos[&p].remaining_dv, 0.0);
        assert_eq!(out_b.infos[&p].remaining_dv, 0.0);

        let mut big_burn = zero_actions(a.agents());
        big_burn.insert(p, Vector3::new(50.0, -30.0, 20.0));
        let out_a = a.step(&big_burn).unwrap();
        let out_b = b.step(&zero_actions(b.agents())).unwrap();

        assert_eq!(out_a.infos[&p].applied_dv, 0.0);
        assert_eq!(out_a.observations[&p].position, out_b.observations[&p].position);
        assert_eq!(out_a.observations[&p].velocity, out_b.observations[&p].velocity);
    }

    #[test]
    fn test_sixty_step_truncation_scenario() {
        // Default config carries the reference constants: GEO-altitude
        // circular orbit, 30 km capture radius, 3600 s episode, 60 s steps.
        let mut env = controller(EpisodeConfig::default());
        env.reset(Some(0)).unwrap();

        if env.separation() < env.config().capture_radius {
            // Degenerate draw: agents spawned inside the capture sphere.
            return;
        }

        let actions = zero_actions(&env.agents().to_vec());
        for step in 1..=60 {
            let out = env.step(&actions).unwrap();

            let truncated = out.truncations.values().all(|t| *t);
            let any_truncated = out.truncations.values().any(|t| *t);
            assert_eq!(truncated, any_truncated);

            assert!(out.terminations.values().all(|t| !*t));
            if step < 60 {
                assert!(!any_truncated, "truncated early at step {step}");
            } else {
                assert!(truncated, "no truncation after {step} steps");
            }
            for reward in out.rewards.values() {
                assert_eq!(*reward, 0.0);
            }
        }

        assert_eq!(env.step_count(), 60);
        assert_eq!(env.epoch(), env.config().init_epoch.advance(3600.0));
        assert_eq!(env.phase(), Phase::Terminal);
    }

    #[test]
    fn test_capture_terminates_all_agents_jointly() {
        // Capture radius above the maximum possible spawn separation, so
        // the very first step captures.
        let config = EpisodeConfig {
            capture_radius: 5.0e7,
            ..EpisodeConfig::default()
        };
        let mut env = controller(config);
        env.reset(Some(11)).unwrap();

        let out = env.step(&zero_actions(&env.agents().to_vec())).unwrap();

        assert!(out.terminations.values().all(|t| *t));
        assert_eq!(
            out.terminations[&AgentId::pursuer(0)],
            out.terminations[&AgentId::evader(0)]
        );
        assert!(out.truncations.values().all(|t| !*t));
        assert_eq!(env.phase(), Phase::Terminal);

        let err = env.step(&zero_actions(&env.agents().to_vec())).unwrap_err();
        assert!(matches!(err, EpisodeError::InvalidState(_)));

        // Reset brings the machine back to READY.
        env.reset(Some(12)).unwrap();
        assert_eq!(env.phase(), Phase::Ready);
    }

    #[test]
    fn test_capture_speed_gate() {
        // Two points on the same circular orbit at different phase keep a
        // relative speed of hundreds of m/s, so a tight gate blocks capture
        // and a loose one allows it.
        let base = EpisodeConfig {
            capture_radius: 5.0e7,
            ..EpisodeConfig::default()
        };

        let mut gated = controller(EpisodeConfig {
            capture_speed: Some(1.0e-3),
            ..base.clone()
        });
        gated.reset(Some(3)).unwrap();
        let out = gated.step(&zero_actions(&gated.agents().to_vec())).unwrap();
        assert!(out.terminations.values().all(|t| !*t));

        let mut open = controller(EpisodeConfig {
            capture_speed: Some(1.0e6),
            ..base
        });
        open.reset(Some(3)).unwrap();
        let out = open.step(&zero_actions(&open.agents().to_vec())).unwrap();
        assert!(out.terminations.values().all(|t| *t));
    }

    #[test]
    fn test_dv_exhaustion_termination_when_enabled() {
        let config = EpisodeConfig {
            initial_dv: 0.5,
            end_on_dv_exhaustion: true,
            ..EpisodeConfig::default()
        };
        let mut env = controller(config);
        env.reset(Some(5)).unwrap();

        let mut actions = zero_actions(env.agents());
        actions.insert(AgentId::pursuer(0), Vector3::new(1.0, 0.0, 0.0));

        let out = env.step(&actions).unwrap();
        assert_eq!(out.infos[&AgentId::pursuer(0)].remaining_dv, 0.0);
        assert!(out.terminations.values().all(|t| *t));
        assert_eq!(env.phase(), Phase::Terminal);
    }

    #[test]
    fn test_epoch_advances_with_the_shared_clock() {
        let mut env = controller(EpisodeConfig::default());
        env.reset(Some(0)).unwrap();

        let actions = zero_actions(&env.agents().to_vec());
        for _ in 0..3 {
            env.step(&actions).unwrap();
        }

        assert_eq!(env.epoch(), env.config().init_epoch.advance(180.0));
    }

    #[test]
    fn test_observations_are_snapshots() {
        let mut env = controller(EpisodeConfig::default());
        let (obs_at_reset, _) = env.reset(Some(0)).unwrap();

        let p = AgentId::pursuer(0);
        let before = obs_at_reset[&p];

        env.step(&zero_actions(&env.agents().to_vec())).unwrap();

        // The copy handed out at reset is unaffected by the step.
        assert_eq!(obs_at_reset[&p], before);
        assert_ne!(env.store().state(p).unwrap().position, before.position);
    }

    #[test]
    fn test_space_descriptors() {
        let env = controller(EpisodeConfig::default());

        let action_space = env.action_space();
        assert_eq!(action_space.low, -1.0);
        assert_eq!(action_space.high, 1.0);
        assert_eq!(ActionSpace::DIM, 3);

        let obs_space = env.observation_space();
        assert_eq!(obs_space.low, f64::NEG_INFINITY);
        assert_eq!(obs_space.high, f64::INFINITY);
        assert_eq!(ObservationSpace::DIM, 6);
    }
}
