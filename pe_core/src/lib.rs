//! Episode simulation engine for 1v1 orbital pursuit-evasion.
//!
//! Both agents orbit a central body; each may apply a bounded impulsive
//! velocity change ("delta-v") once per fixed time interval. The episode
//! ends by **termination** (pursuer closes within the capture radius) or
//! **truncation** (the episode time budget expires).
//!
//! The engine is deliberately small and strict about its invariants:
//! - budgets never go negative and decrease by exactly the applied impulse,
//! - actions are clamped silently (cap first, then budget), never rejected
//!   for being too large,
//! - the shared epoch advances in lockstep with every agent's propagated
//!   epoch, and any disagreement is a fatal corruption,
//! - termination and truncation are episode-wide, broadcast to all agents.
//!
//! Orbital dynamics are consumed through the [`Propagator`] trait from
//! `pe_dynamics`; policies, rewards and rendering stay outside the engine
//! (see the `pe_sim` crate).
//!
//! [`Propagator`]: pe_dynamics::Propagator

mod action;
mod agent;
mod config;
mod display;
mod episode;
mod error;
mod reward;
mod store;

pub use action::{clamp_impulse, ActionSpace, ClampedImpulse, ObservationSpace};
pub use agent::{AgentId, Role};
pub use config::{EpisodeConfig, ReferenceOrbit};
pub use display::{DisplaySink, NullSink};
pub use episode::{EpisodeController, Phase, StepInfo, StepOutput};
pub use error::EpisodeError;
pub use reward::{RewardFn, ZeroReward};
pub use store::AgentStore;
