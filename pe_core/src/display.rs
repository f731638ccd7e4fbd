//! Display sink contract.

use std::collections::HashMap;

use pe_dynamics::CartesianState;

use crate::agent::AgentId;

/// A passive observer of episode state, one `update` per rendered frame.
///
/// The engine never blocks on a sink and never depends on rendering
/// completing; correctness is unaffected by what (if anything) a sink does.
/// The `pe_sim` crate ships a Rerun-backed implementation behind its
/// `visualization` feature.
pub trait DisplaySink {
    /// Receives the current per-agent state snapshot.
    fn update(&mut self, snapshot: &HashMap<AgentId, CartesianState>);

    /// Clears any accumulated display state (trails, histories) at episode
    /// reset.
    fn reset(&mut self);
}

/// Sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DisplaySink for NullSink {
    fn update(&mut self, _snapshot: &HashMap<AgentId, CartesianState>) {}

    fn reset(&mut self) {}
}
