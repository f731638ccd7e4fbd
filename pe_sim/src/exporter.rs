//! JSON exporter for episode playback.
//!
//! Dumps one frame per step so trajectories can be inspected or replayed
//! offline without rerunning the simulation.

use std::collections::HashMap;
use std::fs::File;
use std::io::Write;

use pe_core::AgentId;
use pe_dynamics::CartesianState;
use serde::{Deserialize, Serialize};

/// One agent's state within a frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSample {
    /// Agent name (`p_0`, `e_0`)
    pub agent: String,

    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub vx: f64,
    pub vy: f64,
    pub vz: f64,

    /// Remaining delta-v budget, m/s
    pub remaining_dv: f64,
}

impl AgentSample {
    pub fn new(agent: AgentId, state: &CartesianState, remaining_dv: f64) -> Self {
        Self {
            agent: agent.to_string(),
            x: state.position.x,
            y: state.position.y,
            z: state.position.z,
            vx: state.velocity.x,
            vy: state.velocity.y,
            vz: state.velocity.z,
            remaining_dv,
        }
    }
}

/// A single frame of episode data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeFrame {
    /// Simulated time since episode start, s
    pub time_secs: f64,

    /// Per-agent samples
    pub agents: Vec<AgentSample>,

    /// Pursuer-evader distance, m
    pub separation: f64,
}

impl EpisodeFrame {
    /// Builds a frame from a state snapshot and per-agent budgets.
    pub fn from_snapshot(
        time_secs: f64,
        snapshot: &HashMap<AgentId, CartesianState>,
        budgets: &HashMap<AgentId, f64>,
        separation: f64,
    ) -> Self {
        let mut ids: Vec<AgentId> = snapshot.keys().copied().collect();
        ids.sort();

        let agents = ids
            .into_iter()
            .map(|id| {
                AgentSample::new(
                    id,
                    &snapshot[&id],
                    budgets.get(&id).copied().unwrap_or(0.0),
                )
            })
            .collect();

        Self {
            time_secs,
            agents,
            separation,
        }
    }
}

/// Complete episode export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeExport {
    /// Seed the episode ran with
    pub seed: u64,

    /// Capture radius in effect, m
    pub capture_radius: f64,

    /// All frames, reset frame first
    pub frames: Vec<EpisodeFrame>,

    /// Whether the episode ended by capture
    pub captured: bool,

    /// Whether the episode ended by time budget
    pub truncated: bool,

    /// Pursuer-evader distance at the end, m
    pub final_separation: f64,
}

impl EpisodeExport {
    /// Creates an empty export container.
    pub fn new(seed: u64, capture_radius: f64) -> Self {
        Self {
            seed,
            capture_radius,
            frames: Vec::new(),
            captured: false,
            truncated: false,
            final_separation: f64::NAN,
        }
    }

    /// Appends a frame.
    pub fn add_frame(&mut self, frame: EpisodeFrame) {
        self.frames.push(frame);
    }

    /// Records the episode outcome.
    pub fn finalize(&mut self, captured: bool, truncated: bool, final_separation: f64) {
        self.captured = captured;
        self.truncated = truncated;
        self.final_separation = final_separation;
    }

    /// Writes the export as pretty-printed JSON.
    pub fn write_to_file(&self, path: &str) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}
